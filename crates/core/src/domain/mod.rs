pub mod messages;
pub mod risk;
pub mod ticket;
