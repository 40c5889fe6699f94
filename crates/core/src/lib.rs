pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;

pub use audit::{AuditRecord, AuditSink, InMemoryAuditSink, SafetyOutcome};
pub use domain::messages::{ChatRequest, ChatResponse, Sentiment, VoiceResponse};
pub use domain::risk::{RiskAssessment, RiskLevel};
pub use domain::ticket::{Ticket, TicketId, TicketPriority, TicketStatus};
pub use errors::CapabilityError;
