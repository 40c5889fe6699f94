//! HTTP-backed implementations of the capability traits consumed by the
//! agent engine. Each client owns its own `reqwest::Client` configured with
//! the timeout from its config section; failures are classified into the
//! shared `CapabilityError` taxonomy so the engine can degrade uniformly.

pub mod automation;
pub mod completion;
pub mod directory;
pub mod disabled;
pub mod escalation;
pub mod moderation;
pub mod search;
pub mod sentiment;
pub mod speech;

mod http;

pub use automation::HttpAutomationRunner;
pub use completion::OpenAiChatCompletion;
pub use directory::HttpEmployeeDirectory;
pub use disabled::Disabled;
pub use escalation::WebhookEscalationNotifier;
pub use moderation::HttpModeration;
pub use search::HttpKnowledgeIndex;
pub use sentiment::HttpSentimentAnalyzer;
pub use speech::{HttpSpeechSynthesizer, HttpSpeechTranscriber};
