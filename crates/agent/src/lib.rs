//! Conversational triage engine - the "brain" of the deskd service.
//!
//! Every inbound employee message flows through one pipeline:
//! 1. **Safety Gate** (`safety`) - moderation check, fail-open
//! 2. **Intent Heuristics** (`intent`) - advisory pattern signals
//! 3. **Session Memory** (`session`) - per-key append-only transcript
//! 4. **Tool-Calling Loop** (`tool_loop`) - completion capability drives
//!    0..N tool invocations before a final answer
//! 5. **Risk Scorer** (`risk`) - discrete risk level + action log
//! 6. **Response Composer** (`orchestrator`) - structured response + audit
//!
//! # Safety Principle
//!
//! The completion model decides which declared tools to call; it never
//! decides safety outcomes or risk levels. Those are deterministic decisions
//! made here, after the fact, from signals and recorded tool activity.

pub mod capabilities;
pub mod intent;
pub mod llm;
pub mod orchestrator;
pub mod payload;
pub mod risk;
pub mod safety;
pub mod session;
pub mod tool_loop;
pub mod tools;
pub mod transcript;

pub use intent::{IntentDetector, IntentSignals, Urgency};
pub use orchestrator::Orchestrator;
pub use risk::score;
pub use session::{Session, SessionStore};
pub use transcript::{Role, ToolCall, Transcript, Turn};
