use serde::{Deserialize, Serialize};

/// Discrete risk classification attached to every processed message.
///
/// `Unknown` is reserved for responses produced after an unexpected internal
/// failure, where no scoring ran at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Unknown,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit record of the risk computation for one message.
/// Created once per message, never mutated afterward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub actions: Vec<String>,
}

impl RiskAssessment {
    pub fn new(level: RiskLevel, actions: Vec<String>) -> Self {
        Self { level, actions }
    }
}
