use thiserror::Error;

/// Failure taxonomy for external capabilities (moderation, sentiment,
/// completion, retrieval, directory lookups, persistence).
///
/// `Transient` is the only variant the orchestrator degrades gracefully on;
/// `NotFound` is surfaced as explanatory text to the model, never as a
/// failure; everything else maps to a generic internal-error response.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("capability temporarily unavailable: {0}")]
    Transient(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("capability not configured: {0}")]
    NotConfigured(String),
    #[error("capability failure: {0}")]
    Failed(String),
}

impl CapabilityError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::CapabilityError;

    #[test]
    fn transient_classification() {
        assert!(CapabilityError::Transient("completion timeout".into()).is_transient());
        assert!(!CapabilityError::Failed("bad payload".into()).is_transient());
        assert!(!CapabilityError::NotFound("emp-404".into()).is_transient());
    }

    #[test]
    fn messages_carry_context() {
        let error = CapabilityError::NotConfigured("moderation".into());
        assert_eq!(error.to_string(), "capability not configured: moderation");
    }
}
