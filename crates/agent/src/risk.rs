use deskd_core::domain::risk::{RiskAssessment, RiskLevel};

use crate::intent::{IntentSignals, Urgency};
use crate::tools::ToolCallRecord;

pub const CONTEXTUAL_ANALYSIS_ACTION: &str = "Contextual Analysis";
pub const TOOL_EXECUTION_ACTION: &str = "Tool Execution";
pub const INACTION_WARNING_ACTION: &str =
    "Warning: possible inaction on a critical request (restart/escalation signaled, no tool ran)";

/// Phrases in the final answer that indicate a tool actually executed.
const EXECUTION_PHRASES: &[&str] = &[
    "i have executed",
    "i have restarted",
    "i have generated",
    "ticket created",
    "escalation completed",
    "link generated",
    "hr data",
    "workload analysis",
];

/// Post-hoc safety net: conservative by design, a false positive only
/// raises the logged risk, it never blocks the response.
pub fn score(
    intent: &IntentSignals,
    final_text: &str,
    tool_calls: &[ToolCallRecord],
) -> RiskAssessment {
    let mut level = RiskLevel::Low;
    let mut actions = vec![CONTEXTUAL_ANALYSIS_ACTION.to_string()];

    if intent.urgency == Urgency::High {
        level = RiskLevel::Medium;
    }

    let lowered = final_text.to_lowercase();
    let phrase_evidence = EXECUTION_PHRASES.iter().any(|phrase| lowered.contains(phrase));
    let structured_evidence = tool_calls.iter().any(|record| record.succeeded);

    if phrase_evidence || structured_evidence {
        actions.push(TOOL_EXECUTION_ACTION.to_string());
    } else if intent.needs_restart || intent.needs_human {
        level = RiskLevel::High;
        actions.push(INACTION_WARNING_ACTION.to_string());
    }

    RiskAssessment::new(level, actions)
}

#[cfg(test)]
mod tests {
    use deskd_core::domain::risk::RiskLevel;

    use crate::intent::{IntentSignals, Urgency};
    use crate::tools::ToolCallRecord;

    use super::{
        score, CONTEXTUAL_ANALYSIS_ACTION, INACTION_WARNING_ACTION, TOOL_EXECUTION_ACTION,
    };

    fn signals() -> IntentSignals {
        IntentSignals::default()
    }

    #[test]
    fn base_case_is_low_with_contextual_analysis() {
        let assessment = score(&signals(), "Happy to help!", &[]);
        assert_eq!(assessment.level, RiskLevel::Low);
        assert_eq!(assessment.actions, vec![CONTEXTUAL_ANALYSIS_ACTION.to_string()]);
    }

    #[test]
    fn high_urgency_is_never_low() {
        let mut intent = signals();
        intent.urgency = Urgency::High;

        let assessment = score(&intent, "I understand the urgency.", &[]);
        assert_ne!(assessment.level, RiskLevel::Low);
    }

    #[test]
    fn execution_phrase_adds_tool_execution_marker() {
        let assessment = score(&signals(), "Done - ticket created with id TKT-1.", &[]);
        assert!(assessment.actions.contains(&TOOL_EXECUTION_ACTION.to_string()));
    }

    #[test]
    fn structured_record_counts_as_evidence_without_phrases() {
        let mut intent = signals();
        intent.needs_restart = true;

        let records = vec![ToolCallRecord { tool_name: "self_heal_restart".to_string(), succeeded: true }];
        let assessment = score(&intent, "Your device should recover shortly.", &records);

        assert!(assessment.actions.contains(&TOOL_EXECUTION_ACTION.to_string()));
        assert_ne!(assessment.level, RiskLevel::High);
    }

    #[test]
    fn failed_tool_call_is_not_evidence() {
        let mut intent = signals();
        intent.needs_restart = true;

        let records =
            vec![ToolCallRecord { tool_name: "self_heal_restart".to_string(), succeeded: false }];
        let assessment = score(&intent, "Something went wrong with the restart.", &records);

        assert_eq!(assessment.level, RiskLevel::High);
        assert!(assessment.actions.contains(&INACTION_WARNING_ACTION.to_string()));
    }

    #[test]
    fn critical_need_without_evidence_is_high_with_warning() {
        let mut intent = signals();
        intent.urgency = Urgency::High;
        intent.needs_restart = true;

        let assessment =
            score(&intent, "I understand your laptop is frozen, that sounds frustrating.", &[]);
        assert_eq!(assessment.level, RiskLevel::High);
        assert!(assessment.actions.contains(&INACTION_WARNING_ACTION.to_string()));
    }

    #[test]
    fn execution_evidence_suppresses_inaction_warning() {
        let mut intent = signals();
        intent.needs_human = true;

        let assessment = score(&intent, "Escalation completed, a human will reach out.", &[]);
        assert!(assessment.actions.contains(&TOOL_EXECUTION_ACTION.to_string()));
        assert!(!assessment.actions.contains(&INACTION_WARNING_ACTION.to_string()));
    }
}
