use crate::transcript::Turn;

/// Scans this turn's tool results, most recent first, for a JSON envelope
/// carrying a `system_data` object. First hit wins; unparseable content is
/// skipped, and no hit means no payload (not an error).
pub fn extract_ui_payload(tool_turns: &[&Turn]) -> Option<serde_json::Value> {
    for turn in tool_turns.iter().rev() {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&turn.content) else {
            continue;
        };
        if let Some(system_data) = value.get("system_data") {
            if !system_data.is_null() {
                return Some(system_data.clone());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use crate::transcript::Turn;

    use super::extract_ui_payload;

    #[test]
    fn extracts_system_data_from_envelope() {
        let turn = Turn::tool(
            "generate_upload_link",
            "call-1",
            r#"{"human_text":"link ready","system_data":{"type":"upload_widget","payload":{"url":"https://x.test"}}}"#,
        );
        let turns = vec![&turn];

        let payload = extract_ui_payload(&turns).expect("payload");
        assert_eq!(payload["type"], "upload_widget");
        assert_eq!(payload["payload"]["url"], "https://x.test");
    }

    #[test]
    fn most_recent_envelope_wins() {
        let older = Turn::tool(
            "generate_upload_link",
            "call-1",
            r#"{"human_text":"old","system_data":{"type":"upload_widget","payload":{"n":1}}}"#,
        );
        let newer = Turn::tool(
            "escalate_to_human",
            "call-2",
            r#"{"human_text":"new","system_data":{"type":"ticket_created","payload":{"n":2}}}"#,
        );
        let turns = vec![&older, &newer];

        let payload = extract_ui_payload(&turns).expect("payload");
        assert_eq!(payload["type"], "ticket_created");
    }

    #[test]
    fn narrative_and_malformed_content_yield_none() {
        let narrative = Turn::tool("get_activity_logs", "call-1", "plain log text, no json");
        let malformed = Turn::tool("get_activity_logs", "call-2", "{not valid json");
        let turns = vec![&narrative, &malformed];

        assert!(extract_ui_payload(&turns).is_none());
    }

    #[test]
    fn envelope_without_system_data_is_skipped() {
        let plain = Turn::tool("self_heal_restart", "call-1", r#"{"human_text":"restarted"}"#);
        let widget = Turn::tool(
            "generate_upload_link",
            "call-2",
            r#"{"human_text":"link","system_data":{"type":"upload_widget","payload":{}}}"#,
        );
        // widget is older than plain here, but plain has no system_data
        let turns = vec![&widget, &plain];

        let payload = extract_ui_payload(&turns).expect("payload");
        assert_eq!(payload["type"], "upload_widget");
    }
}
