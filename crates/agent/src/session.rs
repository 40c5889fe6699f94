use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::Mutex as AsyncMutex;

use deskd_core::config::SessionConfig;

use crate::transcript::{Transcript, Turn};

/// One live conversation. Callers hold the session behind an async mutex so
/// concurrent messages for the same key serialize instead of interleaving
/// transcript appends.
#[derive(Debug)]
pub struct Session {
    pub key: String,
    pub transcript: Transcript,
}

impl Session {
    fn new(key: &str, user_label: &str) -> Self {
        Self {
            key: key.to_string(),
            transcript: Transcript::seeded(Turn::system(system_instructions(user_label))),
        }
    }
}

fn system_instructions(user_label: &str) -> String {
    format!(
        "You are deskd, an internal support assistant helping employee '{user_label}'.\n\
         Available tools:\n\
         - analyze_workload_metrics: look up an employee's workload profile\n\
         - generate_upload_link: create a secure file upload link\n\
         - get_activity_logs: fetch recent device activity logs\n\
         - self_heal_restart: restart a stuck service or device remotely\n\
         - escalate_to_human: open a ticket with the human support team\n\
         - check_corporate_policy: search the corporate policy knowledge base\n\
         Rules: use tools when the user needs a real effect; never claim an \
         action happened unless a tool actually ran; never fabricate tool \
         results; stay empathetic and concise; remember the prior context of \
         this conversation."
    )
}

struct Entry {
    handle: Arc<AsyncMutex<Session>>,
    last_touched: Instant,
}

/// Owns every live session. Sessions are created lazily, expire after an
/// idle TTL (swept on access), and the store holds at most `max_sessions`
/// entries, evicting the longest-idle one when full.
pub struct SessionStore {
    entries: Mutex<HashMap<String, Entry>>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            idle_ttl: Duration::from_secs(config.idle_ttl_secs),
            max_sessions: config.max_sessions.max(1),
        }
    }

    /// Returns the session for `session_key`, creating and seeding it when
    /// absent or expired. Same key, same session: no duplicate seeding.
    pub fn get_or_create(&self, session_key: &str, user_label: &str) -> Arc<AsyncMutex<Session>> {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };

        let now = Instant::now();
        entries.retain(|_, entry| now.duration_since(entry.last_touched) < self.idle_ttl);

        if let Some(entry) = entries.get_mut(session_key) {
            entry.last_touched = now;
            return Arc::clone(&entry.handle);
        }

        if entries.len() >= self.max_sessions {
            let longest_idle = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_touched)
                .map(|(key, _)| key.clone());
            if let Some(key) = longest_idle {
                tracing::warn!(
                    event_name = "agent.session.evicted",
                    session_key = %key,
                    "session cap reached, evicting longest-idle session"
                );
                entries.remove(&key);
            }
        }

        let handle = Arc::new(AsyncMutex::new(Session::new(session_key, user_label)));
        entries.insert(
            session_key.to_string(),
            Entry { handle: Arc::clone(&handle), last_touched: now },
        );
        tracing::debug!(
            event_name = "agent.session.created",
            session_key = %session_key,
            "new session seeded"
        );
        handle
    }

    pub fn live_count(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}
