use std::sync::Arc;

use tracing::{debug, warn};

use crate::call_policy::CallPolicy;
use crate::domain::command::HistoryMessage;
use crate::ports::MessagingPlatform;

pub const DEFAULT_HISTORY_LIMIT: u32 = 200;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NoteSearchOutcome {
    Found { target: String, notes: Vec<String> },
    NotFound { target: String },
    Unavailable,
}

impl NoteSearchOutcome {
    pub fn render(&self) -> String {
        match self {
            Self::Found { target, notes } => {
                let listing =
                    notes.iter().map(|note| format!("- {note}")).collect::<Vec<_>>().join("\n");
                format!("Here are notes referencing {target}:\n{listing}")
            }
            Self::NotFound { target } => format!("No notes found referencing {target}."),
            Self::Unavailable => "Could not retrieve messages.".to_owned(),
        }
    }
}

/// Scans a bounded window of channel history for literal mentions of a target.
pub struct NoteSearch {
    messaging: Arc<dyn MessagingPlatform>,
    policy: CallPolicy,
    history_limit: u32,
}

impl NoteSearch {
    pub fn new(messaging: Arc<dyn MessagingPlatform>) -> Self {
        Self { messaging, policy: CallPolicy::default(), history_limit: DEFAULT_HISTORY_LIMIT }
    }

    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_history_limit(mut self, history_limit: u32) -> Self {
        self.history_limit = history_limit;
        self
    }

    pub async fn search(&self, channel_id: &str, target: &str) -> NoteSearchOutcome {
        let limit = self.history_limit;
        let messages = match self
            .policy
            .run("conversations.history", move || self.messaging.fetch_history(channel_id, limit))
            .await
        {
            Ok(messages) => messages,
            Err(error) => {
                warn!(
                    event_name = "notes.history.failed",
                    channel_id,
                    error = %error,
                    "could not fetch channel history"
                );
                return NoteSearchOutcome::Unavailable;
            }
        };

        let notes = matching_notes(&messages, target);
        debug!(
            event_name = "notes.search.completed",
            channel_id,
            scanned = messages.len(),
            matched = notes.len(),
            "note search completed"
        );

        if notes.is_empty() {
            NoteSearchOutcome::NotFound { target: target.to_owned() }
        } else {
            NoteSearchOutcome::Found { target: target.to_owned(), notes }
        }
    }
}

/// Bodies containing `target` as a case-sensitive substring, in supplied order.
pub fn matching_notes(messages: &[HistoryMessage], target: &str) -> Vec<String> {
    messages
        .iter()
        .filter(|message| message.text.contains(target))
        .map(|message| message.text.clone())
        .collect()
}
