use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const LEDGER_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    Praise,
    Feedback,
}

impl NoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Praise => "praise",
            Self::Feedback => "feedback",
        }
    }
}

/// One append-only ledger row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub kind: NoteKind,
    pub from_mention: String,
    pub to_mention: String,
    pub value: String,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

impl NoteRecord {
    pub fn new(
        kind: NoteKind,
        from_mention: impl Into<String>,
        to_mention: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            from_mention: from_mention.into(),
            to_mention: to_mention.into(),
            value: value.into(),
            message: message.into(),
            recorded_at: Utc::now(),
        }
    }

    pub fn timestamp_utc(&self) -> String {
        self.recorded_at.format(LEDGER_TIMESTAMP_FORMAT).to_string()
    }

    /// `[kind, from, to, value, message, timestamp]`, the column order every ledger uses.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.kind.as_str().to_owned(),
            self.from_mention.clone(),
            self.to_mention.clone(),
            self.value.clone(),
            self.message.clone(),
            self.timestamp_utc(),
        ]
    }
}
