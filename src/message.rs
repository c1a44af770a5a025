use serde::{Deserialize, Serialize};

/// Fixed user-facing text for any failed request. Diagnostic detail goes to
/// the operator log, never into the transcript.
pub const REQUEST_FAILED_TEXT: &str = "Sorry, there was an error processing your request.";

/// Discriminates rendering and payload shape of a transcript record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Bot,
    Error,
}

/// A record in the session transcript. The transcript is append-only:
/// records are never mutated or removed while the session lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
    /// Generated SQL. Present only on `Bot` records, and only when the
    /// backend returned one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::User,
            text: text.into(),
            sql: None,
        }
    }

    pub fn bot(explanation: impl Into<String>, sql: Option<String>) -> Self {
        Self {
            kind: MessageKind::Bot,
            text: explanation.into(),
            sql,
        }
    }

    pub fn request_failed() -> Self {
        Self {
            kind: MessageKind::Error,
            text: REQUEST_FAILED_TEXT.to_string(),
            sql: None,
        }
    }
}
