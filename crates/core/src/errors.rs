use thiserror::Error;

/// Failure of an external collaborator call (member directory, channel history,
/// message posting, ledger).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: &'static str, timeout_ms: u64 },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("api returned an error: {0}")]
    Api(String),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

impl CollaboratorError {
    /// Only failures that may succeed on an identical second attempt are retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport(_))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "The request could not be processed.",
            Self::UnsupportedContentType { .. } => "Unsupported content type",
            Self::ServiceUnavailable { .. } => {
                "Sorry, that could not be saved right now. Please try again later."
            }
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest { .. } => 400,
            Self::UnsupportedContentType { .. } => 415,
            Self::ServiceUnavailable { .. } => 503,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::UnsupportedContentType { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. } => correlation_id,
        }
    }
}

impl CollaboratorError {
    /// Every collaborator failure reaches the user as the same plain retry-later text.
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        InterfaceError::ServiceUnavailable {
            message: self.to_string(),
            correlation_id: correlation_id.into(),
        }
    }
}
