use shared::error::ReplyError;
use thiserror::Error;

/// Every failure the try-on flow can surface. None of them is fatal: each
/// one leaves the UI interactable (empty slot or idle controller).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TryOnError {
    /// Rejected locally before any network call.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Network failure or server-reported error while uploading an image.
    #[error("upload failed: {0}")]
    Upload(String),
    /// The synthesis service answered with an `error` status.
    #[error("service error: {0}")]
    Service(String),
    /// The reply did not follow the documented contract.
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("i/o error: {0}")]
    Io(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl TryOnError {
    /// Human-facing detail without the kind prefix.
    pub fn detail(&self) -> &str {
        match self {
            Self::Validation(detail)
            | Self::Upload(detail)
            | Self::Service(detail)
            | Self::Protocol(detail)
            | Self::Transport(detail)
            | Self::Io(detail)
            | Self::InvalidState(detail) => detail,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Upload(_) => "upload",
            Self::Service(_) => "service",
            Self::Protocol(_) => "protocol",
            Self::Transport(_) => "transport",
            Self::Io(_) => "io",
            Self::InvalidState(_) => "invalid_state",
        }
    }

    pub(crate) fn upload_reply(err: ReplyError) -> Self {
        Self::Upload(err.message().to_string())
    }
}

/// Try-on semantics: a reported failure is a service error, anything
/// off-contract is a protocol error.
impl From<ReplyError> for TryOnError {
    fn from(value: ReplyError) -> Self {
        match value {
            ReplyError::Rejected(message) => Self::Service(message),
            ReplyError::Malformed(message) => Self::Protocol(message),
        }
    }
}

impl From<std::io::Error> for TryOnError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}
