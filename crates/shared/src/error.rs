use thiserror::Error;

/// Fallback detail when the server reports an error without a message.
pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error";

/// Generic detail for a reply whose `status` is not one we understand.
pub const UNKNOWN_STATUS_MESSAGE: &str = "unknown status";

/// Why a server reply could not be turned into a usable outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplyError {
    /// The server answered in the expected shape but reported a failure.
    #[error("{0}")]
    Rejected(String),
    /// The reply did not match the documented contract.
    #[error("{0}")]
    Malformed(String),
}

impl ReplyError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Rejected(message) | Self::Malformed(message) => message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
