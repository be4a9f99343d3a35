//! UI/backend events and error modeling for desktop GUI controller.

use client_core::{TryOnError, UploadProgress, UploadTicket};
use shared::protocol::{HealthReply, TryOnOutcome};

use crate::ui::images::PreviewImage;

pub enum UiEvent {
    Info(String),
    Error(UiError),
    UploadProgress {
        ticket: UploadTicket,
        progress: UploadProgress,
    },
    UploadFinished {
        ticket: UploadTicket,
        result: Result<String, TryOnError>,
    },
    TryOnFinished(Result<TryOnOutcome, TryOnError>),
    ResultImageLoaded {
        image_url: String,
        image: PreviewImage,
        original_bytes: Vec<u8>,
    },
    ResultImageFailed {
        image_url: String,
        reason: String,
    },
    HealthChecked(Result<HealthReply, TryOnError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Validation,
    Transport,
    Service,
    Protocol,
    Storage,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Upload,
    SaveResult,
    Clipboard,
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Service => "Service",
        UiErrorCategory::Protocol => "Protocol",
        UiErrorCategory::Storage => "Storage",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("not an image")
            || message_lower.contains("too large")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("transport")
            || message_lower.contains("disconnected")
            || message_lower.contains("unavailable")
        {
            UiErrorCategory::Transport
        } else if message_lower.contains("permission denied")
            || message_lower.contains("no such file")
            || message_lower.contains("read-only")
        {
            UiErrorCategory::Storage
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    /// Typed errors carry their own category; no string sniffing needed.
    pub fn from_try_on(context: UiErrorContext, err: &TryOnError) -> Self {
        let category = match err {
            TryOnError::Validation(_) => UiErrorCategory::Validation,
            TryOnError::Upload(_) | TryOnError::Transport(_) => UiErrorCategory::Transport,
            TryOnError::Service(_) => UiErrorCategory::Service,
            TryOnError::Protocol(_) => UiErrorCategory::Protocol,
            TryOnError::Io(_) => UiErrorCategory::Storage,
            TryOnError::InvalidState(_) => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context,
            message: err.detail().to_string(),
        }
    }

    pub fn is_startup_failure(&self) -> bool {
        self.context == UiErrorContext::BackendStartup
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
