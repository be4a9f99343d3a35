//! Try-On Controller: the state machine behind the trigger button and the
//! result panel.
//!
//! ```text
//! Idle ──submit──▶ Submitting ──completed──▶ Succeeded | SubmittedAsync | Failed
//!   ▲                                          │
//!   └──────────────dismiss─────────────────────┘   (submit re-enters Submitting)
//! ```

use shared::protocol::{TryOnOutcome, TryOnRequest};
use tracing::{debug, info, warn};

use crate::{error::TryOnError, upload::ImageSlots};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TryOnState {
    #[default]
    Idle,
    Submitting {
        request: TryOnRequest,
    },
    Succeeded {
        image_url: String,
        task_id: Option<String>,
    },
    /// Accepted for background processing; nothing polls for the result.
    SubmittedAsync {
        task_id: Option<String>,
    },
    Failed {
        error: TryOnError,
    },
}

impl TryOnState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting { .. } => "submitting",
            Self::Succeeded { .. } => "succeeded",
            Self::SubmittedAsync { .. } => "submitted_async",
            Self::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    Submit(TryOnRequest),
    Completed(Result<TryOnOutcome, TryOnError>),
    /// Hide the result panel ("try again").
    Dismiss,
}

/// What the result panel shows. Derived from the state alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultPanel<'a> {
    Hidden,
    Loading,
    Image { image_url: &'a str },
    Pending,
    Error { detail: &'a str },
}

#[derive(Debug, Default)]
pub struct TryOnController {
    state: TryOnState,
    last_request: Option<TryOnRequest>,
}

impl TryOnController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TryOnState {
        &self.state
    }

    pub fn last_request(&self) -> Option<&TryOnRequest> {
        self.last_request.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, TryOnState::Submitting { .. })
    }

    /// The trigger is enabled iff both slots are uploaded and nothing is in flight.
    pub fn trigger_enabled(&self, slots: &ImageSlots) -> bool {
        slots.is_ready() && !self.is_submitting()
    }

    pub fn result_panel(&self) -> ResultPanel<'_> {
        match &self.state {
            TryOnState::Idle => ResultPanel::Hidden,
            TryOnState::Submitting { .. } => ResultPanel::Loading,
            TryOnState::Succeeded { image_url, .. } => ResultPanel::Image { image_url },
            TryOnState::SubmittedAsync { .. } => ResultPanel::Pending,
            TryOnState::Failed { error } => ResultPanel::Error {
                detail: error.detail(),
            },
        }
    }

    /// The single transition function. Events that do not apply to the
    /// current state are rejected with `InvalidState` and change nothing.
    pub fn transition(&mut self, event: ControllerEvent) -> Result<&TryOnState, TryOnError> {
        let from = self.state.name();
        let next = match (&self.state, event) {
            (TryOnState::Submitting { .. }, ControllerEvent::Submit(_)) => {
                return Err(TryOnError::InvalidState(
                    "a try-on request is already in flight".to_string(),
                ));
            }
            (_, ControllerEvent::Submit(request)) => {
                self.last_request = Some(request.clone());
                TryOnState::Submitting { request }
            }
            (TryOnState::Submitting { .. }, ControllerEvent::Completed(result)) => match result {
                Ok(TryOnOutcome::Success { image_url, task_id }) => {
                    TryOnState::Succeeded { image_url, task_id }
                }
                Ok(TryOnOutcome::Submitted { task_id }) => TryOnState::SubmittedAsync { task_id },
                Err(error) => TryOnState::Failed { error },
            },
            (_, ControllerEvent::Completed(_)) => {
                warn!(state = from, "ignoring try-on completion with nothing in flight");
                return Err(TryOnError::InvalidState(
                    "no try-on request is in flight".to_string(),
                ));
            }
            (TryOnState::Submitting { .. }, ControllerEvent::Dismiss) => {
                return Err(TryOnError::InvalidState(
                    "cannot dismiss while a try-on request is in flight".to_string(),
                ));
            }
            (_, ControllerEvent::Dismiss) => TryOnState::Idle,
        };

        self.state = next;
        match &self.state {
            TryOnState::Failed { error } => {
                warn!(from, to = self.state.name(), error = %error, "try-on transition")
            }
            TryOnState::Succeeded { image_url, .. } => {
                info!(from, to = self.state.name(), %image_url, "try-on transition")
            }
            _ => debug!(from, to = self.state.name(), "try-on transition"),
        }
        Ok(&self.state)
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
