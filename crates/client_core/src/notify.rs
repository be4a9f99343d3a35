//! Transient notifications and upload progress presentation.

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use tracing::{error, info};

use crate::types::UploadProgress;

const MAX_ACTIVE_NOTIFICATIONS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    pub raised_at: Instant,
}

/// Toast queue. Entries disappear after the configured time-to-live.
#[derive(Debug)]
pub struct NotificationCenter {
    ttl: Duration,
    active: VecDeque<Notification>,
    next_id: u64,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            active: VecDeque::new(),
            next_id: 1,
        }
    }

    pub fn push(&mut self, kind: NotificationKind, message: impl Into<String>) -> u64 {
        let message = message.into();
        match kind {
            NotificationKind::Error => error!(notification = %message, "notify"),
            NotificationKind::Success | NotificationKind::Info => {
                info!(notification = %message, kind = ?kind, "notify")
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        self.active.push_back(Notification {
            id,
            kind,
            message,
            raised_at: Instant::now(),
        });
        while self.active.len() > MAX_ACTIVE_NOTIFICATIONS {
            self.active.pop_front();
        }
        id
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Success, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Error, message)
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Info, message)
    }

    /// Drops every notification older than the TTL at `now`.
    pub fn expire(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.active
            .retain(|notification| now.saturating_duration_since(notification.raised_at) < ttl);
    }

    pub fn dismiss(&mut self, id: u64) {
        self.active.retain(|notification| notification.id != id);
    }

    pub fn active(&self) -> impl Iterator<Item = &Notification> {
        self.active.iter()
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.active.back()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Upload progress as shown next to a slot preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressIndicator {
    /// Upload started, no byte count reported yet.
    Indeterminate,
    Fraction(f32),
}

impl ProgressIndicator {
    pub fn fraction(&self) -> Option<f32> {
        match self {
            Self::Indeterminate => None,
            Self::Fraction(value) => Some(*value),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Indeterminate => "Uploading…".to_string(),
            Self::Fraction(value) => format!("Uploading {:.0}%", value * 100.0),
        }
    }
}

impl From<UploadProgress> for ProgressIndicator {
    fn from(value: UploadProgress) -> Self {
        Self::Fraction(value.fraction())
    }
}
