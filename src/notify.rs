//! Transient user-facing notices
//!
//! Every notice auto-dismisses after a fixed delay or when clicked.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        }
    }

    pub fn css_class(&self) -> String {
        format!("notification notification--{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    #[serde(with = "millis")]
    pub expires_at: Duration,
}

#[derive(Debug)]
pub struct NotificationCenter {
    next_id: u64,
    active: Vec<Notification>,
    ttl: Duration,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            next_id: 1,
            active: Vec::new(),
            ttl,
        }
    }

    pub fn show(&mut self, message: impl Into<String>, kind: NotificationKind, now: Duration) -> u64 {
        let message = message.into();
        match kind {
            NotificationKind::Error | NotificationKind::Warning => {
                warn!(kind = kind.as_str(), message = %message, "Showing notification")
            }
            _ => info!(kind = kind.as_str(), message = %message, "Showing notification"),
        }

        let id = self.next_id;
        self.next_id += 1;
        self.active.push(Notification {
            id,
            message,
            kind,
            expires_at: now + self.ttl,
        });
        id
    }

    /// Manual dismissal; false when the notice is already gone
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.active.len();
        self.active.retain(|n| n.id != id);
        before != self.active.len()
    }

    /// Drop every notice whose time is up and return them
    pub fn expire(&mut self, now: Duration) -> Vec<Notification> {
        let (expired, kept): (Vec<_>, Vec<_>) =
            self.active.drain(..).partition(|n| now >= n.expires_at);
        self.active = kept;
        if !expired.is_empty() {
            debug!(count = expired.len(), "Notifications expired");
        }
        expired
    }

    pub fn active(&self) -> &[Notification] {
        &self.active
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.active.last()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::constants::notify::AUTO_DISMISS_MS))
    }
}

mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }
}
