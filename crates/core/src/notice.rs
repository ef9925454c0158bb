//! Short-lived user notices (success or error toasts).

use crate::constants::NOTICE_TTL;
use serde::Serialize;
use std::time::Instant;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A message shown to the user for a few seconds.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
    #[serde(skip)]
    issued_at: Instant,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, NoticeKind::Success)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NoticeKind::Error)
    }

    fn new(message: impl Into<String>, kind: NoticeKind) -> Self {
        Self {
            message: message.into(),
            kind,
            issued_at: Instant::now(),
        }
    }

    /// Whether the notice should still be shown at `now`.
    pub fn is_visible_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.issued_at) < NOTICE_TTL
    }
}
