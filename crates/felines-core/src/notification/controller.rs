//! Auto-dismissing notification state machine.
//!
//! ## State Transitions
//!
//! ```text
//! Hidden --show--> Visible --(expiry | dismiss)--> Hidden
//!                  Visible --show--> Visible (new id, timer restarted)
//! ```
//!
//! Built on wall-clock deltas without an internal thread: either poll
//! [`NotificationController::tick`], or let a scheduled task call
//! [`NotificationController::expire`] with the id it was scheduled for.
//! Both paths ignore anything but the current instance, so a superseded
//! deadline can never hide a newer notification.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;
use crate::events::{Event, HideReason};

pub const DEFAULT_DISPLAY_MS: u64 = 3_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationState {
    Hidden,
    Visible,
}

/// The notification currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Instance id; keys the scheduled hide.
    pub id: u64,
    pub message: String,
    pub shown_at_ms: u64,
    pub expires_at_ms: u64,
}

pub struct NotificationController {
    clock: Arc<dyn Clock>,
    display_ms: u64,
    current: Option<Notification>,
    next_id: u64,
}

impl NotificationController {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_display_ms(clock, DEFAULT_DISPLAY_MS)
    }

    pub fn with_display_ms(clock: Arc<dyn Clock>, display_ms: u64) -> Self {
        Self {
            clock,
            display_ms,
            current: None,
            next_id: 1,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> NotificationState {
        if self.current.is_some() {
            NotificationState::Visible
        } else {
            NotificationState::Hidden
        }
    }

    pub fn is_visible(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    /// Time left before the visible notification hides itself.
    pub fn remaining_ms(&self) -> Option<u64> {
        let now = self.clock.now_ms();
        self.current
            .as_ref()
            .map(|n| n.expires_at_ms.saturating_sub(now))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Show `message`, replacing whatever is visible and restarting the
    /// display window.
    pub fn show(&mut self, message: impl Into<String>) -> Event {
        let now = self.clock.now_ms();
        let id = self.next_id;
        self.next_id += 1;

        if let Some(prev) = &self.current {
            debug!(superseded = prev.id, by = id, "notification superseded");
        }

        let notification = Notification {
            id,
            message: message.into(),
            shown_at_ms: now,
            expires_at_ms: now.saturating_add(self.display_ms),
        };
        let event = Event::NotificationShown {
            id,
            message: notification.message.clone(),
            expires_at_ms: notification.expires_at_ms,
            at: Utc::now(),
        };
        self.current = Some(notification);
        event
    }

    /// Hide immediately. No-op when already hidden.
    pub fn dismiss(&mut self) -> Option<Event> {
        self.hide(HideReason::Dismissed)
    }

    /// Call periodically. Returns `Some(Event::NotificationHidden)` once the
    /// visible notification has outlived its window.
    pub fn tick(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        match &self.current {
            Some(n) if now >= n.expires_at_ms => self.hide(HideReason::Expired),
            _ => None,
        }
    }

    /// Scheduled-hide entry point. Only hides if `id` is still the visible
    /// instance.
    pub fn expire(&mut self, id: u64) -> Option<Event> {
        match &self.current {
            Some(n) if n.id == id => self.hide(HideReason::Expired),
            _ => {
                debug!(id, "stale notification expiry ignored");
                None
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn hide(&mut self, reason: HideReason) -> Option<Event> {
        let n = self.current.take()?;
        debug!(id = n.id, ?reason, "notification hidden");
        Some(Event::NotificationHidden {
            id: n.id,
            reason,
            at: Utc::now(),
        })
    }
}
