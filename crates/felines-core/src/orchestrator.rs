//! Wiring between the counter, the audio slot and the notification.
//!
//! The orchestrator is the explicit session context: it owns every piece of
//! per-session state, and nothing else in the crate holds any.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::audio::{AudioCueController, AudioCueState, Cue, PlaybackBackend, RandomSelector};
use crate::catalog;
use crate::clock::Clock;
use crate::engagement::{EngagementCounter, Increment};
use crate::error::{CoreError, PlaybackError};
use crate::events::Event;
use crate::notification::{Notification, NotificationController};
use crate::storage::Config;

/// `{count}` is replaced by the like count.
pub const DEFAULT_MILESTONE_MESSAGE: &str = "You've liked {count} items. Keep going!";

/// Everything one like caused.
#[derive(Debug, Clone, PartialEq)]
pub struct LikeOutcome {
    pub increment: Increment,
    /// Cue that started playing, if audio worked.
    pub cue: Option<Cue>,
    pub audio_error: Option<PlaybackError>,
    /// Notification shown for a milestone.
    pub notification: Option<Notification>,
    pub events: Vec<Event>,
}

/// Read-only view for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub likes: u64,
    pub badge: Option<String>,
    pub heart_filled: bool,
    pub notification: Option<Notification>,
    pub audio: AudioCueState,
    pub now_playing: Option<Cue>,
}

pub struct EngagementOrchestrator {
    counter: EngagementCounter,
    audio: AudioCueController,
    notifications: NotificationController,
    milestone_message: String,
    notifications_enabled: bool,
}

impl EngagementOrchestrator {
    pub fn new(
        counter: EngagementCounter,
        audio: AudioCueController,
        notifications: NotificationController,
    ) -> Self {
        Self {
            counter,
            audio,
            notifications,
            milestone_message: DEFAULT_MILESTONE_MESSAGE.to_string(),
            notifications_enabled: true,
        }
    }

    /// Build a session from configuration. `backend = None` runs without
    /// audio.
    ///
    /// # Errors
    /// Returns an error when the configured milestone interval is invalid.
    pub fn from_config(
        config: &Config,
        clock: Arc<dyn Clock>,
        backend: Option<Box<dyn PlaybackBackend>>,
    ) -> Result<Self, CoreError> {
        let counter = EngagementCounter::with_interval(config.engagement.milestone_interval)?;
        let backend = if config.audio.enabled { backend } else { None };
        let audio = AudioCueController::new(Box::new(RandomSelector::new(config.audio.seed)), backend)
            .with_settings(config.audio.volume, config.audio.muted);
        let notifications =
            NotificationController::with_display_ms(clock, config.notifications.duration_ms);

        Ok(Self {
            counter,
            audio,
            notifications,
            milestone_message: config.notifications.milestone_message.clone(),
            notifications_enabled: config.notifications.enabled,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn likes(&self) -> u64 {
        self.counter.count()
    }

    pub fn audio(&self) -> &AudioCueController {
        &self.audio
    }

    pub fn notifications(&self) -> &NotificationController {
        &self.notifications
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let likes = self.counter.count();
        SessionSnapshot {
            likes,
            badge: catalog::like_badge(likes),
            heart_filled: catalog::heart_filled(likes),
            notification: self.notifications.current().cloned(),
            audio: self.audio.state(),
            now_playing: self.audio.now_playing(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Count the like, play a cue, and show a notification on milestones.
    pub fn user_liked(&mut self) -> LikeOutcome {
        let increment = self.counter.increment();
        let mut events = vec![Event::Liked {
            count: increment.new_count,
            at: Utc::now(),
        }];

        // One cue per like; milestones do not add a second one.
        let (cue, audio_error) = match self.audio.trigger() {
            Ok(event) => {
                let cue = match &event {
                    Event::CuePlayed { cue, .. } => Some(*cue),
                    _ => None,
                };
                events.push(event);
                (cue, None)
            }
            Err(e) => {
                events.push(Event::CueUnavailable {
                    reason: e.to_string(),
                    at: Utc::now(),
                });
                (None, Some(e))
            }
        };

        let mut notification = None;
        if increment.is_milestone {
            info!(count = increment.new_count, "milestone reached");
            events.push(Event::MilestoneReached {
                count: increment.new_count,
                at: Utc::now(),
            });
            if self.notifications_enabled {
                let message = self.milestone_message.replace("{count}", &increment.new_count.to_string());
                events.push(self.notifications.show(message));
                notification = self.notifications.current().cloned();
            }
        }

        LikeOutcome {
            increment,
            cue,
            audio_error,
            notification,
            events,
        }
    }

    pub fn set_volume(&mut self, volume: f32) -> Event {
        self.audio.set_volume(volume)
    }

    pub fn set_muted(&mut self, muted: bool) -> Event {
        self.audio.set_muted(muted)
    }

    pub fn select_cue(&mut self, cue: Cue) -> Result<Event, PlaybackError> {
        self.audio.select_and_play(cue)
    }

    pub fn dismiss_notification(&mut self) -> Option<Event> {
        self.notifications.dismiss()
    }

    /// Scheduled-hide entry point; see [`NotificationController::expire`].
    pub fn expire_notification(&mut self, id: u64) -> Option<Event> {
        self.notifications.expire(id)
    }

    /// Poll time-based transitions.
    pub fn tick(&mut self) -> Option<Event> {
        self.notifications.tick()
    }
}

impl std::fmt::Debug for EngagementOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngagementOrchestrator")
            .field("counter", &self.counter)
            .field("audio", &self.audio.state())
            .field("notification", &self.notifications.current())
            .finish()
    }
}

/// Log an audio failure once per like without interrupting the caller.
pub(crate) fn report_audio(outcome: &LikeOutcome) {
    if let Some(e) = &outcome.audio_error {
        warn!(count = outcome.increment.new_count, error = %e, "like recorded without audio");
    }
}
