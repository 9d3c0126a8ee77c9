//! Async session for the tokio runtime.
//!
//! Holds the orchestrator and the pending hide task behind one mutex, so
//! likes, cue changes and scheduled hides are serialised: there is never
//! more than one active playback or one pending hide.
//!
//! Commands return their events directly. Events raised later by a
//! scheduled task (the automatic hide) go out on a broadcast channel; see
//! [`LiveSession::subscribe`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use crate::audio::{Cue, PlaybackBackend};
use crate::clock::Clock;
use crate::content::{ConfiguredSource, ContentCache, ContentItem, ContentSource};
use crate::error::{ContentFetchError, CoreError, PlaybackError};
use crate::events::Event;
use crate::notification::{DismissTimer, Notification};
use crate::orchestrator::{report_audio, EngagementOrchestrator, LikeOutcome, SessionSnapshot};
use crate::storage::Config;

struct Shared {
    engine: EngagementOrchestrator,
    dismiss: DismissTimer,
}

/// Capacity of the background event channel. A receiver that falls this far
/// behind skips the oldest events.
const EVENT_BUFFER: usize = 16;

pub struct LiveSession<S> {
    shared: Arc<Mutex<Shared>>,
    events: broadcast::Sender<Event>,
    content: ContentCache<S>,
    content_key: String,
}

impl LiveSession<ConfiguredSource> {
    /// Session wired from configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn from_config(
        config: &Config,
        clock: Arc<dyn Clock>,
        backend: Option<Box<dyn PlaybackBackend>>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let engine = EngagementOrchestrator::from_config(config, clock, backend)?;
        let source = ConfiguredSource::from_config(&config.content)?;
        let content = ContentCache::with_field(source, config.content.field.clone());
        Ok(Self::new(engine, content, config.content.default_key.clone()))
    }
}

impl<S: ContentSource> LiveSession<S> {
    pub fn new(engine: EngagementOrchestrator, content: ContentCache<S>, content_key: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                engine,
                dismiss: DismissTimer::new(),
            })),
            events: broadcast::channel(EVENT_BUFFER).0,
            content,
            content_key: content_key.into(),
        }
    }

    /// Events emitted by scheduled tasks rather than by a command.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn content(&self) -> &ContentCache<S> {
        &self.content
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.shared.lock().await.engine.snapshot()
    }

    /// Id of the notification whose hide is still pending.
    pub async fn pending_hide(&self) -> Option<u64> {
        self.shared.lock().await.dismiss.pending_id()
    }

    // ── Engagement ───────────────────────────────────────────────────

    pub async fn like(&self) -> LikeOutcome {
        let mut shared = self.shared.lock().await;
        let outcome = shared.engine.user_liked();
        report_audio(&outcome);
        if let Some(notification) = &outcome.notification {
            self.schedule_hide(&mut shared.dismiss, notification);
        }
        outcome
    }

    pub async fn dismiss(&self) -> Option<Event> {
        let mut shared = self.shared.lock().await;
        shared.dismiss.cancel();
        shared.engine.dismiss_notification()
    }

    pub async fn set_volume(&self, volume: f32) -> Event {
        self.shared.lock().await.engine.set_volume(volume)
    }

    pub async fn set_muted(&self, muted: bool) -> Event {
        self.shared.lock().await.engine.set_muted(muted)
    }

    pub async fn select_cue(&self, cue: Cue) -> Result<Event, PlaybackError> {
        self.shared.lock().await.engine.select_cue(cue)
    }

    // ── Content ──────────────────────────────────────────────────────

    /// Cached fact, fetched on first use.
    pub async fn fact(&self) -> Result<ContentItem, ContentFetchError> {
        self.content.fetch(&self.content_key).await
    }

    /// Fetch a new fact even if one is cached.
    pub async fn refetch_fact(&self) -> Result<ContentItem, ContentFetchError> {
        self.content.refetch(&self.content_key).await
    }

    /// Event describing a fetch result, noting whether an older value is
    /// still on display after a failure.
    pub fn content_event(&self, result: &Result<ContentItem, ContentFetchError>) -> Event {
        match result {
            Ok(item) => Event::ContentFetched {
                key: item.key.clone(),
                text: item.text.clone(),
                at: Utc::now(),
            },
            Err(e) => Event::ContentFetchFailed {
                key: e.key().to_string(),
                error: e.to_string(),
                has_last_good: self.content.view(e.key()).value().is_some(),
                at: Utc::now(),
            },
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn schedule_hide(&self, dismiss: &mut DismissTimer, notification: &Notification) {
        let delay = Duration::from_millis(
            notification
                .expires_at_ms
                .saturating_sub(notification.shown_at_ms),
        );
        let shared = Arc::clone(&self.shared);
        let events = self.events.clone();
        dismiss.schedule(notification.id, delay, move |id| async move {
            let event = shared.lock().await.engine.expire_notification(id);
            if let Some(event) = event {
                debug!(id, subscribers = events.receiver_count(), "notification expired");
                // Nobody listening is fine; the state change already happened.
                let _ = events.send(event);
            }
        });
    }
}
