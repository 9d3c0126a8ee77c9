//! Owner of the shared playback slot.
//!
//! Every trigger path (random trigger, explicit selection) goes through
//! one internal `play_cue` path, which stops the active playback before
//! starting the next one. At most one playback exists at any time.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::backend::PlaybackBackend;
use super::cue::{Cue, CueSelector};
use crate::error::{PlaybackError, ValidationError};
use crate::events::Event;

pub const DEFAULT_VOLUME: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioCueState {
    pub selected_cue: Option<Cue>,
    pub volume: f32,
    pub muted: bool,
}

impl Default for AudioCueState {
    fn default() -> Self {
        Self {
            selected_cue: None,
            volume: DEFAULT_VOLUME,
            muted: false,
        }
    }
}

pub struct AudioCueController {
    state: AudioCueState,
    selector: Box<dyn CueSelector>,
    backend: Option<Box<dyn PlaybackBackend>>,
    /// Cue occupying the playback slot.
    current: Option<Cue>,
    triggers: u64,
}

impl AudioCueController {
    /// `backend = None` means the environment has no audio; triggers then
    /// report [`PlaybackError::Unavailable`] but state still updates.
    pub fn new(selector: Box<dyn CueSelector>, backend: Option<Box<dyn PlaybackBackend>>) -> Self {
        Self {
            state: AudioCueState::default(),
            selector,
            backend,
            current: None,
            triggers: 0,
        }
    }

    /// Start from persisted settings. Out-of-range volume is clamped.
    pub fn with_settings(mut self, volume: f32, muted: bool) -> Self {
        self.set_volume(volume);
        self.set_muted(muted);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> AudioCueState {
        self.state
    }

    /// Cue in the playback slot, if its clip is still running.
    pub fn now_playing(&self) -> Option<Cue> {
        self.position_ms().and(self.current)
    }

    pub fn position_ms(&self) -> Option<u64> {
        self.current?;
        self.backend.as_ref()?.position_ms()
    }

    /// Number of play requests, including ones that failed.
    pub fn trigger_count(&self) -> u64 {
        self.triggers
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Pick a cue at random and play it from the start.
    pub fn trigger(&mut self) -> Result<Event, PlaybackError> {
        let cue = self.selector.select(&Cue::ALL);
        self.play_cue(cue)
    }

    /// Play `cue` directly, bypassing random selection.
    pub fn select_and_play(&mut self, cue: Cue) -> Result<Event, PlaybackError> {
        self.play_cue(cue)
    }

    /// Clamp to `[0, 1]` and apply immediately. NaN leaves the volume as is.
    pub fn set_volume(&mut self, requested: f32) -> Event {
        let volume = if requested.is_nan() {
            self.state.volume
        } else {
            requested.clamp(0.0, 1.0)
        };
        let adjusted = requested.is_nan() || volume != requested;
        if adjusted {
            warn!(
                error = %ValidationError::InvalidVolume { requested },
                applied = volume,
                "volume adjusted"
            );
        }

        self.state.volume = volume;
        if let Some(backend) = self.backend.as_mut() {
            backend.set_volume(volume);
        }
        Event::VolumeChanged {
            volume,
            requested: adjusted.then_some(requested),
            at: Utc::now(),
        }
    }

    /// Mute or unmute without touching volume or the playback position.
    pub fn set_muted(&mut self, muted: bool) -> Event {
        self.state.muted = muted;
        if let Some(backend) = self.backend.as_mut() {
            backend.set_muted(muted);
        }
        debug!(muted, "mute changed");
        Event::MuteChanged {
            muted,
            at: Utc::now(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn play_cue(&mut self, cue: Cue) -> Result<Event, PlaybackError> {
        self.state.selected_cue = Some(cue);
        self.triggers += 1;

        let result = self.start_playback(cue);
        match &result {
            Ok(()) => self.current = Some(cue),
            Err(e) => {
                self.current = None;
                warn!(cue = %cue, error = %e, "cue not played");
            }
        }
        result.map(|()| Event::CuePlayed {
            cue,
            volume: self.state.volume,
            muted: self.state.muted,
            at: Utc::now(),
        })
    }

    fn start_playback(&mut self, cue: Cue) -> Result<(), PlaybackError> {
        let backend = self
            .backend
            .as_mut()
            .ok_or_else(|| PlaybackError::Unavailable("no playback backend".into()))?;

        if let Some(prev) = self.current.take() {
            debug!(cue = %prev, "stopping previous cue");
            backend.stop();
        }
        backend.load(cue)?;
        backend.set_volume(self.state.volume);
        backend.set_muted(self.state.muted);
        backend.play()
    }
}
