//! Playback resources.

use std::sync::{Arc, Mutex};

use tracing::info;

use super::cue::Cue;
use crate::clock::Clock;
use crate::error::PlaybackError;

/// The single shared playback slot. Implementations wrap whatever the
/// environment offers (an audio device, a browser element, nothing).
pub trait PlaybackBackend: Send {
    /// Load `cue`, replacing whatever was loaded.
    fn load(&mut self, cue: Cue) -> Result<(), PlaybackError>;

    /// Start the loaded cue from position zero.
    fn play(&mut self) -> Result<(), PlaybackError>;

    fn stop(&mut self);

    fn set_volume(&mut self, volume: f32);

    /// Muted playback keeps advancing; it just isn't audible.
    fn set_muted(&mut self, muted: bool);

    /// Position of the active playback, `None` when nothing is playing.
    fn position_ms(&self) -> Option<u64>;
}

#[derive(Debug, Clone, Default)]
struct VirtualState {
    loaded: Option<Cue>,
    started_at_ms: Option<u64>,
    volume: f32,
    muted: bool,
    starts: u64,
}

/// Device-free backend. Tracks position from the clock and logs playback.
///
/// Clones share state, so a caller can keep a handle for inspection after
/// handing the backend to a controller.
#[derive(Clone)]
pub struct VirtualBackend {
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<VirtualState>>,
}

impl VirtualBackend {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Arc::new(Mutex::new(VirtualState::default())),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut VirtualState) -> T) -> T {
        let mut guard = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    pub fn loaded(&self) -> Option<Cue> {
        self.with_state(|s| s.loaded)
    }

    /// How many times playback was started.
    pub fn starts(&self) -> u64 {
        self.with_state(|s| s.starts)
    }

    pub fn volume(&self) -> f32 {
        self.with_state(|s| s.volume)
    }

    pub fn is_muted(&self) -> bool {
        self.with_state(|s| s.muted)
    }

    /// What the listener would hear right now: 0.0 when muted or idle.
    pub fn audible_level(&self) -> f32 {
        if self.position_ms().is_none() {
            return 0.0;
        }
        self.with_state(|s| if s.muted { 0.0 } else { s.volume })
    }
}

impl PlaybackBackend for VirtualBackend {
    fn load(&mut self, cue: Cue) -> Result<(), PlaybackError> {
        self.with_state(|s| {
            s.loaded = Some(cue);
            s.started_at_ms = None;
        });
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        let now = self.clock.now_ms();
        self.with_state(|s| {
            let cue = s
                .loaded
                .ok_or_else(|| PlaybackError::Device("no cue loaded".into()))?;
            s.started_at_ms = Some(now);
            s.starts += 1;
            info!(cue = %cue, asset = cue.asset(), volume = s.volume, muted = s.muted, "playing cue");
            Ok(())
        })
    }

    fn stop(&mut self) {
        self.with_state(|s| s.started_at_ms = None);
    }

    fn set_volume(&mut self, volume: f32) {
        self.with_state(|s| s.volume = volume);
    }

    fn set_muted(&mut self, muted: bool) {
        self.with_state(|s| s.muted = muted);
    }

    fn position_ms(&self) -> Option<u64> {
        let now = self.clock.now_ms();
        self.with_state(|s| {
            let cue = s.loaded?;
            let elapsed = now.saturating_sub(s.started_at_ms?);
            (elapsed < cue.length_ms()).then_some(elapsed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn position_advances_and_ends() {
        let clock = ManualClock::new(0);
        let mut backend = VirtualBackend::new(Arc::new(clock.clone()));
        backend.load(Cue::Meow).unwrap();
        backend.play().unwrap();

        clock.advance(400);
        assert_eq!(backend.position_ms(), Some(400));

        clock.advance(Cue::Meow.length_ms());
        assert_eq!(backend.position_ms(), None);
    }

    #[test]
    fn play_without_load_fails() {
        let mut backend = VirtualBackend::new(Arc::new(ManualClock::new(0)));
        assert!(matches!(backend.play(), Err(PlaybackError::Device(_))));
    }
}
