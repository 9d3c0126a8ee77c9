mod backend;
mod controller;
mod cue;

pub use backend::{PlaybackBackend, VirtualBackend};
pub use controller::{AudioCueController, AudioCueState, DEFAULT_VOLUME};
pub use cue::{Cue, CueSelector, RandomSelector, ScriptedSelector};
