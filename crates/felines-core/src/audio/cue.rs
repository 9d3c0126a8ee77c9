//! The fixed cue set and how a cue gets picked.

use std::fmt;
use std::str::FromStr;

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use crate::error::PlaybackError;

/// One of the sounds played on engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cue {
    Meow,
    Purr,
    Trill,
}

impl Cue {
    pub const ALL: [Cue; 3] = [Cue::Meow, Cue::Purr, Cue::Trill];

    pub fn id(&self) -> &'static str {
        match self {
            Cue::Meow => "meow",
            Cue::Purr => "purr",
            Cue::Trill => "trill",
        }
    }

    /// Asset file name under the sounds directory.
    pub fn asset(&self) -> &'static str {
        match self {
            Cue::Meow => "sounds/meow.mp3",
            Cue::Purr => "sounds/purr.mp3",
            Cue::Trill => "sounds/trill.mp3",
        }
    }

    /// Nominal clip length, used by device-free backends.
    pub fn length_ms(&self) -> u64 {
        match self {
            Cue::Meow => 900,
            Cue::Purr => 2_400,
            Cue::Trill => 1_200,
        }
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Cue {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Cue::ALL
            .into_iter()
            .find(|cue| cue.id() == wanted)
            .ok_or_else(|| PlaybackError::UnknownCue(s.to_string()))
    }
}

/// Source of cue choices. Injected so tests can script the sequence.
pub trait CueSelector: Send {
    /// Pick one of `cues`, which is never empty.
    fn select(&mut self, cues: &[Cue]) -> Cue;
}

/// Uniform choice backed by a PCG generator.
pub struct RandomSelector {
    rng: Mcg128Xsl64,
}

impl RandomSelector {
    /// `seed = None` seeds from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self { rng }
    }
}

impl Default for RandomSelector {
    fn default() -> Self {
        Self::new(None)
    }
}

impl CueSelector for RandomSelector {
    fn select(&mut self, cues: &[Cue]) -> Cue {
        cues[self.rng.gen_range(0..cues.len())]
    }
}

/// Replays a fixed sequence, cycling when it runs out.
#[derive(Debug, Clone)]
pub struct ScriptedSelector {
    script: Vec<Cue>,
    next: usize,
}

impl ScriptedSelector {
    pub fn new(script: Vec<Cue>) -> Self {
        Self { script, next: 0 }
    }
}

impl CueSelector for ScriptedSelector {
    fn select(&mut self, cues: &[Cue]) -> Cue {
        if self.script.is_empty() {
            return cues[0];
        }
        let cue = self.script[self.next % self.script.len()];
        self.next += 1;
        cue
    }
}
