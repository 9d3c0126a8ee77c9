//! Like counter with milestone detection.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_MILESTONE_INTERVAL: u64 = 5;

/// Result of a single increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Increment {
    pub new_count: u64,
    pub is_milestone: bool,
}

/// Monotonic engagement counter.
///
/// The counter is the only writer of its count; nothing decrements it.
/// A fresh session starts a fresh counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementCounter {
    count: u64,
    milestone_interval: u64,
}

impl Default for EngagementCounter {
    fn default() -> Self {
        Self {
            count: 0,
            milestone_interval: DEFAULT_MILESTONE_INTERVAL,
        }
    }
}

impl EngagementCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter with a custom milestone interval.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidInterval`] when `interval` is zero.
    pub fn with_interval(interval: u64) -> Result<Self, ValidationError> {
        if interval == 0 {
            return Err(ValidationError::InvalidInterval(interval));
        }
        Ok(Self {
            count: 0,
            milestone_interval: interval,
        })
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn milestone_interval(&self) -> u64 {
        self.milestone_interval
    }

    pub fn increment(&mut self) -> Increment {
        self.count = self.count.saturating_add(1);
        Increment {
            new_count: self.count,
            is_milestone: is_milestone(self.count, self.milestone_interval),
        }
    }
}

/// `count` is a positive multiple of `interval`.
pub fn is_milestone(count: u64, interval: u64) -> bool {
    interval > 0 && count > 0 && count % interval == 0
}
