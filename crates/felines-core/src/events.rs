use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audio::Cue;

/// Every state change in the engine produces an Event.
/// The CLI prints them; front-ends render from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    Liked {
        count: u64,
        at: DateTime<Utc>,
    },
    MilestoneReached {
        count: u64,
        at: DateTime<Utc>,
    },
    NotificationShown {
        id: u64,
        message: String,
        expires_at_ms: u64,
        at: DateTime<Utc>,
    },
    NotificationHidden {
        id: u64,
        reason: HideReason,
        at: DateTime<Utc>,
    },
    CuePlayed {
        cue: Cue,
        volume: f32,
        muted: bool,
        at: DateTime<Utc>,
    },
    /// Playback could not start; engagement tracking carried on without it.
    CueUnavailable {
        reason: String,
        at: DateTime<Utc>,
    },
    VolumeChanged {
        volume: f32,
        /// Set when the requested value had to be clamped or was rejected.
        requested: Option<f32>,
        at: DateTime<Utc>,
    },
    MuteChanged {
        muted: bool,
        at: DateTime<Utc>,
    },
    ContentFetched {
        key: String,
        text: String,
        at: DateTime<Utc>,
    },
    ContentFetchFailed {
        key: String,
        error: String,
        /// Whether a previously fetched value is still shown.
        has_last_good: bool,
        at: DateTime<Utc>,
    },
}

/// Why a notification left the Visible state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HideReason {
    Expired,
    Dismissed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = Event::NotificationHidden {
            id: 3,
            reason: HideReason::Expired,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "NotificationHidden");
        assert_eq!(json["reason"], "expired");
    }
}
