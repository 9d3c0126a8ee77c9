//! # Felines Core Library
//!
//! This library provides the engagement engine behind the Felines cat page:
//! a like counter with milestones, an auto-dismissing notification, a shared
//! audio-cue slot, and a cache for remotely fetched cat facts. The
//! `felines-cli` binary is a thin shell over the same library.
//!
//! ## Architecture
//!
//! - **Engagement**: monotonic counter that flags every fifth like
//! - **Notification**: two-state machine with a cancellable timed hide
//! - **Audio**: one playback slot; random or explicit cue selection,
//!   volume and mute
//! - **Content**: async cache with in-flight de-duplication
//! - **Orchestrator**: owns the session state and wires the above together
//!
//! ## Key Components
//!
//! - [`EngagementOrchestrator`]: synchronous session context
//! - [`LiveSession`]: the same on a tokio runtime, with scheduled hides
//! - [`ContentCache`]: fact fetching and memoization
//! - [`Config`]: Application configuration management

pub mod audio;
pub mod catalog;
pub mod clock;
pub mod content;
pub mod engagement;
pub mod error;
pub mod events;
pub mod notification;
pub mod orchestrator;
pub mod session;
pub mod storage;

pub use audio::{AudioCueController, AudioCueState, Cue, CueSelector, PlaybackBackend, VirtualBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use content::{ContentCache, ContentItem, ContentSource, ContentView, HttpContentSource};
pub use engagement::{EngagementCounter, Increment};
pub use error::{ConfigError, ContentFetchError, CoreError, PlaybackError, ValidationError};
pub use events::{Event, HideReason};
pub use notification::{Notification, NotificationController, NotificationState};
pub use orchestrator::{EngagementOrchestrator, LikeOutcome, SessionSnapshot};
pub use session::LiveSession;
pub use storage::Config;
