mod counter;

pub use counter::{is_milestone, EngagementCounter, Increment, DEFAULT_MILESTONE_INTERVAL};
