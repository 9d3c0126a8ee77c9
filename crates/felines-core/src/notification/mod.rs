mod controller;
mod timer;

pub use controller::{Notification, NotificationController, NotificationState, DEFAULT_DISPLAY_MS};
pub use timer::DismissTimer;
