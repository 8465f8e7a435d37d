//! Notification requests: milestone crossings, rank moves, unlocks and badges.

pub mod milestones;
pub mod sink;
pub mod types;

pub use milestones::{on_progress_change, ProgressState, MILESTONE_THRESHOLDS};
pub use sink::{ChannelSink, LogSink, NotificationSink};
pub use types::{NotificationKind, NotificationRequest};
