//! Terminal challenge badges.

pub mod awarder;

pub use awarder::{finalize, BadgeAward, BadgeKind, Finalization};
