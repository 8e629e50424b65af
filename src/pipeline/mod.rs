//! Pipeline stages for a scrape run.
//!
//! - `change`: stamp `last_updated` against the previous snapshot
//! - `merge`: fold categories into one ordered snapshot
//! - `guard`: refuse suspicious commits
//! - `scrape`: drive a full run

pub mod change;
pub mod guard;
pub mod merge;
pub mod scrape;

pub use change::{ChangeTracker, SnapshotDiff, stamp};
pub use guard::{CommitGuard, GuardResult};
pub use merge::{GlobalMerger, merge};
pub use scrape::Scraper;
