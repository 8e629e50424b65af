//! Commit guard.
//!
//! Refuses to replace a committed snapshot with an empty one, and
//! optionally with one whose deal count dropped sharply. Either condition
//! usually means the upstream search broke rather than every deal ending.

use crate::error::{AppError, Result};
use crate::models::{Deal, GuardConfig};

/// Result of a guard check.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardResult {
    /// Safe to commit
    Safe {
        current_count: usize,
        previous_count: usize,
    },
    /// No previous snapshot to compare against
    FirstRun { current_count: usize },
    /// Count dropped beyond the configured threshold
    Dropped {
        current_count: usize,
        previous_count: usize,
        drop_percent: f64,
    },
    /// Empty snapshot over a non-empty one
    Empty { previous_count: usize },
}

#[derive(Debug, Clone, Default)]
pub struct CommitGuard {
    config: GuardConfig,
}

impl CommitGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    pub fn check(&self, current: &[Deal], previous_count: usize) -> GuardResult {
        let current_count = current.len();

        if previous_count == 0 {
            return GuardResult::FirstRun { current_count };
        }

        if current_count == 0 && !self.config.allow_empty {
            return GuardResult::Empty { previous_count };
        }

        if self.config.max_drop_percent > 0 && current_count < previous_count {
            let drop = previous_count - current_count;
            let drop_percent = (drop as f64 / previous_count as f64) * 100.0;
            if drop_percent > self.config.max_drop_percent as f64 {
                return GuardResult::Dropped {
                    current_count,
                    previous_count,
                    drop_percent,
                };
            }
        }

        GuardResult::Safe {
            current_count,
            previous_count,
        }
    }

    /// Ok when the commit may proceed.
    pub fn validate(&self, current: &[Deal], previous_count: usize) -> Result<()> {
        match self.check(current, previous_count) {
            GuardResult::Safe {
                current_count,
                previous_count,
            } => {
                log::info!(
                    "Commit guard: SAFE ({} deals, was {})",
                    current_count,
                    previous_count
                );
                Ok(())
            }
            GuardResult::FirstRun { current_count } => {
                log::info!(
                    "Commit guard: FIRST RUN ({} deals, no previous snapshot)",
                    current_count
                );
                Ok(())
            }
            GuardResult::Dropped {
                current_count,
                previous_count,
                drop_percent,
            } => {
                log::error!(
                    "Commit guard: TRIGGERED {} → {} deals ({:.1}% drop > {}% threshold)",
                    previous_count,
                    current_count,
                    drop_percent,
                    self.config.max_drop_percent
                );
                Err(AppError::SnapshotDrop {
                    current_count,
                    previous_count,
                    drop_percent,
                    threshold_percent: self.config.max_drop_percent,
                })
            }
            GuardResult::Empty { previous_count } => {
                log::error!(
                    "Commit guard: EMPTY snapshot over {} deals, aborting commit",
                    previous_count
                );
                Err(AppError::EmptySnapshot { previous_count })
            }
        }
    }
}
