// src/models/stats.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Statistics of one completed run, written next to the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub scraped_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub categories: Vec<CategoryStats>,
    /// Deals in the committed snapshot
    pub deal_count: usize,
    /// Deals in the snapshot this run replaced
    pub previous_count: usize,
    pub added: usize,
    pub changed: usize,
    pub removed: usize,
}

/// Per-category pagination counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryStats {
    pub key: String,
    pub pages_fetched: u32,
    pub entries_seen: usize,
    /// Distinct discounted products kept for the category
    pub deals: usize,
    pub retries: u32,
}

impl RunStats {
    /// Raw listings inspected across all categories.
    pub fn entries_seen(&self) -> usize {
        self.categories.iter().map(|c| c.entries_seen).sum()
    }

    /// Pages fetched across all categories.
    pub fn pages_fetched(&self) -> u32 {
        self.categories.iter().map(|c| c.pages_fetched).sum()
    }
}
