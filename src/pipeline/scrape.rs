// src/pipeline/scrape.rs

//! Scrape run driver.
//!
//! One run walks the configured categories in order, stamps and folds each
//! category into the running snapshot, publishes the partial snapshot to the
//! mirror, and finally commits the full snapshot atomically.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use url::Url;

use crate::error::Result;
use crate::models::{CategoryStats, Config, RunStats};
use crate::pipeline::{ChangeTracker, CommitGuard, GlobalMerger, SnapshotDiff};
use crate::services::{CategoryAccumulator, HttpPageFetcher, PageFetcher};
use crate::storage::{MirrorPublisher, SnapshotMirror, SnapshotStore};
use crate::utils::{Pause, TokioPause};

/// Outcome of the scrape and commit phase.
struct Committed {
    deal_count: usize,
    categories: Vec<CategoryStats>,
    diff: SnapshotDiff,
}

pub struct Scraper {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    store: SnapshotStore,
    mirror: Option<Arc<dyn SnapshotMirror>>,
    pause: Arc<dyn Pause>,
}

impl Scraper {
    pub fn new(config: Arc<Config>, fetcher: Arc<dyn PageFetcher>, store: SnapshotStore) -> Self {
        Self {
            config,
            fetcher,
            store,
            mirror: None,
            pause: Arc::new(TokioPause),
        }
    }

    /// Scraper with the HTTP transport and the configured snapshot paths.
    pub fn from_config(config: Arc<Config>) -> Result<Self> {
        let fetcher = Arc::new(HttpPageFetcher::new(&config.api)?);
        let store = SnapshotStore::from_config(&config.output);
        Ok(Self::new(config, fetcher, store))
    }

    pub fn with_mirror(mut self, mirror: Option<Arc<dyn SnapshotMirror>>) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn with_pause(mut self, pause: Arc<dyn Pause>) -> Self {
        self.pause = pause;
        self
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Run one full scrape dated `run_date`.
    ///
    /// Fails when a category cannot be paginated, the commit guard refuses
    /// the result, or the commit itself fails. In each case the previously
    /// committed snapshot is left untouched.
    pub async fn run(&self, run_date: NaiveDate) -> Result<RunStats> {
        let start_time = Utc::now();
        let base_url = Url::parse(&self.config.api.base_url)?;

        let previous = self.store.load_previous().await?;
        let previous_count = previous.len();
        let tracker = ChangeTracker::new(previous.into_iter().collect(), run_date);

        log::info!(
            "Starting run for {} across {} categories ({} deals in previous snapshot)",
            run_date,
            self.config.categories.len(),
            previous_count
        );

        let publisher = MirrorPublisher::spawn(self.mirror.clone());
        let outcome = self.scrape_and_commit(&tracker, &base_url, &publisher).await;
        publisher.finish().await;
        let committed = outcome?;

        let stats = RunStats {
            scraped_date: run_date,
            start_time,
            end_time: Utc::now(),
            categories: committed.categories,
            deal_count: committed.deal_count,
            previous_count,
            added: committed.diff.added.len(),
            changed: committed.diff.changed.len(),
            removed: committed.diff.removed.len(),
        };

        if let Err(e) = self.store.write_stats(&stats).await {
            log::warn!(
                "Failed to write run stats to {}: {}",
                self.store.stats_path().display(),
                e
            );
        }

        log::info!(
            "Run complete: {} deals ({} added, {} changed, {} removed) from {} pages in {}s",
            stats.deal_count,
            stats.added,
            stats.changed,
            stats.removed,
            stats.pages_fetched(),
            (stats.end_time - stats.start_time).num_seconds()
        );

        Ok(stats)
    }

    async fn scrape_and_commit(
        &self,
        tracker: &ChangeTracker,
        base_url: &Url,
        publisher: &MirrorPublisher,
    ) -> Result<Committed> {
        let accumulator = CategoryAccumulator::new(
            self.fetcher.as_ref(),
            self.pause.as_ref(),
            &self.config.scrape,
            self.config.api.timeout(),
            base_url,
        );

        let total = self.config.categories.len();
        let mut merger = GlobalMerger::new();
        let mut categories = Vec::with_capacity(total);

        for (i, category) in self.config.categories.iter().enumerate() {
            log::info!("[{}/{}] Scraping {}", i + 1, total, category.display_name());

            let result = accumulator.run(category, tracker.run_date()).await?;
            let stamped = tracker.stamp_all(result.deals);
            let overridden = merger.fold(stamped);
            if overridden > 0 {
                log::info!(
                    "[{}] {} products moved here from an earlier category as '{}'",
                    category.display_name(),
                    overridden,
                    category.key
                );
            }

            log::info!(
                "[{}] {} deals, {} in running snapshot",
                category.display_name(),
                result.stats.deals,
                merger.len()
            );
            categories.push(result.stats);

            if publisher.is_enabled() {
                publisher.publish(merger.snapshot());
            }
        }

        if merger.is_empty() {
            log::warn!("No deals found in any of {} categories", total);
        }
        let snapshot = merger.into_snapshot();
        CommitGuard::new(self.config.guard.clone()).validate(&snapshot, tracker.previous().len())?;

        let diff = tracker.diff(&snapshot);
        log::info!(
            "Snapshot diff: {} added, {} changed, {} removed",
            diff.added.len(),
            diff.changed.len(),
            diff.removed.len()
        );

        self.store.commit(&snapshot).await?;

        let deal_count = snapshot.len();
        publisher.publish(snapshot);

        Ok(Committed {
            deal_count,
            categories,
            diff,
        })
    }
}
