// src/services/accumulator.rs

//! Category accumulator.
//!
//! Walks one category's pages in offset order. Each page is normalized as
//! soon as it arrives and its raw listings are dropped before the next
//! request, so at most one page of raw entries is alive at a time.

use std::time::Duration;

use chrono::NaiveDate;
use url::Url;

use crate::error::{AppError, FetchError, Result};
use crate::models::{CategoryConfig, CategoryStats, DealSet, RawPage, ScrapeConfig};
use crate::services::fetcher::PageFetcher;
use crate::services::normalizer::{NormalizeContext, normalize};
use crate::utils::Pause;

/// Deduplicated deals of one fully paginated category.
#[derive(Debug, Clone)]
pub struct CategoryResult {
    pub deals: DealSet,
    pub stats: CategoryStats,
}

/// Drives pagination for one category at a time.
pub struct CategoryAccumulator<'a> {
    fetcher: &'a dyn PageFetcher,
    pause: &'a dyn Pause,
    settings: &'a ScrapeConfig,
    timeout: Duration,
    base_url: &'a Url,
}

impl<'a> CategoryAccumulator<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        pause: &'a dyn Pause,
        settings: &'a ScrapeConfig,
        timeout: Duration,
        base_url: &'a Url,
    ) -> Self {
        Self {
            fetcher,
            pause,
            settings,
            timeout,
            base_url,
        }
    }

    /// Paginate `category` to completion.
    ///
    /// Stops on a short page, on the page count the API reports, or at
    /// `max_pages`. A page that keeps failing after all retries aborts the
    /// category with [`AppError::CategoryFailed`]; no partial result is
    /// returned.
    pub async fn run(
        &self,
        category: &CategoryConfig,
        run_date: NaiveDate,
    ) -> Result<CategoryResult> {
        let label = category.display_name();
        let page_size = self.settings.page_size;
        let mut page_limit = self.settings.max_pages;

        let ctx = NormalizeContext {
            category: &category.key,
            run_date,
            base_url: self.base_url,
        };
        let mut deals = DealSet::new();
        let mut stats = CategoryStats {
            key: category.key.clone(),
            ..CategoryStats::default()
        };

        let mut reported_pages = None;
        let mut offset = 0;
        while offset < page_limit {
            if offset > 0 {
                self.pause.pause(self.settings.request_delay()).await;
            }

            log::debug!("[{}] Fetching page {}", label, offset);
            let page = self.fetch_with_retry(category, offset, &mut stats).await?;
            stats.pages_fetched += 1;

            if let Some(reported) = page.pagination.as_ref().and_then(|p| p.number_of_pages) {
                if offset == 0 {
                    log::info!(
                        "[{}] Upstream reports {} pages ({} results)",
                        label,
                        reported,
                        page.pagination
                            .as_ref()
                            .and_then(|p| p.total_number_of_results)
                            .unwrap_or_default()
                    );
                }
                reported_pages = Some(reported);
                page_limit = page_limit.min(reported);
            }

            let RawPage { products, .. } = page;
            let entry_count = products.len();
            stats.entries_seen += entry_count;

            let mut page_deals = 0;
            for entry in products {
                if let Some(deal) = normalize(entry, &ctx) {
                    page_deals += 1;
                    if let Some(earlier) = deals.insert(deal) {
                        log::debug!(
                            "[{}] {} listed again on page {}; keeping the later listing",
                            label,
                            earlier.product_code,
                            offset
                        );
                    }
                }
            }

            log::info!(
                "[{}] Page {}: {} deals from {} products (total: {})",
                label,
                offset,
                page_deals,
                entry_count,
                deals.len()
            );

            if entry_count < page_size as usize {
                log::info!("[{}] Short page at {}, pagination complete", label, offset);
                break;
            }
            offset += 1;
        }

        let capped = reported_pages.is_none_or(|reported| reported > self.settings.max_pages);
        if offset >= self.settings.max_pages && capped {
            log::warn!(
                "[{}] Stopped at the {}-page cap",
                label,
                self.settings.max_pages
            );
        }

        stats.deals = deals.len();
        Ok(CategoryResult { deals, stats })
    }

    /// Fetch one page, retrying transient failures with a fixed delay.
    async fn fetch_with_retry(
        &self,
        category: &CategoryConfig,
        offset: u32,
        stats: &mut CategoryStats,
    ) -> Result<RawPage> {
        let max_attempts = self.settings.max_retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let fetch = self
                .fetcher
                .fetch(category, offset, self.settings.page_size, self.timeout);
            let result = match tokio::time::timeout(self.timeout, fetch).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout),
            };

            match result {
                Ok(page) => return Ok(page),
                Err(reason) if attempt < max_attempts => {
                    log::warn!(
                        "[{}] Page {} attempt {}/{} failed: {}; retrying",
                        category.display_name(),
                        offset,
                        attempt,
                        max_attempts,
                        reason
                    );
                    stats.retries += 1;
                    self.pause.pause(self.settings.retry_delay()).await;
                }
                Err(reason) => {
                    log::error!(
                        "[{}] Page {} failed after {} attempts: {}",
                        category.display_name(),
                        offset,
                        attempt,
                        reason
                    );
                    return Err(AppError::CategoryFailed {
                        category: category.key.clone(),
                        page: offset,
                        attempts: attempt,
                        reason,
                    });
                }
            }
        }
    }
}
