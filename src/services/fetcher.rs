// src/services/fetcher.rs

//! Page fetching capability.
//!
//! The accumulator only sees [`PageFetcher`]; [`HttpPageFetcher`] is the
//! production transport against the category search endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{FetchError, Result};
use crate::models::{ApiConfig, CategoryConfig, RawPage};
use crate::utils::http::create_async_client;

/// Returns one page of raw listings for a category.
///
/// Any failure is a [`FetchError`], which callers treat as transient.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(
        &self,
        category: &CategoryConfig,
        offset: u32,
        page_size: u32,
        timeout: Duration,
    ) -> std::result::Result<RawPage, FetchError>;
}

/// Fetches pages from the storefront's category search endpoint.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
    search_url: String,
}

impl HttpPageFetcher {
    /// Build a fetcher with a client configured from `config`.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Ok(Self::with_client(
            create_async_client(config)?,
            &config.search_url,
        ))
    }

    /// Build a fetcher around an existing client.
    pub fn with_client(client: Client, search_url: impl Into<String>) -> Self {
        Self {
            client,
            search_url: search_url.into(),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(
        &self,
        category: &CategoryConfig,
        offset: u32,
        page_size: u32,
        timeout: Duration,
    ) -> std::result::Result<RawPage, FetchError> {
        let current_page = offset.to_string();
        let page_size = page_size.to_string();

        let response = self
            .client
            .post(&self.search_url)
            .query(&[
                ("query", category.query.as_str()),
                ("currentPage", current_page.as_str()),
                ("pageSize", page_size.as_str()),
            ])
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}
