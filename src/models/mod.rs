// src/models/mod.rs

//! Domain models for the deal aggregator.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod deal;
mod deal_set;
mod raw;
mod stats;

// Re-export all public types
pub use config::{
    ApiConfig, CategoryConfig, Config, GuardConfig, LoggingConfig, MirrorConfig, OutputConfig,
    ScrapeConfig,
};
pub use deal::{Deal, discount_pct};
pub use deal_set::{DealSet, sort_by_discount};
pub use raw::{
    Image, PRICE_TYPE_BUY, PRICE_TYPE_DISCOUNT, Pagination, PriceEntry, RawListing, RawPage,
    STOCK_IN_STOCK, Stock, StockStatus,
};
pub use stats::{CategoryStats, RunStats};
