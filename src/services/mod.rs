//! Service layer for the deal aggregator.
//!
//! - Page fetching (`PageFetcher`, `HttpPageFetcher`)
//! - Listing normalization (`normalize`)
//! - Per-category pagination (`CategoryAccumulator`)

mod accumulator;
mod fetcher;
mod normalizer;

pub use accumulator::{CategoryAccumulator, CategoryResult};
pub use fetcher::{HttpPageFetcher, PageFetcher};
pub use normalizer::{NormalizeContext, normalize};
