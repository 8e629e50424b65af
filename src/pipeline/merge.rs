//! Cross-category merge.

use crate::models::{Deal, DealSet};

/// Running cross-category result, folded one category at a time.
///
/// A product code already present is overwritten by the later category,
/// keeping the position it was first merged at. Snapshots are sorted by
/// discount with ties in merge order, so identical inputs give identical
/// output.
#[derive(Debug, Clone, Default)]
pub struct GlobalMerger {
    running: DealSet,
}

impl GlobalMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a category in. Returns how many codes it took over from
    /// earlier categories.
    pub fn fold(&mut self, deals: DealSet) -> usize {
        let mut overridden = 0;
        for deal in deals {
            if let Some(earlier) = self.running.insert(deal) {
                overridden += 1;
                log::debug!(
                    "{} moves from category '{}' to the later category",
                    earlier.product_code,
                    earlier.category
                );
            }
        }
        overridden
    }

    /// Current ordered snapshot.
    pub fn snapshot(&self) -> Vec<Deal> {
        self.running.sorted_by_discount()
    }

    /// Final ordered snapshot.
    pub fn into_snapshot(self) -> Vec<Deal> {
        self.running.into_sorted()
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }
}

/// Merge category results in processing order.
pub fn merge(results: impl IntoIterator<Item = DealSet>) -> Vec<Deal> {
    let mut merger = GlobalMerger::new();
    for deals in results {
        merger.fold(deals);
    }
    merger.into_snapshot()
}
