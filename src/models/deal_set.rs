//! Insertion-ordered set of deals keyed by product code.

use std::collections::HashMap;

use super::Deal;

/// Deals unique by `product_code`, remembering first-insertion order.
///
/// Re-inserting a known code replaces the stored deal in place, so the
/// position reflects when the code was first seen and the value reflects
/// the latest occurrence.
#[derive(Debug, Clone, Default)]
pub struct DealSet {
    deals: Vec<Deal>,
    index: HashMap<String, usize>,
}

impl DealSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by code. Returns the replaced deal, if any.
    pub fn insert(&mut self, deal: Deal) -> Option<Deal> {
        if let Some(&pos) = self.index.get(&deal.product_code) {
            return Some(std::mem::replace(&mut self.deals[pos], deal));
        }
        self.index.insert(deal.product_code.clone(), self.deals.len());
        self.deals.push(deal);
        None
    }

    pub fn get(&self, product_code: &str) -> Option<&Deal> {
        self.index.get(product_code).map(|&pos| &self.deals[pos])
    }

    pub fn contains(&self, product_code: &str) -> bool {
        self.index.contains_key(product_code)
    }

    pub fn len(&self) -> usize {
        self.deals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deals.is_empty()
    }

    /// Deals in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Deal> {
        self.deals.iter()
    }

    /// Deals sorted by `discount_pct` descending; ties keep insertion order.
    pub fn sorted_by_discount(&self) -> Vec<Deal> {
        let mut sorted = self.deals.clone();
        sort_by_discount(&mut sorted);
        sorted
    }

    /// Consume into a snapshot ordered by `discount_pct` descending.
    pub fn into_sorted(self) -> Vec<Deal> {
        let mut sorted = self.deals;
        sort_by_discount(&mut sorted);
        sorted
    }
}

/// Stable sort by discount, highest first.
pub fn sort_by_discount(deals: &mut [Deal]) {
    deals.sort_by(|a, b| b.discount_pct.cmp(&a.discount_pct));
}

impl FromIterator<Deal> for DealSet {
    fn from_iter<I: IntoIterator<Item = Deal>>(iter: I) -> Self {
        let mut set = DealSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<Deal> for DealSet {
    fn extend<I: IntoIterator<Item = Deal>>(&mut self, iter: I) {
        for deal in iter {
            self.insert(deal);
        }
    }
}

impl IntoIterator for DealSet {
    type Item = Deal;
    type IntoIter = std::vec::IntoIter<Deal>;

    fn into_iter(self) -> Self::IntoIter {
        self.deals.into_iter()
    }
}

impl<'a> IntoIterator for &'a DealSet {
    type Item = &'a Deal;
    type IntoIter = std::slice::Iter<'a, Deal>;

    fn into_iter(self) -> Self::IntoIter {
        self.deals.iter()
    }
}
