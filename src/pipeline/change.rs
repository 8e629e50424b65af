//! Change tracking against the previous snapshot.
//!
//! `last_updated` only advances when a product first appears or when its
//! prices or stock flag differ from the previous run. `scraped_date` always
//! takes the run date.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Deal, DealSet};

/// Stamp one deal against the previous snapshot.
pub fn stamp(mut deal: Deal, previous: &DealSet, run_date: NaiveDate) -> Deal {
    deal.scraped_date = run_date;
    deal.last_updated = match previous.get(&deal.product_code) {
        Some(prior) if !deal.differs_from(prior) => prior.last_updated,
        _ => run_date,
    };
    deal
}

/// Applies [`stamp`] with a fixed previous snapshot and run date.
#[derive(Debug, Clone)]
pub struct ChangeTracker {
    previous: DealSet,
    run_date: NaiveDate,
}

impl ChangeTracker {
    pub fn new(previous: DealSet, run_date: NaiveDate) -> Self {
        Self { previous, run_date }
    }

    pub fn previous(&self) -> &DealSet {
        &self.previous
    }

    pub fn run_date(&self) -> NaiveDate {
        self.run_date
    }

    pub fn stamp(&self, deal: Deal) -> Deal {
        stamp(deal, &self.previous, self.run_date)
    }

    /// Stamp every deal of a category, keeping its order.
    pub fn stamp_all(&self, deals: DealSet) -> DealSet {
        deals.into_iter().map(|deal| self.stamp(deal)).collect()
    }

    /// Diff the previous snapshot against `current`.
    pub fn diff(&self, current: &[Deal]) -> SnapshotDiff {
        SnapshotDiff::calculate(self.previous.iter(), current)
    }
}

/// Product codes added, changed and removed between two snapshots.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// In the new snapshot only
    pub added: Vec<String>,
    /// In both, with a price or stock difference
    pub changed: Vec<String>,
    /// In the previous snapshot only
    pub removed: Vec<String>,
}

impl SnapshotDiff {
    /// Codes are listed in the order of the snapshot they come from.
    pub fn calculate<'a>(
        previous: impl IntoIterator<Item = &'a Deal>,
        current: &[Deal],
    ) -> Self {
        let previous: DealSet = previous.into_iter().cloned().collect();
        let current_codes: HashSet<&str> =
            current.iter().map(|d| d.product_code.as_str()).collect();

        let mut diff = SnapshotDiff::default();
        for deal in current {
            match previous.get(&deal.product_code) {
                None => diff.added.push(deal.product_code.clone()),
                Some(prior) if deal.differs_from(prior) => {
                    diff.changed.push(deal.product_code.clone())
                }
                Some(_) => {}
            }
        }
        diff.removed = previous
            .iter()
            .filter(|d| !current_codes.contains(d.product_code.as_str()))
            .map(|d| d.product_code.clone())
            .collect();
        diff
    }

    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.changed.is_empty() || !self.removed.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.added.len() + self.changed.len() + self.removed.len()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn make_deal(code: &str, sale: i64, in_stock: bool, last_updated: &str) -> Deal {
        let original = Decimal::from(20);
        let sale = Decimal::from(sale);
        Deal {
            product_code: code.into(),
            product_name: format!("Product {code}"),
            brand: "Acme".into(),
            category: "dog_food".into(),
            original_price: original,
            sale_price: sale,
            discount_pct: crate::models::discount_pct(original, sale),
            in_stock,
            image_url: String::new(),
            product_url: String::new(),
            scraped_date: date(last_updated),
            last_updated: date(last_updated),
        }
    }

    #[test]
    fn test_unchanged_item_carries_last_updated() {
        let previous: DealSet = [make_deal("X", 10, true, "2024-01-01")].into_iter().collect();
        let run_date = date("2024-02-01");

        let fresh = make_deal("X", 10, true, "2024-02-01");
        let stamped = stamp(fresh, &previous, run_date);
        assert_eq!(stamped.last_updated, date("2024-01-01"));
        assert_eq!(stamped.scraped_date, run_date);
    }

    #[test]
    fn test_price_change_advances_last_updated() {
        let previous: DealSet = [make_deal("X", 10, true, "2024-01-01")].into_iter().collect();
        let run_date = date("2024-02-01");

        let stamped = stamp(make_deal("X", 9, true, "2024-02-01"), &previous, run_date);
        assert_eq!(stamped.last_updated, run_date);
    }

    #[test]
    fn test_stock_change_advances_last_updated() {
        let previous: DealSet = [make_deal("X", 10, true, "2024-01-01")].into_iter().collect();
        let run_date = date("2024-02-01");

        let stamped = stamp(make_deal("X", 10, false, "2024-02-01"), &previous, run_date);
        assert_eq!(stamped.last_updated, run_date);
    }

    #[test]
    fn test_new_item_uses_run_date() {
        let run_date = date("2024-02-01");
        let stamped = stamp(make_deal("Y", 10, true, "2023-06-01"), &DealSet::new(), run_date);
        assert_eq!(stamped.last_updated, run_date);
        assert_eq!(stamped.scraped_date, run_date);
    }

    #[test]
    fn test_name_change_is_not_a_change() {
        let previous: DealSet = [make_deal("X", 10, true, "2024-01-01")].into_iter().collect();
        let mut fresh = make_deal("X", 10, true, "2024-02-01");
        fresh.product_name = "Renamed".into();

        let stamped = stamp(fresh, &previous, date("2024-02-01"));
        assert_eq!(stamped.last_updated, date("2024-01-01"));
        assert_eq!(stamped.product_name, "Renamed");
    }

    #[test]
    fn test_stamp_all_keeps_order() {
        let tracker = ChangeTracker::new(DealSet::new(), date("2024-02-01"));
        let deals: DealSet = ["B", "A", "C"]
            .into_iter()
            .map(|code| make_deal(code, 10, true, "2024-01-01"))
            .collect();

        let stamped = tracker.stamp_all(deals);
        let codes: Vec<_> = stamped.iter().map(|d| d.product_code.as_str()).collect();
        assert_eq!(codes, ["B", "A", "C"]);
        assert!(stamped.iter().all(|d| d.last_updated == date("2024-02-01")));
    }

    #[test]
    fn test_diff_mixed_changes() {
        let previous = vec![
            make_deal("001", 10, true, "2024-01-01"),
            make_deal("002", 10, true, "2024-01-01"),
            make_deal("003", 10, true, "2024-01-01"),
        ];
        let current = vec![
            make_deal("001", 10, true, "2024-02-01"),
            make_deal("002", 8, true, "2024-02-01"),
            make_deal("004", 10, true, "2024-02-01"),
        ];

        let diff = SnapshotDiff::calculate(&previous, &current);
        assert_eq!(diff.added, ["004"]);
        assert_eq!(diff.changed, ["002"]);
        assert_eq!(diff.removed, ["003"]);
        assert_eq!(diff.change_count(), 3);
    }

    #[test]
    fn test_diff_no_changes() {
        let previous = vec![make_deal("001", 10, true, "2024-01-01")];
        let current = vec![make_deal("001", 10, true, "2024-02-01")];

        let diff = SnapshotDiff::calculate(&previous, &current);
        assert!(!diff.has_changes());
    }
}
