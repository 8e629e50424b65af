//! Deal record: the persisted unit of a snapshot.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A discounted product as persisted in `deals.json`.
///
/// `product_code` is the identity key across the whole snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "StoredDeal")]
pub struct Deal {
    /// Upstream product identifier
    pub product_code: String,

    /// Product display name
    pub product_name: String,

    /// Brand display name
    pub brand: String,

    /// Configured category key the product was scraped under
    pub category: String,

    /// Regular (buy) price
    pub original_price: Decimal,

    /// Discounted price, strictly below `original_price`
    pub sale_price: Decimal,

    /// Percentage off, one decimal place
    pub discount_pct: Decimal,

    /// Whether the listing reported stock
    pub in_stock: bool,

    /// Absolute image URL (may be empty)
    pub image_url: String,

    /// Absolute product page URL (may be empty)
    pub product_url: String,

    /// Start date of the run that produced this record
    pub scraped_date: NaiveDate,

    /// Date on which price or stock last changed
    pub last_updated: NaiveDate,
}

impl Deal {
    /// Whether any tracked field differs from `previous`.
    ///
    /// Only prices and stock count as an observable change; name, image and
    /// URL edits do not move `last_updated`.
    pub fn differs_from(&self, previous: &Deal) -> bool {
        self.original_price != previous.original_price
            || self.sale_price != previous.sale_price
            || self.in_stock != previous.in_stock
    }
}

/// Percentage discount from `original` to `sale`, rounded to one decimal.
///
/// Callers guarantee `original > 0`.
pub fn discount_pct(original: Decimal, sale: Decimal) -> Decimal {
    ((original - sale) / original * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// On-disk shape; snapshots written before change tracking lack `last_updated`.
#[derive(Deserialize)]
struct StoredDeal {
    product_code: String,
    #[serde(default)]
    product_name: String,
    #[serde(default)]
    brand: String,
    #[serde(default)]
    category: String,
    original_price: Decimal,
    sale_price: Decimal,
    discount_pct: Decimal,
    #[serde(default)]
    in_stock: bool,
    #[serde(default)]
    image_url: String,
    #[serde(default)]
    product_url: String,
    scraped_date: NaiveDate,
    #[serde(default)]
    last_updated: Option<NaiveDate>,
}

impl From<StoredDeal> for Deal {
    fn from(stored: StoredDeal) -> Self {
        Self {
            product_code: stored.product_code,
            product_name: stored.product_name,
            brand: stored.brand,
            category: stored.category,
            original_price: stored.original_price,
            sale_price: stored.sale_price,
            discount_pct: stored.discount_pct,
            in_stock: stored.in_stock,
            image_url: stored.image_url,
            product_url: stored.product_url,
            scraped_date: stored.scraped_date,
            last_updated: stored.last_updated.unwrap_or(stored.scraped_date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_discount_pct_rounds_to_one_decimal() {
        assert_eq!(discount_pct(dec("100"), dec("50")), dec("50.0"));
        assert_eq!(discount_pct(dec("100"), dec("66.67")), dec("33.3"));
        assert_eq!(discount_pct(dec("3"), dec("2")), dec("33.3"));
        // 0.25 → 0.3 with midpoint away from zero
        assert_eq!(discount_pct(dec("400"), dec("399")), dec("0.3"));
    }

    #[test]
    fn test_legacy_snapshot_without_last_updated() {
        let json = r#"{
            "product_code": "H001",
            "product_name": "Kibble",
            "brand": "Acme",
            "original_price": 120.0,
            "sale_price": 99.5,
            "discount_pct": 17.08,
            "category": "dog_food",
            "image_url": "",
            "product_url": "",
            "in_stock": true,
            "scraped_date": "2024-01-01"
        }"#;
        let deal: Deal = serde_json::from_str(json).unwrap();
        assert_eq!(deal.last_updated, deal.scraped_date);
        assert_eq!(deal.sale_price, dec("99.5"));
    }

    #[test]
    fn test_serialized_field_names() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let deal = Deal {
            product_code: "H001".into(),
            product_name: "Kibble".into(),
            brand: "Acme".into(),
            category: "dog_food".into(),
            original_price: dec("100"),
            sale_price: dec("80"),
            discount_pct: dec("20.0"),
            in_stock: true,
            image_url: String::new(),
            product_url: String::new(),
            scraped_date: date,
            last_updated: date,
        };
        let value = serde_json::to_value(&deal).unwrap();
        assert_eq!(value["last_updated"], "2024-02-01");
        assert_eq!(value["discount_pct"].as_f64(), Some(20.0));

        let back: Deal = serde_json::from_value(value).unwrap();
        assert_eq!(back, deal);
    }

    #[test]
    fn test_differs_only_on_price_and_stock() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let base = Deal {
            product_code: "H001".into(),
            product_name: "Kibble".into(),
            brand: "Acme".into(),
            category: "dog_food".into(),
            original_price: dec("100"),
            sale_price: dec("80"),
            discount_pct: dec("20.0"),
            in_stock: true,
            image_url: String::new(),
            product_url: String::new(),
            scraped_date: date,
            last_updated: date,
        };

        let mut renamed = base.clone();
        renamed.product_name = "Kibble XL".into();
        assert!(!renamed.differs_from(&base));

        let mut out_of_stock = base.clone();
        out_of_stock.in_stock = false;
        assert!(out_of_stock.differs_from(&base));

        // 80 and 80.00 are the same price
        let mut rescaled = base.clone();
        rescaled.sale_price = dec("80.00");
        assert!(!rescaled.differs_from(&base));
    }
}
