// src/services/normalizer.rs

//! Product normalizer.
//!
//! Converts one raw listing into a [`Deal`] or rejects it. Rejection is the
//! common case (most listings carry no discount) and is never an error.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use url::Url;

use crate::models::{
    Deal, PRICE_TYPE_BUY, PRICE_TYPE_DISCOUNT, PriceEntry, RawListing, discount_pct,
};
use crate::utils::absolutize;

/// Per-category inputs shared by every listing of a run.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext<'a> {
    /// Category key written into each deal
    pub category: &'a str,
    /// Run start date, used for both date fields until change tracking
    pub run_date: NaiveDate,
    /// Site root for relative links
    pub base_url: &'a Url,
}

/// Normalize a raw listing, consuming it.
///
/// Returns `None` when the listing has no identifier, lacks either price,
/// carries a non-numeric or non-positive price, or is not discounted.
pub fn normalize(entry: RawListing, ctx: &NormalizeContext<'_>) -> Option<Deal> {
    if entry.code.trim().is_empty() {
        return None;
    }

    let original_price = entry
        .price_of_type(PRICE_TYPE_BUY)
        .or(entry.price.as_ref())
        .and_then(entry_amount)?;
    let sale_price = entry
        .price_of_type(PRICE_TYPE_DISCOUNT)
        .and_then(entry_amount)?;

    if original_price <= Decimal::ZERO || sale_price <= Decimal::ZERO {
        return None;
    }
    if sale_price >= original_price {
        return None;
    }

    let in_stock = entry.in_stock();
    let image_url = entry
        .images
        .first()
        .map(|img| absolutize(ctx.base_url, &img.url))
        .unwrap_or_default();
    let product_url = absolutize(ctx.base_url, &entry.url);

    Some(Deal {
        product_code: entry.code,
        product_name: entry.name,
        brand: entry.brand_name,
        category: ctx.category.to_string(),
        original_price,
        sale_price,
        discount_pct: discount_pct(original_price, sale_price),
        in_stock,
        image_url,
        product_url,
        scraped_date: ctx.run_date,
        last_updated: ctx.run_date,
    })
}

fn entry_amount(entry: &PriceEntry) -> Option<Decimal> {
    entry.value.as_ref().and_then(parse_amount)
}

/// Parse a price that may arrive as a JSON number or a numeric string.
fn parse_amount(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().replace(',', ""),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ctx(base: &Url) -> NormalizeContext<'_> {
        NormalizeContext {
            category: "dog_food",
            run_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            base_url: base,
        }
    }

    fn listing(value: Value) -> RawListing {
        serde_json::from_value(value).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_accepts_discounted_listing_in_any_price_order() {
        let base = Url::parse("https://www.hktvmall.com").unwrap();
        let raw = listing(json!({
            "code": "H001",
            "name": "Salmon Kibble",
            "brandName": "Acme",
            "priceList": [
                {"priceType": "DISCOUNT", "value": 75},
                {"priceType": "BUY", "value": "100.00"}
            ],
            "stock": {"stockLevelStatus": {"code": "inStock"}},
            "images": [{"url": "//img.example.com/h001.jpg"}],
            "url": "/hktv/en/p/H001"
        }));

        let deal = normalize(raw, &ctx(&base)).unwrap();
        assert_eq!(deal.product_code, "H001");
        assert_eq!(deal.category, "dog_food");
        assert_eq!(deal.original_price, dec("100"));
        assert_eq!(deal.sale_price, dec("75"));
        assert_eq!(deal.discount_pct, dec("25.0"));
        assert!(deal.in_stock);
        assert_eq!(deal.image_url, "https://img.example.com/h001.jpg");
        assert_eq!(deal.product_url, "https://www.hktvmall.com/hktv/en/p/H001");
    }

    #[test]
    fn test_falls_back_to_top_level_price() {
        let base = Url::parse("https://www.hktvmall.com").unwrap();
        let raw = listing(json!({
            "code": "H002",
            "price": {"value": 50.0},
            "priceList": [{"priceType": "DISCOUNT", "value": 40.0}]
        }));

        let deal = normalize(raw, &ctx(&base)).unwrap();
        assert_eq!(deal.discount_pct, dec("20.0"));
        assert!(!deal.in_stock);
        assert_eq!(deal.image_url, "");
    }

    #[test]
    fn test_rejects_listing_without_discount_entry() {
        let base = Url::parse("https://www.hktvmall.com").unwrap();
        let raw = listing(json!({
            "code": "H003",
            "priceList": [{"priceType": "BUY", "value": 50.0}]
        }));
        assert!(normalize(raw, &ctx(&base)).is_none());
    }

    #[test]
    fn test_rejects_non_discount_and_bad_prices() {
        let base = Url::parse("https://www.hktvmall.com").unwrap();
        let cases = [
            json!([{"priceType": "BUY", "value": 50}, {"priceType": "DISCOUNT", "value": 50}]),
            json!([{"priceType": "BUY", "value": 50}, {"priceType": "DISCOUNT", "value": 60}]),
            json!([{"priceType": "BUY", "value": "n/a"}, {"priceType": "DISCOUNT", "value": 10}]),
            json!([{"priceType": "BUY", "value": 50}, {"priceType": "DISCOUNT", "value": 0}]),
            json!([{"priceType": "BUY", "value": 50}, {"priceType": "DISCOUNT", "value": null}]),
            json!([{"priceType": "BUY", "value": 50}, {"priceType": "DISCOUNT", "value": true}]),
        ];

        for price_list in cases {
            let raw = listing(json!({"code": "H004", "priceList": price_list}));
            assert!(normalize(raw, &ctx(&base)).is_none());
        }
    }

    #[test]
    fn test_rejects_missing_code() {
        let base = Url::parse("https://www.hktvmall.com").unwrap();
        let raw = listing(json!({
            "code": "",
            "priceList": [
                {"priceType": "BUY", "value": 50},
                {"priceType": "DISCOUNT", "value": 25}
            ]
        }));
        assert!(normalize(raw, &ctx(&base)).is_none());
    }

    #[test]
    fn test_parse_amount_formats() {
        assert_eq!(parse_amount(&json!(12.5)), Some(dec("12.5")));
        assert_eq!(parse_amount(&json!(" 1,299.00 ")), Some(dec("1299")));
        assert_eq!(parse_amount(&json!("abc")), None);
        assert_eq!(parse_amount(&json!({"value": 1})), None);
    }
}
