// src/models/raw.rs

//! Raw search API shapes.
//!
//! Only the fields the normalizer reads are declared; everything else in the
//! upstream payload is skipped during decoding.

use serde::Deserialize;
use serde_json::Value;

/// Price entry type carrying the regular price.
pub const PRICE_TYPE_BUY: &str = "BUY";

/// Price entry type carrying the discounted price.
pub const PRICE_TYPE_DISCOUNT: &str = "DISCOUNT";

/// Stock status code for an available listing.
pub const STOCK_IN_STOCK: &str = "inStock";

/// One page of the category search response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPage {
    #[serde(default)]
    pub products: Vec<RawListing>,

    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Pagination block reported alongside a page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub number_of_pages: Option<u32>,

    #[serde(default)]
    pub total_number_of_results: Option<u64>,
}

/// A single product as listed on a page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListing {
    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub brand_name: String,

    /// Tariff entries in no particular order
    #[serde(default)]
    pub price_list: Vec<PriceEntry>,

    /// Legacy top-level regular price
    #[serde(default)]
    pub price: Option<PriceEntry>,

    #[serde(default)]
    pub stock: Option<Stock>,

    #[serde(default)]
    pub images: Vec<Image>,

    #[serde(default)]
    pub url: String,
}

/// A `{type, amount}` price entry. `value` may be a number or a numeric string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceEntry {
    #[serde(default)]
    pub price_type: Option<String>,

    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    #[serde(default)]
    pub stock_level_status: Option<StockStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockStatus {
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub url: String,
}

impl RawListing {
    /// First price entry of the given type.
    pub fn price_of_type(&self, price_type: &str) -> Option<&PriceEntry> {
        self.price_list
            .iter()
            .find(|entry| entry.price_type.as_deref() == Some(price_type))
    }

    /// Whether the listing reports available stock.
    pub fn in_stock(&self) -> bool {
        self.stock
            .as_ref()
            .and_then(|s| s.stock_level_status.as_ref())
            .is_some_and(|status| status.code == STOCK_IN_STOCK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_page_ignores_unknown_fields() {
        let json = r#"{
            "products": [{
                "code": "H0888001",
                "name": "Salmon Kibble 2kg",
                "brandName": "Acme",
                "priceList": [
                    {"priceType": "DISCOUNT", "value": 89.0, "currencyIso": "HKD"},
                    {"priceType": "BUY", "value": "120.00"}
                ],
                "stock": {"stockLevelStatus": {"code": "inStock"}},
                "images": [{"url": "//img.example.com/a.jpg", "format": "thumbnail"}],
                "url": "/p/H0888001",
                "averageRating": 4.5
            }],
            "pagination": {"numberOfPages": 3, "totalNumberOfResults": 1500, "pageSize": 600}
        }"#;

        let page: RawPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.products.len(), 1);
        let listing = &page.products[0];
        assert_eq!(listing.brand_name, "Acme");
        assert!(listing.in_stock());
        assert!(listing.price_of_type(PRICE_TYPE_BUY).is_some());
        assert_eq!(page.pagination.and_then(|p| p.number_of_pages), Some(3));
    }

    #[test]
    fn test_missing_products_is_empty_page() {
        let page: RawPage = serde_json::from_str("{}").unwrap();
        assert!(page.products.is_empty());
        assert!(page.pagination.is_none());
    }
}
