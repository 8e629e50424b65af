// src/utils/http.rs

//! HTTP client utilities.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, ORIGIN, REFERER};

use crate::error::{AppError, Result};
use crate::models::ApiConfig;

/// Create a configured asynchronous HTTP client.
///
/// The search endpoint rejects requests that do not look like they come from
/// the storefront, so Origin and Referer mirror `base_url`.
pub fn create_async_client(config: &ApiConfig) -> Result<reqwest::Client> {
    let origin = config.base_url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(
        ORIGIN,
        HeaderValue::from_str(origin).map_err(|e| AppError::config(e.to_string()))?,
    );
    headers.insert(
        REFERER,
        HeaderValue::from_str(&format!("{origin}/"))
            .map_err(|e| AppError::config(e.to_string()))?,
    );

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_from_defaults() {
        assert!(create_async_client(&ApiConfig::default()).is_ok());
    }

    #[test]
    fn test_create_client_rejects_bad_origin() {
        let config = ApiConfig {
            base_url: "https://bad\nhost".into(),
            ..ApiConfig::default()
        };
        assert!(create_async_client(&config).is_err());
    }
}
