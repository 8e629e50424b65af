//! Utility functions and helpers.

pub mod http;
pub mod pause;

pub use pause::{NoPause, Pause, TokioPause};

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Turn a listing link into an absolute URL.
///
/// Empty links stay empty; protocol-relative links get `https:`.
pub fn absolutize(base: &Url, href: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }
    if let Some(rest) = href.strip_prefix("//") {
        return format!("https://{rest}");
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    resolve_url(base, href)
}
