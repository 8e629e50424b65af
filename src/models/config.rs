//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upstream search API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Pagination, pacing and retry settings
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Categories, processed in the listed order
    #[serde(default = "defaults::categories")]
    pub categories: Vec<CategoryConfig>,

    /// Persisted snapshot locations
    #[serde(default)]
    pub output: OutputConfig,

    /// Optional fast-path mirror
    #[serde(default)]
    pub mirror: MirrorConfig,

    /// Pre-commit safety checks
    #[serde(default)]
    pub guard: GuardConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::validation("api.user_agent is empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.api.search_url)?;
        url::Url::parse(&self.api.base_url)?;
        if self.scrape.page_size == 0 {
            return Err(AppError::validation("scrape.page_size must be > 0"));
        }
        if self.scrape.max_pages == 0 {
            return Err(AppError::validation("scrape.max_pages must be > 0"));
        }
        if self.guard.max_drop_percent > 100 {
            return Err(AppError::validation(
                "guard.max_drop_percent must be between 0 and 100",
            ));
        }
        if self.categories.is_empty() {
            return Err(AppError::validation("No categories defined"));
        }

        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.key.trim().is_empty() {
                return Err(AppError::validation("Category key is empty"));
            }
            if category.query.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "Category '{}' has an empty query",
                    category.key
                )));
            }
            if !seen.insert(category.key.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate category key '{}'",
                    category.key
                )));
            }
        }

        self.mirror.check_targets(&self.output)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            scrape: ScrapeConfig::default(),
            categories: defaults::categories(),
            output: OutputConfig::default(),
            mirror: MirrorConfig::default(),
            guard: GuardConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Search API endpoint and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Category search endpoint (one POST per page)
    #[serde(default = "defaults::search_url")]
    pub search_url: String,

    /// Site root used to absolutize product links
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-page request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            search_url: defaults::search_url(),
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Pagination and pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Entries requested per page
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    /// Safety cap on pages per category
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,

    /// Delay between page requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Retries after the first failed attempt of a page
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Fixed delay between retry attempts in milliseconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,
}

impl ScrapeConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::page_size(),
            max_pages: defaults::max_pages(),
            request_delay_ms: defaults::request_delay(),
            max_retries: defaults::max_retries(),
            retry_delay_ms: defaults::retry_delay(),
        }
    }
}

/// A catalog partition scraped through its own paginated query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryConfig {
    /// Tag written into each deal's `category` field
    pub key: String,

    /// Human-readable name for logs
    #[serde(default)]
    pub label: String,

    /// Search query selecting the category upstream
    pub query: String,
}

impl CategoryConfig {
    /// Label for logs, falling back to the key.
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.key
        } else {
            &self.label
        }
    }
}

/// Persisted snapshot locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Authoritative snapshot, replaced atomically on commit
    #[serde(default = "defaults::snapshot_path")]
    pub snapshot_path: PathBuf,

    /// Run statistics written after each commit
    #[serde(default = "defaults::stats_path")]
    pub stats_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot_path: defaults::snapshot_path(),
            stats_path: defaults::stats_path(),
        }
    }
}

/// Fast-path mirror destinations. All unset means publishing is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MirrorConfig {
    /// Local directory receiving a copy of the snapshot
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Bucket for the S3 mirror
    #[serde(default)]
    pub s3_bucket: Option<String>,

    /// Object key for the S3 mirror
    #[serde(default = "defaults::s3_key")]
    pub s3_key: String,
}

impl MirrorConfig {
    pub fn is_configured(&self) -> bool {
        self.dir.is_some() || self.s3_bucket.is_some()
    }

    /// File the local mirror writes: `dir` joined with the snapshot's name.
    pub fn local_target(&self, output: &OutputConfig) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        let name = output
            .snapshot_path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("deals.json"));
        Some(dir.join(name))
    }

    /// The local mirror must never land on a file owned by [`OutputConfig`].
    pub fn check_targets(&self, output: &OutputConfig) -> Result<()> {
        let Some(target) = self.local_target(output) else {
            return Ok(());
        };
        let target_key = normalized(&target);
        for (field, owned) in [
            ("output.snapshot_path", &output.snapshot_path),
            ("output.stats_path", &output.stats_path),
        ] {
            if normalized(owned) == target_key {
                return Err(AppError::validation(format!(
                    "mirror.dir writes {}, which is {field}",
                    target.display()
                )));
            }
        }
        Ok(())
    }
}

/// Absolute, lexically cleaned form of `path` for equality checks.
fn normalized(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Checks applied before replacing the committed snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GuardConfig {
    /// Allow an empty snapshot to replace a non-empty one
    #[serde(default)]
    pub allow_empty: bool,

    /// Maximum allowed drop in deal count (0 disables the check)
    #[serde(default)]
    pub max_drop_percent: u8,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    use super::CategoryConfig;

    // Api defaults
    pub fn search_url() -> String {
        "https://www.hktvmall.com/hktv/en/ajax/search_products".into()
    }
    pub fn base_url() -> String {
        "https://www.hktvmall.com".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Scrape defaults
    pub fn page_size() -> u32 {
        600
    }
    pub fn max_pages() -> u32 {
        100
    }
    pub fn request_delay() -> u64 {
        2000
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn retry_delay() -> u64 {
        5000
    }

    // Output defaults
    pub fn snapshot_path() -> PathBuf {
        PathBuf::from("data/deals.json")
    }
    pub fn stats_path() -> PathBuf {
        PathBuf::from("data/stats.json")
    }
    pub fn s3_key() -> String {
        "deals.json".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }

    // Category defaults
    pub fn categories() -> Vec<CategoryConfig> {
        vec![
            CategoryConfig {
                key: "dog_food".to_string(),
                label: "Dog Food".to_string(),
                query: ":relevance:street:main:category:AA83100500000".to_string(),
            },
            CategoryConfig {
                key: "cat_food".to_string(),
                label: "Cat Food".to_string(),
                query: ":relevance:street:main:category:AA83200500000".to_string(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.api.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_page_size() {
        let mut config = Config::default();
        config.scrape.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_category_keys() {
        let mut config = Config::default();
        let dup = config.categories[0].clone();
        config.categories.push(dup);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate category key"));
    }

    #[test]
    fn validate_rejects_out_of_range_drop_percent() {
        let mut config = Config::default();
        config.guard.max_drop_percent = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml = r#"
            [scrape]
            page_size = 50

            [[categories]]
            key = "treats"
            query = ":relevance:category:AA83300000000"

            [mirror]
            dir = "public/data"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.scrape.page_size, 50);
        assert_eq!(config.scrape.max_pages, 100);
        assert_eq!(config.categories.len(), 1);
        assert_eq!(config.categories[0].display_name(), "treats");
        assert!(config.mirror.is_configured());
        assert_eq!(config.output.snapshot_path, PathBuf::from("data/deals.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_mirror_dir_on_snapshot_dir() {
        for dir in ["data", "./data", "data/../data"] {
            let mut config = Config::default();
            config.mirror.dir = Some(PathBuf::from(dir));
            let err = config.validate().unwrap_err();
            assert!(
                err.to_string().contains("output.snapshot_path"),
                "{dir}: {err}"
            );
        }
    }

    #[test]
    fn validate_rejects_mirror_target_on_stats_file() {
        let mut config = Config::default();
        config.output.snapshot_path = PathBuf::from("out/stats.json");
        config.output.stats_path = PathBuf::from("data/stats.json");
        config.mirror.dir = Some(PathBuf::from("data"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output.stats_path"));
    }

    #[test]
    fn mirror_target_uses_snapshot_file_name() {
        let mut config = Config::default();
        config.mirror.dir = Some(PathBuf::from("public/data"));
        assert_eq!(
            config.mirror.local_target(&config.output),
            Some(PathBuf::from("public/data/deals.json"))
        );
        assert!(config.validate().is_ok());
    }
}
