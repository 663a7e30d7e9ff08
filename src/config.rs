//! Centralized configuration management for pb-admin

use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Result, Context};

use crate::listing::ErrorPolicy;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the rental backend, without trailing slash
    pub api_url: String,
    /// Local storage file holding `accessToken` / `csrfToken`
    pub storage_path: PathBuf,
    /// HTTP client configuration
    pub http: HttpConfig,
    /// List screen behaviour
    pub listing: ListingConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

/// Settings shared by every list screen
#[derive(Debug, Clone)]
pub struct ListingConfig {
    /// Page size sent to paginated endpoints
    pub page_size: u32,
    /// Quiet period before a server-side search fires (milliseconds)
    pub search_debounce_ms: u64,
    /// Auto-refresh interval for station views (seconds)
    pub refresh_seconds: u64,
    /// What a failed fetch does to the rows already on screen
    pub error_policy: ErrorPolicy,
    /// Terminal width below which rows are drawn as cards
    pub mobile_breakpoint: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: "pb-admin/0.1.0".to_string(),
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            search_debounce_ms: 500,
            refresh_seconds: 30,
            error_policy: ErrorPolicy::KeepStale,
            mobile_breakpoint: 80,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            storage_path: PathBuf::from("./.pb-admin/storage.json"),
            http: HttpConfig::default(),
            listing: ListingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let api_url = std::env::var("PB_ADMIN_API_URL")
            .unwrap_or(defaults.api_url)
            .trim_end_matches('/')
            .to_string();

        let storage_path = std::env::var("PB_ADMIN_STORAGE")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_path);

        let http = HttpConfig {
            timeout_seconds: parse_env_var("PB_ADMIN_HTTP_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.http.timeout_seconds),
            user_agent: std::env::var("PB_ADMIN_USER_AGENT")
                .unwrap_or(defaults.http.user_agent),
        };

        let listing = ListingConfig {
            page_size: parse_env_var("PB_ADMIN_PAGE_SIZE")?
                .unwrap_or(defaults.listing.page_size),
            search_debounce_ms: parse_env_var("PB_ADMIN_SEARCH_DEBOUNCE_MS")?
                .unwrap_or(defaults.listing.search_debounce_ms),
            refresh_seconds: parse_env_var("PB_ADMIN_REFRESH_SECONDS")?
                .unwrap_or(defaults.listing.refresh_seconds),
            error_policy: parse_env_var("PB_ADMIN_ERROR_POLICY")?
                .unwrap_or(defaults.listing.error_policy),
            mobile_breakpoint: parse_env_var("PB_ADMIN_MOBILE_BREAKPOINT")?
                .unwrap_or(defaults.listing.mobile_breakpoint),
        };

        Ok(Config {
            api_url,
            storage_path,
            http,
            listing,
        })
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    /// Get search debounce delay as Duration
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.listing.search_debounce_ms)
    }

    /// Get auto-refresh interval as Duration
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.listing.refresh_seconds)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.api_url)
            .with_context(|| format!("Invalid API URL: {}", self.api_url))?;

        if self.listing.page_size == 0 {
            return Err(anyhow::anyhow!("Page size must be greater than 0"));
        }

        if self.listing.refresh_seconds == 0 {
            return Err(anyhow::anyhow!("Refresh interval must be greater than 0"));
        }

        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}
