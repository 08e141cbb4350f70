//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Content tree and output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Public site addresses
    #[serde(default)]
    pub site: SiteConfig,

    /// Syndication feed settings
    #[serde(default)]
    pub feed: FeedConfig,

    /// Request cache namespaces
    #[serde(default)]
    pub cache: CacheConfig,

    /// Browsing client behavior
    #[serde(default)]
    pub client: ClientConfig,

    /// Update notifications
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.paths.content_root.as_os_str().is_empty() {
            return Err(AppError::validation("paths.content_root is empty"));
        }
        if self.paths.index_file.trim().is_empty() {
            return Err(AppError::validation("paths.index_file is empty"));
        }
        if self.feed.limit == 0 {
            return Err(AppError::validation("feed.limit must be > 0"));
        }
        if self.cache.version.trim().is_empty() {
            return Err(AppError::validation("cache.version is empty"));
        }
        if self.client.poll_interval_secs == 0 {
            return Err(AppError::validation("client.poll_interval_secs must be > 0"));
        }
        if self.client.timeout_secs == 0 {
            return Err(AppError::validation("client.timeout_secs must be > 0"));
        }
        if self.client.read_state_key.trim().is_empty() {
            return Err(AppError::validation("client.read_state_key is empty"));
        }
        if self.notify.tag.trim().is_empty() {
            return Err(AppError::validation("notify.tag is empty"));
        }
        url::Url::parse(&self.site.base_url)
            .map_err(|e| AppError::validation(format!("site.base_url is invalid: {e}")))?;
        Ok(())
    }

    /// Resolved path of the generated index document.
    pub fn index_path(&self) -> PathBuf {
        self.paths.output_dir.join(&self.paths.index_file)
    }

    /// Resolved path of the generated feed document.
    pub fn feed_path(&self) -> PathBuf {
        self.paths.output_dir.join(&self.paths.feed_file)
    }
}

/// Content tree and output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root directory whose children are symbol codes
    #[serde(default = "defaults::content_root")]
    pub content_root: PathBuf,

    /// Directory receiving the index and feed
    #[serde(default = "defaults::output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "defaults::index_file")]
    pub index_file: String,

    #[serde(default = "defaults::feed_file")]
    pub feed_file: String,

    /// Client-local persistent storage directory
    #[serde(default = "defaults::state_dir")]
    pub state_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content_root: defaults::content_root(),
            output_dir: defaults::output_dir(),
            index_file: defaults::index_file(),
            feed_file: defaults::feed_file(),
            state_dir: defaults::state_dir(),
        }
    }
}

/// Public site addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site root; feed links and index fetches are built from it
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Host serving raw Markdown content
    #[serde(default = "defaults::content_host")]
    pub content_host: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            content_host: defaults::content_host(),
        }
    }
}

/// Syndication feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "defaults::feed_title")]
    pub title: String,

    #[serde(default = "defaults::feed_subtitle")]
    pub subtitle: String,

    #[serde(default = "defaults::feed_author")]
    pub author: String,

    /// Maximum number of entries
    #[serde(default = "defaults::feed_limit")]
    pub limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            title: defaults::feed_title(),
            subtitle: defaults::feed_subtitle(),
            author: defaults::feed_author(),
            limit: defaults::feed_limit(),
        }
    }
}

/// Request cache namespace settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Generation suffix; bumping it retires every older namespace
    #[serde(default = "defaults::cache_version")]
    pub version: String,

    #[serde(default = "defaults::static_prefix")]
    pub static_prefix: String,

    #[serde(default = "defaults::api_prefix")]
    pub api_prefix: String,

    #[serde(default = "defaults::content_prefix")]
    pub content_prefix: String,

    /// Body of the synthesized offline response
    #[serde(default = "defaults::offline_message")]
    pub offline_message: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            version: defaults::cache_version(),
            static_prefix: defaults::static_prefix(),
            api_prefix: defaults::api_prefix(),
            content_prefix: defaults::content_prefix(),
            offline_message: defaults::offline_message(),
        }
    }
}

/// Browsing client behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Seconds between index polls
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Fixed key the read state is persisted under
    #[serde(default = "defaults::read_state_key")]
    pub read_state_key: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: defaults::poll_interval(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            read_state_key: defaults::read_state_key(),
        }
    }
}

/// Update notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Whether the platform supports notifications at all
    #[serde(default = "defaults::notify_enabled")]
    pub enabled: bool,

    /// Answer given when permission is requested
    #[serde(default = "defaults::notify_grant")]
    pub grant: bool,

    /// Replacement tag shared by every notification
    #[serde(default = "defaults::notify_tag")]
    pub tag: String,

    #[serde(default = "defaults::notify_icon")]
    pub icon: String,

    /// Joins symbol codes inside one clause
    #[serde(default = "defaults::notify_separator")]
    pub separator: String,

    #[serde(default = "defaults::app_name")]
    pub app_name: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::notify_enabled(),
            grant: defaults::notify_grant(),
            tag: defaults::notify_tag(),
            icon: defaults::notify_icon(),
            separator: defaults::notify_separator(),
            app_name: defaults::app_name(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Path defaults
    pub fn content_root() -> PathBuf {
        PathBuf::from("predictions")
    }
    pub fn output_dir() -> PathBuf {
        PathBuf::from(".")
    }
    pub fn index_file() -> String {
        "index.json".into()
    }
    pub fn feed_file() -> String {
        "feed.xml".into()
    }
    pub fn state_dir() -> PathBuf {
        PathBuf::from(".state")
    }

    // Site defaults
    pub fn base_url() -> String {
        "https://kodatao.github.io/ich-trading".into()
    }
    pub fn content_host() -> String {
        "raw.githubusercontent.com".into()
    }

    // Feed defaults
    pub fn feed_title() -> String {
        "ICH Trading".into()
    }
    pub fn feed_subtitle() -> String {
        "Dated market predictions by symbol".into()
    }
    pub fn feed_author() -> String {
        "ICH Trading".into()
    }
    pub fn feed_limit() -> usize {
        20
    }

    // Cache defaults
    pub fn cache_version() -> String {
        "2".into()
    }
    pub fn static_prefix() -> String {
        "static-assets".into()
    }
    pub fn api_prefix() -> String {
        "api-cache".into()
    }
    pub fn content_prefix() -> String {
        "content-cache".into()
    }
    pub fn offline_message() -> String {
        "Offline: this content is not available right now".into()
    }

    // Client defaults
    pub fn poll_interval() -> u64 {
        300
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; predictions/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn read_state_key() -> String {
        "ich-read-state".into()
    }

    // Notification defaults
    pub fn notify_enabled() -> bool {
        true
    }
    pub fn notify_grant() -> bool {
        true
    }
    pub fn notify_tag() -> String {
        "ich-trading-update".into()
    }
    pub fn notify_icon() -> String {
        "/ich-trading/favicon.ico".into()
    }
    pub fn notify_separator() -> String {
        ", ".into()
    }
    pub fn app_name() -> String {
        "ICH Trading".into()
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
    fn validate_rejects_zero_feed_limit() {
        let mut config = Config::default();
        config.feed.limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.site.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [feed]
            title = "Custom"

            [cache]
            version = "7"
            "#,
        )
        .unwrap();

        assert_eq!(config.feed.title, "Custom");
        assert_eq!(config.feed.limit, 20);
        assert_eq!(config.cache.version, "7");
        assert_eq!(config.cache.static_prefix, "static-assets");
        assert_eq!(config.paths.index_file, "index.json");
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let config = Config::load_or_default("/definitely/not/here.toml");
        assert_eq!(config.client.poll_interval_secs, 300);
    }

    #[test]
    fn output_paths_join_output_dir() {
        let mut config = Config::default();
        config.paths.output_dir = PathBuf::from("dist");
        assert_eq!(config.index_path(), PathBuf::from("dist/index.json"));
        assert_eq!(config.feed_path(), PathBuf::from("dist/feed.xml"));
    }
}
