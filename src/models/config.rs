//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use scraper::Selector;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Scheduling and timeout settings
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// How a count is pulled out of a page
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Where change alerts are sent
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Monitored pages, visited in this order every cycle
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, or return defaults if the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("Config file {:?} not found. Using defaults.", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Append ad-hoc sources given on the command line.
    pub fn with_extra_sources(mut self, urls: impl IntoIterator<Item = String>) -> Self {
        self.sources
            .extend(urls.into_iter().map(|url| SourceConfig { url, name: None }));
        self
    }

    /// Source identifiers in configured order.
    pub fn source_ids(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.url.clone()).collect()
    }

    /// Validate configuration values. Any error here is fatal at startup.
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(AppError::config("No sources defined"));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            let url = Url::parse(&source.url)?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(AppError::validation(format!(
                    "source {} must use http or https",
                    source.url
                )));
            }
            if !seen.insert(source.url.as_str()) {
                return Err(AppError::validation(format!(
                    "source {} is listed twice",
                    source.url
                )));
            }
        }

        if self.monitor.interval_secs == 0 {
            return Err(AppError::validation("monitor.interval_secs must be > 0"));
        }
        if self.monitor.fetch_timeout_secs == 0 {
            return Err(AppError::validation(
                "monitor.fetch_timeout_secs must be > 0",
            ));
        }
        if self.monitor.notify_timeout_secs == 0 {
            return Err(AppError::validation(
                "monitor.notify_timeout_secs must be > 0",
            ));
        }

        if self.extractor.user_agent.trim().is_empty() {
            return Err(AppError::validation("extractor.user_agent is empty"));
        }
        parse_selector(&self.extractor.count_selector)?;
        if let Some(title_selector) = self.extractor.title_selector() {
            parse_selector(title_selector)?;
        }
        if let Some(refinement_selector) = self.extractor.refinement_selector() {
            parse_selector(refinement_selector)?;
        }

        self.notifier.validate()
    }
}

/// Parse a CSS selector, mapping failures into `AppError::Selector`.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Scheduling and per-call timeout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Delay between cycles in seconds
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Upper bound for one source fetch
    #[serde(default = "defaults::fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Upper bound for one notification send
    #[serde(default = "defaults::notify_timeout")]
    pub notify_timeout_secs: u64,

    /// Which changes produce a notification
    #[serde(default)]
    pub notify_on: ChangePolicy,

    /// Title used for every change notification
    #[serde(default = "defaults::notification_title")]
    pub notification_title: String,
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            fetch_timeout_secs: defaults::fetch_timeout(),
            notify_timeout_secs: defaults::notify_timeout(),
            notify_on: ChangePolicy::default(),
            notification_title: defaults::notification_title(),
        }
    }
}

/// Which count changes are worth a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangePolicy {
    /// Any difference between consecutive counts
    #[default]
    Any,
    /// Only when the count grows
    Increase,
    /// Only when the count shrinks
    Decrease,
}

impl ChangePolicy {
    /// Whether a change from `previous` to `current` should be announced.
    pub fn allows(self, previous: u64, current: u64) -> bool {
        match self {
            ChangePolicy::Any => previous != current,
            ChangePolicy::Increase => current > previous,
            ChangePolicy::Decrease => current < previous,
        }
    }
}

/// HTTP and HTML extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// CSS selector of the element holding the count text
    #[serde(default = "defaults::count_selector")]
    pub count_selector: String,

    /// Optional CSS selector of a heading describing the page
    #[serde(default = "defaults::title_selector")]
    pub title_selector: Option<String>,

    /// Optional CSS selector of active filter labels, all matches are kept
    #[serde(default = "defaults::refinement_selector")]
    pub refinement_selector: Option<String>,
}

impl ExtractorConfig {
    /// Title selector, treating an empty string as disabled.
    pub fn title_selector(&self) -> Option<&str> {
        self.title_selector
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    /// Refinement selector, treating an empty string as disabled.
    pub fn refinement_selector(&self) -> Option<&str> {
        self.refinement_selector
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            count_selector: defaults::count_selector(),
            title_selector: defaults::title_selector(),
            refinement_selector: defaults::refinement_selector(),
        }
    }
}

/// Notification channel settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NotifierConfig {
    /// Pushover messages API
    Pushover {
        user_key: String,
        api_token: String,
        #[serde(default = "defaults::pushover_api")]
        api_url: String,
    },
    /// ntfy topic on a public or self-hosted server
    Ntfy {
        topic: String,
        #[serde(default = "defaults::ntfy_server")]
        server: String,
    },
    /// Only write notifications to the log
    #[default]
    Log,
}

impl NotifierConfig {
    fn validate(&self) -> Result<()> {
        match self {
            NotifierConfig::Pushover {
                user_key,
                api_token,
                api_url,
            } => {
                if user_key.trim().is_empty() || api_token.trim().is_empty() {
                    return Err(AppError::validation(
                        "notifier.user_key and notifier.api_token are required for pushover",
                    ));
                }
                Url::parse(api_url)?;
            }
            NotifierConfig::Ntfy { topic, server } => {
                if topic.trim().is_empty() {
                    return Err(AppError::validation(
                        "notifier.topic is required for ntfy",
                    ));
                }
                Url::parse(server)?;
            }
            NotifierConfig::Log => {}
        }
        Ok(())
    }
}

/// A single monitored page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Page URL, also the stable source identifier
    pub url: String,

    /// Optional human-readable label shown in logs and reports
    #[serde(default)]
    pub name: Option<String>,
}

mod defaults {
    // Monitor defaults
    pub fn interval() -> u64 {
        600
    }
    pub fn fetch_timeout() -> u64 {
        30
    }
    pub fn notify_timeout() -> u64 {
        10
    }
    pub fn notification_title() -> String {
        "Listing Count Update".into()
    }

    // Extractor defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into()
    }
    pub fn count_selector() -> String {
        "div.ais-Panel.-stats".into()
    }
    pub fn title_selector() -> Option<String> {
        Some(r#"h1[data-testid="Title"]"#.into())
    }
    pub fn refinement_selector() -> Option<String> {
        Some("ul.-current-refinements span.-refinement-label".into())
    }

    // Notifier defaults
    pub fn pushover_api() -> String {
        "https://api.pushover.net/1/messages.json".into()
    }
    pub fn ntfy_server() -> String {
        "https://ntfy.sh".into()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn config_with_sources(urls: &[&str]) -> Config {
        Config::default().with_extra_sources(urls.iter().map(|u| u.to_string()))
    }

    #[test]
    fn validate_rejects_empty_sources() {
        let err = Config::default().validate().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn validate_accepts_single_source() {
        let config = config_with_sources(&["https://example.com/shop/abc"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_sources() {
        let config = config_with_sources(&["https://example.com/a", "https://example.com/a"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_http_source() {
        let config = config_with_sources(&["ftp://example.com/a"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = config_with_sources(&["https://example.com/a"]);
        config.monitor.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let mut config = config_with_sources(&["https://example.com/a"]);
        config.extractor.count_selector = "[[invalid".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            AppError::Selector { .. }
        ));
    }

    #[test]
    fn validate_rejects_pushover_without_credentials() {
        let mut config = config_with_sources(&["https://example.com/a"]);
        config.notifier = NotifierConfig::Pushover {
            user_key: String::new(),
            api_token: "token".to_string(),
            api_url: defaults::pushover_api(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn change_policy_filters_direction() {
        assert!(ChangePolicy::Any.allows(10, 12));
        assert!(ChangePolicy::Any.allows(12, 10));
        assert!(!ChangePolicy::Any.allows(10, 10));
        assert!(ChangePolicy::Increase.allows(10, 12));
        assert!(!ChangePolicy::Increase.allows(12, 10));
        assert!(ChangePolicy::Decrease.allows(12, 10));
    }

    #[test]
    fn load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[monitor]
interval_secs = 120
notify_on = "increase"

[notifier]
kind = "ntfy"
topic = "automonitor"

[[sources]]
url = "https://www.grailed.com/shop/nxzCtqQtfg"

[[sources]]
url = "https://www.grailed.com/shop/lRwSEkgxZw"
name = "second"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.monitor.interval_secs, 120);
        assert_eq!(config.monitor.fetch_timeout_secs, 30);
        assert_eq!(config.monitor.notify_on, ChangePolicy::Increase);
        assert_eq!(config.extractor.count_selector, "div.ais-Panel.-stats");
        assert!(matches!(
            &config.notifier,
            NotifierConfig::Ntfy { server, .. } if server == "https://ntfy.sh"
        ));
        assert_eq!(
            config.source_ids(),
            vec![
                "https://www.grailed.com/shop/nxzCtqQtfg".to_string(),
                "https://www.grailed.com/shop/lRwSEkgxZw".to_string(),
            ]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_or_default_falls_back_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("monitor.toml")).unwrap();
        assert!(config.sources.is_empty());
        assert_eq!(config.monitor.interval_secs, 600);
        assert!(config.extractor.refinement_selector().is_some());
    }

    #[test]
    fn load_or_default_rejects_broken_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[monitor]
interval_secs = "ten"

[notifier]
kind = "ntfy"
topic = "automonitor"
"#
        )
        .unwrap();

        let result = Config::load_or_default(file.path());
        assert!(matches!(result, Err(AppError::Toml(_))));
    }

    #[test]
    fn empty_refinement_selector_is_disabled() {
        let mut config = config_with_sources(&["https://www.grailed.com/shop/nxzCtqQtfg"]);
        config.extractor.refinement_selector = Some("  ".into());
        assert_eq!(config.extractor.refinement_selector(), None);
        assert!(config.validate().is_ok());

        config.extractor.refinement_selector = Some("ul[".into());
        assert!(matches!(
            config.validate(),
            Err(AppError::Selector { .. })
        ));
    }
}
