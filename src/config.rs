//! Application configuration.
//!
//! Everything is read once at startup from `CHATMAP_*` environment variables
//! and validated before the server starts.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::llm::LlmConfig;
use crate::prompt::PromptStyle;
use crate::scraping::ScrapingConfig;

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;
/// Default interval between idle-session sweeps.
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is present but cannot be parsed.
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },
    /// Values parse but break an invariant.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// The model URL is not a valid URL.
    #[error("invalid model URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Convenience result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Session retention settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetentionConfig {
    /// Idle time after which a session is evicted; `None` keeps sessions forever.
    pub idle_ttl: Option<Duration>,
    /// Interval between eviction sweeps.
    pub cleanup_interval: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            idle_ttl: None,
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
        }
    }
}

/// Top-level application configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Listen port.
    pub port: u16,
    /// Model endpoint settings.
    pub llm: LlmConfig,
    /// Prompt shape sent to the model.
    pub prompt_style: PromptStyle,
    /// Whether `/ask` enriches prompts with scraped web sources.
    pub web_context: bool,
    /// Scraper settings, used when `web_context` is on.
    pub scraping: ScrapingConfig,
    /// `SQLite` file for persistent sessions; in-memory when `None`.
    pub sqlite_path: Option<PathBuf>,
    /// Session retention.
    pub retention: RetentionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            llm: LlmConfig::default(),
            prompt_style: PromptStyle::default(),
            web_context: false,
            scraping: ScrapingConfig::default(),
            sqlite_path: None,
            retention: RetentionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from the process environment.
    ///
    /// # Errors
    /// Returns an error if a variable is malformed or validation fails.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns an error if a variable is malformed or validation fails.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(port) = parsed(&get, "CHATMAP_PORT")? {
            config.port = port;
        }
        if let Some(url) = get("CHATMAP_LLM_URL") {
            config.llm.base_url = url;
        }
        config.llm.api_key = get("CHATMAP_LLM_API_KEY");
        if let Some(model) = get("CHATMAP_MODEL") {
            config.llm.model = model;
        }
        if let Some(temperature) = parsed(&get, "CHATMAP_TEMPERATURE")? {
            config.llm.temperature = temperature;
        }
        if let Some(max_tokens) = parsed(&get, "CHATMAP_MAX_TOKENS")? {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(secs) = parsed(&get, "CHATMAP_LLM_TIMEOUT_SECS")? {
            config.llm.timeout = Duration::from_secs(secs);
        }
        if let Some(style) = parsed(&get, "CHATMAP_PROMPT_STYLE")? {
            config.prompt_style = style;
        }
        if let Some(enabled) = get("CHATMAP_WEB_CONTEXT") {
            config.web_context = parse_flag("CHATMAP_WEB_CONTEXT", &enabled)?;
        }
        config.sqlite_path = get("CHATMAP_SQLITE_PATH").map(PathBuf::from);
        if let Some(secs) = parsed::<u64, _>(&get, "CHATMAP_SESSION_IDLE_TTL_SECS")? {
            config.retention.idle_ttl = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(secs) = parsed(&get, "CHATMAP_CLEANUP_INTERVAL_SECS")? {
            config.retention.cleanup_interval = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(
                "temperature must be within [0, 2]".to_string(),
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(ConfigError::Invalid("max_tokens must be > 0".to_string()));
        }

        if self.llm.model.is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".to_string()));
        }

        if self.retention.idle_ttl.is_some() && self.retention.cleanup_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "cleanup interval must be > 0 when session eviction is enabled".to_string(),
            ));
        }

        Url::parse(&self.llm.base_url)?;

        Ok(())
    }
}

fn parsed<T, G>(get: &G, name: &'static str) -> ConfigResult<Option<T>>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    get(name)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidValue { name, value })
        })
        .transpose()
}

fn parse_flag(name: &'static str, value: &str) -> ConfigResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        }),
    }
}
