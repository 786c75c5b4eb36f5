//! Configuration loading and management.
//!
//! Loads configuration from `./vkbot.toml` (or `$VKBOT_CONFIG_PATH`).
//! Environment variables override file values; file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default VK API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.vk.com/method";

/// API version sent with every call.
pub const DEFAULT_API_VERSION: &str = "5.67";

/// Default webhook queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 20;

/// Largest webhook queue capacity accepted.
pub const MAX_QUEUE_CAPACITY: usize = 65_536;

// ── Top-level config ────────────────────────────────────────────

/// Top-level configuration loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// VK community credentials and API settings (`[bot]`).
    pub bot: BotConfig,
    /// Inbound webhook settings (`[webhook]`).
    pub webhook: WebhookConfig,
    /// Logging settings (`[logging]`).
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// Config file path: `$VKBOT_CONFIG_PATH` or `./vkbot.toml`.
    /// If the file does not exist, returns defaults.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from TOML file only, no env overrides.
    fn load_from_file() -> Result<Self> {
        let path = Self::config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(anyhow::anyhow!(
                "failed to read config file {}: {e}",
                path.display()
            )),
        }
    }

    /// Path [`Config::load`] reads: `$VKBOT_CONFIG_PATH` or `./vkbot.toml`.
    pub fn config_path() -> PathBuf {
        Self::config_path_with(|key| std::env::var(key).ok())
    }

    /// Resolve config path using a custom env resolver (for testing).
    fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        env("VKBOT_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("vkbot.toml"))
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability (avoids unsafe `set_var` in tests).
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        // Bot.
        if let Some(v) = env("VKBOT_ACCESS_TOKEN") {
            self.bot.access_tokens = v
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .collect();
        }
        if let Some(v) = env("VKBOT_GROUP_ID") {
            match v.parse() {
                Ok(n) => self.bot.group_id = n,
                Err(_) => tracing::warn!(
                    var = "VKBOT_GROUP_ID",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("VKBOT_SECRET") {
            self.bot.secret = v;
        }
        if let Some(v) = env("VKBOT_CONFIRMATION") {
            self.bot.confirmation = v;
        }

        // Webhook.
        if let Some(v) = env("VKBOT_BIND_ADDRESS") {
            match v.parse() {
                Ok(addr) => self.webhook.bind_address = addr,
                Err(_) => tracing::warn!(
                    var = "VKBOT_BIND_ADDRESS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("VKBOT_WEBHOOK_PATH") {
            self.webhook.path = v;
        }
        if let Some(v) = env("VKBOT_QUEUE_CAPACITY") {
            match v.parse() {
                Ok(n) => self.webhook.queue_capacity = n,
                Err(_) => tracing::warn!(
                    var = "VKBOT_QUEUE_CAPACITY",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }

        // Logging.
        if let Some(v) = env("VKBOT_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = env("VKBOT_LOGS_DIR") {
            self.logging.logs_dir = Some(PathBuf::from(v));
        }
    }

    /// Parse a TOML string into config.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }

    /// Check the values the adapter cannot run without.
    pub fn validate(&self) -> Result<()> {
        if self.bot.access_tokens.is_empty() {
            anyhow::bail!("bot.access_tokens must contain at least one token");
        }
        if self.bot.group_id == 0 {
            anyhow::bail!("bot.group_id must be set");
        }
        if self.bot.request_timeout_seconds == 0 {
            anyhow::bail!("bot.request_timeout_seconds must be at least 1");
        }
        if !(1..=MAX_QUEUE_CAPACITY).contains(&self.webhook.queue_capacity) {
            anyhow::bail!("webhook.queue_capacity must be between 1 and {MAX_QUEUE_CAPACITY}");
        }
        url::Url::parse(&self.bot.api_base_url).context("bot.api_base_url is not a valid URL")?;
        if !self.webhook.path.starts_with('/') {
            anyhow::bail!("webhook.path must start with '/'");
        }
        Ok(())
    }
}

// ── Bot config ──────────────────────────────────────────────────

/// VK community credentials and API settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Community access tokens, used in round-robin order.
    #[serde(alias = "access_token", deserialize_with = "one_or_many")]
    pub access_tokens: Vec<String>,
    /// Community identifier (positive).
    pub group_id: u64,
    /// Shared secret expected on every Callback API delivery.
    pub secret: String,
    /// String returned for the `confirmation` challenge.
    pub confirmation: String,
    /// API version sent as `v`.
    pub api_version: String,
    /// API base URL; methods are appended as `/{method}`.
    pub api_base_url: String,
    /// Outbound request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl BotConfig {
    /// Outbound request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field(
                "access_tokens",
                &format_args!("[__REDACTED__; {}]", self.access_tokens.len()),
            )
            .field("group_id", &self.group_id)
            .field("secret", &"__REDACTED__")
            .field("confirmation", &self.confirmation)
            .field("api_version", &self.api_version)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            access_tokens: Vec::new(),
            group_id: 0,
            secret: String::new(),
            confirmation: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_seconds: 30,
        }
    }
}

fn one_or_many<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::One(token) => vec![token],
        Raw::Many(tokens) => tokens,
    })
}

// ── Webhook config ──────────────────────────────────────────────

/// What the webhook does when the event queue is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Wait for space without limit.
    Block,
    /// Answer `503` immediately and drop the event.
    Reject,
    /// Wait up to `enqueue_timeout_ms`, then answer `503`.
    #[default]
    Timeout,
}

/// Inbound webhook settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Address the HTTP server binds to.
    pub bind_address: SocketAddr,
    /// URL path the Callback API posts to.
    pub path: String,
    /// Bounded queue capacity between the webhook and the consumer.
    pub queue_capacity: usize,
    /// Behaviour when the queue is full.
    pub overflow_policy: OverflowPolicy,
    /// Wait limit for [`OverflowPolicy::Timeout`], in milliseconds.
    pub enqueue_timeout_ms: u64,
}

impl WebhookConfig {
    /// Wait limit for [`OverflowPolicy::Timeout`].
    pub fn enqueue_timeout(&self) -> Duration {
        Duration::from_millis(self.enqueue_timeout_ms)
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            path: "/callback".to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            overflow_policy: OverflowPolicy::default(),
            enqueue_timeout_ms: 5_000,
        }
    }
}

// ── Logging config ──────────────────────────────────────────────

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for rotated JSON logs; console only when unset.
    pub logs_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            logs_dir: None,
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────
