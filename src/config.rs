//! Configuration module for SMAIL.

use serde::Deserialize;
use std::path::Path;

use crate::{Result, SmailError};

/// Web server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Secrets for signing the identity cookie.
    ///
    /// The first secret signs new cookies; every secret is accepted when
    /// verifying, so old secrets can be kept around during rotation.
    #[serde(default)]
    pub cookie_secrets: Vec<String>,
    /// Lifetime of the identity cookies in days.
    #[serde(default = "default_cookie_max_age")]
    pub cookie_max_age_days: i64,
    /// Whether cookies carry the `Secure` attribute.
    #[serde(default)]
    pub secure_cookies: bool,
    /// Rate limit for mailbox creation (requests per minute per IP).
    #[serde(default = "default_create_rate_limit")]
    pub create_rate_limit: u32,
    /// Take the client IP from `CF-Connecting-IP`, `X-Forwarded-For` or
    /// `X-Real-IP`.
    ///
    /// Only enable behind a proxy that overwrites these headers; otherwise
    /// any client can pick its own rate-limit key.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    8080
}

fn default_cookie_max_age() -> i64 {
    30
}

fn default_create_rate_limit() -> u32 {
    10
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: vec![],
            cookie_secrets: vec![],
            cookie_max_age_days: default_cookie_max_age(),
            secure_cookies: false,
            create_rate_limit: default_create_rate_limit(),
            trust_proxy_headers: false,
        }
    }
}

/// Mailbox configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailboxConfig {
    /// Domain appended to every display name.
    #[serde(default = "default_domain")]
    pub domain: String,
    /// Maximum number of mailboxes a client may hold.
    #[serde(default = "default_max_identities")]
    pub max_identities: usize,
}

fn default_domain() -> String {
    "smail.local".to_string()
}

fn default_max_identities() -> usize {
    20
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            max_identities: default_max_identities(),
        }
    }
}

/// Turnstile (human verification) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TurnstileConfig {
    /// Whether mailbox creation requires a verification proof.
    #[serde(default)]
    pub enabled: bool,
    /// Public site key handed to the front end widget.
    #[serde(default)]
    pub site_key: String,
    /// Shared secret sent to the verification service.
    #[serde(default)]
    pub secret: String,
    /// Verification endpoint.
    #[serde(default = "default_verify_endpoint")]
    pub verify_endpoint: String,
    /// Total request timeout in seconds.
    #[serde(default = "default_verify_timeout")]
    pub timeout_secs: u64,
}

fn default_verify_endpoint() -> String {
    "https://challenges.cloudflare.com/turnstile/v0/siteverify".to_string()
}

fn default_verify_timeout() -> u64 {
    10
}

impl Default for TurnstileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            site_key: String::new(),
            secret: String::new(),
            verify_endpoint: default_verify_endpoint(),
            timeout_secs: default_verify_timeout(),
        }
    }
}

/// Mail store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite mail store.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Open the store read-only (no migrations are applied).
    #[serde(default = "default_read_only")]
    pub read_only: bool,
}

fn default_db_path() -> String {
    "data/mail.db".to_string()
}

fn default_read_only() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            read_only: default_read_only(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/smail.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Web server configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Mailbox configuration.
    #[serde(default)]
    pub mailbox: MailboxConfig,
    /// Human verification configuration.
    #[serde(default)]
    pub turnstile: TurnstileConfig,
    /// Mail store configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(SmailError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| SmailError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `SMAIL_COOKIE_SECRET`: replaces the cookie signing secrets
    /// - `SMAIL_DOMAIN`: mailbox domain
    /// - `SMAIL_DATABASE_PATH`: mail store path
    /// - `SMAIL_TRUST_PROXY_HEADERS`: `"true"` trusts forwarding headers
    /// - `TURNSTILE_ENABLED`: `"true"` enables verification, anything else disables it
    /// - `TURNSTILE_KEY`, `TURNSTILE_SECRET`, `TURNSTILE_VERIFY_ENDPOINT`
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(secret) = get("SMAIL_COOKIE_SECRET") {
            self.web.cookie_secrets = vec![secret];
        }
        if let Some(domain) = get("SMAIL_DOMAIN") {
            self.mailbox.domain = domain;
        }
        if let Some(path) = get("SMAIL_DATABASE_PATH") {
            self.database.path = path;
        }
        if let Some(trust) = get("SMAIL_TRUST_PROXY_HEADERS") {
            self.web.trust_proxy_headers = trust == "true";
        }
        if let Some(enabled) = get("TURNSTILE_ENABLED") {
            self.turnstile.enabled = enabled == "true";
        }
        if let Some(site_key) = get("TURNSTILE_KEY") {
            self.turnstile.site_key = site_key;
        }
        if let Some(secret) = get("TURNSTILE_SECRET") {
            self.turnstile.secret = secret;
        }
        if let Some(endpoint) = get("TURNSTILE_VERIFY_ENDPOINT") {
            self.turnstile.verify_endpoint = endpoint;
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - No non-empty cookie secret is configured
    /// - The mailbox domain is empty or contains `@`, whitespace or control
    ///   characters
    /// - `max_identities` is zero
    /// - Turnstile is enabled without a secret or with an invalid endpoint
    pub fn validate(&self) -> Result<()> {
        if self.web.cookie_secrets.iter().all(|s| s.is_empty()) {
            return Err(SmailError::Config(
                "cookie_secrets is not set. \
                 Set it in config.toml or via SMAIL_COOKIE_SECRET environment variable."
                    .to_string(),
            ));
        }

        let domain = &self.mailbox.domain;
        if domain.trim().is_empty() {
            return Err(SmailError::Config("mailbox domain is empty".to_string()));
        }
        if domain
            .chars()
            .any(|c| c == '@' || c.is_whitespace() || c.is_control())
        {
            return Err(SmailError::Config(format!(
                "mailbox domain {domain:?} must not contain '@', whitespace or control characters"
            )));
        }

        if self.mailbox.max_identities == 0 {
            return Err(SmailError::Config(
                "mailbox max_identities must be at least 1".to_string(),
            ));
        }

        if self.turnstile.enabled {
            if self.turnstile.secret.is_empty() {
                return Err(SmailError::Config(
                    "Turnstile is enabled but secret is not set. \
                     Set it in config.toml or via TURNSTILE_SECRET environment variable."
                        .to_string(),
                ));
            }

            let endpoint = url::Url::parse(&self.turnstile.verify_endpoint).map_err(|e| {
                SmailError::Config(format!("invalid turnstile verify_endpoint: {e}"))
            })?;
            if !matches!(endpoint.scheme(), "http" | "https") {
                return Err(SmailError::Config(format!(
                    "unsupported verify_endpoint scheme: {}",
                    endpoint.scheme()
                )));
            }
        }

        Ok(())
    }
}
