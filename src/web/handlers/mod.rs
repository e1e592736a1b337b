//! Request handlers for the web surface.

pub mod mailbox;

pub use mailbox::*;

use crate::config::Config;
use crate::db::Database;
use crate::mailbox::{IdentityCodec, MailboxService};
use crate::verify::TurnstileVerifier;
use crate::web::cookies::CookieSettings;
use crate::web::dto::TurnstileInfo;
use crate::Result;

/// Application state shared across handlers.
pub struct AppState {
    /// Mailbox operations.
    pub mailbox: MailboxService,
    /// Attributes for cookies set in responses.
    pub cookies: CookieSettings,
    /// Public verification widget key.
    pub site_key: String,
    /// Whether forwarding headers identify the client.
    pub trust_proxy_headers: bool,
}

impl AppState {
    /// Create a new application state.
    pub fn new(mailbox: MailboxService, cookies: CookieSettings, site_key: impl Into<String>) -> Self {
        Self {
            mailbox,
            cookies,
            site_key: site_key.into(),
            trust_proxy_headers: false,
        }
    }

    /// Take the client IP from forwarding headers.
    pub fn with_trusted_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    /// Build the state from configuration.
    pub fn from_config(config: &Config, db: Database) -> Result<Self> {
        let codec = IdentityCodec::new(&config.web.cookie_secrets, config.mailbox.max_identities)?;
        let verifier = TurnstileVerifier::new(&config.turnstile)?;
        let mailbox = MailboxService::new(db, verifier, codec, &config.mailbox);

        Ok(Self::new(
            mailbox,
            CookieSettings::from_config(&config.web),
            config.turnstile.site_key.clone(),
        )
        .with_trusted_proxy_headers(config.web.trust_proxy_headers))
    }

    /// Widget settings for the page.
    pub fn turnstile_info(&self) -> TurnstileInfo {
        let enabled = self.mailbox.verification_enabled();
        TurnstileInfo {
            enabled,
            site_key: if enabled {
                self.site_key.clone()
            } else {
                String::new()
            },
        }
    }
}
