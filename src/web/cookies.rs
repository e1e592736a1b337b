//! Cookie handling for the web surface.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::WebConfig;

pub use crate::mailbox::IDENTITY_LIST_COOKIE;

/// Cookie carrying the advisory currently selected address.
pub const CURRENT_IDENTITY_COOKIE: &str = "current-identity";

/// Attributes applied to every cookie the service sets.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    secure: bool,
    max_age: time::Duration,
}

impl CookieSettings {
    /// Create settings.
    pub fn new(secure: bool, max_age_days: i64) -> Self {
        Self {
            secure,
            max_age: time::Duration::days(max_age_days),
        }
    }

    /// Create settings from web configuration.
    pub fn from_config(config: &WebConfig) -> Self {
        Self::new(config.secure_cookies, config.cookie_max_age_days)
    }

    fn build(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(self.max_age)
            .build()
    }

    /// Cookie storing the encoded identity list.
    pub fn identity_list(&self, value: String) -> Cookie<'static> {
        self.build(IDENTITY_LIST_COOKIE, value)
    }

    /// Cookie storing the selected address.
    pub fn current_identity(&self, address: String) -> Cookie<'static> {
        self.build(CURRENT_IDENTITY_COOKIE, address)
    }
}

/// Raw identity list cookie value, if present.
pub fn identity_list_value(jar: &CookieJar) -> Option<&str> {
    jar.get(IDENTITY_LIST_COOKIE).map(|c| c.value())
}

/// Selected address cookie value, if present and non-empty.
pub fn current_identity_value(jar: &CookieJar) -> Option<String> {
    jar.get(CURRENT_IDENTITY_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
