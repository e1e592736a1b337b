//! Signed cookie codec for identity lists.
//!
//! The cookie value is a compact HS256 JWS whose payload is
//! `{"mailboxes": [...]}`. No time-based claims are included, so encoding the
//! same list with the same key always yields the same value. Expiry is left to
//! the cookie's `Max-Age`.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::types::{IdentityList, MailboxIdentity};
use crate::{Result, SmailError};

/// Name of the cookie carrying the signed identity list.
pub const IDENTITY_LIST_COOKIE: &str = "identity-list";

/// Browsers cap a cookie's `name=value` pair at 4096 bytes.
const MAX_COOKIE_PAIR_LENGTH: usize = 4096;

/// Upper bound on an encoded or accepted cookie value.
pub const MAX_COOKIE_VALUE_LENGTH: usize =
    MAX_COOKIE_PAIR_LENGTH - IDENTITY_LIST_COOKIE.len() - "=".len();

#[derive(Serialize)]
struct IdentityClaimsRef<'a> {
    mailboxes: &'a IdentityList,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct IdentityClaims {
    mailboxes: Vec<MailboxIdentity>,
}

/// Encodes and decodes the identity list cookie.
#[derive(Clone)]
pub struct IdentityCodec {
    encoding_key: EncodingKey,
    decoding_keys: Vec<DecodingKey>,
    validation: Validation,
    max_identities: usize,
}

impl IdentityCodec {
    /// Create a codec from signing secrets.
    ///
    /// The first non-empty secret signs; every non-empty secret verifies.
    pub fn new(secrets: &[String], max_identities: usize) -> Result<Self> {
        let secrets: Vec<&String> = secrets.iter().filter(|s| !s.is_empty()).collect();
        let signing = secrets
            .first()
            .ok_or_else(|| SmailError::Config("no cookie secret configured".to_string()))?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(signing.as_bytes()),
            decoding_keys: secrets
                .iter()
                .map(|s| DecodingKey::from_secret(s.as_bytes()))
                .collect(),
            validation,
            max_identities,
        })
    }

    /// Encode a list into a signed cookie value.
    ///
    /// Fails with [`SmailError::CookieTooLarge`] if the value plus the cookie
    /// name would exceed what a browser stores, which is also the limit
    /// [`decode`](Self::decode) accepts.
    pub fn encode(&self, list: &IdentityList) -> Result<String> {
        let value = encode(
            &Header::new(Algorithm::HS256),
            &IdentityClaimsRef { mailboxes: list },
            &self.encoding_key,
        )
        .map_err(|e| SmailError::Cookie(format!("failed to sign identity list: {e}")))?;

        if value.len() > MAX_COOKIE_VALUE_LENGTH {
            return Err(SmailError::CookieTooLarge {
                len: value.len(),
                max: MAX_COOKIE_VALUE_LENGTH,
            });
        }
        Ok(value)
    }

    /// Decode a cookie value into a list.
    ///
    /// Anything that is not a value produced by [`encode`](Self::encode) with
    /// a configured key, or that fails re-validation, yields the empty list.
    pub fn decode(&self, raw: Option<&str>) -> IdentityList {
        let Some(raw) = raw.filter(|r| !r.is_empty()) else {
            return IdentityList::new();
        };

        if raw.len() > MAX_COOKIE_VALUE_LENGTH {
            tracing::debug!(len = raw.len(), "Identity cookie too long; ignoring");
            return IdentityList::new();
        }

        let Some(claims) = self
            .decoding_keys
            .iter()
            .find_map(|key| decode::<IdentityClaims>(raw, key, &self.validation).ok())
        else {
            tracing::debug!("Identity cookie failed verification; ignoring");
            return IdentityList::new();
        };

        IdentityList::from_untrusted(claims.claims.mailboxes, self.max_identities).unwrap_or_else(
            || {
                tracing::debug!("Identity cookie payload failed validation; ignoring");
                IdentityList::new()
            },
        )
    }
}
