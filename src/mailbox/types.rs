//! Mailbox identity types for SMAIL.

use serde::{Deserialize, Serialize};

use crate::{Result, SmailError};

/// Maximum length of a display name (the local part of an address).
pub const MAX_DISPLAY_NAME_LENGTH: usize = 64;

/// Maximum length of an identity ID accepted from a cookie.
pub const MAX_IDENTITY_ID_LENGTH: usize = 64;

/// A throwaway mailbox held by a client.
///
/// Field names on the wire are `id`, `displayName` and `address`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MailboxIdentity {
    /// Random token used for UI keying only.
    pub id: String,
    /// Name chosen by the visitor.
    pub display_name: String,
    /// `display_name@domain`.
    pub address: String,
}

impl MailboxIdentity {
    /// Check that this entry is well formed.
    ///
    /// The address must be the display name followed by `@` and a single
    /// non-empty domain.
    fn is_well_formed(&self) -> bool {
        if self.id.is_empty() || self.id.len() > MAX_IDENTITY_ID_LENGTH {
            return false;
        }
        if validate_display_name(&self.display_name).is_err() {
            return false;
        }
        match self
            .address
            .strip_prefix(self.display_name.as_str())
            .and_then(|rest| rest.strip_prefix('@'))
        {
            Some(domain) => !domain.is_empty() && !domain.contains('@'),
            None => false,
        }
    }
}

/// Ordered list of mailboxes held by a client, most recently added last.
///
/// No two entries share a display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IdentityList(Vec<MailboxIdentity>);

impl IdentityList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from untrusted entries.
    ///
    /// Returns `None` if the entries exceed `max_len`, repeat a display name,
    /// or contain a malformed entry.
    pub fn from_untrusted(entries: Vec<MailboxIdentity>, max_len: usize) -> Option<Self> {
        if entries.len() > max_len {
            return None;
        }

        let mut list = Self(Vec::with_capacity(entries.len()));
        for entry in entries {
            if !entry.is_well_formed() || list.contains_name(&entry.display_name) {
                return None;
            }
            list.0.push(entry);
        }
        Some(list)
    }

    /// Number of mailboxes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list holds no mailboxes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the mailboxes in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, MailboxIdentity> {
        self.0.iter()
    }

    /// Most recently added mailbox.
    pub fn latest(&self) -> Option<&MailboxIdentity> {
        self.0.last()
    }

    /// Whether a mailbox with exactly this display name is present.
    pub fn contains_name(&self, display_name: &str) -> bool {
        self.0.iter().any(|m| m.display_name == display_name)
    }

    /// Whether the list has reached `max_len` entries.
    pub fn is_full(&self, max_len: usize) -> bool {
        self.0.len() >= max_len
    }

    /// Addresses of every mailbox, in insertion order.
    pub fn addresses(&self) -> Vec<String> {
        self.0.iter().map(|m| m.address.clone()).collect()
    }

    pub(crate) fn push(&mut self, identity: MailboxIdentity) {
        self.0.push(identity);
    }
}

impl<'a> IntoIterator for &'a IdentityList {
    type Item = &'a MailboxIdentity;
    type IntoIter = std::slice::Iter<'a, MailboxIdentity>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Check that a display name can be used as the local part of an address.
///
/// Names are used verbatim: case is preserved and nothing is trimmed. A name
/// that would need changing is rejected instead.
pub fn validate_display_name(display_name: &str) -> Result<()> {
    if display_name.is_empty() {
        return Err(SmailError::Validation(
            "Mailbox name must not be empty".to_string(),
        ));
    }
    if display_name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        return Err(SmailError::Validation(format!(
            "Mailbox name must be at most {MAX_DISPLAY_NAME_LENGTH} characters"
        )));
    }
    if display_name.contains('@') {
        return Err(SmailError::Validation(
            "Mailbox name must not contain '@'".to_string(),
        ));
    }
    if display_name
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(SmailError::Validation(
            "Mailbox name must not contain spaces or control characters".to_string(),
        ));
    }
    Ok(())
}
