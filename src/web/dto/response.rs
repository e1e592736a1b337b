//! Response DTOs for the web surface.

use serde::Serialize;

use crate::mail::MailRecord;
use crate::mailbox::{MailboxIdentity, MailboxView};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Widget settings the page needs to render the verification challenge.
#[derive(Debug, Serialize)]
pub struct TurnstileInfo {
    /// Whether creation requires a proof.
    pub enabled: bool,
    /// Public site key, empty when disabled.
    pub site_key: String,
}

/// Mailbox page (`GET /`).
#[derive(Debug, Serialize)]
pub struct MailboxPageResponse {
    /// Mailboxes held by the client, oldest first.
    pub mailboxes: Vec<MailboxIdentity>,
    /// Messages addressed to any held mailbox.
    pub mails: Vec<MailRecord>,
    /// Selected address, as sent by the client.
    pub current: Option<String>,
    /// Non-fatal notice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    /// Verification widget settings.
    pub turnstile: TurnstileInfo,
}

impl MailboxPageResponse {
    /// Build the page from a service view.
    pub fn from_view(view: MailboxView, turnstile: TurnstileInfo) -> Self {
        Self {
            mailboxes: view.mailboxes.iter().cloned().collect(),
            mails: view.mails,
            current: view.current,
            notice: view.notice,
            turnstile,
        }
    }
}
