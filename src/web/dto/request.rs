//! Request DTOs for the web surface.
//!
//! Both forms arrive as `application/x-www-form-urlencoded`.

use serde::Deserialize;
use validator::Validate;

use super::validation::no_control_chars;

/// Mailbox creation form (`POST /`).
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateMailboxForm {
    /// Requested mailbox name.
    #[serde(rename = "displayName", alias = "userName", default)]
    #[validate(
        length(max = 64, message = "Mailbox name must be at most 64 characters"),
        custom(function = "no_control_chars")
    )]
    pub display_name: String,
    /// Human-verification proof from the widget.
    #[serde(
        rename = "verificationProof",
        alias = "cf-turnstile-response",
        default
    )]
    #[validate(length(max = 2048, message = "Verification proof is too long"))]
    pub verification_proof: Option<String>,
}

/// Mailbox selection form (`POST /current`).
#[derive(Debug, Deserialize, Validate)]
pub struct SelectMailboxForm {
    /// Address to mark as selected.
    #[validate(
        length(min = 1, max = 320, message = "Address must be 1-320 characters"),
        custom(function = "no_control_chars")
    )]
    pub address: String,
}
