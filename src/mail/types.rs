//! Mail types for SMAIL.

use serde::Serialize;

/// A received message as stored in the mail store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct MailRecord {
    /// Message ID.
    pub id: String,
    /// Sender address.
    pub message_from: String,
    /// Recipient address. The read path joins on this column.
    pub message_to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub text: Option<String>,
    /// HTML body.
    pub html: Option<String>,
    /// When the message was received.
    pub created_at: String,
}
