//! Mail module for SMAIL.
//!
//! Read-only access to received messages, looked up by recipient address.

mod repository;
mod types;

pub use repository::MailRepository;
pub use types::MailRecord;
