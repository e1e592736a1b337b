//! SMAIL - disposable multi-mailbox service
//!
//! Visitors create throwaway mailboxes under a shared domain. The mailboxes a
//! client holds are kept in a signed cookie, creation is gated by human
//! verification, and received mail is read from an external SQLite store.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod mail;
pub mod mailbox;
pub mod verify;
pub mod web;

pub use config::Config;
pub use db::{Database, DbPool};
pub use error::{Result, SmailError};
pub use mail::{MailRecord, MailRepository};
pub use mailbox::{
    CreateMailboxRequest, CreateOutcome, CreateRejected, IdentityCodec, IdentityList,
    MailboxIdentity, MailboxService, MailboxView,
};
pub use verify::TurnstileVerifier;
pub use web::WebServer;
