//! Mailbox module for SMAIL.
//!
//! A client's mailboxes live entirely in a signed cookie. This module holds the
//! identity types, the pure add-if-absent operation, the cookie codec, and the
//! service that ties them to human verification and the mail store.

mod codec;
mod service;
mod store;
mod types;

pub use codec::{IdentityCodec, IDENTITY_LIST_COOKIE, MAX_COOKIE_VALUE_LENGTH};
pub use service::{
    CreateMailboxRequest, CreateOutcome, CreateRejected, MailboxService, MailboxView,
    MAIL_UNAVAILABLE_NOTICE,
};
pub use store::{
    add_if_absent, generate_identity_id, mailbox_address, AddOutcome, IDENTITY_ID_LENGTH,
};
pub use types::{
    validate_display_name, IdentityList, MailboxIdentity, MAX_DISPLAY_NAME_LENGTH,
    MAX_IDENTITY_ID_LENGTH,
};
