//! Human verification for SMAIL.
//!
//! Mailbox creation is gated behind a proof token checked against an external
//! verification service.

mod turnstile;

pub use turnstile::TurnstileVerifier;
