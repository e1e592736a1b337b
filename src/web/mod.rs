//! Web surface for SMAIL.
//!
//! A small form-driven HTTP interface: `GET /` returns the client's mailboxes
//! and mail as JSON, `POST /` creates a mailbox and redirects back.

pub mod cookies;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::{create_health_router, create_router};
pub use server::WebServer;
