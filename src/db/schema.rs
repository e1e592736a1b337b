//! Mail store schema.
//!
//! In production the store is owned by the mail ingestion side and opened
//! read-only. These migrations create the same layout for local stores and
//! tests.

/// Database migrations.
///
/// Each migration is a SQL script executed in order. The schema_version table
/// tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Received mail
    r#"
CREATE TABLE emails (
    id              TEXT PRIMARY KEY,
    message_from    TEXT NOT NULL,
    message_to      TEXT NOT NULL,
    subject         TEXT NOT NULL DEFAULT '',
    text            TEXT,
    html            TEXT,
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_emails_message_to ON emails(message_to);
CREATE INDEX idx_emails_created_at ON emails(created_at);
"#,
];
