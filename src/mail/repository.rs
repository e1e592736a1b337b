//! Mail repository for SMAIL.

use crate::db::DbPool;
use crate::{Result, SmailError};

use super::types::MailRecord;

/// Read-only access to the mail store.
pub struct MailRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> MailRepository<'a> {
    /// Create a new MailRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// List every message addressed to any of the given addresses.
    ///
    /// An empty address set returns an empty list without querying the store.
    /// Rows come back in the order the store's query yields them.
    pub async fn list_by_recipients(&self, addresses: &[String]) -> Result<Vec<MailRecord>> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders: String = addresses.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query = format!(
            "SELECT id, message_from, message_to, subject, text, html, created_at
             FROM emails WHERE message_to IN ({placeholders})
             ORDER BY created_at DESC, id DESC"
        );

        let mut query_builder = sqlx::query_as::<_, MailRecord>(&query);
        for address in addresses {
            query_builder = query_builder.bind(address);
        }

        let mails = query_builder
            .fetch_all(self.pool)
            .await
            .map_err(|e| SmailError::Database(e.to_string()))?;

        Ok(mails)
    }
}
