//! Mailbox service for SMAIL.
//!
//! Request-level control flow for viewing mail and creating mailboxes. All
//! per-client state arrives in the identity cookie and leaves in the returned
//! outcome; the service keeps nothing between requests.

use thiserror::Error;

use crate::config::MailboxConfig;
use crate::db::Database;
use crate::mail::{MailRecord, MailRepository};
use crate::verify::TurnstileVerifier;
use crate::SmailError;

use super::codec::IdentityCodec;
use super::store::add_if_absent;
use super::types::{validate_display_name, IdentityList, MailboxIdentity};

/// Notice shown when the mail store could not be queried.
pub const MAIL_UNAVAILABLE_NOTICE: &str = "Messages are temporarily unavailable";

/// Request to create a mailbox.
#[derive(Debug, Clone, Default)]
pub struct CreateMailboxRequest {
    /// Requested display name, used verbatim.
    pub display_name: String,
    /// Human-verification proof.
    pub verification_proof: Option<String>,
    /// Client IP forwarded to the verification service.
    pub remote_ip: Option<String>,
}

impl CreateMailboxRequest {
    /// Create a new request without a proof.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    /// Attach a verification proof.
    pub fn with_proof(mut self, proof: impl Into<String>) -> Self {
        self.verification_proof = Some(proof.into());
        self
    }

    /// Attach the client IP.
    pub fn with_remote_ip(mut self, ip: impl Into<String>) -> Self {
        self.remote_ip = Some(ip.into());
        self
    }
}

/// Successful outcome of a creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A mailbox was added; the client must store the new cookie value.
    Created {
        /// The new mailbox.
        identity: MailboxIdentity,
        /// Encoded identity list including the new mailbox.
        cookie_value: String,
    },
    /// Nothing changed; the client keeps its current cookie.
    Unchanged,
}

/// Creation rejected with a message meant for the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateRejected {
    /// The verification proof was missing or not accepted.
    #[error("Failed to pass the turnstile")]
    VerificationFailed,
    /// The display name cannot be used as an address.
    #[error("{0}")]
    InvalidName(String),
    /// The client already holds the maximum number of mailboxes.
    #[error("You can hold at most {max} mailboxes")]
    LimitReached {
        /// Configured cap.
        max: usize,
    },
    /// The identity list cookie has no room for another mailbox.
    #[error("Your mailbox list is full; no more mailboxes fit in this browser")]
    CookieFull,
}

/// Data for the mailbox page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxView {
    /// Mailboxes held by the client.
    pub mailboxes: IdentityList,
    /// Messages addressed to any held mailbox.
    pub mails: Vec<MailRecord>,
    /// Advisory "currently selected" address from the client.
    pub current: Option<String>,
    /// Non-fatal notice for the page.
    pub notice: Option<String>,
}

enum CreateFailure {
    Rejected(CreateRejected),
    Fault(SmailError),
}

/// Service for mailbox operations.
pub struct MailboxService {
    db: Database,
    verifier: TurnstileVerifier,
    codec: IdentityCodec,
    domain: String,
    max_identities: usize,
}

impl MailboxService {
    /// Create a new MailboxService.
    pub fn new(
        db: Database,
        verifier: TurnstileVerifier,
        codec: IdentityCodec,
        config: &MailboxConfig,
    ) -> Self {
        Self {
            db,
            verifier,
            codec,
            domain: config.domain.clone(),
            max_identities: config.max_identities,
        }
    }

    /// Whether creation is gated by human verification.
    pub fn verification_enabled(&self) -> bool {
        self.verifier.is_enabled()
    }

    /// Decode the identity cookie.
    pub fn mailboxes(&self, identity_cookie: Option<&str>) -> IdentityList {
        self.codec.decode(identity_cookie)
    }

    /// Build the mailbox page.
    ///
    /// No query is issued when the client holds no mailboxes. A mail store
    /// failure yields an empty message list and a notice.
    pub async fn view(&self, identity_cookie: Option<&str>, current: Option<String>) -> MailboxView {
        let mailboxes = self.codec.decode(identity_cookie);

        let (mails, notice) = if mailboxes.is_empty() {
            (Vec::new(), None)
        } else {
            let repo = MailRepository::new(self.db.pool());
            match repo.list_by_recipients(&mailboxes.addresses()).await {
                Ok(mails) => (mails, None),
                Err(e) => {
                    tracing::error!(error = %e, mailboxes = mailboxes.len(), "Failed to load mails");
                    (Vec::new(), Some(MAIL_UNAVAILABLE_NOTICE.to_string()))
                }
            }
        };

        MailboxView {
            mailboxes,
            mails,
            current,
            notice,
        }
    }

    /// Create a mailbox.
    ///
    /// Re-submitting a name the client already holds is not an error and
    /// yields [`CreateOutcome::Unchanged`]. Internal faults are logged and
    /// also yield `Unchanged`, so the client never sees them.
    pub async fn create(
        &self,
        identity_cookie: Option<&str>,
        request: &CreateMailboxRequest,
    ) -> Result<CreateOutcome, CreateRejected> {
        match self.try_create(identity_cookie, request).await {
            Ok(outcome) => Ok(outcome),
            Err(CreateFailure::Rejected(rejected)) => Err(rejected),
            Err(CreateFailure::Fault(e)) => {
                tracing::error!(error = %e, "Mailbox creation failed; leaving cookie unchanged");
                Ok(CreateOutcome::Unchanged)
            }
        }
    }

    async fn try_create(
        &self,
        identity_cookie: Option<&str>,
        request: &CreateMailboxRequest,
    ) -> Result<CreateOutcome, CreateFailure> {
        let display_name = request.display_name.as_str();
        validate_display_name(display_name).map_err(|e| match e {
            SmailError::Validation(msg) => CreateFailure::Rejected(CreateRejected::InvalidName(msg)),
            other => CreateFailure::Fault(other),
        })?;

        if self.verifier.is_enabled() {
            let passed = self
                .verifier
                .verify(
                    request.verification_proof.as_deref(),
                    request.remote_ip.as_deref(),
                )
                .await;
            if !passed {
                return Err(CreateFailure::Rejected(CreateRejected::VerificationFailed));
            }
        }

        let current = self.codec.decode(identity_cookie);
        if !current.contains_name(display_name) && current.is_full(self.max_identities) {
            return Err(CreateFailure::Rejected(CreateRejected::LimitReached {
                max: self.max_identities,
            }));
        }

        let outcome = add_if_absent(current, display_name, &self.domain);
        let Some(identity) = outcome.created else {
            tracing::debug!(display_name, "Mailbox already held");
            return Ok(CreateOutcome::Unchanged);
        };

        let cookie_value = self.codec.encode(&outcome.list).map_err(|e| match e {
            SmailError::CookieTooLarge { len, max } => {
                tracing::info!(len, max, mailboxes = outcome.list.len(), "Identity cookie full");
                CreateFailure::Rejected(CreateRejected::CookieFull)
            }
            other => CreateFailure::Fault(other),
        })?;
        tracing::info!(
            address = %identity.address,
            mailboxes = outcome.list.len(),
            "Mailbox created"
        );

        Ok(CreateOutcome::Created {
            identity,
            cookie_value,
        })
    }
}
