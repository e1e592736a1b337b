//! Cloudflare Turnstile verification client.
//!
//! Every uncertain outcome (missing proof, network failure, timeout, non-2xx
//! status, unreadable body) is reported as "not verified".

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::TurnstileConfig;
use crate::{Result, SmailError};

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// User agent string for verification requests.
const USER_AGENT: &str = "SMAIL/1.0 (Turnstile)";

#[derive(Debug, Serialize)]
struct SiteverifyRequest<'a> {
    secret: &'a str,
    response: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    remoteip: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Human-verification gate in front of mailbox creation.
#[derive(Debug, Clone)]
pub struct TurnstileVerifier {
    enabled: bool,
    secret: String,
    endpoint: String,
    client: Client,
}

impl TurnstileVerifier {
    /// Create a verifier from configuration.
    pub fn new(config: &TurnstileConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SmailError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            enabled: config.enabled,
            secret: config.secret.clone(),
            endpoint: config.verify_endpoint.clone(),
            client,
        })
    }

    /// Whether creation requires a verification proof.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Check a verification proof.
    ///
    /// An absent or empty proof returns `false` without a network call.
    /// Otherwise exactly one request is made; there is no retry.
    pub async fn verify(&self, proof: Option<&str>, remote_ip: Option<&str>) -> bool {
        let Some(proof) = proof.filter(|p| !p.is_empty()) else {
            tracing::debug!("No verification proof submitted");
            return false;
        };

        match self.siteverify(proof, remote_ip).await {
            Ok(resp) if resp.success => true,
            Ok(resp) => {
                tracing::info!(error_codes = ?resp.error_codes, "Verification proof rejected");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Verification request failed");
                false
            }
        }
    }

    async fn siteverify(&self, proof: &str, remote_ip: Option<&str>) -> Result<SiteverifyResponse> {
        let body = SiteverifyRequest {
            secret: &self.secret,
            response: proof,
            remoteip: remote_ip,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| SmailError::Verification(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(SmailError::Verification(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        response
            .json::<SiteverifyResponse>()
            .await
            .map_err(|e| SmailError::Verification(format!("invalid response: {e}")))
    }
}
