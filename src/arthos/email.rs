//! Email validation collaborators.
//!
//! The signup flow only consumes the [`EmailVerifier`] trait. Two
//! implementations ship with the service: a syntax-only check for local dev
//! and a client for a remote verification service that also performs
//! mailbox-level (SMTP) probes. The verdict's reason feeds the user-facing
//! rejection message, so the remote service's `smtp` reason is meaningful.

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::{future::Future, pin::Pin, time::Duration};

use crate::APP_USER_AGENT;

/// Rejection reasons a verifier may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectReason {
    Smtp,
    Syntax,
    Disposable,
    Mx,
    Unknown,
}

impl RejectReason {
    /// Reasons a verification service may report on the wire; anything
    /// unrecognized collapses to [`Self::Unknown`].
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        match value {
            "smtp" => Self::Smtp,
            "syntax" | "regex" => Self::Syntax,
            "disposable" => Self::Disposable,
            "mx" => Self::Mx,
            _ => Self::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for RejectReason {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&value))
    }
}

/// Verdict returned by a verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EmailVerdict {
    pub valid: bool,
    #[serde(default)]
    pub reason: Option<RejectReason>,
}

impl EmailVerdict {
    #[must_use]
    pub const fn accept() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    #[must_use]
    pub const fn reject(reason: RejectReason) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// Email validation abstraction used by the signup flow.
pub trait EmailVerifier: Send + Sync {
    fn verify<'a>(
        &'a self,
        email: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<EmailVerdict>> + Send + 'a>>;
}

pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

/// Syntax-only verifier, the default when no verification service is
/// configured.
#[derive(Clone, Debug)]
pub struct SyntaxEmailVerifier;

impl EmailVerifier for SyntaxEmailVerifier {
    fn verify<'a>(
        &'a self,
        email: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<EmailVerdict>> + Send + 'a>> {
        Box::pin(async move {
            if valid_email(email) {
                Ok(EmailVerdict::accept())
            } else {
                Ok(EmailVerdict::reject(RejectReason::Syntax))
            }
        })
    }
}

/// Verifier backed by a remote verification service.
#[derive(Debug)]
pub struct HttpEmailVerifier {
    client: Client,
    url: String,
}

impl HttpEmailVerifier {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(url: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(5))
            .build()
            .context("failed to build email verifier HTTP client")?;

        Ok(Self { client, url })
    }
}

impl EmailVerifier for HttpEmailVerifier {
    fn verify<'a>(
        &'a self,
        email: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<EmailVerdict>> + Send + 'a>> {
        Box::pin(async move {
            // Cheap local check before going to the network.
            if !valid_email(email) {
                return Ok(EmailVerdict::reject(RejectReason::Syntax));
            }

            #[derive(Serialize)]
            struct VerifyRequest<'a> {
                email: &'a str,
            }

            let response = self
                .client
                .post(&self.url)
                .json(&VerifyRequest { email })
                .send()
                .await
                .context("failed to send email verification request")?;

            if !response.status().is_success() {
                return Err(anyhow!(
                    "email verification failed with status {}",
                    response.status()
                ));
            }

            response
                .json::<EmailVerdict>()
                .await
                .context("failed to decode email verification response")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(valid_email("ada@example.com"));
        assert!(valid_email("a.b+c@sub.example.org"));
        assert!(!valid_email("ada@example"));
        assert!(!valid_email("ada example@example.com"));
        assert!(!valid_email("@example.com"));
        assert!(!valid_email(""));
    }

    #[tokio::test]
    async fn test_syntax_verifier_accepts() {
        let verdict = SyntaxEmailVerifier
            .verify("ada@example.com")
            .await
            .expect("verdict");
        assert!(verdict.valid);
        assert!(verdict.reason.is_none());
    }

    #[tokio::test]
    async fn test_syntax_verifier_rejects() {
        let verdict = SyntaxEmailVerifier
            .verify("not-an-email")
            .await
            .expect("verdict");
        assert!(!verdict.valid);
        assert_eq!(verdict.reason, Some(RejectReason::Syntax));
    }

    #[test]
    fn test_verdict_decoding() {
        let verdict: EmailVerdict =
            serde_json::from_str(r#"{"valid": false, "reason": "smtp"}"#).expect("decode");
        assert!(!verdict.valid);
        assert_eq!(verdict.reason, Some(RejectReason::Smtp));

        let verdict: EmailVerdict = serde_json::from_str(r#"{"valid": true}"#).expect("decode");
        assert!(verdict.valid);
        assert!(verdict.reason.is_none());
    }

    #[test]
    fn test_unknown_reason_decodes_to_catch_all() {
        let verdict: EmailVerdict =
            serde_json::from_str(r#"{"valid": false, "reason": "typo"}"#).expect("decode");
        assert_eq!(verdict.reason, Some(RejectReason::Unknown));
    }
}
