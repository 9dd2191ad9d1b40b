//! Session token issuance and cookie transport.
//!
//! Tokens are self-contained HS256 JWTs binding a user id to a short expiry;
//! nothing is stored server-side. The cookie writer in [`cookie`] is the only
//! way tokens reach the client.

pub mod cookie;
pub mod token;

pub use self::token::SessionClaims;

use crate::cli::globals::{Environment, GlobalArgs};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::error;

/// Issues and verifies session tokens with a process-wide secret.
#[derive(Debug)]
pub struct SessionIssuer {
    secret: SecretString,
    ttl_seconds: i64,
    environment: Environment,
}

impl SessionIssuer {
    #[must_use]
    pub fn new(globals: &GlobalArgs) -> Self {
        Self {
            secret: globals.token_secret.clone(),
            ttl_seconds: globals.session_ttl_seconds,
            environment: globals.environment,
        }
    }

    #[must_use]
    pub const fn environment(&self) -> Environment {
        self.environment
    }

    /// Issue a signed token for `user_id`, expiring `ttl_seconds` from now.
    ///
    /// A missing identifier yields `None` rather than an error; callers check
    /// for the absent token.
    #[must_use]
    pub fn issue(&self, user_id: &str) -> Option<String> {
        if user_id.is_empty() {
            return None;
        }

        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            user_id: user_id.to_string(),
            iat: now,
            exp: now + self.ttl_seconds,
        };

        match token::sign_hs256(self.secret.expose_secret().as_bytes(), &claims) {
            Ok(signed) => Some(signed),
            Err(err) => {
                error!("Failed to sign session token: {err}");
                None
            }
        }
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, forged, or expired.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, token::Error> {
        token::verify_hs256(
            self.secret.expose_secret().as_bytes(),
            token,
            Utc::now().timestamp(),
        )
    }
}
