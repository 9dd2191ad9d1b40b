use secrecy::SecretString;
use std::{fmt, str::FromStr};

/// Signing secret used when none is configured in development.
pub const DEV_FALLBACK_TOKEN_SECRET: &str = "secretTesting";

/// Default lifetime of an issued session token, in seconds.
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub environment: Environment,
    pub token_secret: SecretString,
    pub session_ttl_seconds: i64,
    pub verify_credentials: bool,
    pub email_verifier_url: Option<String>,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(environment: Environment, token_secret: SecretString) -> Self {
        Self {
            environment,
            token_secret,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            verify_credentials: false,
            email_verifier_url: None,
        }
    }
}
