use crate::cli::{
    actions::Action,
    globals::{Environment, GlobalArgs, DEV_FALLBACK_TOKEN_SECRET},
};
use anyhow::{anyhow, Result};
use secrecy::SecretString;
use tracing::warn;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let environment = matches
        .get_one::<String>("environment")
        .map_or("development", String::as_str)
        .parse::<Environment>()
        .map_err(|err| anyhow!(err))?;

    // The signing secret is required configuration; the historical fallback
    // value only survives in development.
    let token_secret = match matches.get_one::<String>("token-secret") {
        Some(secret) => SecretString::from(secret.clone()),
        None if environment.is_development() => {
            warn!("ACCESS_TOKEN_SECRET not set, using the development fallback secret");
            SecretString::from(DEV_FALLBACK_TOKEN_SECRET.to_string())
        }
        None => {
            return Err(anyhow!(
                "missing required argument: --token-secret (required outside development)"
            ))
        }
    };

    let mut globals = GlobalArgs::new(environment, token_secret);

    if let Some(ttl) = matches.get_one::<i64>("token-ttl") {
        globals.session_ttl_seconds = *ttl;
    }
    globals.verify_credentials = matches.get_flag("verify-credentials");
    globals.email_verifier_url = matches.get_one::<String>("email-verifier-url").cloned();

    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(4000),
        dsn: matches
            .get_one("dsn")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow!("missing required argument: --dsn"))?,
        globals,
    })
}
