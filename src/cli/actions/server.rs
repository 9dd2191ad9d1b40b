use crate::arthos::new;
use crate::cli::actions::Action;
use anyhow::{anyhow, Result};
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server { port, dsn, globals } => {
            let dsn = Url::parse(&dsn)?;

            if !matches!(dsn.scheme(), "postgres" | "postgresql") {
                return Err(anyhow!("unsupported DSN scheme: {}", dsn.scheme()));
            }

            new(port, dsn.to_string(), &globals).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::globals::{Environment, GlobalArgs};
    use secrecy::SecretString;

    #[tokio::test]
    async fn test_rejects_non_postgres_dsn() {
        let action = Action::Server {
            port: 4000,
            dsn: "mysql://localhost/arthos".to_string(),
            globals: GlobalArgs::new(
                Environment::Development,
                SecretString::from("secret".to_string()),
            ),
        };

        let err = handle(action).await.unwrap_err();
        assert!(err.to_string().contains("unsupported DSN scheme"));
    }

    #[tokio::test]
    async fn test_rejects_malformed_dsn() {
        let action = Action::Server {
            port: 4000,
            dsn: "not a url".to_string(),
            globals: GlobalArgs::new(
                Environment::Development,
                SecretString::from("secret".to_string()),
            ),
        };

        assert!(handle(action).await.is_err());
    }
}
