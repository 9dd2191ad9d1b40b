//! Request context construction.
//!
//! Resolves the session cookie into the current user before resolvers run.
//! Every failure along the way (missing cookie, forged or expired token,
//! unreachable store) degrades to an anonymous context rather than rejecting
//! the request; handlers decide what an absent user means.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::{convert::Infallible, sync::Arc};
use tracing::debug;
use uuid::Uuid;

use crate::arthos::store::{self, Database, User};
use crate::session::{cookie, SessionClaims, SessionIssuer};

/// Per-request context: the session claims and the user they resolve to.
#[derive(Debug, Default)]
pub struct RequestContext {
    pub user: Option<User>,
    pub session: Option<SessionClaims>,
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (Some(issuer), Some(database)) = (
            parts.extensions.get::<Arc<SessionIssuer>>(),
            parts.extensions.get::<Database>(),
        ) else {
            return Ok(Self::default());
        };

        let Some(token) = cookie::extract_session_token(&parts.headers) else {
            return Ok(Self::default());
        };

        let claims = match issuer.verify(&token) {
            Ok(claims) => claims,
            Err(err) => {
                debug!("Ignoring invalid session cookie: {err}");
                return Ok(Self::default());
            }
        };

        let Ok(user_id) = Uuid::parse_str(&claims.user_id) else {
            return Ok(Self::default());
        };

        let Ok(pool) = database.pool().await else {
            debug!("Context lookup skipped, database unreachable");
            return Ok(Self {
                user: None,
                session: Some(claims),
            });
        };

        let user = match store::find_one_by_id(&pool, user_id).await {
            Ok(user) => user,
            Err(err) => {
                debug!("Context lookup failed: {err}");
                None
            }
        };

        Ok(Self {
            user,
            session: Some(claims),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn test_anonymous_without_collaborators() {
        let request = Request::builder().body(()).expect("request");
        let (mut parts, ()) = request.into_parts();

        let ctx = RequestContext::from_request_parts(&mut parts, &())
            .await
            .expect("infallible");

        assert!(ctx.user.is_none());
        assert!(ctx.session.is_none());
    }

    #[tokio::test]
    async fn test_anonymous_without_cookie() {
        use crate::cli::globals::{Environment, GlobalArgs};
        use secrecy::SecretString;

        let request = Request::builder().body(()).expect("request");
        let (mut parts, ()) = request.into_parts();

        let globals = GlobalArgs::new(
            Environment::Development,
            SecretString::from("secretTesting".to_string()),
        );
        parts
            .extensions
            .insert(Arc::new(SessionIssuer::new(&globals)));
        parts
            .extensions
            .insert(Database::new("postgres://localhost:5432/arthos".to_string()));

        let ctx = RequestContext::from_request_parts(&mut parts, &())
            .await
            .expect("infallible");

        assert!(ctx.user.is_none());
        assert!(ctx.session.is_none());
    }
}
