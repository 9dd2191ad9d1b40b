use anyhow::anyhow;
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::arthos::error::{ApiError, ErrorBody};
use crate::arthos::handlers::Token;
use crate::arthos::store::{self, Database};
use crate::cli::globals::GlobalArgs;
use crate::session::{cookie, SessionIssuer};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/graphql/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued, cookie attached", body = Token),
        (status = 404, description = "No user for that email", body = ErrorBody),
        (status = 401, description = "Wrong credentials (only with verification enabled)", body = ErrorBody),
        (status = 503, description = "Database unreachable", body = ErrorBody),
        (status = 500, description = "Unknown server fault", body = ErrorBody)
    ),
    tag = "auth"
)]
#[instrument(skip(database, issuer, globals, payload))]
pub async fn login(
    Extension(database): Extension<Database>,
    Extension(issuer): Extension<Arc<SessionIssuer>>,
    Extension(globals): Extension<GlobalArgs>,
    payload: Option<Json<LoginRequest>>,
) -> Result<(StatusCode, HeaderMap, Json<Token>), ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::MissingPayload);
    };

    let mut headers = HeaderMap::new();
    let token = log_in(&database, &issuer, &globals, request, &mut headers).await?;

    Ok((StatusCode::OK, headers, Json(Token { token })))
}

/// The login flow: connect, look the user up by email, optionally compare the
/// credential, attach a session cookie and hand back the token.
pub(crate) async fn log_in(
    database: &Database,
    issuer: &SessionIssuer,
    globals: &GlobalArgs,
    request: LoginRequest,
    headers: &mut HeaderMap,
) -> Result<String, ApiError> {
    let pool = database.pool().await.map_err(|err| database.classify(err))?;

    let user = store::find_one_by_email(&pool, &request.email)
        .await
        .map_err(|err| database.classify(err))?;

    let Some(user) = user else {
        return Err(ApiError::UserNotFound);
    };

    // Credential comparison is opt-in; the default flow issues a session for
    // any stored user regardless of the supplied password.
    if globals.verify_credentials && user.password != request.password {
        return Err(ApiError::WrongCredentials);
    }

    debug!("login for user: {}", user.id);

    cookie::attach(issuer, &user.id.to_string(), headers)
        .ok_or_else(|| ApiError::Internal(anyhow!("session token issuance yielded no token")))
}
