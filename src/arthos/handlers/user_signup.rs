use anyhow::anyhow;
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::arthos::email::{EmailVerifier, RejectReason};
use crate::arthos::error::{ApiError, ErrorBody};
use crate::arthos::handlers::Token;
use crate::arthos::store::{
    self, Avatar, BlockAvatar, Database, EmailRecord, FullName, User, USER_RECORD_TYPE,
};
use crate::session::{cookie, SessionIssuer};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NameInput {
    pub first_name: String,
    #[serde(default)]
    pub second_name: Option<String>,
    pub last_name: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AvatarInput {
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: NameInput,
    pub nickname: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<AvatarInput>,
}

#[utoipa::path(
    post,
    path = "/graphql/user/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created, session cookie attached", body = Token),
        (status = 400, description = "Email rejected or payload missing", body = ErrorBody),
        (status = 503, description = "Database unreachable", body = ErrorBody),
        (status = 500, description = "Unknown server fault", body = ErrorBody)
    ),
    tag = "auth"
)]
#[instrument(skip(database, verifier, issuer, payload))]
pub async fn signup(
    Extension(database): Extension<Database>,
    Extension(verifier): Extension<Arc<dyn EmailVerifier>>,
    Extension(issuer): Extension<Arc<SessionIssuer>>,
    payload: Option<Json<SignupRequest>>,
) -> Result<(StatusCode, HeaderMap, Json<Token>), ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::MissingPayload);
    };

    let mut headers = HeaderMap::new();
    let token = sign_up(&database, verifier.as_ref(), &issuer, request, &mut headers).await?;

    Ok((StatusCode::CREATED, headers, Json(Token { token })))
}

/// The signup flow: connect, validate the email, persist the new user, attach
/// a session cookie and hand back the token.
pub(crate) async fn sign_up(
    database: &Database,
    verifier: &dyn EmailVerifier,
    issuer: &SessionIssuer,
    request: SignupRequest,
    headers: &mut HeaderMap,
) -> Result<String, ApiError> {
    let pool = database.pool().await.map_err(|err| database.classify(err))?;

    let verdict = verifier
        .verify(&request.email)
        .await
        .map_err(ApiError::Internal)?;
    if !verdict.valid {
        return Err(ApiError::EmailRejected(
            rejection_message(verdict.reason).to_string(),
        ));
    }

    let user = build_user(&request);
    store::insert_one(&pool, &user)
        .await
        .map_err(|err| database.classify(err))?;

    debug!("user created: {}", user.id);

    cookie::attach(issuer, &user.id.to_string(), headers)
        .ok_or_else(|| ApiError::Internal(anyhow!("session token issuance yielded no token")))
}

/// Map a rejection reason to the user-facing message: mailbox-level (SMTP)
/// failures get their own wording, everything else is generic.
const fn rejection_message(reason: Option<RejectReason>) -> &'static str {
    match reason {
        Some(RejectReason::Smtp) => "Wrong SMTP",
        _ => "Email not accepted",
    }
}

fn build_user(request: &SignupRequest) -> User {
    let mut rng = rand::thread_rng();

    User {
        id: Uuid::new_v4(),
        email: EmailRecord {
            current: request.email.clone(),
            is_verified: false,
            old_emails: Vec::new(),
        },
        // Stored as supplied; credential hashing stays out of this flow.
        password: request.password.clone(),
        nickname: request.nickname.clone(),
        name: FullName {
            first_name: request.name.first_name.trim().to_string(),
            second_name: request
                .name
                .second_name
                .as_deref()
                .map(|name| name.trim().to_string()),
            last_name: request.name.last_name.trim().to_string(),
        },
        created_at: Local::now().to_rfc3339_opts(SecondsFormat::Millis, false),
        kind: USER_RECORD_TYPE.to_string(),
        avatar: Avatar {
            source: request
                .avatar
                .as_ref()
                .and_then(|avatar| avatar.source.clone()),
            block_avatar: BlockAvatar::random(&mut rng),
        },
    }
}
