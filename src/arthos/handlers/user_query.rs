use axum::{
    extract::{Extension, Path},
    Json,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::arthos::context::RequestContext;
use crate::arthos::error::{ApiError, ErrorBody};
use crate::arthos::store::{self, Database, User};

#[utoipa::path(
    get,
    path = "/graphql/user/me",
    responses(
        (status = 200, description = "The session's user, or null for anonymous requests", body = User)
    ),
    tag = "users"
)]
pub async fn current_user(ctx: RequestContext) -> Json<Option<User>> {
    // The request context already resolved the user; no store access here.
    Json(ctx.user)
}

#[utoipa::path(
    get,
    path = "/graphql/user/{id}",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "The stored record, or null for an unknown id", body = User),
        (status = 400, description = "Malformed user id", body = ErrorBody),
        (status = 503, description = "Database unreachable", body = ErrorBody),
        (status = 500, description = "Unknown server fault", body = ErrorBody)
    ),
    tag = "users"
)]
#[instrument(skip(database))]
pub async fn user(
    Extension(database): Extension<Database>,
    Path(id): Path<String>,
) -> Result<Json<Option<User>>, ApiError> {
    let result = lookup_user(&database, id.trim()).await;

    // Attempt marker, logged whatever the outcome.
    debug!("User query attempt");

    result.map(Json)
}

async fn lookup_user(database: &Database, id: &str) -> Result<Option<User>, ApiError> {
    let user_id = Uuid::parse_str(id).map_err(|_| ApiError::InvalidUserId)?;

    let pool = database.pool().await.map_err(|err| database.classify(err))?;

    store::find_one_by_id(&pool, user_id)
        .await
        .map_err(|err| database.classify(err))
}
