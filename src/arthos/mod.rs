pub mod context;
pub mod email;
pub mod error;
pub mod handlers;
mod openapi;
pub mod store;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE},
        HeaderName, HeaderValue, Method, Request,
    },
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, warn, Span};
use ulid::Ulid;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::arthos::email::{EmailVerifier, HttpEmailVerifier, SyntaxEmailVerifier};
use crate::arthos::store::Database;
use crate::cli::globals::GlobalArgs;
use crate::session::SessionIssuer;

/// Origins allowed to call the API with credentials.
const ALLOWED_ORIGINS: [&str; 5] = [
    "http://localhost:3000",
    "https://studio.apollographql.com",
    "https://arthos-portfolio.vercel.app",
    "https://portfolio-client-5uac1fbso-xarthos.vercel.app",
    "https://portfolio-client-xarthos.vercel.app",
];

/// Start the server
///
/// # Errors
///
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, globals: &GlobalArgs) -> Result<()> {
    let database = Database::new(dsn);

    // First connection attempt up front; flows reconnect lazily if it fails.
    if let Err(err) = database.pool().await {
        warn!("Database unreachable at startup, deferring to first request: {err:#}");
    }

    let issuer = Arc::new(SessionIssuer::new(globals));

    let verifier: Arc<dyn EmailVerifier> = match globals.email_verifier_url.clone() {
        Some(url) => Arc::new(HttpEmailVerifier::new(url)?),
        None => Arc::new(SyntaxEmailVerifier),
    };

    let cors = cors_layer()?;

    let app = Router::new()
        .route("/health", get(handlers::health))
        .route("/graphql/user/signup", post(handlers::signup))
        .route("/graphql/user/login", post(handlers::login))
        .route("/graphql/user/me", get(handlers::current_user))
        .route("/graphql/user/:id", get(handlers::user))
        .merge(SwaggerUi::new("/doc").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(database))
                .layer(Extension(issuer))
                .layer(Extension(verifier))
                .layer(Extension(globals.clone())),
        );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn cors_layer() -> Result<CorsLayer> {
    let origins = ALLOWED_ORIGINS
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).with_context(|| format!("Invalid origin: {origin}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, COOKIE])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true))
}
