use utoipa::OpenApi;

use crate::arthos::{error, handlers, store};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::user_signup::signup,
        handlers::user_login::login,
        handlers::user_query::current_user,
        handlers::user_query::user,
    ),
    components(schemas(
        handlers::Token,
        handlers::user_signup::SignupRequest,
        handlers::user_signup::NameInput,
        handlers::user_signup::AvatarInput,
        handlers::user_login::LoginRequest,
        error::ErrorBody,
        store::User,
        store::EmailRecord,
        store::FullName,
        store::Avatar,
        store::BlockAvatar,
    )),
    tags(
        (name = "auth", description = "Signup and login session issuance"),
        (name = "users", description = "User lookups"),
        (name = "health", description = "Service probe")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_all_routes() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_string(&doc).expect("openapi json");

        for path in [
            "/health",
            "/graphql/user/signup",
            "/graphql/user/login",
            "/graphql/user/me",
            "/graphql/user/{id}",
        ] {
            assert!(json.contains(path), "missing path: {path}");
        }
    }
}
