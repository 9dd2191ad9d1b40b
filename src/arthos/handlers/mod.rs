pub mod health;
pub use self::health::health;

pub mod user_signup;
pub use self::user_signup::signup;

pub mod user_login;
pub use self::user_login::login;

pub mod user_query;
pub use self::user_query::{current_user, user};

// common types for the handlers
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Session token returned by the signup and login flows. The same token also
/// travels in the `Set-Cookie` header.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Token {
    pub token: String,
}
