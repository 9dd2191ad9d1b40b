use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

/// Flow errors carrying a machine-readable code next to the user-facing
/// message. Mapping to HTTP status happens only here, at the transport edge.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing payload")]
    MissingPayload,
    #[error("{0}")]
    EmailRejected(String),
    #[error("Invalid user id")]
    InvalidUserId,
    #[error("Wrong credentials")]
    WrongCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("Server database is temporarily unreachable")]
    DatabaseNotConnected,
    #[error("An unknown error occurred in the server")]
    Internal(anyhow::Error),
}

impl ApiError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingPayload | Self::EmailRejected(_) | Self::InvalidUserId => "BAD_USER_INPUT",
            Self::WrongCredentials => "WRONG_CREDENTIALS",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::DatabaseNotConnected => "DATABASE_NOT_CONNECTED",
            Self::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingPayload | Self::EmailRejected(_) | Self::InvalidUserId => {
                StatusCode::BAD_REQUEST
            }
            Self::WrongCredentials => StatusCode::UNAUTHORIZED,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::DatabaseNotConnected => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error payload shipped to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(source) = &self {
            error!("Internal error: {source:#}");
        }

        let body = ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
        };

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ApiError::MissingPayload.code(), "BAD_USER_INPUT");
        assert_eq!(
            ApiError::EmailRejected("Wrong SMTP".to_string()).code(),
            "BAD_USER_INPUT"
        );
        assert_eq!(ApiError::InvalidUserId.code(), "BAD_USER_INPUT");
        assert_eq!(ApiError::WrongCredentials.code(), "WRONG_CREDENTIALS");
        assert_eq!(ApiError::UserNotFound.code(), "USER_NOT_FOUND");
        assert_eq!(
            ApiError::DatabaseNotConnected.code(),
            "DATABASE_NOT_CONNECTED"
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).code(),
            "INTERNAL_SERVER_ERROR"
        );
    }

    #[test]
    fn test_statuses() {
        assert_eq!(ApiError::UserNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::DatabaseNotConnected.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::WrongCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::EmailRejected("Email not accepted".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_email_rejection_message_passes_through() {
        let err = ApiError::EmailRejected("Wrong SMTP".to_string());
        assert_eq!(err.to_string(), "Wrong SMTP");

        let err = ApiError::EmailRejected("Email not accepted".to_string());
        assert_eq!(err.to_string(), "Email not accepted");
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorBody {
            code: ApiError::UserNotFound.code().to_string(),
            message: ApiError::UserNotFound.to_string(),
        };
        let json = serde_json::to_value(&body).expect("encode");
        assert_eq!(json["code"], "USER_NOT_FOUND");
        assert_eq!(json["message"], "User not found");
    }
}
