//! Domain error taxonomy and its HTTP mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Failures surfaced by the stores, the user manager and the collaborator
/// services. Storage-layer details are logged, never sent to the client.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not authenticated.")]
    Unauthenticated,

    #[error("Access forbidden.")]
    Forbidden,

    #[error("An account with this email already exists.")]
    DuplicateIdentity,

    #[error("Not found.")]
    NotFound,

    #[error("This account is blocked.")]
    Disabled,

    #[error("Invalid email or password.")]
    InvalidCredential,

    #[error("Image upload failed.")]
    Upload,

    #[error("Storage error.")]
    Persistence(String),

    #[error("Could not send the notification.")]
    Notification(String),
}

impl DomainError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DomainError::Unauthenticated => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden => StatusCode::FORBIDDEN,
            DomainError::DuplicateIdentity => StatusCode::CONFLICT,
            DomainError::NotFound => StatusCode::NOT_FOUND,
            DomainError::Disabled => StatusCode::FORBIDDEN,
            DomainError::InvalidCredential => StatusCode::UNAUTHORIZED,
            DomainError::Upload => StatusCode::INTERNAL_SERVER_ERROR,
            DomainError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DomainError::Notification(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<rusqlite::Error> for DomainError {
    fn from(err: rusqlite::Error) -> Self {
        DomainError::Persistence(err.to_string())
    }
}

/// Structured outcome body returned by every mutating endpoint.
#[derive(Serialize, Debug)]
pub struct ApiOutcome {
    pub success: bool,
    pub message: String,
}

impl ApiOutcome {
    pub fn ok<T: Into<String>>(message: T) -> Self {
        ApiOutcome {
            success: true,
            message: message.into(),
        }
    }

    pub fn fail<T: Into<String>>(message: T) -> Self {
        ApiOutcome {
            success: false,
            message: message.into(),
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        if let DomainError::Persistence(ref details) = self {
            error!("persistence failure: {}", details);
        }
        let status = self.status_code();
        (status, Json(ApiOutcome::fail(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            DomainError::Unauthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(DomainError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            DomainError::DuplicateIdentity.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(DomainError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(DomainError::Disabled.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            DomainError::InvalidCredential.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn outcome_helpers() {
        let ok = ApiOutcome::ok("done");
        assert!(ok.success);
        assert_eq!(ok.message, "done");

        let fail = ApiOutcome::fail("nope");
        assert!(!fail.success);
    }
}
