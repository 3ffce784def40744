//! API error taxonomy and classification.
//!
//! Every failure leaving [`crate::TrackerService`] is an [`ApiError`]
//! carrying a technical `message` (logged) and a `user_message` (safe
//! to show). Structured [`TrackerError`] variants map directly; opaque
//! store failures are classified by keyword and otherwise fall back to
//! [`ErrorCode::Server`].

use serde::Serialize;
use shipyard_core::error::TrackerError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Auth,
    Permission,
    NotFound,
    Validation,
    Server,
}

#[derive(Debug, Clone, Error, Serialize)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    /// Technical description; for logs only.
    pub message: String,
    /// Message suitable for end users.
    pub user_message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

const AUTH_MESSAGE: &str = "Please sign in to continue";
const PERMISSION_MESSAGE: &str = "You don't have permission to perform this action";
const NOT_FOUND_MESSAGE: &str = "The requested resource was not found";
const SERVER_MESSAGE: &str = "Something went wrong. Please try again later";

impl ApiError {
    pub fn new(
        code: ErrorCode,
        message: impl Into<String>,
        user_message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            user_message: user_message.into(),
        }
    }
}

fn not_found_message(entity: &str) -> &'static str {
    match entity {
        "idea" => "This project no longer exists",
        "resource" => "This resource no longer exists",
        "step" => "This step no longer exists",
        _ => NOT_FOUND_MESSAGE,
    }
}

/// Keyword classification for failures that arrive as plain text.
fn classify_message(message: String) -> ApiError {
    let lowered = message.to_lowercase();
    if lowered.contains("permission") {
        ApiError::new(ErrorCode::Permission, message, PERMISSION_MESSAGE)
    } else if lowered.contains("not found") {
        ApiError::new(ErrorCode::NotFound, message, NOT_FOUND_MESSAGE)
    } else if lowered.contains("logged in") {
        ApiError::new(ErrorCode::Auth, message, AUTH_MESSAGE)
    } else {
        ApiError::new(ErrorCode::Server, message, SERVER_MESSAGE)
    }
}

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        let message = err.to_string();
        match err {
            TrackerError::Unauthenticated => ApiError::new(ErrorCode::Auth, message, AUTH_MESSAGE),
            TrackerError::PermissionDenied { .. } => {
                ApiError::new(ErrorCode::Permission, message, PERMISSION_MESSAGE)
            }
            TrackerError::NotFound { entity, .. } => {
                ApiError::new(ErrorCode::NotFound, message, not_found_message(&entity))
            }
            TrackerError::Validation { message: reason } => {
                ApiError::new(ErrorCode::Validation, message, reason)
            }
            TrackerError::Database(_) | TrackerError::Internal(_) => classify_message(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_errors_map_directly() {
        let err = ApiError::from(TrackerError::Unauthenticated);
        assert_eq!(err.code, ErrorCode::Auth);
        assert_eq!(err.user_message, AUTH_MESSAGE);

        let err = ApiError::from(TrackerError::not_found("idea", "42"));
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.user_message, "This project no longer exists");

        let err = ApiError::from(TrackerError::PermissionDenied {
            reason: "bob does not own idea 42".into(),
        });
        assert_eq!(err.code, ErrorCode::Permission);

        let err = ApiError::from(TrackerError::validation("Project name is required"));
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(err.user_message, "Project name is required");
    }

    #[test]
    fn opaque_errors_are_classified_by_keyword() {
        let cases = [
            ("Missing or insufficient permissions", ErrorCode::Permission),
            ("Document not found", ErrorCode::NotFound),
            ("You must be logged in", ErrorCode::Auth),
            ("connection reset by peer", ErrorCode::Server),
        ];
        for (text, code) in cases {
            let err = ApiError::from(TrackerError::Database(text.into()));
            assert_eq!(err.code, code, "{text}");
        }
    }

    #[test]
    fn serializes_for_the_ui() {
        let err = ApiError::from(TrackerError::not_found("resource", "7"));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["user_message"], "This resource no longer exists");
    }

    #[test]
    fn server_errors_keep_technical_message_out_of_user_message() {
        let err = ApiError::from(TrackerError::Internal("socket closed".into()));
        assert_eq!(err.code, ErrorCode::Server);
        assert!(err.message.contains("socket closed"));
        assert_eq!(err.user_message, SERVER_MESSAGE);
    }
}
