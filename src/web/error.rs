use crate::core::accounts::AccountError;
use crate::core::board::BoardError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

const GENERIC_FAILURE: &str = "Internal server error";

/// Error returned by the JSON API. Always rendered as `{"error": "<message>"}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    /// The message is what the client sees; details are logged where the error was raised.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Map a board error, using `failure` as the client message for storage errors.
    pub fn from_board(err: BoardError, failure: &str) -> Self {
        match err {
            BoardError::EmptyMessage
            | BoardError::EmptyComment
            | BoardError::UnsafePost
            | BoardError::UnsafeComment
            | BoardError::AlreadyLiked => ApiError::BadRequest(err.to_string()),
            BoardError::PostNotFound(_) => ApiError::NotFound(err.to_string()),
            BoardError::StorageError(detail) => {
                tracing::error!("Board storage error: {}", detail);
                ApiError::Internal(failure.to_string())
            }
        }
    }
}

impl From<BoardError> for ApiError {
    fn from(err: BoardError) -> Self {
        ApiError::from_board(err, GENERIC_FAILURE)
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(_)
            | AccountError::PasswordMismatch
            | AccountError::DuplicateAccount => ApiError::BadRequest(err.to_string()),
            AccountError::UnknownUser | AccountError::WrongPassword => {
                ApiError::Unauthorized(err.to_string())
            }
            AccountError::Hashing(_) | AccountError::StorageError(_) => {
                tracing::error!("Account error: {}", err);
                ApiError::Internal(GENERIC_FAILURE.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_errors_map_to_statuses() {
        let cases = [
            (BoardError::EmptyMessage, StatusCode::BAD_REQUEST),
            (BoardError::UnsafeComment, StatusCode::BAD_REQUEST),
            (BoardError::AlreadyLiked, StatusCode::BAD_REQUEST),
            (BoardError::PostNotFound(9), StatusCode::NOT_FOUND),
            (
                BoardError::StorageError("disk full".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_storage_details_stay_out_of_the_message() {
        let err = ApiError::from_board(
            BoardError::StorageError("database is locked".to_string()),
            "Failed to like post",
        );
        assert_eq!(err.to_string(), "Failed to like post");
    }
}
