//! Application Error Types
//!
//! Centralized error handling with Axum integration.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Steps of the group cascade, used to report where a cascade stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStep {
    DeleteGroup,
    DiscoverPosts,
    DiscoverComments,
    DeleteCommentVotes,
    DeleteComments,
    DeletePostVotes,
    DeletePosts,
    DiscoverDiscussion,
    DiscoverChannels,
    DeleteMessages,
    DeleteChannels,
    DeleteDiscussion,
}

impl CascadeStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeleteGroup => "delete_group",
            Self::DiscoverPosts => "discover_posts",
            Self::DiscoverComments => "discover_comments",
            Self::DeleteCommentVotes => "delete_comment_votes",
            Self::DeleteComments => "delete_comments",
            Self::DeletePostVotes => "delete_post_votes",
            Self::DeletePosts => "delete_posts",
            Self::DiscoverDiscussion => "discover_discussion",
            Self::DiscoverChannels => "discover_channels",
            Self::DeleteMessages => "delete_messages",
            Self::DeleteChannels => "delete_channels",
            Self::DeleteDiscussion => "delete_discussion",
        }
    }
}

impl std::fmt::Display for CascadeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cascade step {step} failed: {message}")]
    CascadeStep { step: CascadeStep, message: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// Wrap any error raised while running a cascade step.
    pub fn cascade(step: CascadeStep, source: AppError) -> Self {
        match source {
            // Keep the first failing step when errors nest.
            e @ AppError::CascadeStep { .. } => e,
            other => AppError::CascadeStep {
                step,
                message: other.to_string(),
            },
        }
    }

    /// Map a sqlx error, turning unique violations into conflicts.
    pub fn from_write(e: sqlx::Error, conflict: impl Into<String>) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(conflict.into())
            }
            _ => AppError::Database(e),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<CascadeStep>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut step = None;
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, 10001, msg.clone()),
            AppError::InvalidIdentity(msg) => (StatusCode::BAD_REQUEST, 10002, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, 10005, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, 10007, msg.clone()),
            AppError::CascadeStep { step: s, message } => {
                tracing::error!(step = %s, "Cascade failed: {}", message);
                step = Some(*s);
                (StatusCode::INTERNAL_SERVER_ERROR, 10008, "Cascade incomplete, retry".into())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, 10000, "Internal server error".into())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, 10000, "Internal server error".into())
            }
        };

        let body = ErrorResponse {
            code,
            message,
            step,
        };

        (status, Json(body)).into_response()
    }
}
