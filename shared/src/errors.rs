//! Shared error types for the tool page layer

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Server startup error: {0}")]
    ServerStartup(String),

    #[error("Page session {session} is closed")]
    SessionClosed { session: String },

    #[error("Page session not found: {session}")]
    SessionNotFound { session: String },

    #[error("Download not found: {download}")]
    DownloadNotFound { download: String },

    #[error("No page registered at {path}")]
    UnknownPage { path: String },

    #[error("Invalid page event: {details}")]
    InvalidEvent { details: String },

    #[error("Handler failed: {message}")]
    Handler { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolError {
    /// Wrap any displayable failure raised by a page handler
    pub fn handler(message: impl std::fmt::Display) -> Self {
        ToolError::Handler {
            message: message.to_string(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ToolError::SessionNotFound { .. }
            | ToolError::DownloadNotFound { .. }
            | ToolError::UnknownPage { .. } => StatusCode::NOT_FOUND,
            ToolError::InvalidEvent { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ToolError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

pub type ToolResult<T> = Result<T, ToolError>;
