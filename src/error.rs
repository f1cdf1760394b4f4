// SPDX-License-Identifier: MIT

//! Application error types shared across services and the backend client.

/// Application error type.
///
/// I/O failures are converted into one of these variants at the boundary
/// of each operation; they carry a short, user-presentable message and
/// never propagate as panics into the consuming layer.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Timed out after {0} seconds waiting for the backend")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, AppError>;
