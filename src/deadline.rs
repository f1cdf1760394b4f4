// SPDX-License-Identifier: MIT

//! Bounded-deadline wrapper for backend round trips.
//!
//! Snapshot and profile fetches must never leave the caller hanging, so
//! they race against a fixed deadline and report which side won as a
//! tagged outcome. The deadline only changes what the caller observes;
//! the underlying request is not cancelled and may keep running.

use std::future::Future;
use std::time::Duration;

use crate::error::AppError;

/// Outcome of an operation raced against a deadline.
#[derive(Debug)]
pub enum Outcome<T> {
    /// Completed within the deadline.
    Ok(T),
    /// The deadline elapsed first.
    TimedOut,
    /// Completed within the deadline, but failed.
    Failed(AppError),
}

/// Run `fut` with a deadline of `limit`.
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> Outcome<T>
where
    F: Future<Output = crate::error::Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Outcome::Ok(value),
        Ok(Err(err)) => Outcome::Failed(err),
        Err(_) => Outcome::TimedOut,
    }
}
