// SPDX-License-Identifier: MIT

//! Backend client facade.
//!
//! The hosted backend owns storage, auth, and change notifications; this
//! module defines the contract the services consume. The concrete client
//! is always constructed explicitly and passed in (no process-wide
//! singleton), so tests can substitute a fake.

pub mod rest;

pub use rest::RestBackend;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::error::Result;

/// Record-set names as constants.
pub mod tables {
    pub const EVENTS: &str = "current_events";
    pub const PROFILES: &str = "profiles";
    pub const PADEL_MATCHES: &str = "padel_matches";
}

/// Column filter for queries.
#[derive(Debug, Clone)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn neq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Neq,
            value: value.into(),
        }
    }
}

/// Result ordering for queries.
#[derive(Debug, Clone)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// A single change notification for a record-set.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// The affected row. For deletions only the `id` field is guaranteed.
    pub row: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

/// Live change stream for one record-set.
///
/// Dropping the subscription releases the underlying channel; the
/// delivery task observes the teardown and stops.
pub struct Subscription {
    changes: mpsc::Receiver<ChangeEvent>,
    _stop: Option<oneshot::Sender<()>>,
}

impl Subscription {
    pub fn new(changes: mpsc::Receiver<ChangeEvent>, stop: Option<oneshot::Sender<()>>) -> Self {
        Self {
            changes,
            _stop: stop,
        }
    }

    /// Receive the next change. `None` means the channel closed (the
    /// subscription failed or was torn down server-side).
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.changes.recv().await
    }
}

/// Authenticated session as reported by the backend.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
    pub access_token: String,
}

/// Contract of the hosted backend: typed queries, mutations, a change
/// subscription per record-set, and session/auth primitives.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn query(
        &self,
        table: &str,
        filters: &[Filter],
        order: Option<Order>,
        limit: Option<u32>,
    ) -> Result<Vec<Value>>;

    async fn insert(&self, table: &str, row: Value) -> Result<Value>;

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value>;

    async fn delete(&self, table: &str, id: &str) -> Result<()>;

    async fn subscribe(&self, table: &str) -> Result<Subscription>;

    async fn session(&self) -> Option<Session>;

    async fn sign_up(&self, email: &str, password: &str, username: Option<&str>)
        -> Result<Session>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    async fn sign_out(&self) -> Result<()>;
}
