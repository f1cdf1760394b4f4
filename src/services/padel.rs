// SPDX-License-Identifier: MIT

//! Padel record manager.
//!
//! CRUD over the session user's match records with optimistic local
//! state: a created record is prepended immediately, a deleted one is
//! removed only after the backend confirms, and a failed mutation
//! leaves the local list untouched.

use std::sync::Arc;

use serde_json::Value;

use crate::backend::{tables, Backend, Filter, Order};
use crate::error::{AppError, Result};
use crate::models::{MatchStats, PadelMatch, PadelMatchInput};

/// Blocking yes/no confirmation before a destructive action.
pub trait ConfirmPrompt {
    fn confirm(&self, message: &str) -> bool;
}

/// User-scoped padel match list.
pub struct PadelTracker {
    backend: Arc<dyn Backend>,
    matches: Vec<PadelMatch>,
}

impl PadelTracker {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            matches: Vec::new(),
        }
    }

    /// Most recent first. After an optimistic insert the newest record
    /// leads regardless of its `date_played` until the next refetch.
    pub fn matches(&self) -> &[PadelMatch] {
        &self.matches
    }

    pub fn stats(&self) -> MatchStats {
        MatchStats::from_matches(&self.matches)
    }

    /// Fetch all records of the session user, most recent first.
    pub async fn refetch(&mut self) -> Result<()> {
        let session = self
            .backend
            .session()
            .await
            .ok_or(AppError::Unauthorized)?;

        let rows = self
            .backend
            .query(
                tables::PADEL_MATCHES,
                &[Filter::eq("user_id", session.user_id.as_str())],
                Some(Order::desc("date_played")),
                None,
            )
            .await?;

        self.matches = decode_matches(rows);
        Ok(())
    }

    /// Create a record for the session user and prepend it locally.
    pub async fn add(&mut self, input: PadelMatchInput) -> Result<&PadelMatch> {
        let session = self
            .backend
            .session()
            .await
            .ok_or(AppError::Unauthorized)?;

        let row = serde_json::json!({
            "opponents": input.opponents,
            "result": input.result,
            "win": input.win,
            "date_played": input.date_played,
            "user_id": session.user_id,
        });

        let created = self.backend.insert(tables::PADEL_MATCHES, row).await?;
        let created: PadelMatch = serde_json::from_value(created)
            .map_err(|e| AppError::Backend(format!("Malformed insert response: {}", e)))?;

        tracing::info!(id = %created.id, "Padel match recorded");
        self.matches.insert(0, created);
        Ok(&self.matches[0])
    }

    /// Delete a record after explicit confirmation.
    ///
    /// Returns `Ok(false)` when the user declines (no mutation is
    /// issued). A failed mutation keeps the record in the local list.
    pub async fn remove(&mut self, id: &str, prompt: &dyn ConfirmPrompt) -> Result<bool> {
        let Some(record) = self.matches.iter().find(|m| m.id == id) else {
            return Err(AppError::NotFound(format!("padel match {}", id)));
        };

        let message = format!(
            "Delete the match against {} on {}?",
            record.opponents, record.date_played
        );
        if !prompt.confirm(&message) {
            tracing::debug!(id, "Match deletion declined");
            return Ok(false);
        }

        self.backend.delete(tables::PADEL_MATCHES, id).await?;
        self.matches.retain(|m| m.id != id);
        tracing::info!(id, "Padel match deleted");
        Ok(true)
    }
}

fn decode_matches(rows: Vec<Value>) -> Vec<PadelMatch> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<PadelMatch>(row) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed padel match row");
                None
            }
        })
        .collect()
}
