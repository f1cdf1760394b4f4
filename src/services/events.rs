// SPDX-License-Identifier: MIT

//! Event synchronization engine.
//!
//! Owns the authoritative in-memory event list for the dashboard:
//! seeded from an optional pre-fetched snapshot, refreshed by bounded
//! bulk fetches, and kept current by folding change notifications into
//! the list through one pure reconciliation function.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::backend::{tables, Backend, ChangeEvent, ChangeKind, Filter, Order, Subscription};
use crate::deadline::{with_deadline, Outcome};
use crate::error::{AppError, Result};
use crate::models::{EventRow, SportEvent, SportType, UserPreferences};

/// F1 emits many session sub-events per meet, so its snapshot query is
/// bounded tighter than the other feeds.
pub const F1_FETCH_LIMIT: u32 = 5;
pub const OTHER_FETCH_LIMIT: u32 = 50;
/// Deadline for a snapshot fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(8);

/// Synchronized event list plus fetch status.
pub struct EventFeed {
    backend: Arc<dyn Backend>,
    events: Vec<SportEvent>,
    last_updated: Option<DateTime<Utc>>,
    error: Option<String>,
    fetch_timeout: Duration,
}

impl EventFeed {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            events: Vec::new(),
            last_updated: None,
            error: None,
            fetch_timeout: FETCH_TIMEOUT,
        }
    }

    /// Seed from a pre-fetched snapshot, skipping the initial load.
    pub fn with_snapshot(backend: Arc<dyn Backend>, snapshot: Vec<SportEvent>) -> Self {
        let mut feed = Self::new(backend);
        feed.events = snapshot;
        feed.events.sort_by_key(|e| e.time);
        feed.last_updated = Some(Utc::now());
        feed
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// The full synchronized set, ascending by start time.
    pub fn events(&self) -> &[SportEvent] {
        &self.events
    }

    /// Preference-filtered view of the synchronized set.
    pub fn visible(&self, preferences: Option<&UserPreferences>) -> Vec<SportEvent> {
        filter_by_preferences(&self.events, preferences)
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fetch a fresh snapshot and overwrite the current one.
    ///
    /// Issues the F1 and non-F1 queries in parallel (each independently
    /// ordered, so the concatenation is re-sorted client-side) under a
    /// single deadline. On failure the list is emptied and a message is
    /// recorded; the caller never observes a hang or a panic.
    pub async fn refetch(&mut self) {
        tracing::debug!("Fetching event snapshot");
        self.error = None;

        let fetch = async {
            let f1_filters = [Filter::eq("sport_type", SportType::F1.as_str())];
            let f1 = self.backend.query(
                tables::EVENTS,
                &f1_filters,
                Some(Order::asc("start_time")),
                Some(F1_FETCH_LIMIT),
            );
            let other_filters = [Filter::neq("sport_type", SportType::F1.as_str())];
            let others = self.backend.query(
                tables::EVENTS,
                &other_filters,
                Some(Order::asc("start_time")),
                Some(OTHER_FETCH_LIMIT),
            );

            let (f1_rows, other_rows) = futures_util::try_join!(f1, others)?;

            let mut events = decode_rows(f1_rows);
            events.extend(decode_rows(other_rows));
            events.sort_by_key(|e| e.time);
            Ok(events)
        };

        let outcome = with_deadline(self.fetch_timeout, fetch).await;
        match outcome {
            Outcome::Ok(events) => {
                tracing::debug!(count = events.len(), "Event snapshot loaded");
                self.events = events;
                self.last_updated = Some(Utc::now());
            }
            Outcome::TimedOut => {
                tracing::warn!("Event snapshot fetch timed out");
                self.events.clear();
                self.error = Some(AppError::Timeout(self.fetch_timeout.as_secs()).to_string());
            }
            Outcome::Failed(e) => {
                tracing::error!(error = %e, "Event snapshot fetch failed");
                self.events.clear();
                self.error = Some(e.to_string());
            }
        }
    }

    /// Open the live change stream for the events record-set.
    pub async fn subscribe(&self) -> Result<Subscription> {
        self.backend.subscribe(tables::EVENTS).await
    }

    /// Fold one change notification into the list. Returns whether the
    /// notification was applied (malformed payloads are dropped).
    pub fn apply(&mut self, change: &ChangeEvent) -> bool {
        let applied = apply_change(&mut self.events, change);
        if applied {
            self.last_updated = Some(Utc::now());
        }
        applied
    }

    /// Drain the change stream until it closes. A closed stream is a
    /// degraded state, not an error: the last snapshot stays on screen
    /// and manual refresh still works.
    pub async fn run(&mut self, mut subscription: Subscription) {
        while let Some(change) = subscription.recv().await {
            self.apply(&change);
        }
        tracing::warn!("Change stream closed; continuing with last known snapshot");
    }
}

fn decode_rows(rows: Vec<Value>) -> Vec<SportEvent> {
    rows.into_iter()
        .filter_map(|value| match serde_json::from_value::<EventRow>(value) {
            Ok(row) => match SportEvent::from_row(row) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping undecodable event row");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed event row");
                None
            }
        })
        .collect()
}

/// Reconcile one change notification into the event list.
///
/// - insert: ignored when the id is already present (duplicate
///   delivery), otherwise appended and re-sorted ascending by time;
/// - update: the matching event is replaced wholesale, with a freshly
///   built metadata map so consumers diffing by identity see the change;
/// - delete: the matching event is removed by id.
pub fn apply_change(events: &mut Vec<SportEvent>, change: &ChangeEvent) -> bool {
    match change.kind {
        ChangeKind::Inserted => {
            let Some(event) = decode_change_row(&change.row) else {
                return false;
            };
            if events.iter().any(|e| e.id == event.id) {
                tracing::debug!(id = %event.id, "Duplicate insert notification ignored");
                return false;
            }
            events.push(event);
            events.sort_by_key(|e| e.time);
            true
        }
        ChangeKind::Updated => {
            // Decoding builds a brand-new metadata map, so consumers
            // comparing by identity observe the replacement.
            let Some(event) = decode_change_row(&change.row) else {
                return false;
            };
            let Some(slot) = events.iter_mut().find(|e| e.id == event.id) else {
                tracing::debug!(id = %event.id, "Update for unknown event ignored");
                return false;
            };
            *slot = event;
            true
        }
        ChangeKind::Deleted => {
            let Some(id) = change.row.get("id").and_then(|v| v.as_str()) else {
                return false;
            };
            let before = events.len();
            events.retain(|e| e.id != id);
            events.len() != before
        }
    }
}

fn decode_change_row(row: &Value) -> Option<SportEvent> {
    let row: EventRow = match serde_json::from_value(row.clone()) {
        Ok(row) => row,
        Err(e) => {
            tracing::warn!(error = %e, "Dropping malformed change payload");
            return None;
        }
    };
    match SportEvent::from_row(row) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(error = %e, "Dropping undecodable change payload");
            None
        }
    }
}

/// Keep only events whose sport feed is enabled. `None` means no
/// profile is loaded and everything is shown.
pub fn filter_by_preferences(
    events: &[SportEvent],
    preferences: Option<&UserPreferences>,
) -> Vec<SportEvent> {
    match preferences {
        None => events.to_vec(),
        Some(prefs) => events
            .iter()
            .filter(|e| prefs.enabled(e.sport))
            .cloned()
            .collect(),
    }
}
