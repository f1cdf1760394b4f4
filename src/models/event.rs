// SPDX-License-Identifier: MIT

//! Sport event models: the backend row shape and its UI-facing
//! normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::time_utils::parse_event_time;

/// Sport feeds served by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SportType {
    F1,
    Football,
    Lol,
    Tennis,
}

impl SportType {
    pub const ALL: [SportType; 4] = [
        SportType::F1,
        SportType::Football,
        SportType::Lol,
        SportType::Tennis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SportType::F1 => "f1",
            SportType::Football => "football",
            SportType::Lol => "lol",
            SportType::Tennis => "tennis",
        }
    }
}

impl std::fmt::Display for SportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Live,
    Finished,
}

/// Open, sport-specific key/value bag (scores, logos, venue, progress).
/// No fixed schema; every key must be treated as optional.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Event row as stored in the backend `current_events` record-set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRow {
    pub id: String,
    pub sport_type: SportType,
    pub title: String,
    pub start_time: String,
    pub status: EventStatus,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Normalized, UI-facing projection of an event row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SportEvent {
    pub id: String,
    pub sport: SportType,
    pub title: String,
    pub time: DateTime<Utc>,
    pub status: EventStatus,
    pub channel: String,
    pub metadata: Metadata,
}

impl SportEvent {
    /// Normalize a backend row: null channel becomes an empty string,
    /// null metadata an empty map.
    pub fn from_row(row: EventRow) -> Result<Self, AppError> {
        let time = parse_event_time(&row.start_time).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Event {} has unparseable start_time {:?}",
                row.id, row.start_time
            ))
        })?;

        Ok(Self {
            id: row.id,
            sport: row.sport_type,
            title: row.title,
            time,
            status: row.status,
            channel: row.channel.unwrap_or_default(),
            metadata: row.metadata.unwrap_or_default(),
        })
    }

    pub fn is_live(&self) -> bool {
        self.status == EventStatus::Live
    }

    /// Metadata string value with an empty-string fallback.
    pub fn meta_str(&self, key: &str) -> &str {
        self.metadata.get(key).and_then(|v| v.as_str()).unwrap_or("")
    }
}
