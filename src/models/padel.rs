// SPDX-License-Identifier: MIT

//! Padel match records and derived statistics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A personal padel match record. Matches are created and deleted by
/// their owner; there is no in-place edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PadelMatch {
    pub id: String,
    pub created_at: String,
    pub user_id: String,
    pub opponents: String,
    /// Free-form score notation ("6-3 / 4-6 / 7-5").
    pub result: String,
    pub win: bool,
    pub date_played: NaiveDate,
}

/// Form input for a new match. The owner id is stamped from the session,
/// never taken from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PadelMatchInput {
    pub opponents: String,
    pub result: String,
    pub win: bool,
    pub date_played: NaiveDate,
}

/// Aggregate statistics over a match list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchStats {
    pub total: u32,
    pub wins: u32,
    pub losses: u32,
    /// Integer percentage, rounded. 0 when there are no matches.
    pub win_rate: u8,
}

impl MatchStats {
    pub fn from_matches(matches: &[PadelMatch]) -> Self {
        let total = matches.len() as u32;
        let wins = matches.iter().filter(|m| m.win).count() as u32;
        let win_rate = if total == 0 {
            0
        } else {
            (f64::from(wins) / f64::from(total) * 100.0).round() as u8
        };

        Self {
            total,
            wins,
            losses: total - wins,
            win_rate,
        }
    }
}
