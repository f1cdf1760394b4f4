// SPDX-License-Identifier: MIT

//! User profile and per-sport feed preferences.

use serde::{Deserialize, Serialize};

use crate::models::SportType;

/// Per-sport visibility flags. New users see everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub f1: bool,
    pub football: bool,
    pub lol: bool,
    pub tennis: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            f1: true,
            football: true,
            lol: true,
            tennis: true,
        }
    }
}

impl UserPreferences {
    pub fn enabled(&self, sport: SportType) -> bool {
        match sport {
            SportType::F1 => self.f1,
            SportType::Football => self.football,
            SportType::Lol => self.lol,
            SportType::Tennis => self.tennis,
        }
    }
}

/// User profile row, keyed by the auth user id (1:1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub preferences: UserPreferences,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Profile {
    /// Default profile used when the backend row is missing or cannot be
    /// fetched. Username is derived from the email local-part.
    pub fn fallback(user_id: &str, email: Option<&str>) -> Self {
        let username = email
            .and_then(|e| e.split('@').next())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            id: user_id.to_string(),
            username,
            preferences: UserPreferences::default(),
            updated_at: None,
        }
    }
}
