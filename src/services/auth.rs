// SPDX-License-Identifier: MIT

//! Session and profile management.
//!
//! Wraps the backend auth primitives and keeps the cached profile in
//! step with the session. Profile provisioning is client-side: sign-up
//! writes the profile row itself rather than waiting on a server
//! trigger, and the fetch path still retries briefly in case a freshly
//! created row has not landed yet.

use std::sync::Arc;
use std::time::Duration;

use crate::backend::{tables, Backend, Filter, Session};
use crate::deadline::{with_deadline, Outcome};
use crate::error::{AppError, Result};
use crate::models::{Profile, UserPreferences};
use crate::time_utils::format_utc_rfc3339;

/// Attempts before giving up on the profile row.
pub const PROFILE_FETCH_ATTEMPTS: u32 = 3;
/// Initial retry delay; doubles per attempt.
pub const PROFILE_RETRY_DELAY: Duration = Duration::from_millis(500);
/// Deadline for each profile query.
const PROFILE_FETCH_TIMEOUT: Duration = Duration::from_secs(8);

/// Session plus cached profile.
pub struct AuthManager {
    backend: Arc<dyn Backend>,
    session: Option<Session>,
    profile: Option<Profile>,
}

impl AuthManager {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            session: None,
            profile: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn preferences(&self) -> Option<&UserPreferences> {
        self.profile.as_ref().map(|p| &p.preferences)
    }

    /// Pick up an existing session (e.g. a persisted token) and load
    /// its profile.
    pub async fn init(&mut self) {
        self.session = self.backend.session().await;
        if let Some(session) = self.session.clone() {
            tracing::info!(user_id = %session.user_id, "Session restored");
            self.profile = Some(self.fetch_profile(&session).await);
        }
    }

    /// Create an account, then provision its profile row with default
    /// preferences. The upsert tolerates a row already provisioned
    /// server-side.
    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        username: Option<&str>,
    ) -> Result<()> {
        let session = self.backend.sign_up(email, password, username).await?;
        tracing::info!(user_id = %session.user_id, "Account created");

        let profile_row = serde_json::json!({
            "id": session.user_id,
            "username": username.map(str::to_string)
                .or_else(|| email.split('@').next().map(str::to_string)),
            "preferences": UserPreferences::default(),
            "updated_at": format_utc_rfc3339(chrono::Utc::now()),
        });

        match self.backend.insert(tables::PROFILES, profile_row.clone()).await {
            Ok(_) => {}
            Err(e) => {
                // A trigger may have provisioned the row first; fold our
                // defaults into it instead.
                tracing::debug!(error = %e, "Profile insert rejected, updating instead");
                self.backend
                    .update(tables::PROFILES, &session.user_id, profile_row)
                    .await?;
            }
        }

        self.profile = Some(self.fetch_profile(&session).await);
        self.session = Some(session);
        Ok(())
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<()> {
        let session = self.backend.sign_in(email, password).await?;
        tracing::info!(user_id = %session.user_id, "Signed in");
        self.profile = Some(self.fetch_profile(&session).await);
        self.session = Some(session);
        Ok(())
    }

    pub async fn sign_out(&mut self) -> Result<()> {
        self.backend.sign_out().await?;
        self.session = None;
        self.profile = None;
        tracing::info!("Signed out");
        Ok(())
    }

    /// Update username and preferences on the profile row, then refresh
    /// the cached profile.
    pub async fn save_settings(
        &mut self,
        username: Option<String>,
        preferences: UserPreferences,
    ) -> Result<()> {
        let session = self.session.clone().ok_or(AppError::Unauthorized)?;

        let patch = serde_json::json!({
            "username": username,
            "preferences": preferences,
            "updated_at": format_utc_rfc3339(chrono::Utc::now()),
        });
        self.backend
            .update(tables::PROFILES, &session.user_id, patch)
            .await?;

        self.profile = Some(self.fetch_profile(&session).await);
        Ok(())
    }

    /// Fetch the profile row with bounded retry and backoff.
    ///
    /// Right after sign-up the row may not be visible yet, so a missing
    /// row is polled a few times. When the retries are exhausted or the
    /// queries keep failing, a default profile is returned instead of an
    /// error so the dashboard never blocks on the profile.
    pub async fn fetch_profile(&self, session: &Session) -> Profile {
        let mut delay = PROFILE_RETRY_DELAY;

        for attempt in 1..=PROFILE_FETCH_ATTEMPTS {
            let filters = [Filter::eq("id", session.user_id.as_str())];
            let query = self.backend.query(
                tables::PROFILES,
                &filters,
                None,
                Some(1),
            );

            match with_deadline(PROFILE_FETCH_TIMEOUT, query).await {
                Outcome::Ok(rows) => {
                    if let Some(row) = rows.into_iter().next() {
                        match serde_json::from_value::<Profile>(row) {
                            Ok(profile) => {
                                tracing::debug!(user_id = %session.user_id, "Profile loaded");
                                return profile;
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Malformed profile row");
                                break;
                            }
                        }
                    }
                    tracing::debug!(attempt, "Profile row not provisioned yet");
                }
                Outcome::TimedOut => {
                    tracing::warn!(attempt, "Profile fetch timed out");
                }
                Outcome::Failed(e) => {
                    tracing::warn!(attempt, error = %e, "Profile fetch failed");
                }
            }

            if attempt < PROFILE_FETCH_ATTEMPTS {
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }

        tracing::warn!(user_id = %session.user_id, "Falling back to default profile");
        Profile::fallback(&session.user_id, session.email.as_deref())
    }
}
