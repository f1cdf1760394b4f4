// SPDX-License-Identifier: MIT

//! REST client for the hosted backend.
//!
//! Speaks the backend's PostgREST-style data API (`/rest/v1`) and its
//! auth API (`/auth/v1`). Change subscriptions are implemented by a
//! background poller that diffs successive table snapshots; a polling
//! failure degrades to the last known snapshot rather than erroring.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::backend::{
    Backend, ChangeEvent, ChangeKind, Filter, FilterOp, Order, Session, Subscription,
};
use crate::error::{AppError, Result};

/// Buffer for pending change notifications per subscription.
const CHANGE_BUFFER: usize = 64;
/// Upper bound on rows examined per poll cycle.
const POLL_SNAPSHOT_LIMIT: u32 = 200;

/// REST backend client.
#[derive(Clone)]
pub struct RestBackend {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    poll_interval: Duration,
    session: Arc<RwLock<Option<Session>>>,
}

impl RestBackend {
    /// Create a new client for the given backend project.
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            anon_key: anon_key.into(),
            poll_interval: Duration::from_secs(30),
            session: Arc::new(RwLock::new(None)),
        }
    }

    /// Override the change-poll interval (mainly for tests).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Bearer token for data requests: the session token when signed in,
    /// the anon key otherwise.
    async fn bearer(&self) -> String {
        match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.anon_key.clone(),
        }
    }

    async fn data_request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.rest_url(table))
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer().await)
    }

    /// Check response status and return error if not successful.
    async fn check_response(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(AppError::Unauthorized);
        }

        Err(AppError::Backend(format!("HTTP {}: {}", status, body)))
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        self.check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("JSON parse error: {}", e)))
    }

    /// Unwrap a `return=representation` response (always an array).
    fn single_row(mut rows: Vec<Value>, table: &str) -> Result<Value> {
        if rows.is_empty() {
            return Err(AppError::NotFound(table.to_string()));
        }
        Ok(rows.swap_remove(0))
    }

    async fn store_session(&self, session: Option<Session>) {
        *self.session.write().await = session;
    }
}

fn filter_param(filter: &Filter) -> (String, String) {
    let op = match filter.op {
        FilterOp::Eq => "eq",
        FilterOp::Neq => "neq",
    };
    (filter.column.clone(), format!("{}.{}", op, filter.value))
}

fn id_of(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn query(
        &self,
        table: &str,
        filters: &[Filter],
        order: Option<Order>,
        limit: Option<u32>,
    ) -> Result<Vec<Value>> {
        let mut params: Vec<(String, String)> = vec![("select".to_string(), "*".to_string())];
        params.extend(filters.iter().map(filter_param));
        if let Some(order) = &order {
            let dir = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, dir)));
        }
        if let Some(limit) = limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        let response = self
            .data_request(reqwest::Method::GET, table)
            .await
            .query(&params)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_response_json(response).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        let response = self
            .data_request(reqwest::Method::POST, table)
            .await
            .header("Prefer", "return=representation")
            .json(&Value::Array(vec![row]))
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        let rows: Vec<Value> = self.check_response_json(response).await?;
        Self::single_row(rows, table)
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value> {
        let response = self
            .data_request(reqwest::Method::PATCH, table)
            .await
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{}", id))])
            .json(&patch)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        let rows: Vec<Value> = self.check_response_json(response).await?;
        Self::single_row(rows, table)
    }

    async fn delete(&self, table: &str, id: &str) -> Result<()> {
        let response = self
            .data_request(reqwest::Method::DELETE, table)
            .await
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        self.check_response(response).await?;
        Ok(())
    }

    /// Poll-based change stream: the first cycle primes a baseline
    /// snapshot, later cycles emit the diff as insert/update/delete
    /// notifications. Poll failures are logged and the last snapshot
    /// stays authoritative.
    async fn subscribe(&self, table: &str) -> Result<Subscription> {
        let (tx, rx) = mpsc::channel(CHANGE_BUFFER);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let client = self.clone();
        let table_name = table.to_string();

        tokio::spawn(async move {
            let mut known: HashMap<String, Value> = HashMap::new();
            let mut primed = false;
            let mut ticker = tokio::time::interval(client.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let rows = match client
                            .query(&table_name, &[], None, Some(POLL_SNAPSHOT_LIMIT))
                            .await
                        {
                            Ok(rows) => rows,
                            Err(e) => {
                                tracing::warn!(table = %table_name, error = %e,
                                    "Change poll failed; keeping last snapshot");
                                continue;
                            }
                        };

                        let fresh: HashMap<String, Value> = rows
                            .into_iter()
                            .filter_map(|row| id_of(&row).map(|id| (id, row)))
                            .collect();

                        if primed {
                            let mut changes = Vec::new();
                            for (id, row) in &fresh {
                                match known.get(id) {
                                    None => changes.push(ChangeEvent {
                                        kind: ChangeKind::Inserted,
                                        row: row.clone(),
                                    }),
                                    Some(old) if old != row => changes.push(ChangeEvent {
                                        kind: ChangeKind::Updated,
                                        row: row.clone(),
                                    }),
                                    Some(_) => {}
                                }
                            }
                            for id in known.keys() {
                                if !fresh.contains_key(id) {
                                    changes.push(ChangeEvent {
                                        kind: ChangeKind::Deleted,
                                        row: serde_json::json!({ "id": id }),
                                    });
                                }
                            }

                            for change in changes {
                                if tx.send(change).await.is_err() {
                                    return; // subscriber gone
                                }
                            }
                        }

                        known = fresh;
                        primed = true;
                    }
                }
            }

            tracing::debug!(table = %table_name, "Change poller stopped");
        });

        Ok(Subscription::new(rx, Some(stop_tx)))
    }

    async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: Option<&str>,
    ) -> Result<Session> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "data": { "username": username },
        });

        let response = self
            .http
            .post(self.auth_url("signup"))
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        let auth: AuthResponse = self.check_response_json(response).await?;
        let session = auth.into_session().ok_or_else(|| {
            AppError::Backend(
                "Sign-up did not return a session (email confirmation may be required)"
                    .to_string(),
            )
        })?;

        self.store_session(Some(session.clone())).await;
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let body = serde_json::json!({ "email": email, "password": password });

        let response = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        if response.status().as_u16() == 400 || response.status().as_u16() == 401 {
            return Err(AppError::InvalidCredentials);
        }

        let auth: AuthResponse = self.check_response_json(response).await?;
        let session = auth
            .into_session()
            .ok_or_else(|| AppError::Backend("Sign-in returned no session".to_string()))?;

        self.store_session(Some(session.clone())).await;
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        let token = {
            let guard = self.session.read().await;
            guard.as_ref().map(|s| s.access_token.clone())
        };

        // Local session state is cleared regardless of whether the
        // server-side revocation succeeds.
        self.store_session(None).await;

        if let Some(token) = token {
            let result = self
                .http
                .post(self.auth_url("logout"))
                .header("apikey", &self.anon_key)
                .bearer_auth(token)
                .send()
                .await;

            if let Err(e) = result {
                tracing::warn!(error = %e, "Sign-out revocation request failed");
            }
        }

        Ok(())
    }
}

/// Auth API response (sign-up and password grant).
#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: Option<String>,
    user: Option<AuthUser>,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
}

impl AuthResponse {
    fn into_session(self) -> Option<Session> {
        let access_token = self.access_token?;
        let user = self.user?;
        Some(Session {
            user_id: user.id,
            email: user.email,
            access_token,
        })
    }
}
