// SPDX-License-Identifier: MIT

//! Shared test fixtures: an in-memory fake backend implementing the
//! full client facade, plus row builders.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use sportdesk::backend::{
    Backend, ChangeEvent, Filter, FilterOp, Order, Session, Subscription,
};
use sportdesk::error::{AppError, Result};

/// In-memory backend with scriptable failures and change streams.
#[derive(Default)]
pub struct FakeBackend {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    session: Mutex<Option<Session>>,
    change_senders: Mutex<HashMap<String, mpsc::Sender<ChangeEvent>>>,
    /// Upcoming queries to fail.
    fail_queries: AtomicU32,
    /// Upcoming queries to answer with zero rows (profile-provisioning race).
    miss_queries: AtomicU32,
    /// Upcoming deletes to fail.
    fail_deletes: AtomicU32,
    query_delay: Mutex<Option<Duration>>,
    delete_calls: AtomicU32,
    next_id: AtomicU32,
}

#[allow(dead_code)]
impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn authenticate(&self, user_id: &str, email: Option<&str>) {
        *self.session.lock().unwrap() = Some(Session {
            user_id: user_id.to_string(),
            email: email.map(str::to_string),
            access_token: "fake-token".to_string(),
        });
    }

    pub fn fail_next_queries(&self, count: u32) {
        self.fail_queries.store(count, Ordering::SeqCst);
    }

    pub fn miss_next_queries(&self, count: u32) {
        self.miss_queries.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_deletes(&self, count: u32) {
        self.fail_deletes.store(count, Ordering::SeqCst);
    }

    pub fn set_query_delay(&self, delay: Duration) {
        *self.query_delay.lock().unwrap() = Some(delay);
    }

    pub fn delete_calls(&self) -> u32 {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Simulate a realtime channel failure by closing the stream.
    pub fn close_subscription(&self, table: &str) {
        self.change_senders.lock().unwrap().remove(table);
    }

    /// Deliver a change notification to the table's subscriber.
    pub async fn push_change(&self, table: &str, change: ChangeEvent) {
        let sender = self
            .change_senders
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .expect("no subscriber for table");
        sender.send(change).await.expect("subscriber dropped");
    }

    fn take(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches_filter(row: &Value, filter: &Filter) -> bool {
    let actual = row.get(&filter.column).map(value_text).unwrap_or_default();
    match filter.op {
        FilterOp::Eq => actual == filter.value,
        FilterOp::Neq => actual != filter.value,
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn query(
        &self,
        table: &str,
        filters: &[Filter],
        order: Option<Order>,
        limit: Option<u32>,
    ) -> Result<Vec<Value>> {
        let delay = *self.query_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if Self::take(&self.fail_queries) {
            return Err(AppError::Backend("injected query failure".to_string()));
        }
        if Self::take(&self.miss_queries) {
            return Ok(Vec::new());
        }

        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|row| filters.iter().all(|f| matches_filter(row, f)))
            .collect();

        if let Some(order) = order {
            rows.sort_by_key(|row| row.get(&order.column).map(value_text).unwrap_or_default());
            if !order.ascending {
                rows.reverse();
            }
        }
        if let Some(limit) = limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, mut row: Value) -> Result<Value> {
        let object = row
            .as_object_mut()
            .ok_or_else(|| AppError::BadRequest("row must be an object".to_string()))?;
        if !object.contains_key("id") {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            object.insert("id".to_string(), json!(format!("gen-{}", n)));
        }
        object
            .entry("created_at")
            .or_insert(json!("2024-03-01T00:00:00Z"));

        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value> {
        let mut tables = self.tables.lock().unwrap();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| AppError::NotFound(table.to_string()))?;
        let row = rows
            .iter_mut()
            .find(|r| r.get("id").and_then(|v| v.as_str()) == Some(id))
            .ok_or_else(|| AppError::NotFound(format!("{}/{}", table, id)))?;

        if let (Some(target), Some(changes)) = (row.as_object_mut(), patch.as_object()) {
            for (key, value) in changes {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(row.clone())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if Self::take(&self.fail_deletes) {
            return Err(AppError::Backend("injected delete failure".to_string()));
        }

        let mut tables = self.tables.lock().unwrap();
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|r| r.get("id").and_then(|v| v.as_str()) != Some(id));
        }
        Ok(())
    }

    async fn subscribe(&self, table: &str) -> Result<Subscription> {
        let (tx, rx) = mpsc::channel(32);
        self.change_senders
            .lock()
            .unwrap()
            .insert(table.to_string(), tx);
        Ok(Subscription::new(rx, None))
    }

    async fn session(&self) -> Option<Session> {
        self.session.lock().unwrap().clone()
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        _username: Option<&str>,
    ) -> Result<Session> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let session = Session {
            user_id: format!("user-{}", n),
            email: Some(email.to_string()),
            access_token: "fake-token".to_string(),
        };
        *self.session.lock().unwrap() = Some(session.clone());
        Ok(session)
    }

    async fn sign_in(&self, email: &str, _password: &str) -> Result<Session> {
        let session = Session {
            user_id: "u1".to_string(),
            email: Some(email.to_string()),
            access_token: "fake-token".to_string(),
        };
        *self.session.lock().unwrap() = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        *self.session.lock().unwrap() = None;
        Ok(())
    }
}

/// Backend event row as stored in `current_events`.
#[allow(dead_code)]
pub fn event_row(id: &str, sport: &str, title: &str, start_time: &str, status: &str) -> Value {
    json!({
        "id": id,
        "sport_type": sport,
        "title": title,
        "start_time": start_time,
        "status": status,
        "channel": null,
        "metadata": {},
        "created_at": "2024-03-01T00:00:00Z",
        "updated_at": "2024-03-01T00:00:00Z",
    })
}

/// Padel match row scoped to `user_id`.
#[allow(dead_code)]
pub fn padel_row(id: &str, user_id: &str, date_played: &str, win: bool) -> Value {
    json!({
        "id": id,
        "created_at": "2024-03-01T00:00:00Z",
        "user_id": user_id,
        "opponents": "Carlos y Marta",
        "result": "6-3 / 6-4",
        "win": win,
        "date_played": date_played,
    })
}
