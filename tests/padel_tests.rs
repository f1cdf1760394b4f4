// SPDX-License-Identifier: MIT

//! Padel record manager tests: session requirements, optimistic local
//! state, and confirmation-gated deletion.

mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use common::{padel_row, FakeBackend};
use sportdesk::backend::tables;
use sportdesk::error::AppError;
use sportdesk::models::PadelMatchInput;
use sportdesk::services::{ConfirmPrompt, PadelTracker};

struct Always(bool);

impl ConfirmPrompt for Always {
    fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}

fn input(date: (i32, u32, u32), win: bool) -> PadelMatchInput {
    PadelMatchInput {
        opponents: "Carlos y Marta".to_string(),
        result: "6-3 / 6-4".to_string(),
        win,
        date_played: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
    }
}

#[tokio::test]
async fn test_list_is_user_scoped_and_most_recent_first() {
    let backend = Arc::new(FakeBackend::new());
    backend.seed(
        tables::PADEL_MATCHES,
        vec![
            padel_row("m1", "u1", "2024-01-10", true),
            padel_row("m2", "u1", "2024-02-20", false),
            padel_row("m3", "someone-else", "2024-03-01", true),
        ],
    );
    backend.authenticate("u1", Some("ana@example.com"));

    let mut tracker = PadelTracker::new(backend);
    tracker.refetch().await.unwrap();

    let ids: Vec<&str> = tracker.matches().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["m2", "m1"]);
}

#[tokio::test]
async fn test_create_requires_session() {
    let backend = Arc::new(FakeBackend::new());
    let mut tracker = PadelTracker::new(backend);

    let err = tracker.add(input((2024, 3, 1), true)).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
    assert!(tracker.matches().is_empty());
}

#[tokio::test]
async fn test_create_stamps_owner_and_prepends() {
    let backend = Arc::new(FakeBackend::new());
    backend.seed(tables::PADEL_MATCHES, vec![padel_row("m1", "u1", "2024-02-20", true)]);
    backend.authenticate("u1", Some("ana@example.com"));

    let mut tracker = PadelTracker::new(backend.clone());
    tracker.refetch().await.unwrap();

    // date_played older than the existing record: still prepended.
    let created_id = tracker
        .add(input((2024, 1, 5), false))
        .await
        .unwrap()
        .id
        .clone();

    assert_eq!(tracker.matches()[0].id, created_id);
    assert_eq!(tracker.matches()[0].user_id, "u1");
    assert_eq!(tracker.matches().len(), 2);
}

#[tokio::test]
async fn test_delete_declined_issues_no_mutation() {
    let backend = Arc::new(FakeBackend::new());
    backend.seed(tables::PADEL_MATCHES, vec![padel_row("m1", "u1", "2024-02-20", true)]);
    backend.authenticate("u1", None);

    let mut tracker = PadelTracker::new(backend.clone());
    tracker.refetch().await.unwrap();

    let deleted = tracker.remove("m1", &Always(false)).await.unwrap();
    assert!(!deleted);
    assert_eq!(tracker.matches().len(), 1);
    assert_eq!(backend.delete_calls(), 0);
}

#[tokio::test]
async fn test_delete_failure_keeps_local_record() {
    let backend = Arc::new(FakeBackend::new());
    backend.seed(tables::PADEL_MATCHES, vec![padel_row("m1", "u1", "2024-02-20", true)]);
    backend.authenticate("u1", None);
    backend.fail_next_deletes(1);

    let mut tracker = PadelTracker::new(backend.clone());
    tracker.refetch().await.unwrap();

    let err = tracker.remove("m1", &Always(true)).await.unwrap_err();
    assert!(matches!(err, AppError::Backend(_)));
    assert_eq!(tracker.matches().len(), 1, "rollback: record must survive");

    // Retry succeeds and removes it.
    let deleted = tracker.remove("m1", &Always(true)).await.unwrap();
    assert!(deleted);
    assert!(tracker.matches().is_empty());
}

#[tokio::test]
async fn test_stats_follow_local_list() {
    let backend = Arc::new(FakeBackend::new());
    backend.seed(
        tables::PADEL_MATCHES,
        vec![
            padel_row("m1", "u1", "2024-01-10", true),
            padel_row("m2", "u1", "2024-01-11", true),
            padel_row("m3", "u1", "2024-01-12", true),
            padel_row("m4", "u1", "2024-01-13", false),
        ],
    );
    backend.authenticate("u1", None);

    let mut tracker = PadelTracker::new(backend);
    tracker.refetch().await.unwrap();

    let stats = tracker.stats();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.wins, 3);
    assert_eq!(stats.losses, 1);
    assert_eq!(stats.win_rate, 75);

    tracker.remove("m1", &Always(true)).await.unwrap();
    assert_eq!(tracker.stats().win_rate, 67);
}
