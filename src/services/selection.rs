// SPDX-License-Identifier: MIT

//! Event selection logic: pure transformations from the synchronized
//! set to what each dashboard section actually shows.

use chrono::{DateTime, Duration, Utc};

use crate::models::{SportEvent, SportType};

/// Separator between the meet name and the session name in F1 titles
/// ("Bahrain - FP1").
pub const MEET_SEPARATOR: &str = " - ";

/// Rolling window for the non-F1 feeds.
pub const WINDOW_DAYS: i64 = 7;

/// Meet identifier of an F1 event title: everything before the first
/// separator. A title without one is its own meet (group of one).
pub fn meet_of(title: &str) -> &str {
    match title.find(MEET_SEPARATOR) {
        Some(idx) => &title[..idx],
        None => title,
    }
}

/// Select the F1 events shown by default: every session of the next
/// meet (the one owning the soonest live-or-future session), past
/// sessions of that meet included. Empty when nothing is live or ahead.
pub fn next_meet_f1<'a>(events: &'a [SportEvent], now: DateTime<Utc>) -> Vec<&'a SportEvent> {
    let mut candidates: Vec<&SportEvent> = events
        .iter()
        .filter(|e| e.sport == SportType::F1)
        .filter(|e| e.is_live() || e.time >= now)
        .collect();
    candidates.sort_by_key(|e| e.time);

    let Some(next) = candidates.first() else {
        return Vec::new();
    };
    let meet = meet_of(&next.title);

    events
        .iter()
        .filter(|e| e.sport == SportType::F1 && e.title.starts_with(meet))
        .collect()
}

/// Select the events of one non-F1 feed shown by default: live events
/// always, otherwise anything starting up to exactly 7 days from now.
pub fn within_week<'a>(
    events: &'a [SportEvent],
    sport: SportType,
    now: DateTime<Utc>,
) -> Vec<&'a SportEvent> {
    let horizon = now + Duration::days(WINDOW_DAYS);
    events
        .iter()
        .filter(|e| e.sport == sport)
        .filter(|e| e.is_live() || e.time <= horizon)
        .collect()
}

/// What one dashboard section renders.
#[derive(Debug)]
pub struct SectionView<'a> {
    pub visible: Vec<&'a SportEvent>,
    /// Events windowed out. Drives the "there is more" affordance.
    pub hidden: usize,
}

impl SectionView<'_> {
    pub fn has_hidden(&self) -> bool {
        self.hidden > 0
    }
}

/// Compute one section, honoring its independent show-all toggle.
pub fn section<'a>(
    events: &'a [SportEvent],
    sport: SportType,
    show_all: bool,
    now: DateTime<Utc>,
) -> SectionView<'a> {
    let raw_count = events.iter().filter(|e| e.sport == sport).count();

    let visible = if show_all {
        events.iter().filter(|e| e.sport == sport).collect()
    } else if sport == SportType::F1 {
        next_meet_f1(events, now)
    } else {
        within_week(events, sport, now)
    };

    SectionView {
        hidden: raw_count - visible.len(),
        visible,
    }
}

/// Order a combined feed: live events first, everything else ascending
/// by start time. Stable, so equal keys keep their relative order.
pub fn sort_live_first(events: &mut [&SportEvent]) {
    events.sort_by_key(|e| (!e.is_live(), e.time));
}
