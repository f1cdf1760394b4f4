// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod event;
pub mod padel;
pub mod profile;

pub use event::{EventRow, EventStatus, Metadata, SportEvent, SportType};
pub use padel::{MatchStats, PadelMatch, PadelMatchInput};
pub use profile::{Profile, UserPreferences};
