// SPDX-License-Identifier: MIT

//! Services module - the dashboard's core logic.

pub mod auth;
pub mod events;
pub mod padel;
pub mod selection;

pub use auth::AuthManager;
pub use events::{apply_change, filter_by_preferences, EventFeed};
pub use padel::{ConfirmPrompt, PadelTracker};
pub use selection::{section, sort_live_first, SectionView};
