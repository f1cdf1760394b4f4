// SPDX-License-Identifier: MIT

//! Sportdesk: live sports-event dashboard client.
//!
//! This crate keeps a dashboard's event list synchronized with a hosted
//! backend (bulk snapshot plus live change stream), selects what each
//! sport section shows, and manages a user's padel match records.

pub mod backend;
pub mod config;
pub mod deadline;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;
