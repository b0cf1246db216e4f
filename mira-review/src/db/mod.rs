//! Database queries for sessions, reviews and sync state
//!
//! Schema creation lives in `mira_common::db::init`.

pub mod reviews;
pub mod sessions;
pub mod sync_state;
