//! # Mira Common Library
//!
//! Shared code for the Mira review service:
//! - Database initialization and data model (sessions, reviews, sync state)
//! - Configuration resolution
//! - Reviewer cookie signing
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod reviewer;
pub mod time;

pub use error::{Error, Result};
