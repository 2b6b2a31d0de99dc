//! # momentum-core
//!
//! Core library for momentum - a personal habit and project tracker.
//!
//! This library provides:
//! - Domain types for activities, projects, subtasks, and their logs
//! - Local-day bucketing of instants in the caller's timezone
//! - Exact decimal aggregation of progress deltas
//! - Streak derivation for counter-style activities
//! - Database storage layer with SQLite
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows one way through two layers:
//! - **Canonical (source of truth):** append-only activity and progress
//!   logs, bucketed by local day
//! - **Derived (regenerable):** per-day status rows and streak/summary
//!   reads, always reproducible by re-folding the logs
//!
//! Derived state is never a counter that drifts: every recompute re-folds
//! the whole day's log and idempotently upserts the result.
//!
//! ## Example
//!
//! ```rust,no_run
//! use momentum_core::{Config, Database};
//!
//! // Load configuration
//! let config = Config::load().expect("failed to load config");
//!
//! // Open database and provision the schema once at startup
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use projects::{CompletionHook, LogCompletionHook};
pub use rust_decimal::Decimal;
pub use types::*;

// Public modules
pub mod activities;
pub mod config;
pub mod day;
pub mod db;
pub mod decimal;
pub mod error;
pub mod logging;
pub mod projects;
pub mod streak;
pub mod types;
