//! # colis-store
//!
//! Local persistence for the delivery client: the pending-submission queue,
//! the server-history cache, and the paging-cursor bookkeeping, all in one
//! SQLite database. The crate exposes a synchronous `Database` handle that
//! wraps a `rusqlite::Connection` and provides typed CRUD helpers; callers
//! that must stay off a latency-sensitive thread wrap calls in
//! `spawn_blocking`.

pub mod cursors;
pub mod database;
pub mod history;
pub mod migrations;
pub mod models;
pub mod pending;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
