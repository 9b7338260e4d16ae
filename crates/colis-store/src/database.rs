//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees
//! that migrations are run before any other operation. It also owns the
//! live pending-count/list channels that UI layers subscribe to.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::Connection;
use tokio::sync::watch;
use tracing::warn;

use crate::error::{Result, StoreError};
use crate::migrations;
use crate::models::PendingDelivery;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
    pending_count_tx: watch::Sender<i64>,
    pending_rows_tx: watch::Sender<Vec<PendingDelivery>>,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data
    /// directory, e.g. `~/.local/share/colis/colis.db` on Linux.
    pub fn new() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("in", "devi7", "colis").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("colis.db");

        tracing::info!(path = %db_path.display(), "opening database");

        Self::open_at(&db_path)
    }

    /// Open (or create) a database at an explicit path.
    ///
    /// If the first open fails (typically an on-disk schema from an
    /// incompatible build), the file is removed and recreated once before
    /// the error is propagated. The queue is lost in that case, which is
    /// preferable to an app that can never start again.
    pub fn open_at(path: &Path) -> Result<Self> {
        match Self::try_open(path) {
            Ok(db) => Ok(db),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "database open failed, recreating file");
                let _ = std::fs::remove_file(path);
                Self::try_open(path)
            }
        }
    }

    fn try_open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Recommended SQLite settings.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Run schema migrations.
        migrations::run_migrations(&conn)?;

        let (pending_count_tx, _) = watch::channel(0);
        let (pending_rows_tx, _) = watch::channel(Vec::new());

        let db = Self {
            conn,
            pending_count_tx,
            pending_rows_tx,
        };
        db.publish_pending_changed();
        Ok(db)
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    ///
    /// Callers should prefer the typed CRUD helpers, but direct access is
    /// occasionally needed for ad-hoc queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return a mutable reference to the underlying connection (needed for
    /// transactions).
    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }

    /// Subscribe to the live pending-queue count.
    ///
    /// The receiver holds the current count immediately and observes a new
    /// value after every queue insert or delete.
    pub fn watch_pending_count(&self) -> watch::Receiver<i64> {
        self.pending_count_tx.subscribe()
    }

    /// Subscribe to the live pending-queue list (oldest first), with the
    /// same emission behavior as [`Database::watch_pending_count`].
    pub fn watch_pending(&self) -> watch::Receiver<Vec<PendingDelivery>> {
        self.pending_rows_tx.subscribe()
    }

    /// Re-read the queue and publish count and list to watchers. Called by
    /// the mutating queue helpers.
    pub(crate) fn publish_pending_changed(&self) {
        if let Ok(count) = self.pending_count() {
            self.pending_count_tx.send_replace(count);
        }
        if let Ok(rows) = self.all_pending() {
            self.pending_rows_tx.send_replace(rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let db = Database::open_at(&path).expect("should open");
        assert!(db.path().is_some());
    }

    #[test]
    fn corrupt_file_is_recreated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        std::fs::write(&path, b"this is not a sqlite database, not even close").unwrap();

        let db = Database::open_at(&path).expect("should recover by recreating");
        assert_eq!(db.pending_count().unwrap(), 0);
    }

    #[test]
    fn watcher_starts_at_current_count() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        assert_eq!(*db.watch_pending_count().borrow(), 0);
    }
}
