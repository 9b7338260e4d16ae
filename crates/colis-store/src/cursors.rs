//! CRUD for the paging-cursor table.
//!
//! One row per query context. The cursor is normally written together with
//! its page via [`Database::write_history_page`]; the helpers here cover
//! reads and the standalone cases.

use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::PageCursor;

impl Database {
    /// Look up the cursor for a query context, `None` if no page has been
    /// fetched yet for that context.
    pub fn cursor(&self, query_key: &str) -> Result<Option<PageCursor>> {
        let result = self.conn().query_row(
            "SELECT query_key, prev_key, next_key FROM page_cursors WHERE query_key = ?1",
            params![query_key],
            row_to_cursor,
        );
        match result {
            Ok(cursor) => Ok(Some(cursor)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    /// Insert or replace a cursor outside a page write.
    pub fn put_cursor(&self, cursor: &PageCursor) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO page_cursors (query_key, prev_key, next_key)
             VALUES (?1, ?2, ?3)",
            params![cursor.query_key, cursor.prev_key, cursor.next_key],
        )?;
        Ok(())
    }

    /// Drop every cursor (done on refresh, together with the cache clear).
    pub fn clear_cursors(&self) -> Result<()> {
        self.conn().execute("DELETE FROM page_cursors", [])?;
        Ok(())
    }
}

fn row_to_cursor(row: &rusqlite::Row<'_>) -> rusqlite::Result<PageCursor> {
    let prev: Option<i64> = row.get(1)?;
    let next: Option<i64> = row.get(2)?;
    Ok(PageCursor {
        query_key: row.get(0)?,
        prev_key: prev.map(|v| v as u32),
        next_key: next.map(|v| v as u32),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    fn test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (db, dir)
    }

    #[test]
    fn missing_cursor_is_none() {
        let (db, _dir) = test_db();
        assert!(db.cursor("HISTORY").unwrap().is_none());
    }

    #[test]
    fn upsert_round_trip() {
        let (db, _dir) = test_db();

        let cursor = PageCursor {
            query_key: "HISTORY:router".into(),
            prev_key: Some(1),
            next_key: Some(3),
        };
        db.put_cursor(&cursor).unwrap();
        assert_eq!(db.cursor("HISTORY:router").unwrap().unwrap(), cursor);

        let ended = PageCursor {
            next_key: None,
            ..cursor
        };
        db.put_cursor(&ended).unwrap();
        assert_eq!(
            db.cursor("HISTORY:router").unwrap().unwrap().next_key,
            None
        );
    }

    #[test]
    fn clear_drops_every_context() {
        let (db, _dir) = test_db();
        db.put_cursor(&PageCursor {
            query_key: "HISTORY".into(),
            prev_key: None,
            next_key: Some(2),
        })
        .unwrap();
        db.put_cursor(&PageCursor {
            query_key: "HISTORY:x".into(),
            prev_key: None,
            next_key: Some(2),
        })
        .unwrap();

        db.clear_cursors().unwrap();
        assert!(db.cursor("HISTORY").unwrap().is_none());
        assert!(db.cursor("HISTORY:x").unwrap().is_none());
    }
}
