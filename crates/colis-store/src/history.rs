//! CRUD for the server-history cache.
//!
//! The cache is read-through: rows are only ever written as whole fetched
//! pages, together with the paging cursor, inside one transaction. A failed
//! fetch therefore never leaves a partially cleared cache behind.

use rusqlite::params;

use colis_shared::types::HistoryRecord;

use crate::database::Database;
use crate::error::Result;
use crate::models::PageCursor;

const HISTORY_COLUMNS: &str = "id, item, serial_number, sim, merchant, shop, receiver, \
     delivery_agent, code, receiver_proof, created_at, row_order";

impl Database {
    /// Atomically persist one fetched page and its cursor.
    ///
    /// With `refresh` set, the cache and the whole cursor table are cleared
    /// first, all inside the same transaction: either the new page replaces
    /// the old state completely or nothing changes at all.
    pub fn write_history_page(
        &mut self,
        refresh: bool,
        rows: &[HistoryRecord],
        cursor: &PageCursor,
    ) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        if refresh {
            tx.execute("DELETE FROM history_cache", [])?;
            tx.execute("DELETE FROM page_cursors", [])?;
        }

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR REPLACE INTO history_cache ({HISTORY_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ))?;
            for record in rows {
                stmt.execute(params![
                    record.id,
                    record.item,
                    record.serial_number,
                    record.sim,
                    record.merchant,
                    record.shop,
                    record.receiver,
                    record.delivery_agent,
                    record.code,
                    record.receiver_proof,
                    record.created_at,
                    record.row_order,
                ])?;
            }

            stmt = tx.prepare(
                "INSERT OR REPLACE INTO page_cursors (query_key, prev_key, next_key)
                 VALUES (?1, ?2, ?3)",
            )?;
            stmt.execute(params![cursor.query_key, cursor.prev_key, cursor.next_key])?;
        }

        tx.commit()?;
        Ok(())
    }

    /// One page of cached history in server order.
    pub fn history_page(&self, limit: u32, offset: u32) -> Result<Vec<HistoryRecord>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {HISTORY_COLUMNS} FROM history_cache
             ORDER BY row_order ASC LIMIT ?1 OFFSET ?2"
        ))?;

        let rows = stmt.query_map(params![limit, offset], row_to_history)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Everything currently cached, in server order.
    pub fn all_history(&self) -> Result<Vec<HistoryRecord>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {HISTORY_COLUMNS} FROM history_cache ORDER BY row_order ASC"
        ))?;

        let rows = stmt.query_map([], row_to_history)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn history_count(&self) -> Result<i64> {
        let count = self
            .conn()
            .query_row("SELECT COUNT(*) FROM history_cache", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn clear_history(&self) -> Result<()> {
        self.conn().execute("DELETE FROM history_cache", [])?;
        Ok(())
    }
}

fn row_to_history(row: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryRecord> {
    Ok(HistoryRecord {
        id: row.get(0)?,
        item: row.get(1)?,
        serial_number: row.get(2)?,
        sim: row.get(3)?,
        merchant: row.get(4)?,
        shop: row.get(5)?,
        receiver: row.get(6)?,
        delivery_agent: row.get(7)?,
        code: row.get(8)?,
        receiver_proof: row.get(9)?,
        created_at: row.get(10)?,
        row_order: row.get(11)?,
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

    fn record(id: &str, row_order: i64) -> HistoryRecord {
        HistoryRecord {
            id: id.into(),
            item: "Router".into(),
            serial_number: "SN".into(),
            sim: "SIM".into(),
            merchant: "M".into(),
            shop: "S".into(),
            receiver: "R".into(),
            delivery_agent: "A".into(),
            code: id.into(),
            receiver_proof: None,
            created_at: Some("2025-12-22T11:22:01+00:00".into()),
            row_order,
        }
    }

    fn cursor(next: Option<u32>) -> PageCursor {
        PageCursor {
            query_key: "HISTORY".into(),
            prev_key: None,
            next_key: next,
        }
    }

    #[test]
    fn page_write_persists_rows_and_cursor() {
        let (mut db, _dir) = test_db();

        db.write_history_page(true, &[record("a", 0), record("b", 1)], &cursor(Some(2)))
            .unwrap();

        assert_eq!(db.history_count().unwrap(), 2);
        let stored = db.cursor("HISTORY").unwrap().unwrap();
        assert_eq!(stored.next_key, Some(2));
    }

    #[test]
    fn refresh_replaces_previous_pages() {
        let (mut db, _dir) = test_db();

        db.write_history_page(true, &[record("old", 0)], &cursor(Some(2)))
            .unwrap();
        db.write_history_page(false, &[record("old2", 1)], &cursor(Some(3)))
            .unwrap();
        db.write_history_page(true, &[record("new", 0)], &cursor(None))
            .unwrap();

        let rows = db.all_history().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "new");
        assert_eq!(db.cursor("HISTORY").unwrap().unwrap().next_key, None);
    }

    #[test]
    fn rows_come_back_in_row_order() {
        let (mut db, _dir) = test_db();

        db.write_history_page(true, &[record("b", 1), record("a", 0)], &cursor(Some(2)))
            .unwrap();

        let rows = db.all_history().unwrap();
        assert_eq!(rows[0].id, "a");
        assert_eq!(rows[1].id, "b");

        let paged = db.history_page(1, 1).unwrap();
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].id, "b");
    }

    #[test]
    fn same_id_is_replaced_not_duplicated() {
        let (mut db, _dir) = test_db();

        db.write_history_page(true, &[record("a", 0)], &cursor(Some(2)))
            .unwrap();
        db.write_history_page(false, &[record("a", 5)], &cursor(Some(3)))
            .unwrap();

        let rows = db.all_history().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row_order, 5);
    }
}
