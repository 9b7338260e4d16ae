//! CRUD for the pending-submission queue.
//!
//! The queue is the single shared mutable resource of the sync engines.
//! Every mutation here is one SQL statement, so per-row atomicity holds
//! without explicit transactions; the live count/list channels are
//! republished after each insert/delete.

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter};

use colis_shared::types::DeliveryForm;

use crate::database::Database;
use crate::error::Result;
use crate::models::{PendingDelivery, PendingStatus};

const PENDING_COLUMNS: &str = "id, item, serial_number, sim, merchant, shop, receiver, \
     delivery_agent, receiver_proof_path, created_at, retry_count, status, server_code";

impl Database {
    /// Enqueue a delivery that could not be sent. Returns the locally
    /// assigned id. `created_at` is stamped here, not by the caller.
    pub fn insert_pending(&self, form: &DeliveryForm) -> Result<i64> {
        self.conn().execute(
            "INSERT INTO pending_deliveries
                (item, serial_number, sim, merchant, shop, receiver, delivery_agent,
                 receiver_proof_path, created_at, retry_count, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, 'PENDING')",
            params![
                form.item,
                form.serial_number,
                form.sim,
                form.merchant,
                form.shop,
                form.receiver,
                form.delivery_agent,
                form.receiver_proof_path,
                Utc::now().to_rfc3339(),
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        self.publish_pending_changed();
        Ok(id)
    }

    /// Fetch one queued delivery, or `None` if the id is unknown.
    pub fn pending_by_id(&self, id: i64) -> Result<Option<PendingDelivery>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {PENDING_COLUMNS} FROM pending_deliveries WHERE id = ?1"
        ))?;
        let mut rows = stmt.query_map(params![id], row_to_pending)?;
        rows.next().transpose().map_err(Into::into)
    }

    /// Point-in-time snapshot of the whole queue, oldest first.
    pub fn all_pending(&self) -> Result<Vec<PendingDelivery>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {PENDING_COLUMNS} FROM pending_deliveries ORDER BY created_at ASC, id ASC"
        ))?;

        let rows = stmt.query_map([], row_to_pending)?;

        let mut pending = Vec::new();
        for row in rows {
            pending.push(row?);
        }
        Ok(pending)
    }

    /// One page of the queue (for list screens), oldest first.
    pub fn pending_page(&self, limit: u32, offset: u32) -> Result<Vec<PendingDelivery>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {PENDING_COLUMNS} FROM pending_deliveries
             ORDER BY created_at ASC, id ASC LIMIT ?1 OFFSET ?2"
        ))?;

        let rows = stmt.query_map(params![limit, offset], row_to_pending)?;

        let mut pending = Vec::new();
        for row in rows {
            pending.push(row?);
        }
        Ok(pending)
    }

    /// Current queue size.
    pub fn pending_count(&self) -> Result<i64> {
        let count = self
            .conn()
            .query_row("SELECT COUNT(*) FROM pending_deliveries", [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }

    /// Delete acknowledged rows in one statement. Returns how many were
    /// removed.
    pub fn delete_pending(&self, ids: &[i64]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["?"; ids.len()].join(",");
        let affected = self.conn().execute(
            &format!("DELETE FROM pending_deliveries WHERE id IN ({placeholders})"),
            params_from_iter(ids.iter()),
        )?;
        self.publish_pending_changed();
        Ok(affected)
    }

    /// Bump the retry counter on every listed row and mark them `FAILED`,
    /// in one statement. Rows are kept; the count channel is untouched
    /// because the queue size does not change.
    pub fn increment_retry(&self, ids: &[i64]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["?"; ids.len()].join(",");
        let affected = self.conn().execute(
            &format!(
                "UPDATE pending_deliveries
                 SET retry_count = retry_count + 1, status = 'FAILED'
                 WHERE id IN ({placeholders})"
            ),
            params_from_iter(ids.iter()),
        )?;
        Ok(affected)
    }
}

fn row_to_pending(row: &rusqlite::Row<'_>) -> rusqlite::Result<PendingDelivery> {
    let created_str: String = row.get(9)?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
        })?;
    let retry_count: i64 = row.get(10)?;
    let status_str: String = row.get(11)?;

    Ok(PendingDelivery {
        id: row.get(0)?,
        item: row.get(1)?,
        serial_number: row.get(2)?,
        sim: row.get(3)?,
        merchant: row.get(4)?,
        shop: row.get(5)?,
        receiver: row.get(6)?,
        delivery_agent: row.get(7)?,
        receiver_proof_path: row.get(8)?,
        created_at,
        retry_count: retry_count.max(0) as u32,
        status: PendingStatus::from_str(&status_str),
        server_code: row.get(12)?,
    })
}
