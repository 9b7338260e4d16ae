//! v001 -- Initial schema creation.
//!
//! Creates the three core tables: `pending_deliveries` (the submission
//! queue), `history_cache` (read-through cache of server history), and
//! `page_cursors` (paging-key bookkeeping).

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Pending submission queue
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS pending_deliveries (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    item                TEXT NOT NULL,
    serial_number       TEXT NOT NULL,
    sim                 TEXT NOT NULL,
    merchant            TEXT NOT NULL,
    shop                TEXT NOT NULL,
    receiver            TEXT NOT NULL,
    delivery_agent      TEXT NOT NULL,
    receiver_proof_path TEXT,                         -- local file path, not inline data
    created_at          TEXT NOT NULL,                -- ISO-8601 / RFC-3339
    retry_count         INTEGER NOT NULL DEFAULT 0,
    status              TEXT NOT NULL DEFAULT 'PENDING',
    server_code         TEXT
);

CREATE INDEX IF NOT EXISTS idx_pending_created_at
    ON pending_deliveries(created_at);

-- ----------------------------------------------------------------
-- History cache (server-sourced, read-through)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS history_cache (
    id             TEXT PRIMARY KEY NOT NULL,         -- server id or code
    item           TEXT NOT NULL,
    serial_number  TEXT NOT NULL,
    sim            TEXT NOT NULL,
    merchant       TEXT NOT NULL,
    shop           TEXT NOT NULL,
    receiver       TEXT NOT NULL,
    delivery_agent TEXT NOT NULL,
    code           TEXT NOT NULL,
    receiver_proof TEXT,                              -- URL, path or inline base64
    created_at     TEXT,                              -- server ISO string, verbatim
    row_order      INTEGER NOT NULL                   -- preserves server page order
);

CREATE INDEX IF NOT EXISTS idx_history_row_order
    ON history_cache(row_order);

-- ----------------------------------------------------------------
-- Paging cursors
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS page_cursors (
    query_key TEXT PRIMARY KEY NOT NULL,
    prev_key  INTEGER,
    next_key  INTEGER
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
