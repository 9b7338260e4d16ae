//! The remote-backed history paging engine.
//!
//! A paging session walks the server history page by page, persisting each
//! page and its cursor to the local cache in one transaction. The cursor's
//! `next_key` drives forward paging; a short page sets it to `None`, after
//! which further appends short-circuit without a network call.
//!
//! When constructed without a database handle the pager still works as a
//! pure network-backed source, tracking its cursor in memory and caching
//! nothing.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use colis_net::{ApiClient, NetworkOutcome};
use colis_shared::constants::{HISTORY_CURSOR_KEY, MAX_PAGE_LIMIT};
use colis_shared::types::HistoryRecord;
use colis_shared::wire::parse_history_page;
use colis_store::PageCursor;

use crate::error::SyncError;
use crate::{with_db, SharedDatabase};

/// What kind of load the consumer is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadDirection {
    /// First load of a session: clears cache and cursors, fetches page 1.
    Refresh,
    /// Next page, from the stored `next_key`.
    Append,
    /// Backward paging; always reports end-of-pagination immediately.
    Prepend,
}

/// Result of one successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLoad {
    /// The rows fetched by this load (empty for a short-circuited one).
    pub records: Vec<HistoryRecord>,
    /// True when the server has no further pages.
    pub end_of_pagination: bool,
}

impl PageLoad {
    fn end() -> Self {
        Self {
            records: Vec::new(),
            end_of_pagination: true,
        }
    }
}

/// A failed load. The cache and cursor are left exactly as they were; the
/// consumer may retry the same load.
#[derive(Error, Debug)]
pub enum PagerError {
    #[error("Server returned code {0}")]
    Server(u16),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid history payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Cursor-table key for a session: `"HISTORY"` plain, `"HISTORY:{kw}"`
/// when filtered.
pub fn cursor_key(keyword: Option<&str>) -> String {
    match keyword.filter(|k| !k.trim().is_empty()) {
        Some(k) => format!("{HISTORY_CURSOR_KEY}:{k}"),
        None => HISTORY_CURSOR_KEY.to_string(),
    }
}

/// One paging session over the delivery history, fixed to a keyword and
/// page size. Changing either means starting a new session.
pub struct HistoryPager {
    api: Arc<ApiClient>,
    db: Option<SharedDatabase>,
    keyword: Option<String>,
    page_size: u32,
    /// Cursor state for the store-less fallback mode.
    mem_cursor: Option<PageCursor>,
}

impl HistoryPager {
    pub fn new(
        api: Arc<ApiClient>,
        db: Option<SharedDatabase>,
        keyword: Option<String>,
        page_size: u32,
    ) -> Self {
        Self {
            api,
            db,
            keyword: keyword.filter(|k| !k.trim().is_empty()),
            page_size,
            mem_cursor: None,
        }
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Perform one load. On success the page and its cursor are already
    /// persisted (cached mode) or tracked in memory (fallback mode); on
    /// error nothing was mutated.
    pub async fn load(&mut self, direction: LoadDirection) -> Result<PageLoad, PagerError> {
        let page = match direction {
            LoadDirection::Refresh => 1,
            LoadDirection::Prepend => return Ok(PageLoad::end()),
            LoadDirection::Append => match self.current_cursor().await? {
                Some(PageCursor {
                    next_key: Some(next),
                    ..
                }) => next,
                _ => return Ok(PageLoad::end()),
            },
        };

        let limit = self.page_size.min(MAX_PAGE_LIMIT);
        debug!(page, limit, keyword = self.keyword.as_deref().unwrap_or(""), "loading history page");

        match self
            .api
            .get_history_page(page, limit, self.keyword.as_deref())
            .await
        {
            NetworkOutcome::Success { status, body } if (200..=299).contains(&status) => {
                let body = body.unwrap_or_else(|| "[]".to_string());
                let records = parse_history_page(&body, page, limit)?;
                let end_of_pagination = (records.len() as u32) < limit;

                let cursor = PageCursor {
                    query_key: cursor_key(self.keyword.as_deref()),
                    prev_key: if page == 1 { None } else { Some(page - 1) },
                    next_key: if end_of_pagination {
                        None
                    } else {
                        Some(page + 1)
                    },
                };

                let refresh = matches!(direction, LoadDirection::Refresh);
                match &self.db {
                    Some(db) => {
                        let rows = records.clone();
                        let cursor = cursor.clone();
                        with_db(db, move |db| db.write_history_page(refresh, &rows, &cursor))
                            .await?;
                    }
                    None => self.mem_cursor = Some(cursor),
                }

                Ok(PageLoad {
                    records,
                    end_of_pagination,
                })
            }
            NetworkOutcome::Success { status, .. } => Err(PagerError::Server(status)),
            NetworkOutcome::Failure { error } => Err(PagerError::Network(error)),
        }
    }

    /// Read a page of the local cache (empty in fallback mode).
    pub async fn cached_page(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<HistoryRecord>, PagerError> {
        match &self.db {
            Some(db) => Ok(with_db(db, move |db| db.history_page(limit, offset)).await?),
            None => Ok(Vec::new()),
        }
    }

    async fn current_cursor(&self) -> Result<Option<PageCursor>, PagerError> {
        match &self.db {
            Some(db) => {
                let key = cursor_key(self.keyword.as_deref());
                Ok(with_db(db, move |db| db.cursor(&key)).await?)
            }
            None => Ok(self.mem_cursor.clone()),
        }
    }
}
