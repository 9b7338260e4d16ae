//! Debounced, restartable history feed.
//!
//! The feed runs in a dedicated tokio task. External code talks to it
//! through a typed command channel and observes list snapshots on a watch
//! channel, keeping the paging engine fully asynchronous and decoupled
//! from any UI framework.
//!
//! Keyword and page-size edits are debounced: a burst of changes inside the
//! quiet window collapses into one refresh. A load whose session was
//! superseded while it was in flight completes normally but its result is
//! discarded; the last request wins.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use colis_net::ApiClient;
use colis_shared::constants::{DEFAULT_PAGE_SIZE, KEYWORD_DEBOUNCE_MS};
use colis_shared::types::HistoryRecord;

use crate::pager::{HistoryPager, LoadDirection};
use crate::SharedDatabase;

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub page_size: u32,
    /// Quiet window after the last keyword/page-size edit before the feed
    /// restarts. Tests shrink this.
    pub debounce: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            debounce: Duration::from_millis(KEYWORD_DEBOUNCE_MS),
        }
    }
}

/// What consumers observe: the accumulated list for the current session.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    pub keyword: Option<String>,
    pub records: Vec<HistoryRecord>,
    pub end_of_pagination: bool,
    /// Raw error text of the last failed load, if any. Run it through
    /// [`colis_shared::classify`] before showing it to a user.
    pub error: Option<String>,
}

/// Commands sent *into* the feed task.
#[derive(Debug)]
enum FeedCommand {
    SetKeyword(Option<String>),
    SetPageSize(u32),
    LoadMore,
    Refresh,
    Shutdown,
}

/// Handle to a running feed task.
pub struct HistoryFeed {
    cmd_tx: mpsc::Sender<FeedCommand>,
    snapshot_rx: watch::Receiver<FeedSnapshot>,
}

impl HistoryFeed {
    /// Spawn the feed task and trigger its initial refresh. `db = None`
    /// runs the feed in the cache-less fallback mode.
    pub fn spawn(api: Arc<ApiClient>, db: Option<SharedDatabase>, config: FeedConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (snapshot_tx, snapshot_rx) = watch::channel(FeedSnapshot::default());

        let pager = HistoryPager::new(Arc::clone(&api), db.clone(), None, config.page_size);
        let task = FeedTask {
            api,
            db,
            config,
            pager,
            keyword: None,
            page_size: None,
            records: Vec::new(),
            end_of_pagination: false,
            error: None,
            pending_keyword: None,
            pending_page_size: None,
            deadline: None,
            refresh_queued: false,
            shutdown: false,
            snapshot_tx,
        };
        tokio::spawn(task.run(cmd_rx));

        Self {
            cmd_tx,
            snapshot_rx,
        }
    }

    /// Change the keyword filter; takes effect after the quiet window.
    pub async fn set_keyword(&self, keyword: Option<String>) {
        let _ = self.cmd_tx.send(FeedCommand::SetKeyword(keyword)).await;
    }

    /// Change the page size; takes effect after the quiet window.
    pub async fn set_page_size(&self, page_size: u32) {
        let _ = self.cmd_tx.send(FeedCommand::SetPageSize(page_size)).await;
    }

    /// Ask for the next page of the current session.
    pub async fn load_more(&self) {
        let _ = self.cmd_tx.send(FeedCommand::LoadMore).await;
    }

    /// Restart the current session from page 1 immediately.
    pub async fn refresh(&self) {
        let _ = self.cmd_tx.send(FeedCommand::Refresh).await;
    }

    /// Stop the feed task.
    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(FeedCommand::Shutdown).await;
    }

    /// Subscribe to list snapshots (holds the latest immediately).
    pub fn snapshots(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshot_rx.clone()
    }
}

struct FeedTask {
    api: Arc<ApiClient>,
    db: Option<SharedDatabase>,
    config: FeedConfig,
    /// The current session's pager; replaced on every restart. In fallback
    /// mode it also carries the in-memory cursor, so it must live as long
    /// as the session.
    pager: HistoryPager,
    /// Session parameters currently in effect.
    keyword: Option<String>,
    page_size: Option<u32>,
    records: Vec<HistoryRecord>,
    end_of_pagination: bool,
    error: Option<String>,
    /// Edits waiting for the quiet window to elapse.
    pending_keyword: Option<Option<String>>,
    pending_page_size: Option<u32>,
    deadline: Option<Instant>,
    refresh_queued: bool,
    shutdown: bool,
    snapshot_tx: watch::Sender<FeedSnapshot>,
}

impl FeedTask {
    async fn run(mut self, mut rx: mpsc::Receiver<FeedCommand>) {
        self.restart(&mut rx).await;

        while !self.shutdown {
            let command = tokio::select! {
                cmd = rx.recv() => match cmd {
                    Some(cmd) => Some(cmd),
                    None => break,
                },
                _ = sleep_until(self.deadline.unwrap_or_else(Instant::now)),
                    if self.deadline.is_some() => None,
            };

            match command {
                // Quiet window elapsed: apply the batched edits.
                None => {
                    self.deadline = None;
                    let changed = self.apply_pending();
                    let forced = std::mem::take(&mut self.refresh_queued);
                    if changed || forced {
                        self.restart(&mut rx).await;
                    }
                }
                Some(FeedCommand::SetKeyword(keyword)) => {
                    self.pending_keyword = Some(keyword);
                    self.deadline = Some(Instant::now() + self.config.debounce);
                }
                Some(FeedCommand::SetPageSize(page_size)) => {
                    self.pending_page_size = Some(page_size);
                    self.deadline = Some(Instant::now() + self.config.debounce);
                }
                Some(FeedCommand::LoadMore) => {
                    // A pending session change makes the old pages moot.
                    if self.deadline.is_none() {
                        self.append(&mut rx).await;
                    }
                }
                Some(FeedCommand::Refresh) => {
                    self.deadline = None;
                    self.apply_pending();
                    self.restart(&mut rx).await;
                }
                Some(FeedCommand::Shutdown) => break,
            }
        }
    }

    /// Fold batched edits into the session parameters. Returns whether the
    /// session actually changed (an edit back to the same value does not
    /// restart, mirroring a distinct-until-changed stream).
    fn apply_pending(&mut self) -> bool {
        let mut changed = false;
        if let Some(keyword) = self.pending_keyword.take() {
            let keyword = keyword.filter(|k| !k.trim().is_empty());
            if keyword != self.keyword {
                self.keyword = keyword;
                changed = true;
            }
        }
        if let Some(page_size) = self.pending_page_size.take() {
            if Some(page_size) != self.page_size {
                self.page_size = Some(page_size);
                changed = true;
            }
        }
        changed
    }

    fn new_pager(&self) -> HistoryPager {
        HistoryPager::new(
            Arc::clone(&self.api),
            self.db.clone(),
            self.keyword.clone(),
            self.page_size.unwrap_or(self.config.page_size),
        )
    }

    async fn restart(&mut self, rx: &mut mpsc::Receiver<FeedCommand>) {
        self.pager = self.new_pager();
        match self.pager.load(LoadDirection::Refresh).await {
            Ok(page) => {
                self.records = page.records;
                self.end_of_pagination = page.end_of_pagination;
                self.error = None;
            }
            Err(e) => {
                // Previous cache state is untouched; keep showing it.
                self.error = Some(e.to_string());
            }
        }
        if self.drain(rx) {
            debug!("history refresh superseded, discarding result");
            return;
        }
        self.publish();
    }

    async fn append(&mut self, rx: &mut mpsc::Receiver<FeedCommand>) {
        if self.end_of_pagination {
            return;
        }
        match self.pager.load(LoadDirection::Append).await {
            Ok(page) => {
                self.records.extend(page.records);
                self.end_of_pagination = page.end_of_pagination;
                self.error = None;
            }
            Err(e) => {
                self.error = Some(e.to_string());
            }
        }
        if self.drain(rx) {
            debug!("history page load superseded, discarding result");
            return;
        }
        self.publish();
    }

    /// Absorb commands that arrived while a load was in flight. Returns
    /// true when the completed load's result must be discarded because a
    /// newer session (or an explicit refresh) is queued behind it.
    fn drain(&mut self, rx: &mut mpsc::Receiver<FeedCommand>) -> bool {
        let mut superseded = false;
        while let Ok(cmd) = rx.try_recv() {
            match cmd {
                FeedCommand::SetKeyword(keyword) => {
                    self.pending_keyword = Some(keyword);
                    self.deadline = Some(Instant::now() + self.config.debounce);
                    superseded = true;
                }
                FeedCommand::SetPageSize(page_size) => {
                    self.pending_page_size = Some(page_size);
                    self.deadline = Some(Instant::now() + self.config.debounce);
                    superseded = true;
                }
                FeedCommand::Refresh => {
                    self.refresh_queued = true;
                    self.deadline = Some(Instant::now());
                    superseded = true;
                }
                FeedCommand::LoadMore => {
                    debug!("dropping load-more queued behind a completed load");
                }
                FeedCommand::Shutdown => {
                    self.shutdown = true;
                    superseded = true;
                }
            }
        }
        superseded
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(FeedSnapshot {
            keyword: self.keyword.clone(),
            records: self.records.clone(),
            end_of_pagination: self.end_of_pagination,
            error: self.error.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::Ordering;

    use colis_net::ApiConfig;
    use colis_store::Database;

    use crate::shared_database;
    use crate::testutil::{spawn_api, Script};

    async fn wait_snapshot(
        rx: &mut watch::Receiver<FeedSnapshot>,
        predicate: impl FnMut(&FeedSnapshot) -> bool,
    ) -> FeedSnapshot {
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
            .await
            .expect("snapshot in time")
            .expect("feed alive")
            .clone()
    }

    async fn rig(total: usize) -> (HistoryFeed, Arc<Script>, tempfile::TempDir) {
        let script = Arc::new(Script::default());
        script.history_total.store(total, Ordering::SeqCst);
        let base = spawn_api(script.clone()).await;

        let dir = tempfile::tempdir().unwrap();
        let db = shared_database(Database::open_at(&dir.path().join("test.db")).unwrap());
        let api = Arc::new(ApiClient::new(&ApiConfig::default().with_base_url(&base)).unwrap());
        let feed = HistoryFeed::spawn(
            api,
            Some(db),
            FeedConfig {
                page_size: 20,
                debounce: Duration::from_millis(50),
            },
        );
        (feed, script, dir)
    }

    #[tokio::test]
    async fn initial_refresh_publishes_first_page() {
        let (feed, _script, _dir) = rig(5).await;
        let mut rx = feed.snapshots();

        let snapshot = wait_snapshot(&mut rx, |s| !s.records.is_empty()).await;
        assert_eq!(snapshot.records.len(), 5);
        assert!(snapshot.end_of_pagination);
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn keyword_burst_collapses_into_one_refresh() {
        let (feed, script, _dir) = rig(5).await;
        let mut rx = feed.snapshots();
        wait_snapshot(&mut rx, |s| !s.records.is_empty()).await;

        feed.set_keyword(Some("a".into())).await;
        feed.set_keyword(Some("ab".into())).await;
        feed.set_keyword(Some("abc".into())).await;

        let snapshot = wait_snapshot(&mut rx, |s| s.keyword.as_deref() == Some("abc")).await;
        assert_eq!(snapshot.records.len(), 5);

        // One initial refresh plus exactly one for the debounced burst.
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(script.history_hits.load(Ordering::SeqCst), 2);
        assert_eq!(
            script.last_keyword.lock().unwrap().as_deref(),
            Some("abc")
        );
    }

    #[tokio::test]
    async fn repeating_the_same_keyword_does_not_restart() {
        let (feed, script, _dir) = rig(5).await;
        let mut rx = feed.snapshots();
        wait_snapshot(&mut rx, |s| !s.records.is_empty()).await;

        feed.set_keyword(None).await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(script.history_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn load_more_extends_the_snapshot_until_the_end() {
        let (feed, script, _dir) = rig(35).await;
        let mut rx = feed.snapshots();

        let first = wait_snapshot(&mut rx, |s| s.records.len() == 20).await;
        assert!(!first.end_of_pagination);

        feed.load_more().await;
        let second = wait_snapshot(&mut rx, |s| s.records.len() == 35).await;
        assert!(second.end_of_pagination);

        // End reached: a further load-more never hits the network.
        feed.load_more().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(script.history_hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_refresh_reports_an_error_snapshot() {
        let script = Arc::new(Script::default());
        script.history_status.store(500, Ordering::SeqCst);
        let base = spawn_api(script.clone()).await;
        let api = Arc::new(ApiClient::new(&ApiConfig::default().with_base_url(&base)).unwrap());

        let feed = HistoryFeed::spawn(api, None, FeedConfig::default());
        let mut rx = feed.snapshots();

        let snapshot = wait_snapshot(&mut rx, |s| s.error.is_some()).await;
        assert!(snapshot.records.is_empty());
        assert_eq!(
            snapshot.error.as_deref(),
            Some("Server returned code 500")
        );
    }

    #[tokio::test]
    async fn fallback_feed_pages_with_its_memory_cursor() {
        let script = Arc::new(Script::default());
        script.history_total.store(25, Ordering::SeqCst);
        let base = spawn_api(script.clone()).await;
        let api = Arc::new(ApiClient::new(&ApiConfig::default().with_base_url(&base)).unwrap());

        let feed = HistoryFeed::spawn(
            api,
            None,
            FeedConfig {
                page_size: 20,
                debounce: Duration::from_millis(50),
            },
        );
        let mut rx = feed.snapshots();

        wait_snapshot(&mut rx, |s| s.records.len() == 20).await;

        feed.load_more().await;
        let second = wait_snapshot(&mut rx, |s| s.records.len() == 25).await;
        assert!(second.end_of_pagination);
    }

    #[tokio::test]
    async fn explicit_refresh_reloads_from_page_one() {
        let (feed, script, _dir) = rig(5).await;
        let mut rx = feed.snapshots();
        wait_snapshot(&mut rx, |s| s.records.len() == 5).await;

        script.history_total.store(7, Ordering::SeqCst);
        feed.refresh().await;

        let snapshot = wait_snapshot(&mut rx, |s| s.records.len() == 7).await;
        assert!(snapshot.end_of_pagination);
    }
}
