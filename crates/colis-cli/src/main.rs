//! # colis-cli
//!
//! Reference caller for the delivery submission/sync core. Wires the
//! engines the way an app shell would: one database, one API client, one
//! shared sync guard, everything injected by constructor.
//!
//! Subcommands:
//! - `submit <form.json>` -- send a delivery now, queueing it on failure
//! - `pending`            -- list the local queue
//! - `sync`               -- drain the whole queue in one bulk request
//! - `sync-one <id>`      -- retry a single queued delivery
//! - `history [keyword]`  -- fetch and print the first history page
//! - `detail <code>`      -- fetch one history entry by code

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use colis_net::{ApiClient, ApiConfig};
use colis_shared::classify;
use colis_shared::types::DeliveryForm;
use colis_store::Database;
use colis_sync::{
    fetch_history_detail, shared_database, BulkSyncEngine, FeedConfig, HistoryFeed,
    SharedDatabase, SubmissionEngine, SubmitOutcome, SyncGuard, SyncOutcome,
};

const USAGE: &str = "usage: colis-cli <submit <form.json> | pending | sync | sync-one <id> | history [keyword] | detail <code>>";

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // -----------------------------------------------------------------------
    // 2. Load configuration and open the database
    // -----------------------------------------------------------------------
    let config = ApiConfig::from_env();
    info!(base_url = %config.base_url, "using delivery API");

    let api = Arc::new(ApiClient::new(&config)?);
    let db = shared_database(Database::new()?);
    let guard = SyncGuard::new();

    // -----------------------------------------------------------------------
    // 3. Dispatch
    // -----------------------------------------------------------------------
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("submit") => {
            let path = args.get(1).context(USAGE)?;
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read form file {path}"))?;
            let form: DeliveryForm =
                serde_json::from_str(&json).context("form file is not a valid delivery form")?;

            let engine = SubmissionEngine::new(api, db, guard);
            match engine.submit(form).await {
                SubmitOutcome::Sent => println!("Envoyé"),
                SubmitOutcome::Queued(id) => println!("Envoi différé (file locale, id {id})"),
                SubmitOutcome::Failure(e) => println!("{}", classify(&e)),
            }
        }
        Some("pending") => {
            print_pending(&db)?;
        }
        Some("sync") => {
            let engine = BulkSyncEngine::new(api, db.clone(), guard);
            match engine.sync_all().await {
                SyncOutcome::Synced(count) => println!("{count} livraison(s) synchronisée(s)"),
                SyncOutcome::NothingToSync => println!("Rien à synchroniser"),
                SyncOutcome::Failed(reason) => println!("{}", classify(&reason)),
            }
            print_pending(&db)?;
        }
        Some("sync-one") => {
            let id: i64 = args
                .get(1)
                .context(USAGE)?
                .parse()
                .context("id must be a number")?;

            let engine = SubmissionEngine::new(api, db, guard);
            match engine.sync_single(id).await {
                SubmitOutcome::Sent => println!("Envoyé"),
                SubmitOutcome::Queued(id) => println!("Envoi différé (file locale, id {id})"),
                SubmitOutcome::Failure(e) => println!("{}", classify(&e)),
            }
        }
        Some("history") => {
            let keyword = args.get(1).cloned();
            let feed = HistoryFeed::spawn(api, Some(db), FeedConfig::default());
            if let Some(keyword) = keyword.clone() {
                feed.set_keyword(Some(keyword)).await;
            }

            // The unfiltered initial page may publish before the keyword
            // session kicks in; wait for the snapshot that matches.
            let mut snapshots = feed.snapshots();
            let snapshot = snapshots
                .wait_for(|s| {
                    s.keyword == keyword
                        && (!s.records.is_empty() || s.end_of_pagination || s.error.is_some())
                })
                .await
                .context("history feed stopped before the first page")?
                .clone();

            if let Some(error) = &snapshot.error {
                println!("{}", classify(error));
            }
            for record in &snapshot.records {
                println!(
                    "{:>4}  {}  {}  {}  {}",
                    record.row_order,
                    record.code,
                    record.item,
                    record.receiver,
                    record.created_at.as_deref().unwrap_or("-"),
                );
            }
            feed.shutdown().await;
        }
        Some("detail") => {
            let code = args.get(1).context(USAGE)?;
            match fetch_history_detail(&api, code).await {
                Ok(detail) => println!("{}", serde_json::to_string_pretty(&detail)?),
                Err(e) => println!("{}", classify(&e.to_string())),
            }
        }
        _ => bail!(USAGE),
    }

    Ok(())
}

fn print_pending(db: &SharedDatabase) -> Result<()> {
    let guard = db
        .lock()
        .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;
    let pending = guard.all_pending()?;
    println!("{} en attente", pending.len());
    for row in pending {
        println!(
            "{:>4}  {}  {}  tentatives: {}  {}",
            row.id,
            row.item,
            row.receiver,
            row.retry_count,
            row.created_at.to_rfc3339(),
        );
    }
    Ok(())
}
