//! Long-running background task that polls the Soroban RPC and writes
//! decoded marketplace events to the database.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::db;
use crate::errors::Result;
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Where the next poll starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub ledger: u32,
    pub cursor: Option<String>,
}

/// Pick the resume position: the persisted cursor if any, else the
/// configured start ledger.
pub fn resume_position(
    saved_ledger: i64,
    saved_cursor: Option<String>,
    start_ledger: u32,
) -> Position {
    if saved_ledger > 0 {
        Position {
            ledger: saved_ledger as u32,
            cursor: saved_cursor,
        }
    } else {
        Position {
            ledger: start_ledger,
            cursor: None,
        }
    }
}

/// Ledger to scan from after a page whose RPC reported `latest_ledger`.
/// Never moves backwards.
pub fn next_ledger(start_ledger: u32, latest_ledger: Option<u64>) -> u32 {
    latest_ledger
        .map(|l| (l as u32).max(start_ledger))
        .unwrap_or(start_ledger)
}

/// Poll until `shutdown` is cancelled.
pub async fn run(state: Arc<IndexerState>, shutdown: CancellationToken) {
    info!("Indexer starting, contract: {}", state.config.contract_id);

    let saved_ledger = db::get_last_ledger(&state.pool).await.unwrap_or(0);
    let saved_cursor = db::get_cursor_string(&state.pool).await.unwrap_or(None);
    let mut position = resume_position(saved_ledger, saved_cursor, state.config.start_ledger);

    info!("Resuming from ledger {}", position.ledger);

    loop {
        let polled = tokio::select! {
            _ = shutdown.cancelled() => break,
            polled = poll_once(&state, &position) => polled,
        };
        match polled {
            Ok(next) => position = next,
            Err(e) => error!("Indexer poll error: {e}"),
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_secs(state.config.poll_interval_secs)) => {}
        }
    }

    info!("Indexer stopped at ledger {}", position.ledger);
}

/// Perform a single poll iteration and return the next position.
async fn poll_once(state: &IndexerState, position: &Position) -> Result<Position> {
    let config = &state.config;
    let page = rpc::fetch_events(
        &state.client,
        &config.rpc_url,
        &config.contract_id,
        position.ledger,
        position.cursor.as_deref(),
        config.events_per_page,
    )
    .await?;

    if !page.events.is_empty() {
        let decoded = rpc::decode_events(&page.events, &config.contract_id);
        let inserted = db::insert_events(&state.pool, &decoded).await?;
        info!(
            "Polled {} raw events → {} new records stored",
            page.events.len(),
            inserted
        );
    }

    let next = Position {
        ledger: next_ledger(position.ledger, page.latest_ledger),
        cursor: page.cursor,
    };

    // Persist so restarts are deterministic.
    db::save_cursor(&state.pool, next.ledger as i64, next.cursor.as_deref()).await?;

    Ok(next)
}
