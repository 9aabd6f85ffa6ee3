//! Command implementations for the wikigraph CLI
//!
//! Each command module provides a `run` function that executes the command logic.

pub mod check;
pub mod clear;
pub mod convert;
pub mod export;
pub mod links;
pub mod status;

use wikigraph_store::{GraphStore, StoreStats};

/// Single-statement store operations used by `status` and `clear`.
#[derive(Debug, Clone, Copy)]
pub(crate) enum StoreAction {
    Stats,
    Clear,
}

/// Run `action` on a fresh session, closing it whether or not the action failed.
pub(crate) async fn run_store_action(
    store: &dyn GraphStore,
    action: StoreAction,
) -> wikigraph_store::Result<StoreStats> {
    let mut session = store.open_session().await?;
    let result = match action {
        StoreAction::Stats => session.stats().await,
        StoreAction::Clear => session.clear().await,
    };
    let closed = session.close().await;

    let stats = result?;
    closed?;
    Ok(stats)
}
