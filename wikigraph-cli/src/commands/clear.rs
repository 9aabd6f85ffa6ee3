//! Clear command - delete every page and link from the store

use anyhow::{bail, Context, Result};
use colored::Colorize;
use dialoguer::Confirm;
use serde::Serialize;
use std::io::{self, IsTerminal};

use super::{run_store_action, StoreAction};
use crate::config::WikiConfig;
use crate::output::{Output, OutputFormat, TableDisplay};

/// What a clear removed.
#[derive(Debug, Serialize)]
pub struct ClearResult {
    pub backend: String,
    pub location: String,
    pub pages_removed: u64,
    pub links_removed: u64,
}

impl TableDisplay for ClearResult {
    fn to_table(&self) -> String {
        format!(
            "{} Removed {} pages and {} links from {} ({})",
            "CLEARED:".yellow().bold(),
            self.pages_removed,
            self.links_removed,
            self.backend,
            self.location
        )
    }
}

/// Ask for confirmation on a terminal; refuse outright otherwise.
fn confirmed(yes: bool, location: &str) -> Result<bool> {
    if yes {
        return Ok(true);
    }

    if io::stdin().is_terminal() && io::stdout().is_terminal() {
        Ok(Confirm::new()
            .with_prompt(format!("Delete all pages and links in {}?", location))
            .default(false)
            .interact()
            .unwrap_or(false))
    } else {
        bail!("Refusing to clear {} without --yes", location)
    }
}

pub async fn run(yes: bool, config: &WikiConfig, format: OutputFormat) -> Result<()> {
    let store = config.build_store();
    let location = store.location();

    if !confirmed(yes, &location)? {
        println!("Aborted.");
        return Ok(());
    }

    let removed = run_store_action(store.as_ref(), StoreAction::Clear)
        .await
        .with_context(|| format!("Failed to clear {} store", store.backend()))?;
    tracing::info!(
        "Cleared {} pages and {} links",
        removed.pages,
        removed.links
    );

    let result = ClearResult {
        backend: store.backend().to_string(),
        location,
        pages_removed: removed.pages,
        links_removed: removed.links,
    };
    Output::new(result, format).render()
}
