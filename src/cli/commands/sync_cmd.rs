//! `keepsync sync`: run a single reconciliation cycle.

use std::sync::Arc;

use crate::cli::output;
use crate::cli::{connect_remote, load_settings, open_store, save_session, Cli};
use crate::errors::Result;
use crate::store::{OpContext, SecretStore};
use crate::sync::SyncEngine;

/// Execute the `sync` command.
pub async fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let store = open_store(cli, &settings).await?;
    let remote = Arc::new(connect_remote(cli, &settings)?);
    let tokens = remote.tokens().clone();

    let engine = SyncEngine::from_settings(store.clone(), remote, &settings)?;
    let result = engine.run_cycle(&OpContext::background()).await;

    // A rotated token is worth keeping even when the cycle failed.
    save_session(&cli.project_dir, &tokens)?;
    store.close().await?;
    let report = result?;

    if report.is_empty() {
        output::success("Already in sync");
    } else {
        output::success(&format!(
            "Synced: {} pushed, {} pulled",
            report.pushed.len(),
            report.pulled.len()
        ));
    }

    Ok(())
}
