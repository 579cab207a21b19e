//! `keepsync watch`: sync on an interval until interrupted.

use std::sync::Arc;

use crate::cli::output;
use crate::cli::{connect_remote, load_settings, open_store, save_session, Cli};
use crate::errors::{KeepSyncError, Result};
use crate::store::SecretStore;
use crate::sync::{spawn_sync_loop, IntervalTicks, SyncEngine};

/// Execute the `watch` command.
pub async fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let store = open_store(cli, &settings).await?;
    let remote = Arc::new(connect_remote(cli, &settings)?);
    let tokens = remote.tokens().clone();

    let engine = Arc::new(SyncEngine::from_settings(store.clone(), remote, &settings)?);
    let (join, handle) = spawn_sync_loop(engine, IntervalTicks::new(settings.sync_interval()));

    output::info(&format!(
        "Syncing every {}s. Press Ctrl-C to stop.",
        settings.sync_interval_secs
    ));

    tokio::signal::ctrl_c().await?;
    handle.shutdown();

    let stats = join
        .await
        .map_err(|e| KeepSyncError::CommandFailed(format!("sync loop: {e}")))?;
    save_session(&cli.project_dir, &tokens)?;
    store.close().await?;

    output::success(&format!(
        "Stopped after {} cycle(s): {} pushed, {} pulled, {} skipped, {} failed",
        stats.cycles, stats.pushed, stats.pulled, stats.skipped, stats.failed
    ));

    Ok(())
}
