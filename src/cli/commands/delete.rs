//! `keepsync delete`: tombstone a secret so the deletion syncs.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{load_settings, open_store, Cli};
use crate::errors::{KeepSyncError, Result};
use crate::store::{OpContext, SecretStore};
use crate::vault::SecretId;

/// Execute the `delete` command.
pub async fn execute(cli: &Cli, id: SecretId, force: bool) -> Result<()> {
    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete secret {id}?"))
            .default(false)
            .interact()
            .map_err(|e| KeepSyncError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let settings = load_settings(cli)?;
    let store = open_store(cli, &settings).await?;
    store.delete(&OpContext::background(), id).await?;
    store.close().await?;

    output::success(&format!("Deleted secret {id}"));

    Ok(())
}
