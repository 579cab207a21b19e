//! `keepsync describe`: change a secret's description.

use crate::cli::output;
use crate::cli::{load_settings, open_store, Cli};
use crate::errors::Result;
use crate::store::{OpContext, SecretStore};
use crate::vault::SecretId;

/// Execute the `describe` command.
pub async fn execute(cli: &Cli, id: SecretId, description: &str) -> Result<()> {
    let settings = load_settings(cli)?;
    let store = open_store(cli, &settings).await?;

    store
        .describe(&OpContext::background(), id, description)
        .await?;
    store.close().await?;

    output::success(&format!("Updated description of {id}"));

    Ok(())
}
