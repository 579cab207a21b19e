//! `keepsync list`: display the owner's secrets in a table.

use crate::cli::output;
use crate::cli::{load_settings, open_store, Cli};
use crate::errors::Result;
use crate::store::{OpContext, SecretStore};

/// Execute the `list` command.
pub async fn execute(cli: &Cli, all: bool) -> Result<()> {
    let settings = load_settings(cli)?;
    let owner = settings.require_owner()?;
    let store = open_store(cli, &settings).await?;
    let ctx = OpContext::background();

    let mut secrets = Vec::new();
    for digest in store.digests_for(&ctx, owner).await? {
        if digest.deleted && !all {
            continue;
        }
        secrets.push(store.get(&ctx, digest.id).await?);
    }
    secrets.sort_by(|a, b| a.description.cmp(&b.description).then(a.id.cmp(&b.id)));
    store.close().await?;

    output::info(&format!("{owner}: {} secret(s)", secrets.len()));
    output::print_secrets_table(&secrets);

    Ok(())
}
