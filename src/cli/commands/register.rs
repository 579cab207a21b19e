//! `keepsync register`: create an account on the sync server.

use crate::cli::output;
use crate::cli::{connect_remote, load_settings, prompt_account_password, save_session, Cli};
use crate::errors::Result;
use crate::sync::Credentials;

/// Execute the `register` command.
pub async fn execute(cli: &Cli, login: &str) -> Result<()> {
    let mut settings = load_settings(cli)?;
    let remote = connect_remote(cli, &settings)?;

    let password = prompt_account_password()?;
    let credentials = Credentials {
        login: login.to_string(),
        password: password.to_string(),
    };
    remote.register(&credentials).await?;
    save_session(&cli.project_dir, remote.tokens())?;

    // The account name is the owner id of every secret created from here on.
    settings.owner = Some(login.to_string());
    settings.save(&cli.project_dir)?;

    output::success(&format!("Registered '{login}' at {}", settings.server_address));
    output::tip("Generate an encryption passphrase: keepsync passphrase");

    Ok(())
}
