//! `keepsync login`: authenticate and remember the session.

use crate::cli::output;
use crate::cli::{connect_remote, load_settings, prompt_account_password, save_session, Cli};
use crate::errors::Result;
use crate::sync::Credentials;

/// Execute the `login` command.
pub async fn execute(cli: &Cli, login: &str) -> Result<()> {
    let mut settings = load_settings(cli)?;
    let remote = connect_remote(cli, &settings)?;
    remote.tokens().clear();

    let password = prompt_account_password()?;
    let credentials = Credentials {
        login: login.to_string(),
        password: password.to_string(),
    };
    remote.login(&credentials).await?;
    save_session(&cli.project_dir, remote.tokens())?;

    settings.owner = Some(login.to_string());
    settings.save(&cli.project_dir)?;

    output::success(&format!("Logged in as '{login}'"));
    output::tip("Run `keepsync sync` to fetch your secrets.");

    Ok(())
}
