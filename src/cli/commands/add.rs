//! `keepsync add`: encrypt and store a new secret.

use std::io::{self, IsTerminal, Read};
use std::path::Path;

use dialoguer::{Input, Password};
use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{load_settings, open_store, prompt_passphrase, Cli};
use crate::crypto::PassphraseKey;
use crate::errors::{KeepSyncError, Result};
use crate::store::{OpContext, SecretStore};
use crate::vault::payload::{self, BankCard, LoginPassword};
use crate::vault::{Secret, SecretKind};

/// Execute the `add` command.
pub async fn execute(
    cli: &Cli,
    kind: SecretKind,
    description: &str,
    value: Option<&str>,
    file: Option<&Path>,
) -> Result<()> {
    let settings = load_settings(cli)?;
    let owner = settings.require_owner()?.to_string();

    let plaintext = read_payload(kind, value, file)?;

    let passphrase = prompt_passphrase()?;
    let key = PassphraseKey::from_passphrase(&passphrase)?;
    let secret = Secret::new(&owner, kind, description, key.encrypt(&plaintext)?);
    let id = secret.id;

    let store = open_store(cli, &settings).await?;
    store.put(&OpContext::background(), secret).await?;
    store.close().await?;

    output::success(&format!("Added {kind} secret {id}"));
    output::tip("Run `keepsync sync` to upload it.");

    Ok(())
}

/// Collect the plaintext for `kind` from the command line, a file, stdin
/// or interactive prompts.
fn read_payload(
    kind: SecretKind,
    value: Option<&str>,
    file: Option<&Path>,
) -> Result<Zeroizing<Vec<u8>>> {
    match kind {
        SecretKind::LoginPassword | SecretKind::BankCard if value.is_some() || file.is_some() => {
            Err(KeepSyncError::CommandFailed(format!(
                "{kind} secrets are entered interactively"
            )))
        }

        SecretKind::LoginPassword => {
            let entry = LoginPassword {
                login: input("Login")?,
                password: secret_input("Password")?,
            };
            Ok(Zeroizing::new(payload::to_bytes(&entry)?))
        }

        SecretKind::BankCard => {
            let card = BankCard {
                card_number: secret_input("Card number")?,
                expiry_month: input("Expiry month (MM)")?,
                expiry_year: input("Expiry year (YY)")?,
                cvv: secret_input("CVV")?,
                card_holder_name: input("Card holder name")?,
            };
            Ok(Zeroizing::new(payload::to_bytes(&card)?))
        }

        SecretKind::Text | SecretKind::Binary => {
            if let Some(path) = file {
                return Ok(Zeroizing::new(std::fs::read(path)?));
            }
            if let Some(v) = value {
                output::warning("Value provided on command line; it may appear in shell history.");
                return Ok(Zeroizing::new(v.as_bytes().to_vec()));
            }
            if !io::stdin().is_terminal() {
                let mut buf = Vec::new();
                io::stdin().read_to_end(&mut buf)?;
                if kind == SecretKind::Text {
                    while buf.last().is_some_and(|b| b.is_ascii_whitespace()) {
                        buf.pop();
                    }
                }
                return Ok(Zeroizing::new(buf));
            }
            if kind == SecretKind::Binary {
                return Err(KeepSyncError::CommandFailed(
                    "binary secrets need --file or piped input".into(),
                ));
            }
            Ok(Zeroizing::new(secret_input("Secret text")?.into_bytes()))
        }
    }
}

fn input(prompt: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .interact_text()
        .map_err(|e| KeepSyncError::CommandFailed(format!("input prompt: {e}")))
}

fn secret_input(prompt: &str) -> Result<String> {
    Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| KeepSyncError::CommandFailed(format!("input prompt: {e}")))
}
