//! `keepsync show`: decrypt and print a single secret.

use std::io::Write;
use std::path::Path;

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{load_settings, open_store, prompt_passphrase, Cli};
use crate::crypto::PassphraseKey;
use crate::errors::Result;
use crate::store::{OpContext, SecretStore};
use crate::vault::payload::{self, BankCard, LoginPassword};
use crate::vault::{SecretId, SecretKind};

/// Execute the `show` command.
pub async fn execute(cli: &Cli, id: SecretId, out: Option<&Path>) -> Result<()> {
    let settings = load_settings(cli)?;
    let store = open_store(cli, &settings).await?;
    let secret = store.get(&OpContext::background(), id).await?;
    store.close().await?;

    if secret.deleted {
        output::warning(&format!("Secret {id} is deleted; showing its last contents."));
    }

    let passphrase = prompt_passphrase()?;
    let key = PassphraseKey::from_passphrase(&passphrase)?;
    let plaintext = Zeroizing::new(key.decrypt(&secret.payload)?);

    if let Some(path) = out {
        std::fs::write(path, plaintext.as_slice())?;
        output::success(&format!("Wrote {} bytes to {}", plaintext.len(), path.display()));
        return Ok(());
    }

    output::info(&format!("{} ({})", secret.description, secret.kind));
    match secret.kind {
        SecretKind::LoginPassword => {
            let entry: LoginPassword = payload::from_bytes(&plaintext)?;
            output::print_fields(&[
                ("login", entry.login.as_str()),
                ("password", entry.password.as_str()),
            ]);
        }
        SecretKind::BankCard => {
            let card: BankCard = payload::from_bytes(&plaintext)?;
            let expiry = format!("{}/{}", card.expiry_month, card.expiry_year);
            output::print_fields(&[
                ("number", card.card_number.as_str()),
                ("expiry", expiry.as_str()),
                ("cvv", card.cvv.as_str()),
                ("holder", card.card_holder_name.as_str()),
            ]);
        }
        SecretKind::Text => println!("{}", String::from_utf8_lossy(&plaintext)),
        SecretKind::Binary => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&plaintext)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
