//! `keepsync passphrase`: generate a fresh encryption passphrase.

use crate::cli::output;
use crate::crypto::generate_passphrase;

/// Execute the `passphrase` command.
pub fn execute() {
    let passphrase = generate_passphrase();
    println!("{}", passphrase.as_str());

    output::warning("Store this passphrase somewhere safe. Lost passphrases cannot be recovered.");
    output::tip("Export it as KEEPSYNC_PASSPHRASE to skip the prompt.");
}
