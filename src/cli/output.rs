//! Terminal output for keepsync commands: status lines, the secrets
//! table, and labelled field dumps for decrypted payloads.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::Secret;

/// Leading glyph of a status line. Errors and warnings go to stderr.
#[derive(Clone, Copy)]
enum Glyph {
    Done,
    Failed,
    Caution,
    Note,
    Hint,
}

impl Glyph {
    fn emit(self, msg: &str) {
        match self {
            Glyph::Done => println!("{} {msg}", style("\u{2713}").green().bold()),
            Glyph::Failed => eprintln!("{} {msg}", style("\u{2717}").red().bold()),
            Glyph::Caution => eprintln!("{} {msg}", style("\u{26a0}").yellow().bold()),
            Glyph::Note => println!("{} {msg}", style("\u{2139}").blue().bold()),
            Glyph::Hint => println!("{} {}", style("\u{2192}").dim(), style(msg).dim()),
        }
    }
}

/// Green check: the command did what was asked.
pub fn success(msg: &str) {
    Glyph::Done.emit(msg);
}

/// Red cross on stderr. `main` routes every command error here.
pub fn error(msg: &str) {
    Glyph::Failed.emit(msg);
}

/// Yellow sign on stderr, e.g. a value typed on the command line.
pub fn warning(msg: &str) {
    Glyph::Caution.emit(msg);
}

pub fn info(msg: &str) {
    Glyph::Note.emit(msg);
}

/// Dimmed follow-up suggestion.
pub fn tip(msg: &str) {
    Glyph::Hint.emit(msg);
}

/// Print a table of secrets (Id, Type, Description, Updated).
///
/// Deleted rows are only present when the caller asked for them and are
/// marked in the last column.
pub fn print_secrets_table(secrets: &[Secret]) {
    if secrets.is_empty() {
        info("No secrets stored yet.");
        tip("Run `keepsync add <TYPE> <DESCRIPTION>` to add your first secret.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Type", "Description", "Updated", ""]);

    for s in secrets {
        table.add_row(vec![
            s.id.to_string(),
            s.kind.to_string(),
            s.description.clone(),
            s.version.format("%Y-%m-%d %H:%M:%S").to_string(),
            if s.deleted { "deleted".into() } else { String::new() },
        ]);
    }

    println!("{table}");
}

/// Print `label: value` pairs, labels dimmed.
pub fn print_fields(fields: &[(&str, &str)]) {
    let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (label, value) in fields {
        println!("{} {value}", style(format!("{label:>width$}:")).dim());
    }
}
