//! One module per subcommand. Each exposes an `execute` entry point.

pub mod add;
pub mod delete;
pub mod describe;
pub mod list;
pub mod login;
pub mod passphrase;
pub mod register;
pub mod show;
pub mod sync_cmd;
pub mod watch;
