//! Configuration loaded from `.keepsync.toml`.

pub mod settings;

pub use settings::{BackendConfig, Settings};
