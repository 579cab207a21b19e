pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod store;
pub mod sync;
pub mod vault;
