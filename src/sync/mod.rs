//! Digest-based reconciliation between the local store and a remote.
//!
//! - `reconcile` turns two digest sets into an ordered action list.
//! - `remote` defines the transfer boundary; `http` speaks it to the
//!   sync server.
//! - `engine` runs one cycle; `scheduler` runs cycles in the background.

pub mod engine;
pub mod http;
pub mod reconcile;
pub mod remote;
pub mod scheduler;

pub use engine::{CycleReport, SyncEngine};
pub use http::{Credentials, HttpRemote, TokenHolder};
pub use reconcile::{Reconciler, SyncAction};
pub use remote::{Remote, StoreRemote};
pub use scheduler::{manual, spawn_sync_loop, IntervalTicks, SyncLoopHandle, SyncStats, TickSource};
