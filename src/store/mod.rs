//! Secret storage.
//!
//! `SecretStore` is the one capability interface every backend satisfies.
//! The concrete backend is chosen once at startup (`StoreBackend::open`)
//! and handed around as a value; nothing downstream inspects which
//! variant it got.
//!
//! Per-id read-modify-write atomicity is each backend's responsibility:
//! sync cycles and interactive edits hit the same store without any
//! outside lock.

pub mod backend;
pub mod context;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use async_trait::async_trait;

use crate::errors::Result;
use crate::vault::{index, Digest, DigestSet, Secret, SecretId};

pub use backend::StoreBackend;
pub use context::OpContext;
pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Liveness check.
    async fn ping(&self) -> Result<()>;

    /// Release the backend. Later calls fail with a storage error.
    async fn close(&self) -> Result<()>;

    /// Insert or fully overwrite the record with `secret.id`.
    async fn put(&self, ctx: &OpContext, secret: Secret) -> Result<()>;

    /// Fetch a record, tombstones included. Unknown ids are `NotFound`.
    async fn get(&self, ctx: &OpContext, id: SecretId) -> Result<Secret>;

    /// Tombstone a live record and bump its version. Unknown and already
    /// deleted ids are `NotFound`.
    async fn delete(&self, ctx: &OpContext, id: SecretId) -> Result<()>;

    /// Replace the description of a live record and bump its version, as
    /// one step. Unknown and deleted ids are `NotFound`.
    async fn describe(&self, ctx: &OpContext, id: SecretId, description: &str) -> Result<()>;

    /// Digests of every record owned by `owner_id`, tombstones included.
    async fn digests_for(&self, ctx: &OpContext, owner_id: &str) -> Result<Vec<Digest>>;

    /// `digests_for`, indexed by id.
    async fn digests_of(&self, ctx: &OpContext, owner_id: &str) -> Result<DigestSet> {
        Ok(index(self.digests_for(ctx, owner_id).await?))
    }
}
