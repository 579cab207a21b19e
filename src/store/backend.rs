//! The closed set of storage backends behind one `SecretStore` face.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use super::{MemoryStore, OpContext, SecretStore};
use crate::config::{BackendConfig, Settings};
use crate::errors::{KeepSyncError, Result};
use crate::vault::{Digest, Secret, SecretId};

#[cfg(feature = "postgres")]
use super::PostgresStore;
#[cfg(feature = "sqlite")]
use super::SqliteStore;

/// A backend picked from configuration once, at startup.
pub enum StoreBackend {
    Memory(MemoryStore),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteStore),
    #[cfg(feature = "postgres")]
    Postgres(PostgresStore),
}

impl StoreBackend {
    /// Open the backend described by `config`. Relative file paths resolve
    /// against `project_dir`.
    pub async fn open(config: &BackendConfig, project_dir: &Path) -> Result<Self> {
        let backend = match config {
            BackendConfig::Memory => StoreBackend::Memory(MemoryStore::new()),

            #[cfg(feature = "sqlite")]
            BackendConfig::Sqlite { path } => {
                let path = Settings::resolve_path(project_dir, path);
                StoreBackend::Sqlite(SqliteStore::open(&path)?)
            }
            #[cfg(not(feature = "sqlite"))]
            BackendConfig::Sqlite { .. } => {
                let _ = project_dir;
                return Err(KeepSyncError::ConfigError(
                    "sqlite backend not compiled in; rebuild with `--features sqlite`".into(),
                ));
            }

            #[cfg(feature = "postgres")]
            BackendConfig::Postgres { url } => {
                StoreBackend::Postgres(PostgresStore::connect(url).await?)
            }
            #[cfg(not(feature = "postgres"))]
            BackendConfig::Postgres { .. } => {
                return Err(KeepSyncError::ConfigError(
                    "postgres backend not compiled in; rebuild with `--features postgres`".into(),
                ));
            }
        };

        debug!(backend = backend.name(), "store opened");
        Ok(backend)
    }

    pub fn name(&self) -> &'static str {
        match self {
            StoreBackend::Memory(_) => "memory",
            #[cfg(feature = "sqlite")]
            StoreBackend::Sqlite(_) => "sqlite",
            #[cfg(feature = "postgres")]
            StoreBackend::Postgres(_) => "postgres",
        }
    }

    fn inner(&self) -> &dyn SecretStore {
        match self {
            StoreBackend::Memory(s) => s,
            #[cfg(feature = "sqlite")]
            StoreBackend::Sqlite(s) => s,
            #[cfg(feature = "postgres")]
            StoreBackend::Postgres(s) => s,
        }
    }
}

#[async_trait]
impl SecretStore for StoreBackend {
    async fn ping(&self) -> Result<()> {
        self.inner().ping().await
    }

    async fn close(&self) -> Result<()> {
        self.inner().close().await
    }

    async fn put(&self, ctx: &OpContext, secret: Secret) -> Result<()> {
        self.inner().put(ctx, secret).await
    }

    async fn get(&self, ctx: &OpContext, id: SecretId) -> Result<Secret> {
        self.inner().get(ctx, id).await
    }

    async fn delete(&self, ctx: &OpContext, id: SecretId) -> Result<()> {
        self.inner().delete(ctx, id).await
    }

    async fn describe(&self, ctx: &OpContext, id: SecretId, description: &str) -> Result<()> {
        self.inner().describe(ctx, id, description).await
    }

    async fn digests_for(&self, ctx: &OpContext, owner_id: &str) -> Result<Vec<Digest>> {
        self.inner().digests_for(ctx, owner_id).await
    }
}
