//! The transfer boundary between the reconciler and the authoritative copy.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::{KeepSyncError, Result};
use crate::store::{OpContext, SecretStore};
use crate::vault::{Digest, Secret, SecretId};

/// Operations the reconciler needs from the authoritative side.
#[async_trait]
pub trait Remote: Send + Sync {
    /// Reachability probe. Failure is reported as `Liveness`.
    async fn ping(&self) -> Result<()>;

    /// Every digest the remote holds for `owner_id`. Order is irrelevant;
    /// an empty list means "no secrets for this owner".
    async fn digests(&self, owner_id: &str) -> Result<Vec<Digest>>;

    /// Upload one full secret.
    async fn push(&self, secret: &Secret) -> Result<()>;

    /// Download one full secret. Missing ids are `NotFound`.
    async fn pull(&self, id: SecretId) -> Result<Secret>;
}

/// Serves the `Remote` operations straight from a local `SecretStore`.
///
/// Stands in for the server when both copies live in one process.
pub struct StoreRemote {
    store: Arc<dyn SecretStore>,
}

impl StoreRemote {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Remote for StoreRemote {
    async fn ping(&self) -> Result<()> {
        self.store
            .ping()
            .await
            .map_err(|e| KeepSyncError::Liveness(e.to_string()))
    }

    async fn digests(&self, owner_id: &str) -> Result<Vec<Digest>> {
        self.store
            .digests_for(&OpContext::background(), owner_id)
            .await
    }

    async fn push(&self, secret: &Secret) -> Result<()> {
        self.store
            .put(&OpContext::background(), secret.clone())
            .await
    }

    async fn pull(&self, id: SecretId) -> Result<Secret> {
        self.store.get(&OpContext::background(), id).await
    }
}
