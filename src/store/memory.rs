//! Volatile in-memory backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{OpContext, SecretStore};
use crate::errors::{KeepSyncError, Result};
use crate::vault::{digests_of, Digest, Secret, SecretId};

/// `HashMap` behind a single `RwLock`; every mutation holds the write
/// lock for its whole read-modify-write.
#[derive(Default)]
pub struct MemoryStore {
    secrets: RwLock<HashMap<SecretId, Secret>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records, tombstones included.
    pub fn len(&self) -> usize {
        self.secrets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(KeepSyncError::Storage("store is closed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        self.ensure_open()
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    async fn put(&self, ctx: &OpContext, secret: Secret) -> Result<()> {
        ctx.check()?;
        self.ensure_open()?;
        self.secrets.write().insert(secret.id, secret);
        Ok(())
    }

    async fn get(&self, ctx: &OpContext, id: SecretId) -> Result<Secret> {
        ctx.check()?;
        self.ensure_open()?;
        self.secrets
            .read()
            .get(&id)
            .cloned()
            .ok_or(KeepSyncError::NotFound(id))
    }

    async fn delete(&self, ctx: &OpContext, id: SecretId) -> Result<()> {
        ctx.check()?;
        self.ensure_open()?;
        let mut secrets = self.secrets.write();
        match secrets.get_mut(&id) {
            Some(secret) if !secret.deleted => {
                secret.tombstone();
                Ok(())
            }
            _ => Err(KeepSyncError::NotFound(id)),
        }
    }

    async fn describe(&self, ctx: &OpContext, id: SecretId, description: &str) -> Result<()> {
        ctx.check()?;
        self.ensure_open()?;
        let mut secrets = self.secrets.write();
        match secrets.get_mut(&id) {
            Some(secret) if !secret.deleted => {
                secret.set_description(description);
                Ok(())
            }
            _ => Err(KeepSyncError::NotFound(id)),
        }
    }

    async fn digests_for(&self, ctx: &OpContext, owner_id: &str) -> Result<Vec<Digest>> {
        ctx.check()?;
        self.ensure_open()?;
        let secrets = self.secrets.read();
        Ok(digests_of(owner_id, secrets.values()).into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::SecretKind;

    #[tokio::test]
    async fn closed_store_rejects_calls() {
        let store = MemoryStore::new();
        store.close().await.unwrap();
        assert!(store.ping().await.is_err());
        let ctx = OpContext::background();
        let secret = Secret::new("alice", SecretKind::Text, "x", vec![]);
        assert!(matches!(
            store.put(&ctx, secret).await,
            Err(KeepSyncError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn cancelled_context_is_refused() {
        let store = MemoryStore::new();
        let ctx = OpContext::background();
        ctx.cancel();
        let secret = Secret::new("alice", SecretKind::Text, "x", vec![]);
        assert!(matches!(
            store.put(&ctx, secret).await,
            Err(KeepSyncError::Cancelled)
        ));
        assert!(store.is_empty());
    }
}
