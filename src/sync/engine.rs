//! One reconciliation cycle: probe, list digests, plan, apply.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::reconcile::{Reconciler, SyncAction};
use super::remote::Remote;
use crate::config::Settings;
use crate::errors::{KeepSyncError, Result};
use crate::store::{OpContext, SecretStore};
use crate::vault::{index, SecretId};

/// Default deadline for the digest phase.
pub const DEFAULT_DIGEST_TIMEOUT: Duration = Duration::from_secs(10);

/// What one successful cycle moved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub pushed: Vec<SecretId>,
    pub pulled: Vec<SecretId>,
}

impl CycleReport {
    pub fn is_empty(&self) -> bool {
        self.pushed.is_empty() && self.pulled.is_empty()
    }
}

pub struct SyncEngine {
    store: Arc<dyn SecretStore>,
    remote: Arc<dyn Remote>,
    owner_id: String,
    reconciler: Reconciler,
    digest_timeout: Duration,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn SecretStore>,
        remote: Arc<dyn Remote>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            remote,
            owner_id: owner_id.into(),
            reconciler: Reconciler::default(),
            digest_timeout: DEFAULT_DIGEST_TIMEOUT,
        }
    }

    /// Engine tuned by `settings`. Fails when no owner is configured.
    pub fn from_settings(
        store: Arc<dyn SecretStore>,
        remote: Arc<dyn Remote>,
        settings: &Settings,
    ) -> Result<Self> {
        let owner = settings.require_owner()?.to_string();
        Ok(Self::new(store, remote, owner)
            .with_reconciler(
                Reconciler::new(settings.version_skew())
                    .with_remote_discovery(settings.discover_remote_only),
            )
            .with_digest_timeout(settings.sync_timeout()))
    }

    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    pub fn with_digest_timeout(mut self, timeout: Duration) -> Self {
        self.digest_timeout = timeout;
        self
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Run one cycle under `parent`.
    ///
    /// A failed liveness probe or an expired digest phase returns an error
    /// for which `is_skip()` holds. The first failing transfer aborts the
    /// remaining actions; those already applied stay applied.
    pub async fn run_cycle(&self, parent: &OpContext) -> Result<CycleReport> {
        parent.check()?;
        parent.run(self.remote.ping()).await.map_err(|e| {
            if e.is_skip() {
                e
            } else {
                KeepSyncError::Liveness(e.to_string())
            }
        })?;

        let listing = parent.child_with_timeout(self.digest_timeout);
        let remote = index(listing.run(self.remote.digests(&self.owner_id)).await?);
        let local = self.store.digests_of(&listing, &self.owner_id).await?;

        let plan = self.reconciler.plan(&local, &remote);
        debug!(
            owner = %self.owner_id,
            local = local.len(),
            remote = remote.len(),
            actions = plan.len(),
            "sync plan ready"
        );

        let mut report = CycleReport::default();
        for action in plan {
            parent.check()?;
            match action {
                SyncAction::Push(id) => {
                    self.push_one(parent, id).await?;
                    report.pushed.push(id);
                }
                SyncAction::Pull(id) => {
                    self.pull_one(parent, id).await?;
                    report.pulled.push(id);
                }
            }
        }

        if !report.is_empty() {
            info!(
                owner = %self.owner_id,
                pushed = report.pushed.len(),
                pulled = report.pulled.len(),
                "sync cycle applied changes"
            );
        }
        Ok(report)
    }

    /// Send the local copy of `id` to the remote.
    pub async fn push_one(&self, ctx: &OpContext, id: SecretId) -> Result<()> {
        let secret = self.store.get(ctx, id).await?;
        ctx.run(self.remote.push(&secret)).await?;
        debug!(%id, "pushed");
        Ok(())
    }

    /// Overwrite the local copy of `id` with the remote one.
    pub async fn pull_one(&self, ctx: &OpContext, id: SecretId) -> Result<()> {
        let secret = ctx.run(self.remote.pull(id)).await?;
        self.store.put(ctx, secret).await?;
        debug!(%id, "pulled");
        Ok(())
    }
}
