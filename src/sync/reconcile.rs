//! Digest comparison: decide, per id, whether to push, pull or leave it.
//!
//! Rules for an id present locally, against the remote digest (or the
//! zero-value digest when the remote lacks it):
//! 1. Tombstone flags differ: a local tombstone is pushed, a remote one
//!    is pulled.
//! 2. Local version ahead by more than the skew threshold: push. Hashes
//!    are not consulted.
//! 3. Fingerprints differ: pull. Versions this close count as concurrent
//!    and the server wins the tie.
//! 4. Otherwise nothing.
//!
//! An empty local set pulls everything the remote has (bootstrap).

use std::time::Duration;

use crate::vault::{Digest, DigestSet, SecretId};

/// Default gap a local version needs before it wins outright.
pub const DEFAULT_VERSION_SKEW: Duration = Duration::from_secs(1);

/// One transfer decided by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncAction {
    /// Send the local secret to the remote.
    Push(SecretId),
    /// Fetch the remote secret into the local store.
    Pull(SecretId),
}

impl SyncAction {
    pub fn id(&self) -> SecretId {
        match self {
            SyncAction::Push(id) | SyncAction::Pull(id) => *id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    skew: chrono::Duration,
    discover_remote_only: bool,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION_SKEW)
    }
}

impl Reconciler {
    /// Remote-only discovery is on by default.
    pub fn new(skew: Duration) -> Self {
        Self {
            skew: chrono::Duration::from_std(skew).unwrap_or(chrono::Duration::MAX),
            discover_remote_only: true,
        }
    }

    /// With discovery off, ids that exist only remotely are learned only
    /// when the local set is empty.
    pub fn with_remote_discovery(mut self, enabled: bool) -> Self {
        self.discover_remote_only = enabled;
        self
    }

    /// Ordered list of transfers that brings `local` in line with `remote`.
    ///
    /// Local ids come first in ascending order, then remote-only ids.
    pub fn plan(&self, local: &DigestSet, remote: &DigestSet) -> Vec<SyncAction> {
        if local.is_empty() {
            return remote.keys().copied().map(SyncAction::Pull).collect();
        }

        let mut actions: Vec<SyncAction> = local
            .values()
            .filter_map(|l| match remote.get(&l.id) {
                Some(r) => self.decide(l, r),
                None => self.decide(l, &Digest::absent(l.id)),
            })
            .collect();

        if self.discover_remote_only {
            actions.extend(
                remote
                    .keys()
                    .filter(|id| !local.contains_key(id))
                    .copied()
                    .map(SyncAction::Pull),
            );
        }

        actions
    }

    /// Decision for one id given both digests.
    pub fn decide(&self, local: &Digest, remote: &Digest) -> Option<SyncAction> {
        if local.deleted != remote.deleted {
            return Some(if local.deleted {
                SyncAction::Push(local.id)
            } else {
                SyncAction::Pull(local.id)
            });
        }

        if local.version.signed_duration_since(remote.version) > self.skew {
            return Some(SyncAction::Push(local.id));
        }

        if !local.same_content(remote) {
            return Some(SyncAction::Pull(local.id));
        }

        None
    }
}
