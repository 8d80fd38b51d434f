//! Package registry store
//!
//! The store holds each package's published version list (append-only)
//! and its slot pair. Slot state is keyed by package id in the store, not
//! held as process state, so multiple engine instances behind the same
//! store agree on which slot is active.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use semver::Version;
use tokio::sync::RwLock;

use crate::error::{DeployError, DeployResult};
use crate::slots::{HealthStatus, SlotLabel, SlotPair};
use crate::version::PackageVersion;

/// Store for package versions and deployment slots.
#[async_trait]
pub trait PackageStore: Send + Sync {
    /// Load a package's slot pair, if the package has ever been deployed.
    async fn get_slots(&self, package_id: &str) -> DeployResult<Option<SlotPair>>;

    /// Persist a package's slot pair.
    async fn put_slots(&self, pair: SlotPair) -> DeployResult<()>;

    /// Update one slot's health in place.
    ///
    /// Kept separate from [`PackageStore::put_slots`] so concurrent
    /// health probes are last-write-wins on the health field alone and
    /// cannot clobber a concurrent slot flip. Fails with `NotFound` if
    /// the package is unknown or the slot is empty.
    async fn set_health(
        &self,
        package_id: &str,
        slot: SlotLabel,
        status: HealthStatus,
    ) -> DeployResult<()>;

    /// Look up one published version.
    async fn get_version(
        &self,
        package_id: &str,
        version: &Version,
    ) -> DeployResult<Option<PackageVersion>>;

    /// Append a published version. Appending an already-recorded
    /// `(package, version)` is a no-op; records are immutable.
    async fn append_version(&self, version: PackageVersion) -> DeployResult<()>;

    /// Full version history, semver-sorted ascending.
    async fn history(&self, package_id: &str) -> DeployResult<Vec<PackageVersion>>;
}

/// In-memory package store.
///
/// Suitable for single-process deployments and testing.
#[derive(Debug, Default)]
pub struct MemoryPackageStore {
    slots: Arc<RwLock<HashMap<String, SlotPair>>>,
    versions: Arc<RwLock<HashMap<String, Vec<PackageVersion>>>>,
}

impl MemoryPackageStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PackageStore for MemoryPackageStore {
    async fn get_slots(&self, package_id: &str) -> DeployResult<Option<SlotPair>> {
        Ok(self.slots.read().await.get(package_id).cloned())
    }

    async fn put_slots(&self, pair: SlotPair) -> DeployResult<()> {
        let mut slots = self.slots.write().await;
        slots.insert(pair.package_id.clone(), pair);
        Ok(())
    }

    async fn set_health(
        &self,
        package_id: &str,
        slot: SlotLabel,
        status: HealthStatus,
    ) -> DeployResult<()> {
        let mut slots = self.slots.write().await;
        let pair = slots.get_mut(package_id).ok_or_else(|| DeployError::NotFound {
            package: package_id.to_string(),
        })?;

        let target = pair.slot_mut(slot);
        if target.version.is_none() {
            return Err(DeployError::NotFound {
                package: package_id.to_string(),
            });
        }
        target.health = status;
        Ok(())
    }

    async fn get_version(
        &self,
        package_id: &str,
        version: &Version,
    ) -> DeployResult<Option<PackageVersion>> {
        let versions = self.versions.read().await;
        Ok(versions
            .get(package_id)
            .and_then(|list| list.iter().find(|pv| &pv.version == version))
            .cloned())
    }

    async fn append_version(&self, version: PackageVersion) -> DeployResult<()> {
        let mut versions = self.versions.write().await;
        let list = versions.entry(version.package_id.clone()).or_default();
        if !list.iter().any(|pv| pv.version == version.version) {
            list.push(version);
        }
        Ok(())
    }

    async fn history(&self, package_id: &str) -> DeployResult<Vec<PackageVersion>> {
        let versions = self.versions.read().await;
        let mut history = versions.get(package_id).cloned().unwrap_or_default();
        history.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(history)
    }
}
