//! Deployment slot manager
//!
//! Owns the blue/green transitions for every package: deploy into the
//! inactive slot, promote a healthy slot to active, roll back to the
//! sibling. Every mutation passes a delegation check first and appends
//! one audit entry last; the three slot mutations are serialized per
//! package.

use std::collections::HashMap;
use std::sync::Arc;

use semver::Version;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::instrument;
use uuid::Uuid;

use canopy_audit::{AuditEntry, AuditSink, TargetKind};
use canopy_rbac::DelegationService;

use crate::error::{DeployError, DeployResult};
use crate::registry::PackageStore;
use crate::slots::{DeploymentSlot, HealthStatus, SlotLabel, SlotPair, SlotRef};
use crate::version::{self, PackageVersion, ReleaseMetadata, VersionResolver};

/// Outcome of a promotion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionResult {
    /// The package id.
    pub package_id: String,
    /// The now-active slot.
    pub slot: SlotLabel,
    /// The version displaced from active, if any.
    pub previous_version: Option<Version>,
    /// The version now serving traffic.
    pub new_version: Version,
    /// False when the slot was already active and nothing changed.
    pub changed: bool,
}

/// Options for a rollback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RollbackOptions {
    /// Explicit version to roll back to; defaults to the inactive slot.
    pub target_version: Option<String>,

    /// Proceed even if the target slot reports unhealthy.
    #[serde(default)]
    pub force: bool,

    /// Operator-supplied reason, recorded in the audit log.
    pub reason: Option<String>,
}

impl RollbackOptions {
    /// Roll back to the last-known-good (the inactive slot).
    pub fn to_previous() -> Self {
        Self::default()
    }

    /// Roll back to an explicit version.
    pub fn to_version(version: impl Into<String>) -> Self {
        Self {
            target_version: Some(version.into()),
            ..Self::default()
        }
    }

    /// Set the force flag.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Set the recorded reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Outcome of a rollback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackResult {
    /// The package id.
    pub package_id: String,
    /// The now-active slot.
    pub slot: SlotLabel,
    /// The version that was serving traffic before.
    pub previous_version: Version,
    /// The version now serving traffic.
    pub rolled_back_to: Version,
}

/// Current deployment state of one package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentStatus {
    /// The package id.
    pub package_id: String,
    /// The active slot, if any promotion has happened.
    pub active_slot: Option<SlotLabel>,
    /// The version serving traffic, if any.
    pub active_version: Option<Version>,
    /// Both slot records.
    pub slots: Vec<DeploymentSlot>,
}

/// Deployment slot manager.
///
/// One logical authority per store: slot state lives in the
/// [`PackageStore`], never in this struct, so multiple manager instances
/// over the same store stay consistent. The per-package locks only
/// serialize the slot mutations of this instance with each other.
pub struct SlotManager {
    store: Arc<dyn PackageStore>,
    resolver: VersionResolver,
    delegation: Arc<DelegationService>,
    audit: Arc<dyn AuditSink>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SlotManager {
    /// Create a new slot manager.
    pub fn new(
        store: Arc<dyn PackageStore>,
        delegation: Arc<DelegationService>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            resolver: VersionResolver::new(store.clone()),
            store,
            delegation,
            audit,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The version resolver reading the same store.
    pub fn resolver(&self) -> &VersionResolver {
        &self.resolver
    }

    /// The underlying package store.
    pub fn store(&self) -> &Arc<dyn PackageStore> {
        &self.store
    }

    /// The critical-section lock for one package.
    async fn package_lock(&self, package_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(package_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Fail `Forbidden` unless the actor administers this package.
    async fn ensure_admin(&self, actor: Uuid, package_id: &str) -> DeployResult<()> {
        if self.delegation.is_plugin_admin(actor, package_id).await? {
            Ok(())
        } else {
            Err(DeployError::Forbidden {
                actor,
                package: package_id.to_string(),
            })
        }
    }

    /// Deploy a version into the package's inactive slot.
    ///
    /// The version must parse as strict semver and must not collide with
    /// an existing publish of different content. If either slot already
    /// holds the version the call is a no-op success. The targeted slot
    /// starts at health unknown with zero traffic; nothing is promoted.
    #[instrument(skip(self, metadata))]
    pub async fn deploy(
        &self,
        actor: Uuid,
        package_id: &str,
        version: &str,
        metadata: ReleaseMetadata,
    ) -> DeployResult<SlotRef> {
        self.ensure_admin(actor, package_id).await?;
        let version = version::validate(version)?;

        let lock = self.package_lock(package_id).await;
        let _guard = lock.lock().await;

        if let Some(conflict) = self
            .resolver
            .check_conflict(package_id, &version, &metadata.content_digest)
            .await?
        {
            return Err(DeployError::VersionConflict {
                package: conflict.package_id,
                version: conflict.version,
            });
        }

        let mut pair = self
            .store
            .get_slots(package_id)
            .await?
            .unwrap_or_else(|| SlotPair::new(package_id));

        // Re-deploying a resident version changes nothing
        if let Some(label) = pair.holding(&version) {
            tracing::debug!(package = package_id, version = %version, slot = %label, "Version already deployed");
            return Ok(SlotRef {
                package_id: package_id.to_string(),
                slot: label,
                version,
            });
        }

        let target = pair.deploy_target();
        pair.slot_mut(target).target(version.clone());
        self.store.put_slots(pair).await?;
        self.store
            .append_version(PackageVersion::new(package_id, version.clone(), metadata))
            .await?;

        tracing::info!(package = package_id, version = %version, slot = %target, "Version deployed");

        self.audit
            .record(
                AuditEntry::new("package.deployed", actor, TargetKind::Package, package_id)
                    .with_detail("version", serde_json::json!(version.to_string()))
                    .with_detail("slot", serde_json::json!(target.as_str())),
            )
            .await?;

        Ok(SlotRef {
            package_id: package_id.to_string(),
            slot: target,
            version,
        })
    }

    /// Record a probe result for one slot.
    ///
    /// Last-write-wins on the health field; runs outside the package
    /// critical section and is not audited. Probe cadence is the
    /// caller's concern.
    pub async fn report_health(
        &self,
        package_id: &str,
        slot: SlotLabel,
        status: HealthStatus,
    ) -> DeployResult<()> {
        self.store.set_health(package_id, slot, status).await
    }

    /// Promote a healthy slot to active.
    ///
    /// Fails `UnhealthySlot` unless the slot reports healthy. Promoting
    /// the already-active slot is an idempotent success: no flip, no
    /// audit entry.
    #[instrument(skip(self))]
    pub async fn promote(
        &self,
        actor: Uuid,
        package_id: &str,
        slot: SlotLabel,
    ) -> DeployResult<PromotionResult> {
        self.ensure_admin(actor, package_id).await?;

        let lock = self.package_lock(package_id).await;
        let _guard = lock.lock().await;

        let mut pair = self
            .store
            .get_slots(package_id)
            .await?
            .ok_or_else(|| DeployError::NotFound {
                package: package_id.to_string(),
            })?;

        let target = pair.slot(slot);
        let new_version = match (&target.version, target.health) {
            (Some(version), HealthStatus::Healthy) => version.clone(),
            (_, status) => {
                return Err(DeployError::UnhealthySlot {
                    package: package_id.to_string(),
                    slot,
                    status,
                })
            }
        };

        if target.active {
            tracing::debug!(package = package_id, slot = %slot, "Slot already active");
            return Ok(PromotionResult {
                package_id: package_id.to_string(),
                slot,
                previous_version: Some(new_version.clone()),
                new_version,
                changed: false,
            });
        }

        let previous_version = pair.active_version().cloned();
        pair.activate(slot);
        self.store.put_slots(pair).await?;

        tracing::info!(
            package = package_id,
            slot = %slot,
            previous = ?previous_version,
            new = %new_version,
            "Slot promoted"
        );

        self.audit
            .record(
                AuditEntry::new("package.promoted", actor, TargetKind::Package, package_id)
                    .with_detail(
                        "previous_version",
                        serde_json::json!(previous_version.as_ref().map(|v| v.to_string())),
                    )
                    .with_detail("new_version", serde_json::json!(new_version.to_string()))
                    .with_detail("slot", serde_json::json!(slot.as_str())),
            )
            .await?;

        Ok(PromotionResult {
            package_id: package_id.to_string(),
            slot,
            previous_version,
            new_version,
            changed: true,
        })
    }

    /// Roll traffic back to a previously deployed version.
    ///
    /// Without an explicit target this flips to the inactive slot (the
    /// last-known-good). An explicit target must be resident in one of
    /// the two slots. An unhealthy target is refused unless `force` is
    /// set; unknown health is allowed.
    #[instrument(skip(self, opts))]
    pub async fn rollback(
        &self,
        actor: Uuid,
        package_id: &str,
        opts: RollbackOptions,
    ) -> DeployResult<RollbackResult> {
        self.ensure_admin(actor, package_id).await?;

        let explicit_target = match &opts.target_version {
            Some(raw) => Some(version::validate(raw)?),
            None => None,
        };

        let lock = self.package_lock(package_id).await;
        let _guard = lock.lock().await;

        let mut pair = self
            .store
            .get_slots(package_id)
            .await?
            .ok_or_else(|| DeployError::NotFound {
                package: package_id.to_string(),
            })?;

        let active = pair.active().ok_or_else(|| DeployError::NoPreviousVersion {
            package: package_id.to_string(),
        })?;
        let previous_version =
            active
                .version
                .clone()
                .ok_or_else(|| DeployError::NoPreviousVersion {
                    package: package_id.to_string(),
                })?;
        let active_label = active.label;

        let target_label = match explicit_target {
            Some(ref wanted) => match pair.holding(wanted) {
                Some(label) if label == active_label => {
                    // Already serving the requested version
                    tracing::debug!(package = package_id, version = %wanted, "Rollback target already active");
                    return Ok(RollbackResult {
                        package_id: package_id.to_string(),
                        slot: label,
                        previous_version: previous_version.clone(),
                        rolled_back_to: previous_version,
                    });
                }
                Some(label) => label,
                None => {
                    return Err(DeployError::NoPreviousVersion {
                        package: package_id.to_string(),
                    })
                }
            },
            None => active_label.other(),
        };

        let target = pair.slot(target_label);
        let rolled_back_to =
            target
                .version
                .clone()
                .ok_or_else(|| DeployError::NoPreviousVersion {
                    package: package_id.to_string(),
                })?;
        if target.health == HealthStatus::Unhealthy && !opts.force {
            return Err(DeployError::UnhealthySlot {
                package: package_id.to_string(),
                slot: target_label,
                status: target.health,
            });
        }

        pair.activate(target_label);
        self.store.put_slots(pair).await?;

        tracing::info!(
            package = package_id,
            slot = %target_label,
            previous = %previous_version,
            target = %rolled_back_to,
            forced = opts.force,
            "Rolled back"
        );

        self.audit
            .record(
                AuditEntry::new("package.rolled_back", actor, TargetKind::Package, package_id)
                    .with_detail(
                        "previous_version",
                        serde_json::json!(previous_version.to_string()),
                    )
                    .with_detail("new_version", serde_json::json!(rolled_back_to.to_string()))
                    .with_detail("reason", serde_json::json!(opts.reason))
                    .with_detail("forced", serde_json::json!(opts.force)),
            )
            .await?;

        Ok(RollbackResult {
            package_id: package_id.to_string(),
            slot: target_label,
            previous_version,
            rolled_back_to,
        })
    }

    /// Current deployment state of a package.
    pub async fn deployment_status(&self, package_id: &str) -> DeployResult<DeploymentStatus> {
        let pair = self
            .store
            .get_slots(package_id)
            .await?
            .ok_or_else(|| DeployError::NotFound {
                package: package_id.to_string(),
            })?;

        Ok(DeploymentStatus {
            package_id: pair.package_id.clone(),
            active_slot: pair.active().map(|s| s.label),
            active_version: pair.active_version().cloned(),
            slots: vec![pair.slot_a.clone(), pair.slot_b.clone()],
        })
    }
}
