//! # Canopy Deployment Lifecycle
//!
//! This crate drives the blue/green deployment lifecycle for plugin
//! packages on the Canopy platform.
//!
//! ## Overview
//!
//! The canopy-deploy crate handles:
//! - **Versions**: Strict semver validation, conflict detection, history,
//!   and upgrade checks over a package's published versions
//! - **Slots**: The two-slot (A/B) state machine per package
//! - **Registry**: The [`PackageStore`] trait holding versions and slots
//! - **Manager**: [`SlotManager`] with deploy, health reporting,
//!   promotion, and rollback, delegation-gated and audited
//!
//! ## Slot lifecycle
//!
//! ```text
//! empty ──deploy──► deployed(unknown) ──report_health──► deployed(healthy|unhealthy)
//!                        ▲                                      │
//!                        │                                 promote (healthy only)
//!                   displaced by                                │
//!                   sibling promote ◄───────────────────── active
//! ```
//!
//! There is no terminal state; slots are perpetually retargeted. Exactly
//! one slot is active once any promotion has happened, and the two slots'
//! traffic percentages always sum to 100 from then on.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use canopy_deploy::{ReleaseMetadata, SlotLabel, HealthStatus, SlotManager};
//! use uuid::Uuid;
//!
//! # async fn example(manager: SlotManager, admin: Uuid) -> canopy_deploy::DeployResult<()> {
//! let slot = manager
//!     .deploy(admin, "billing", "1.2.0", ReleaseMetadata::new("sha256:abc"))
//!     .await?;
//! manager
//!     .report_health("billing", slot.slot, HealthStatus::Healthy)
//!     .await?;
//! manager.promote(admin, "billing", slot.slot).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! `deploy`, `promote`, and `rollback` are mutually exclusive per package
//! behind a per-package lock; `report_health` bypasses the lock and is
//! last-write-wins on the health field only.

pub mod error;
pub mod manager;
pub mod registry;
pub mod slots;
pub mod version;

// Re-export main types for convenience
pub use error::{DeployError, DeployResult};
pub use manager::{
    DeploymentStatus, PromotionResult, RollbackOptions, RollbackResult, SlotManager,
};
pub use registry::{MemoryPackageStore, PackageStore};
pub use slots::{DeploymentSlot, HealthStatus, SlotLabel, SlotPair, SlotRef};
pub use version::{
    PackageVersion, ReleaseMetadata, UpgradeInfo, VersionConflict, VersionResolver,
};
