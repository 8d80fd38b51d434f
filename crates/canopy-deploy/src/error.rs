//! Error types for deployment operations

use thiserror::Error;
use uuid::Uuid;

use canopy_audit::AuditError;
use canopy_rbac::RbacError;

use crate::slots::{HealthStatus, SlotLabel};

/// Deployment error types.
///
/// All failures are terminal and checked before any state mutation;
/// callers may safely retry.
#[derive(Debug, Error)]
pub enum DeployError {
    /// A version string failed strict semver parsing.
    #[error("Invalid version {version:?}: {reason}")]
    InvalidVersion {
        /// The rejected version string.
        version: String,
        /// The parser's reason.
        reason: String,
    },

    /// A version was re-published with different content.
    #[error("Version conflict for {package} {version}")]
    VersionConflict {
        /// The package id.
        package: String,
        /// The conflicting version.
        version: semver::Version,
    },

    /// Promotion or rollback targeted a slot that is not fit to serve.
    #[error("Slot {slot} of {package} is not healthy (status: {status:?})")]
    UnhealthySlot {
        /// The package id.
        package: String,
        /// The targeted slot.
        slot: SlotLabel,
        /// Its health at check time.
        status: HealthStatus,
    },

    /// Rollback had no resident version to return to.
    #[error("No previous version available for {package}")]
    NoPreviousVersion {
        /// The package id.
        package: String,
    },

    /// The package (or addressed slot content) does not exist.
    #[error("Package not found: {package}")]
    NotFound {
        /// The package id.
        package: String,
    },

    /// The actor is not an administrator of this package.
    #[error("Actor {actor} may not manage deployments of {package}")]
    Forbidden {
        /// The denied actor.
        actor: Uuid,
        /// The package id.
        package: String,
    },

    /// Underlying storage failed; propagated unchanged.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Delegation check failed to evaluate.
    #[error(transparent)]
    Rbac(#[from] RbacError),

    /// Audit append failed.
    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// Result type for deployment operations.
pub type DeployResult<T> = Result<T, DeployError>;
