//! Error types for installation and access operations

use thiserror::Error;
use uuid::Uuid;

use canopy_audit::AuditError;
use canopy_deploy::DeployError;
use canopy_rbac::RbacError;

/// Access error types.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The installation does not exist.
    #[error("Installation not found: {installation}")]
    InstallationNotFound {
        /// The missing installation id.
        installation: Uuid,
    },

    /// The member has no membership in the installation's owning team.
    #[error("User {member} is not a member of team {team}")]
    MembershipNotFound {
        /// The team id.
        team: Uuid,
        /// The member without a membership row.
        member: Uuid,
    },

    /// A pin target failed strict semver parsing.
    #[error("Invalid version {version:?}: {reason}")]
    InvalidVersion {
        /// The rejected version string.
        version: String,
        /// The parser's reason.
        reason: String,
    },

    /// The actor may not manage this team's installations.
    #[error("Actor {actor} may not manage installations of team {team}")]
    Forbidden {
        /// The denied actor.
        actor: Uuid,
        /// The owning team.
        team: Uuid,
    },

    /// Underlying storage failed; propagated unchanged.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Delegation check failed to evaluate.
    #[error(transparent)]
    Rbac(#[from] RbacError),

    /// Deployment state read failed.
    #[error(transparent)]
    Deploy(#[from] DeployError),

    /// Audit append failed.
    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// Result type for access operations.
pub type AccessResult<T> = Result<T, AccessError>;
