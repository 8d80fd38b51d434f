//! Error types for RBAC operations

use thiserror::Error;
use uuid::Uuid;

use canopy_audit::AuditError;

/// RBAC error types.
///
/// Every variant carries the offending field/value; rendering a
/// human-facing message is the caller's job.
#[derive(Debug, Error)]
pub enum RbacError {
    /// A referenced role does not exist.
    #[error("Unknown role: {role}")]
    UnknownRole {
        /// The missing role name.
        role: String,
    },

    /// A role cannot be deleted while assignments reference it.
    #[error("Role {role} is in use by {assignments} assignment(s)")]
    RoleInUse {
        /// The role name.
        role: String,
        /// How many assignments reference it.
        assignments: usize,
    },

    /// A role definition violates the naming invariant.
    #[error("Invalid role name {name:?} for {scope} scope")]
    InvalidRoleName {
        /// The rejected role name.
        name: String,
        /// The declared scope, as a string.
        scope: &'static str,
    },

    /// The actor may not perform this delegation.
    #[error("Actor {actor} may not delegate role {role}")]
    Forbidden {
        /// The denied actor.
        actor: Uuid,
        /// The role the actor tried to delegate.
        role: String,
    },

    /// Underlying storage failed; propagated unchanged.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Audit append failed.
    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// Result type for RBAC operations.
pub type RbacResult<T> = Result<T, RbacError>;
