//! Role definitions and assignments
//!
//! Roles are named permission bundles. A role is either system-scoped
//! (platform-wide) or plugin-scoped, in which case its name is prefixed
//! with the owning package id (`"<package>:<role>"`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actions::Action;
use crate::error::RbacError;
use crate::permissions::PermissionSet;
use crate::resources::Resource;

/// The scope a role applies at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RoleScope {
    /// Platform-wide role.
    System,
    /// Role owned by a single plugin package.
    Plugin,
}

impl RoleScope {
    /// Get the string representation of the scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleScope::System => "system",
            RoleScope::Plugin => "plugin",
        }
    }
}

/// A named permission bundle.
///
/// # Naming invariant
///
/// Plugin-scoped role names must be `"<package>:<role>"` with a non-empty
/// package prefix; system-scoped names must not contain `:`. The store
/// rejects upserts that violate this via [`Role::validate`].
///
/// # Examples
///
/// ```
/// use canopy_rbac::{Action, PermissionSet, Resource, Role};
///
/// let viewer = Role::plugin_scoped("billing", "viewer", PermissionSet::from_pairs(&[
///     (Resource::Plugin, Action::Read),
///     (Resource::Plugin, Action::Use),
/// ]));
/// assert_eq!(viewer.name, "billing:viewer");
/// assert_eq!(viewer.package_id(), Some("billing"));
/// assert!(viewer.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Globally unique role name.
    pub name: String,

    /// Permissions granted by this role.
    pub permissions: PermissionSet,

    /// Scope the role applies at.
    pub scope: RoleScope,

    /// Optional human-oriented description.
    pub description: Option<String>,

    /// When the role was created.
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Create a system-scoped role.
    pub fn system(name: impl Into<String>, permissions: PermissionSet) -> Self {
        Self {
            name: name.into(),
            permissions,
            scope: RoleScope::System,
            description: None,
            created_at: Utc::now(),
        }
    }

    /// Create a plugin-scoped role named `"<package>:<role>"`.
    pub fn plugin_scoped(
        package_id: impl AsRef<str>,
        role: impl AsRef<str>,
        permissions: PermissionSet,
    ) -> Self {
        Self {
            name: format!("{}:{}", package_id.as_ref(), role.as_ref()),
            permissions,
            scope: RoleScope::Plugin,
            description: None,
            created_at: Utc::now(),
        }
    }

    /// The standard system administrator role.
    pub fn system_admin() -> Self {
        Self::system(
            "platform-admin",
            PermissionSet::from_pairs(&[(Resource::Platform, Action::Admin)]),
        )
        .with_description("Full platform administration")
    }

    /// The standard admin role for one package (`"<package>:admin"`).
    pub fn plugin_admin(package_id: impl AsRef<str>) -> Self {
        Self::plugin_scoped(
            package_id.as_ref(),
            "admin",
            PermissionSet::from_pairs(&[
                (Resource::Plugin, Action::Admin),
                (Resource::Deployment, Action::Admin),
                (Resource::Installation, Action::Admin),
                (Resource::Config, Action::Admin),
            ]),
        )
        .with_description(format!("Administration of the {} plugin", package_id.as_ref()))
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The owning package id for a plugin-scoped role.
    ///
    /// Returns `None` for system-scoped roles or malformed names.
    pub fn package_id(&self) -> Option<&str> {
        if self.scope != RoleScope::Plugin {
            return None;
        }
        match self.name.split_once(':') {
            Some((package, _)) if !package.is_empty() => Some(package),
            _ => None,
        }
    }

    /// Check the naming invariant for this role's scope.
    pub fn validate(&self) -> Result<(), RbacError> {
        let valid = match self.scope {
            RoleScope::System => !self.name.is_empty() && !self.name.contains(':'),
            RoleScope::Plugin => matches!(
                self.name.split_once(':'),
                Some((package, role)) if !package.is_empty() && !role.is_empty()
            ),
        };
        if valid {
            Ok(())
        } else {
            Err(RbacError::InvalidRoleName {
                name: self.name.clone(),
                scope: self.scope.as_str(),
            })
        }
    }

    /// Check whether this role grants `(resource, action)`.
    pub fn grants(&self, resource: Resource, action: Action) -> bool {
        self.permissions.grants(resource, action)
    }

    /// Check whether this role satisfies a package-scope qualifier.
    ///
    /// An absent qualifier is satisfied by every role. System roles
    /// satisfy any scope; plugin roles only their own package.
    pub fn satisfies_scope(&self, package_id: Option<&str>) -> bool {
        match (self.scope, package_id) {
            (_, None) => true,
            (RoleScope::System, Some(_)) => true,
            (RoleScope::Plugin, Some(package)) => self.package_id() == Some(package),
        }
    }
}

/// A user→role binding, unique on `(user_id, role_name)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// The assigned user.
    pub user_id: Uuid,

    /// The assigned role name.
    pub role_name: String,

    /// Who made the assignment, when known.
    pub assigned_by: Option<Uuid>,

    /// When the assignment was made.
    pub assigned_at: DateTime<Utc>,
}

impl RoleAssignment {
    /// Create a new assignment.
    pub fn new(user_id: Uuid, role_name: impl Into<String>) -> Self {
        Self {
            user_id,
            role_name: role_name.into(),
            assigned_by: None,
            assigned_at: Utc::now(),
        }
    }

    /// Set who made the assignment.
    pub fn with_assigner(mut self, assigner: Uuid) -> Self {
        self.assigned_by = Some(assigner);
        self
    }
}
