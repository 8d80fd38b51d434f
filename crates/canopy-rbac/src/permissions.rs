//! # Permissions
//!
//! Core permission types and sets for the RBAC system.
//! A permission combines a resource type with an action.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::actions::Action;
use crate::resources::Resource;

/// A permission is a `(resource, action)` pair.
///
/// # Example
///
/// ```
/// use canopy_rbac::{Action, Permission, Resource};
///
/// let perm = Permission::new(Resource::Plugin, Action::Install);
/// assert_eq!(perm.as_key(), "plugin:install");
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Permission {
    /// The resource type this permission applies to.
    pub resource: Resource,
    /// The action allowed on the resource.
    pub action: Action,
}

impl Permission {
    /// Create a new permission.
    pub fn new(resource: Resource, action: Action) -> Self {
        Self { resource, action }
    }

    /// Get the string key (e.g., "plugin:install").
    pub fn as_key(&self) -> String {
        format!("{}:{}", self.resource.as_str(), self.action.as_str())
    }

    /// Parse from a string key (e.g., "plugin:install").
    ///
    /// # Example
    ///
    /// ```
    /// use canopy_rbac::{Action, Permission, Resource};
    ///
    /// let perm = Permission::from_key("deployment:promote").unwrap();
    /// assert_eq!(perm.resource, Resource::Deployment);
    /// assert_eq!(perm.action, Action::Promote);
    /// assert!(Permission::from_key("nonsense").is_none());
    /// ```
    pub fn from_key(s: &str) -> Option<Self> {
        let (resource, action) = s.split_once(':')?;
        Some(Self {
            resource: Resource::parse(resource)?,
            action: Action::parse(action)?,
        })
    }

    /// Check if holding this permission satisfies a check for `other`.
    ///
    /// Resources must match exactly; the action must match or imply the
    /// checked action (e.g., `Admin` covers everything on its resource).
    pub fn covers(&self, other: &Permission) -> bool {
        self.resource == other.resource
            && (self.action == other.action || self.action.implies(other.action))
    }
}

/// A set of permissions held by a role.
///
/// # Example
///
/// ```
/// use canopy_rbac::{Action, Permission, PermissionSet, Resource};
///
/// let mut set = PermissionSet::new();
/// set.add(Permission::new(Resource::Plugin, Action::Read));
/// set.add(Permission::new(Resource::Plugin, Action::Use));
///
/// assert!(set.grants(Resource::Plugin, Action::Read));
/// assert!(!set.grants(Resource::Plugin, Action::Install));
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionSet {
    /// The permissions in this set.
    permissions: HashSet<Permission>,
}

impl PermissionSet {
    /// Create a new empty permission set.
    pub fn new() -> Self {
        Self {
            permissions: HashSet::new(),
        }
    }

    /// Create a set from `(resource, action)` pairs.
    pub fn from_pairs(pairs: &[(Resource, Action)]) -> Self {
        pairs
            .iter()
            .map(|&(resource, action)| Permission::new(resource, action))
            .collect()
    }

    /// Create a set from string keys, ignoring unparseable entries.
    ///
    /// # Example
    ///
    /// ```
    /// use canopy_rbac::PermissionSet;
    ///
    /// let set = PermissionSet::from_keys(&["plugin:read", "plugin:use", "bogus"]);
    /// assert_eq!(set.len(), 2);
    /// ```
    pub fn from_keys(keys: &[&str]) -> Self {
        keys.iter().filter_map(|k| Permission::from_key(k)).collect()
    }

    /// Add a permission to the set.
    pub fn add(&mut self, permission: Permission) {
        self.permissions.insert(permission);
    }

    /// Remove a permission from the set.
    ///
    /// Returns `true` if the permission was present.
    pub fn remove(&mut self, permission: &Permission) -> bool {
        self.permissions.remove(permission)
    }

    /// Check if the set satisfies a permission check.
    ///
    /// This is a set-membership check with implication: the exact pair, or
    /// any held permission on the same resource whose action implies the
    /// checked one.
    pub fn has(&self, permission: &Permission) -> bool {
        if self.permissions.contains(permission) {
            return true;
        }
        self.permissions.iter().any(|held| held.covers(permission))
    }

    /// Convenience form of [`PermissionSet::has`].
    pub fn grants(&self, resource: Resource, action: Action) -> bool {
        self.has(&Permission::new(resource, action))
    }

    /// Merge another permission set into this one.
    pub fn merge(&mut self, other: &PermissionSet) {
        for perm in &other.permissions {
            self.permissions.insert(*perm);
        }
    }

    /// Get all permissions in the set.
    pub fn all(&self) -> Vec<Permission> {
        self.permissions.iter().copied().collect()
    }

    /// Get the count of permissions.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Self {
            permissions: iter.into_iter().collect(),
        }
    }
}
