//! # Canopy RBAC (Role-Based Access Control)
//!
//! This crate provides RBAC and delegated administration for the Canopy
//! plugin platform.
//!
//! ## Overview
//!
//! The canopy-rbac crate handles:
//! - **Resources**: Platform entities access is checked against
//! - **Actions**: Operations that can be performed on resources
//! - **Permissions**: Resource + Action combinations held in sets
//! - **Roles**: Named permission bundles, system- or plugin-scoped
//! - **Role store**: Role definitions and user→role assignments
//! - **Delegation**: Who may grant/revoke which roles, with auditing
//!
//! ## Architecture
//!
//! ```text
//! Permission = Resource + Action
//!
//! Role "platform-admin"      scope: system   { platform:admin }
//! Role "billing:admin"       scope: plugin   { plugin:admin }
//! Role "billing:viewer"      scope: plugin   { plugin:read, plugin:use }
//! ```
//!
//! A plugin-scoped role's name carries its owning package as a prefix
//! (`"<package>:<role>"`). That prefix is what delegation checks: plugin
//! admins may only grant roles under their own prefix, system admins may
//! grant anything.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use canopy_rbac::{Action, Permission, PermissionSet, Resource, Role};
//!
//! // A permission is a (resource, action) pair
//! let perm = Permission::new(Resource::Plugin, Action::Install);
//! assert_eq!(perm.as_key(), "plugin:install");
//!
//! // Roles bundle permissions
//! let role = Role::plugin_scoped("billing", "viewer", PermissionSet::from_pairs(&[
//!     (Resource::Plugin, Action::Read),
//!     (Resource::Plugin, Action::Use),
//! ]));
//! assert_eq!(role.name, "billing:viewer");
//! ```
//!
//! ## Action Implications
//!
//! Some actions imply others:
//! - `Admin` implies all actions on the same resource
//! - Mutating actions (`Deploy`, `Promote`, `Rollback`, `Configure`,
//!   `Install`, `Uninstall`) imply `Read`
//!
//! ## Checking Pattern
//!
//! `has_permission` is a set-union check over a user's assigned roles, not
//! dispatch logic: permissions live in the data. A scope-qualified check
//! additionally requires the granting role's scope to match the package,
//! where system roles satisfy any plugin scope.

pub mod actions;
pub mod delegation;
pub mod error;
pub mod permissions;
pub mod resources;
pub mod roles;
pub mod store;

// Re-export main types for convenience
pub use actions::Action;
pub use delegation::DelegationService;
pub use error::{RbacError, RbacResult};
pub use permissions::{Permission, PermissionSet};
pub use resources::Resource;
pub use roles::{Role, RoleAssignment, RoleScope};
pub use store::{MemoryRoleStore, RoleStore};
