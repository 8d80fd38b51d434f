//! # Actions
//!
//! Defines all actions that can be performed on resources.

use serde::{Deserialize, Serialize};

/// Actions that can be performed on resources.
///
/// Actions represent the operations the platform core exposes:
/// - **Read**: View resource data (deployment status, resolved views)
/// - **Use**: Run a plugin as a member
/// - **Install** / **Uninstall**: Manage a team's installations
/// - **Deploy** / **Promote** / **Rollback**: Drive the slot lifecycle
/// - **Configure**: Change shared/member configuration and pins
/// - **Assign**: Grant or revoke roles
/// - **Admin**: Full control of the resource
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Read/view resource.
    Read,

    /// Use the resource as a member (run a plugin).
    Use,

    /// Install a package for a team.
    Install,

    /// Remove a team's installation.
    Uninstall,

    /// Target a version at a deployment slot.
    Deploy,

    /// Promote a slot to active.
    Promote,

    /// Roll the active version back.
    Rollback,

    /// Change configuration (shared, member, pins).
    Configure,

    /// Grant or revoke roles.
    Assign,

    /// Full administrative control.
    Admin,
}

impl Action {
    /// Get the string representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Use => "use",
            Action::Install => "install",
            Action::Uninstall => "uninstall",
            Action::Deploy => "deploy",
            Action::Promote => "promote",
            Action::Rollback => "rollback",
            Action::Configure => "configure",
            Action::Assign => "assign",
            Action::Admin => "admin",
        }
    }

    /// Parse an action from its string representation.
    ///
    /// # Example
    ///
    /// ```
    /// use canopy_rbac::Action;
    ///
    /// assert_eq!(Action::parse("deploy"), Some(Action::Deploy));
    /// assert_eq!(Action::parse("ADMIN"), Some(Action::Admin));
    /// assert_eq!(Action::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "read" | "view" | "get" => Some(Action::Read),
            "use" | "run" | "execute" => Some(Action::Use),
            "install" | "add" => Some(Action::Install),
            "uninstall" | "remove" => Some(Action::Uninstall),
            "deploy" => Some(Action::Deploy),
            "promote" => Some(Action::Promote),
            "rollback" => Some(Action::Rollback),
            "configure" | "config" | "pin" => Some(Action::Configure),
            "assign" | "grant" | "revoke" => Some(Action::Assign),
            "admin" | "manage" | "administer" => Some(Action::Admin),
            _ => None,
        }
    }

    /// Get all actions.
    pub fn all() -> Vec<Self> {
        vec![
            Action::Read,
            Action::Use,
            Action::Install,
            Action::Uninstall,
            Action::Deploy,
            Action::Promote,
            Action::Rollback,
            Action::Configure,
            Action::Assign,
            Action::Admin,
        ]
    }

    /// Check if this action implies another action.
    ///
    /// - `Admin` implies every action
    /// - Mutating actions imply `Read`
    ///
    /// # Example
    ///
    /// ```
    /// use canopy_rbac::Action;
    ///
    /// assert!(Action::Admin.implies(Action::Deploy));
    /// assert!(Action::Deploy.implies(Action::Read));
    /// assert!(!Action::Read.implies(Action::Deploy));
    /// ```
    pub fn implies(&self, other: Action) -> bool {
        match self {
            Action::Admin => true,
            Action::Install
            | Action::Uninstall
            | Action::Deploy
            | Action::Promote
            | Action::Rollback
            | Action::Configure
            | Action::Assign => other == Action::Read,
            _ => false,
        }
    }

    /// Check if this is a read-only action.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Action::Read | Action::Use)
    }
}
