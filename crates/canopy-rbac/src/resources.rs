//! # Resources
//!
//! Defines the platform entities access control is checked against.

use serde::{Deserialize, Serialize};

/// Resource types permissions apply to.
///
/// Resources cover the surface of the platform core:
/// - **Platform**: The platform itself; `(Platform, Admin)` marks a
///   system administrator
/// - **Plugin**: A plugin package as a whole
/// - **Deployment**: A package's deployment slots
/// - **Installation**: A team's binding to a package
/// - **Role**: Role definitions and assignments
/// - **Config**: Shared and personal configuration layers
/// - **AuditLog**: The recorded administrative history
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// The platform itself.
    Platform,

    /// A plugin package.
    Plugin,

    /// A package's deployment slots.
    Deployment,

    /// A team's installation of a package.
    Installation,

    /// Role definitions and assignments.
    Role,

    /// Shared and personal configuration.
    Config,

    /// The audit log.
    AuditLog,
}

impl Resource {
    /// Get the string representation of the resource.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Platform => "platform",
            Resource::Plugin => "plugin",
            Resource::Deployment => "deployment",
            Resource::Installation => "installation",
            Resource::Role => "role",
            Resource::Config => "config",
            Resource::AuditLog => "audit_log",
        }
    }

    /// Parse a resource from its string representation.
    ///
    /// # Example
    ///
    /// ```
    /// use canopy_rbac::Resource;
    ///
    /// assert_eq!(Resource::parse("plugin"), Some(Resource::Plugin));
    /// assert_eq!(Resource::parse("AUDIT_LOG"), Some(Resource::AuditLog));
    /// assert_eq!(Resource::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "platform" => Some(Resource::Platform),
            "plugin" | "package" => Some(Resource::Plugin),
            "deployment" | "slot" => Some(Resource::Deployment),
            "installation" | "install" => Some(Resource::Installation),
            "role" => Some(Resource::Role),
            "config" | "configuration" | "settings" => Some(Resource::Config),
            "audit_log" | "audit" => Some(Resource::AuditLog),
            _ => None,
        }
    }

    /// Get all resources.
    pub fn all() -> Vec<Self> {
        vec![
            Resource::Platform,
            Resource::Plugin,
            Resource::Deployment,
            Resource::Installation,
            Resource::Role,
            Resource::Config,
            Resource::AuditLog,
        ]
    }
}
