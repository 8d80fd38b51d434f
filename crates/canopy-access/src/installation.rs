//! Installations and member access overlays

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A flat map of setting name to value.
///
/// Values are opaque JSON; merging is shallow and per-key.
pub type ConfigMap = HashMap<String, serde_json::Value>;

/// A team's binding to a package.
///
/// Exclusively owned by its team. Uninstall is a hard delete; the audit
/// log is the only history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installation {
    /// Unique installation id.
    pub id: Uuid,

    /// The owning team.
    pub team_id: Uuid,

    /// The installed package.
    pub package_id: String,

    /// Pinned version; `None` means track the active slot.
    pub pinned_version: Option<Version>,

    /// Team-wide configuration, the base layer of every member's config.
    pub shared_config: ConfigMap,

    /// Whether the installation is enabled for the team.
    pub enabled: bool,

    /// When the package was installed.
    pub installed_at: DateTime<Utc>,

    /// Who installed it.
    pub installed_by: Uuid,
}

impl Installation {
    /// Create an enabled installation with empty config and no pin.
    pub fn new(team_id: Uuid, package_id: impl Into<String>, installed_by: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            team_id,
            package_id: package_id.into(),
            pinned_version: None,
            shared_config: ConfigMap::new(),
            enabled: true,
            installed_at: Utc::now(),
            installed_by,
        }
    }
}

/// Per-member overlay on an installation.
///
/// Every gate field is tri-state: `None` inherits the resolved default,
/// `Some(v)` overrides it explicitly. A row exists only once someone has
/// set an override; absence means full inheritance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberAccess {
    /// The installation this overlay belongs to.
    pub installation_id: Uuid,

    /// The member it applies to.
    pub member_id: Uuid,

    /// Override for visibility.
    pub visible: Option<bool>,

    /// Override for usage.
    pub can_use: Option<bool>,

    /// Override for configuration rights.
    pub can_configure: Option<bool>,

    /// Plugin-scoped role granted to this member through the overlay.
    pub plugin_role: Option<String>,

    /// Member-private config keys, overlaid on the shared config.
    pub personal_config: ConfigMap,
}

impl MemberAccess {
    /// Create a fully inheriting row.
    pub fn inheriting(installation_id: Uuid, member_id: Uuid) -> Self {
        Self {
            installation_id,
            member_id,
            visible: None,
            can_use: None,
            can_configure: None,
            plugin_role: None,
            personal_config: ConfigMap::new(),
        }
    }
}

/// Partial update applied to a member's overlay row.
///
/// `None` fields leave the row untouched; setters mirror the tri-state
/// fields of [`MemberAccess`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessOverrides {
    /// New value for the visibility override.
    pub visible: Option<bool>,

    /// New value for the usage override.
    pub can_use: Option<bool>,

    /// New value for the configuration override.
    pub can_configure: Option<bool>,

    /// New plugin role, if granting one.
    pub plugin_role: Option<String>,

    /// Replacement personal config, if changing it.
    pub personal_config: Option<ConfigMap>,
}

impl AccessOverrides {
    /// An empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override visibility.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    /// Override usage.
    pub fn with_can_use(mut self, can_use: bool) -> Self {
        self.can_use = Some(can_use);
        self
    }

    /// Override configuration rights.
    pub fn with_can_configure(mut self, can_configure: bool) -> Self {
        self.can_configure = Some(can_configure);
        self
    }

    /// Grant a plugin role through the overlay.
    pub fn with_plugin_role(mut self, role: impl Into<String>) -> Self {
        self.plugin_role = Some(role.into());
        self
    }

    /// Replace the member's personal config.
    pub fn with_personal_config(mut self, config: ConfigMap) -> Self {
        self.personal_config = Some(config);
        self
    }

    /// Apply the set fields to a row.
    pub fn apply(&self, row: &mut MemberAccess) {
        if let Some(visible) = self.visible {
            row.visible = Some(visible);
        }
        if let Some(can_use) = self.can_use {
            row.can_use = Some(can_use);
        }
        if let Some(can_configure) = self.can_configure {
            row.can_configure = Some(can_configure);
        }
        if let Some(ref role) = self.plugin_role {
            row.plugin_role = Some(role.clone());
        }
        if let Some(ref config) = self.personal_config {
            row.personal_config = config.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_installation_defaults() {
        let team = Uuid::now_v7();
        let actor = Uuid::now_v7();
        let installation = Installation::new(team, "billing", actor);

        assert!(installation.enabled);
        assert!(installation.pinned_version.is_none());
        assert!(installation.shared_config.is_empty());
    }

    #[test]
    fn test_overrides_apply_only_set_fields() {
        let row_id = Uuid::now_v7();
        let member = Uuid::now_v7();
        let mut row = MemberAccess::inheriting(row_id, member);
        row.visible = Some(false);

        AccessOverrides::new().with_can_use(false).apply(&mut row);

        assert_eq!(row.visible, Some(false));
        assert_eq!(row.can_use, Some(false));
        assert_eq!(row.can_configure, None);
    }
}
