//! Pure access and config resolution
//!
//! Three layers, highest precedence last: team-role defaults, then the
//! installation's enabled flag, then the member's explicit overlay.
//! These functions only combine already-loaded rows; the service is
//! responsible for reading them.

use serde::{Deserialize, Serialize};

use crate::installation::{ConfigMap, Installation, MemberAccess};
use crate::teams::TeamRole;

/// The outcome of access resolution for one member on one installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAccess {
    /// Whether the installation is listed for the member.
    pub visible: bool,

    /// Whether the member may use the plugin.
    pub can_use: bool,

    /// Whether the member may change the installation's configuration.
    pub can_configure: bool,

    /// Plugin role granted through the overlay, if any.
    pub plugin_role: Option<String>,

    /// The member's role in the owning team.
    pub team_role: TeamRole,
}

/// Resolve a member's access to an installation.
///
/// Defaults are visible and usable for everyone, configurable only for
/// team admins and owners. A disabled installation forces usage off.
/// Explicit overlay fields are applied last and win over both layers;
/// `None` fields inherit.
pub fn resolve_access(
    team_role: TeamRole,
    installation: &Installation,
    overlay: Option<&MemberAccess>,
) -> ResolvedAccess {
    let mut resolved = ResolvedAccess {
        visible: true,
        can_use: true,
        can_configure: team_role.is_admin(),
        plugin_role: None,
        team_role,
    };

    if !installation.enabled {
        resolved.can_use = false;
    }

    if let Some(overlay) = overlay {
        if let Some(visible) = overlay.visible {
            resolved.visible = visible;
        }
        if let Some(can_use) = overlay.can_use {
            resolved.can_use = can_use;
        }
        if let Some(can_configure) = overlay.can_configure {
            resolved.can_configure = can_configure;
        }
        resolved.plugin_role.clone_from(&overlay.plugin_role);
    }

    resolved
}

/// Shallow-merge a member's config over the shared base.
///
/// Per-key: a personal key fully replaces the shared value, nested
/// objects are not merged. Without an overlay the shared config passes
/// through unchanged.
pub fn merge_config(shared: &ConfigMap, overlay: Option<&MemberAccess>) -> ConfigMap {
    let mut merged = shared.clone();
    if let Some(overlay) = overlay {
        for (key, value) in &overlay.personal_config {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn installation(enabled: bool) -> Installation {
        let mut i = Installation::new(Uuid::now_v7(), "billing", Uuid::now_v7());
        i.enabled = enabled;
        i
    }

    fn overlay(installation: &Installation) -> MemberAccess {
        MemberAccess::inheriting(installation.id, Uuid::now_v7())
    }

    #[test]
    fn test_member_defaults() {
        let access = resolve_access(TeamRole::Member, &installation(true), None);
        assert!(access.visible);
        assert!(access.can_use);
        assert!(!access.can_configure);
    }

    #[test]
    fn test_admin_can_configure_by_default() {
        for role in [TeamRole::Admin, TeamRole::Owner] {
            let access = resolve_access(role, &installation(true), None);
            assert!(access.can_configure);
        }
    }

    #[test]
    fn test_disabled_installation_forces_can_use_off() {
        let access = resolve_access(TeamRole::Owner, &installation(false), None);
        assert!(!access.can_use);
        assert!(access.visible);
    }

    #[test]
    fn test_explicit_false_wins_over_defaults() {
        let installation = installation(true);
        let mut row = overlay(&installation);
        row.can_configure = Some(false);
        row.visible = Some(false);

        let access = resolve_access(TeamRole::Owner, &installation, Some(&row));
        assert!(!access.can_configure);
        assert!(!access.visible);
        assert!(access.can_use);
    }

    #[test]
    fn test_overlay_wins_over_enabled_flag() {
        // The overlay is the highest-precedence layer
        let installation = installation(false);
        let mut row = overlay(&installation);
        row.can_use = Some(true);

        let access = resolve_access(TeamRole::Member, &installation, Some(&row));
        assert!(access.can_use);
    }

    #[test]
    fn test_overlay_grants_plugin_role() {
        let installation = installation(true);
        let mut row = overlay(&installation);
        row.plugin_role = Some("billing:operator".to_string());

        let access = resolve_access(TeamRole::Member, &installation, Some(&row));
        assert_eq!(access.plugin_role.as_deref(), Some("billing:operator"));
    }

    #[test]
    fn test_merge_personal_key_wins() {
        let mut shared = ConfigMap::new();
        shared.insert("theme".to_string(), json!("dark"));
        shared.insert("limit".to_string(), json!(10));

        let installation = installation(true);
        let mut row = overlay(&installation);
        row.personal_config
            .insert("theme".to_string(), json!("light"));

        let merged = merge_config(&shared, Some(&row));
        assert_eq!(merged["theme"], json!("light"));
        assert_eq!(merged["limit"], json!(10));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_without_overlay_passes_through() {
        let mut shared = ConfigMap::new();
        shared.insert("limit".to_string(), json!(10));

        assert_eq!(merge_config(&shared, None), shared);
    }

    #[test]
    fn test_merge_replaces_nested_objects_whole() {
        let mut shared = ConfigMap::new();
        shared.insert("flags".to_string(), json!({"a": true, "b": true}));

        let installation = installation(true);
        let mut row = overlay(&installation);
        row.personal_config
            .insert("flags".to_string(), json!({"a": false}));

        let merged = merge_config(&shared, Some(&row));
        // No deep merge: the personal object replaces the shared one
        assert_eq!(merged["flags"], json!({"a": false}));
    }
}
