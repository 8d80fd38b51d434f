//! Installation and access service
//!
//! The mutation surface and the read-side resolution engine. Every
//! mutation gates first (team admin/owner or system admin, plus the
//! member-on-own-row case), mutates second, and appends one audit entry
//! last. Reads never audit and never mutate.

use std::sync::Arc;

use semver::Version;
use tracing::instrument;
use uuid::Uuid;

use canopy_audit::{AuditEntry, AuditSink, TargetKind};
use canopy_deploy::PackageStore;
use canopy_rbac::DelegationService;

use crate::error::{AccessError, AccessResult};
use crate::installation::{AccessOverrides, ConfigMap, Installation, MemberAccess};
use crate::resolve::{self, ResolvedAccess};
use crate::store::AccessStore;
use crate::teams::TeamMembership;

/// Installation and access service.
pub struct AccessService {
    store: Arc<dyn AccessStore>,
    packages: Arc<dyn PackageStore>,
    delegation: Arc<DelegationService>,
    audit: Arc<dyn AuditSink>,
}

impl AccessService {
    /// Create a new access service.
    pub fn new(
        store: Arc<dyn AccessStore>,
        packages: Arc<dyn PackageStore>,
        delegation: Arc<DelegationService>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store,
            packages,
            delegation,
            audit,
        }
    }

    /// The underlying access store.
    pub fn store(&self) -> &Arc<dyn AccessStore> {
        &self.store
    }

    async fn load_installation(&self, id: Uuid) -> AccessResult<Installation> {
        self.store
            .get_installation(id)
            .await?
            .ok_or(AccessError::InstallationNotFound { installation: id })
    }

    async fn load_membership(&self, team: Uuid, member: Uuid) -> AccessResult<TeamMembership> {
        self.store
            .get_membership(team, member)
            .await?
            .ok_or(AccessError::MembershipNotFound { team, member })
    }

    /// Whether the actor administers this team's installations.
    async fn is_team_manager(&self, actor: Uuid, team: Uuid) -> AccessResult<bool> {
        if self.delegation.is_system_admin(actor).await? {
            return Ok(true);
        }
        Ok(self
            .store
            .get_membership(team, actor)
            .await?
            .is_some_and(|m| m.role.is_admin()))
    }

    async fn ensure_manager(&self, actor: Uuid, installation: &Installation) -> AccessResult<()> {
        if self.is_team_manager(actor, installation.team_id).await? {
            Ok(())
        } else {
            Err(AccessError::Forbidden {
                actor,
                team: installation.team_id,
            })
        }
    }

    // --- Reads ---

    /// Resolve a member's access to an installation.
    ///
    /// `InstallationNotFound` / `MembershipNotFound` are the only
    /// failures; otherwise the result is always definite.
    pub async fn resolve_access(
        &self,
        member: Uuid,
        installation_id: Uuid,
    ) -> AccessResult<ResolvedAccess> {
        let installation = self.load_installation(installation_id).await?;
        let membership = self.load_membership(installation.team_id, member).await?;
        let overlay = self.store.get_member_access(installation_id, member).await?;

        Ok(resolve::resolve_access(
            membership.role,
            &installation,
            overlay.as_ref(),
        ))
    }

    /// Resolve a member's effective configuration for an installation.
    pub async fn resolve_config(
        &self,
        member: Uuid,
        installation_id: Uuid,
    ) -> AccessResult<ConfigMap> {
        let installation = self.load_installation(installation_id).await?;
        self.load_membership(installation.team_id, member).await?;
        let overlay = self.store.get_member_access(installation_id, member).await?;

        Ok(resolve::merge_config(
            &installation.shared_config,
            overlay.as_ref(),
        ))
    }

    /// The version an installation should run.
    ///
    /// A pin wins verbatim; otherwise the package's active slot version.
    /// `None` before the first promotion. The slot read happens after
    /// the installation read so a concurrent promotion yields the
    /// freshest version rather than a stale one.
    pub async fn resolve_effective_version(
        &self,
        installation_id: Uuid,
    ) -> AccessResult<Option<Version>> {
        let installation = self.load_installation(installation_id).await?;
        if let Some(pinned) = installation.pinned_version {
            return Ok(Some(pinned));
        }

        let pair = self.packages.get_slots(&installation.package_id).await?;
        Ok(pair.and_then(|p| p.active_version().cloned()))
    }

    // --- Mutations ---

    /// Install a package for a team.
    ///
    /// Idempotent per `(team, package)`: re-installing returns the
    /// existing installation without a second audit entry.
    #[instrument(skip(self))]
    pub async fn install(
        &self,
        actor: Uuid,
        team_id: Uuid,
        package_id: &str,
    ) -> AccessResult<Installation> {
        if !self.is_team_manager(actor, team_id).await? {
            return Err(AccessError::Forbidden {
                actor,
                team: team_id,
            });
        }

        if let Some(existing) = self.store.find_installation(team_id, package_id).await? {
            tracing::debug!(team = %team_id, package = package_id, "Package already installed");
            return Ok(existing);
        }

        let installation = Installation::new(team_id, package_id, actor);
        self.store.put_installation(installation.clone()).await?;

        tracing::info!(
            team = %team_id,
            package = package_id,
            installation = %installation.id,
            "Package installed"
        );

        self.audit
            .record(
                AuditEntry::new(
                    "installation.installed",
                    actor,
                    TargetKind::Installation,
                    installation.id.to_string(),
                )
                .with_detail("team_id", serde_json::json!(team_id.to_string()))
                .with_detail("package_id", serde_json::json!(package_id)),
            )
            .await?;

        Ok(installation)
    }

    /// Remove an installation and all of its member overlays.
    #[instrument(skip(self))]
    pub async fn uninstall(&self, actor: Uuid, installation_id: Uuid) -> AccessResult<()> {
        let installation = self.load_installation(installation_id).await?;
        self.ensure_manager(actor, &installation).await?;

        self.store.delete_installation(installation_id).await?;

        tracing::info!(
            team = %installation.team_id,
            package = %installation.package_id,
            installation = %installation_id,
            "Package uninstalled"
        );

        self.audit
            .record(
                AuditEntry::new(
                    "installation.uninstalled",
                    actor,
                    TargetKind::Installation,
                    installation_id.to_string(),
                )
                .with_detail("team_id", serde_json::json!(installation.team_id.to_string()))
                .with_detail("package_id", serde_json::json!(installation.package_id)),
            )
            .await?;

        Ok(())
    }

    /// Replace the team-wide configuration of an installation.
    #[instrument(skip(self, config))]
    pub async fn set_shared_config(
        &self,
        actor: Uuid,
        installation_id: Uuid,
        config: ConfigMap,
    ) -> AccessResult<()> {
        let mut installation = self.load_installation(installation_id).await?;
        self.ensure_manager(actor, &installation).await?;

        installation.shared_config = config;
        self.store.put_installation(installation).await?;

        self.audit
            .record(AuditEntry::new(
                "installation.config_updated",
                actor,
                TargetKind::Installation,
                installation_id.to_string(),
            ))
            .await?;

        Ok(())
    }

    /// Enable or disable an installation for the whole team.
    ///
    /// Setting the current value is a no-op success without an audit
    /// entry.
    #[instrument(skip(self))]
    pub async fn set_enabled(
        &self,
        actor: Uuid,
        installation_id: Uuid,
        enabled: bool,
    ) -> AccessResult<()> {
        let mut installation = self.load_installation(installation_id).await?;
        self.ensure_manager(actor, &installation).await?;

        if installation.enabled == enabled {
            return Ok(());
        }
        installation.enabled = enabled;
        self.store.put_installation(installation).await?;

        tracing::info!(installation = %installation_id, enabled, "Installation toggled");

        self.audit
            .record(
                AuditEntry::new(
                    "installation.enabled_set",
                    actor,
                    TargetKind::Installation,
                    installation_id.to_string(),
                )
                .with_detail("enabled", serde_json::json!(enabled)),
            )
            .await?;

        Ok(())
    }

    /// Apply overrides to a member's overlay row, creating it lazily.
    ///
    /// Allowed for team admins/owners, system admins, and the member
    /// acting on their own row. The member must belong to the owning
    /// team.
    #[instrument(skip(self, overrides))]
    pub async fn set_member_access(
        &self,
        actor: Uuid,
        member: Uuid,
        installation_id: Uuid,
        overrides: AccessOverrides,
    ) -> AccessResult<()> {
        let installation = self.load_installation(installation_id).await?;
        if actor != member {
            self.ensure_manager(actor, &installation).await?;
        }
        self.load_membership(installation.team_id, member).await?;

        let mut row = self
            .store
            .get_member_access(installation_id, member)
            .await?
            .unwrap_or_else(|| MemberAccess::inheriting(installation_id, member));
        overrides.apply(&mut row);
        self.store.put_member_access(row).await?;

        // The overlay row's natural key is (installation, member)
        self.audit
            .record(
                AuditEntry::new(
                    "installation.member_access_updated",
                    actor,
                    TargetKind::MemberAccess,
                    format!("{installation_id}:{member}"),
                )
                .with_detail("member_id", serde_json::json!(member.to_string())),
            )
            .await?;

        Ok(())
    }

    /// Pin an installation to a version.
    ///
    /// Any parseable semver may be pinned; the pin wins over the active
    /// slot until removed.
    #[instrument(skip(self))]
    pub async fn pin_version(
        &self,
        actor: Uuid,
        installation_id: Uuid,
        version: &str,
    ) -> AccessResult<()> {
        let pinned = Version::parse(version).map_err(|e| AccessError::InvalidVersion {
            version: version.to_string(),
            reason: e.to_string(),
        })?;

        let mut installation = self.load_installation(installation_id).await?;
        self.ensure_manager(actor, &installation).await?;

        installation.pinned_version = Some(pinned.clone());
        self.store.put_installation(installation).await?;

        tracing::info!(installation = %installation_id, version = %pinned, "Version pinned");

        self.audit
            .record(
                AuditEntry::new(
                    "installation.pinned",
                    actor,
                    TargetKind::Installation,
                    installation_id.to_string(),
                )
                .with_detail("version", serde_json::json!(pinned.to_string())),
            )
            .await?;

        Ok(())
    }

    /// Remove an installation's pin, resuming active-slot tracking.
    ///
    /// Unpinning an unpinned installation is a no-op success without an
    /// audit entry.
    #[instrument(skip(self))]
    pub async fn unpin_version(&self, actor: Uuid, installation_id: Uuid) -> AccessResult<()> {
        let mut installation = self.load_installation(installation_id).await?;
        self.ensure_manager(actor, &installation).await?;

        let Some(pinned) = installation.pinned_version.take() else {
            return Ok(());
        };
        self.store.put_installation(installation).await?;

        tracing::info!(installation = %installation_id, version = %pinned, "Version unpinned");

        self.audit
            .record(
                AuditEntry::new(
                    "installation.unpinned",
                    actor,
                    TargetKind::Installation,
                    installation_id.to_string(),
                )
                .with_detail("version", serde_json::json!(pinned.to_string())),
            )
            .await?;

        Ok(())
    }
}
