//! End-to-end tests for the platform core.
//!
//! These tests wire the four crates together over the in-memory
//! backends and drive the full lifecycle: role setup, deploy, promote,
//! install, resolve, override, roll back. They assert the cross-crate
//! properties no single crate can check alone.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use canopy_access::{
    AccessOverrides, AccessService, ConfigMap, MemoryAccessStore, TeamMembership, TeamRole,
};
use canopy_audit::{AuditFilter, AuditSink, MemoryAuditLog, TargetKind};
use canopy_deploy::{
    HealthStatus, MemoryPackageStore, ReleaseMetadata, RollbackOptions, SlotManager,
};
use canopy_rbac::{
    DelegationService, MemoryRoleStore, PermissionSet, Resource, Role, RoleAssignment, RoleStore,
};

/// Everything a platform instance needs, over memory backends.
struct Platform {
    roles: Arc<MemoryRoleStore>,
    audit: Arc<MemoryAuditLog>,
    delegation: Arc<DelegationService>,
    slots: SlotManager,
    access: AccessService,
}

impl Platform {
    async fn new() -> Self {
        let roles = Arc::new(MemoryRoleStore::new());
        let audit = Arc::new(MemoryAuditLog::new());
        let packages = Arc::new(MemoryPackageStore::new());
        let delegation = Arc::new(DelegationService::new(roles.clone(), audit.clone()));

        let slots = SlotManager::new(packages.clone(), delegation.clone(), audit.clone());
        let access = AccessService::new(
            Arc::new(MemoryAccessStore::new()),
            packages,
            delegation.clone(),
            audit.clone(),
        );

        Self {
            roles,
            audit,
            delegation,
            slots,
            access,
        }
    }

    /// Seed the admin role for a package and assign it to a new user.
    async fn plugin_admin(&self, package: &str) -> Uuid {
        self.roles
            .upsert_role(Role::plugin_admin(package))
            .await
            .unwrap();
        let user = Uuid::now_v7();
        self.roles
            .assign_role(RoleAssignment::new(user, format!("{package}:admin")))
            .await
            .unwrap();
        user
    }

    /// Deploy a version, mark it healthy, and promote it.
    async fn release(&self, actor: Uuid, package: &str, version: &str) {
        let slot = self
            .slots
            .deploy(
                actor,
                package,
                version,
                ReleaseMetadata::new(format!("sha256:{version}")),
            )
            .await
            .unwrap();
        self.slots
            .report_health(package, slot.slot, HealthStatus::Healthy)
            .await
            .unwrap();
        self.slots.promote(actor, package, slot.slot).await.unwrap();
    }
}

#[tokio::test]
async fn test_full_lifecycle() {
    let platform = Platform::new().await;
    let deployer = platform.plugin_admin("billing").await;

    // Release 1.0.0, then stage 1.1.0 behind it
    platform.release(deployer, "billing", "1.0.0").await;
    platform.release(deployer, "billing", "1.1.0").await;

    // A team installs the package
    let team = Uuid::now_v7();
    let owner = Uuid::now_v7();
    let member = Uuid::now_v7();
    platform
        .access
        .store()
        .put_membership(TeamMembership::new(team, owner, TeamRole::Owner))
        .await
        .unwrap();
    platform
        .access
        .store()
        .put_membership(TeamMembership::new(team, member, TeamRole::Member))
        .await
        .unwrap();
    let installation = platform
        .access
        .install(owner, team, "billing")
        .await
        .unwrap();

    // Members track the active slot
    let version = platform
        .access
        .resolve_effective_version(installation.id)
        .await
        .unwrap();
    assert_eq!(version.unwrap().to_string(), "1.1.0");

    // Owner configures, member personalizes, personal keys win
    platform
        .access
        .set_shared_config(
            owner,
            installation.id,
            ConfigMap::from([
                ("theme".to_string(), json!("dark")),
                ("limit".to_string(), json!(10)),
            ]),
        )
        .await
        .unwrap();
    platform
        .access
        .set_member_access(
            member,
            member,
            installation.id,
            AccessOverrides::new()
                .with_personal_config(ConfigMap::from([("theme".to_string(), json!("light"))])),
        )
        .await
        .unwrap();
    let config = platform
        .access
        .resolve_config(member, installation.id)
        .await
        .unwrap();
    assert_eq!(config["theme"], json!("light"));
    assert_eq!(config["limit"], json!(10));

    // A bad release goes out and gets rolled back
    platform.release(deployer, "billing", "1.2.0").await;
    let rollback = platform
        .slots
        .rollback(
            deployer,
            "billing",
            RollbackOptions::to_previous().with_reason("error rate spike"),
        )
        .await
        .unwrap();
    assert_eq!(rollback.previous_version.to_string(), "1.2.0");
    assert_eq!(rollback.rolled_back_to.to_string(), "1.1.0");

    // Installations immediately see the rolled-back version
    let version = platform
        .access
        .resolve_effective_version(installation.id)
        .await
        .unwrap();
    assert_eq!(version.unwrap().to_string(), "1.1.0");
}

#[tokio::test]
async fn test_slot_exclusivity_over_many_promotions() {
    let platform = Platform::new().await;
    let deployer = platform.plugin_admin("billing").await;

    for version in ["1.0.0", "1.1.0", "1.2.0", "1.3.0"] {
        platform.release(deployer, "billing", version).await;

        let status = platform.slots.deployment_status("billing").await.unwrap();
        let active: Vec<_> = status.slots.iter().filter(|s| s.active).collect();
        assert_eq!(active.len(), 1);
        let traffic: u8 = status.slots.iter().map(|s| s.traffic_percent).sum();
        assert_eq!(traffic, 100);
    }

    let status = platform.slots.deployment_status("billing").await.unwrap();
    assert_eq!(status.active_version.unwrap().to_string(), "1.3.0");
}

#[tokio::test]
async fn test_pin_wins_over_promotion() {
    let platform = Platform::new().await;
    let deployer = platform.plugin_admin("billing").await;
    platform.release(deployer, "billing", "2.0.0").await;

    let team = Uuid::now_v7();
    let owner = Uuid::now_v7();
    platform
        .access
        .store()
        .put_membership(TeamMembership::new(team, owner, TeamRole::Owner))
        .await
        .unwrap();
    let installation = platform
        .access
        .install(owner, team, "billing")
        .await
        .unwrap();

    platform
        .access
        .pin_version(owner, installation.id, "2.0.0")
        .await
        .unwrap();
    platform.release(deployer, "billing", "2.1.0").await;

    // The pin holds the installation at 2.0.0 despite the new release
    let pinned = platform
        .access
        .resolve_effective_version(installation.id)
        .await
        .unwrap();
    assert_eq!(pinned.unwrap().to_string(), "2.0.0");

    platform
        .access
        .unpin_version(owner, installation.id)
        .await
        .unwrap();
    let tracking = platform
        .access
        .resolve_effective_version(installation.id)
        .await
        .unwrap();
    assert_eq!(tracking.unwrap().to_string(), "2.1.0");
}

#[tokio::test]
async fn test_delegation_is_scoped_by_package_prefix() {
    let platform = Platform::new().await;
    let billing_admin = platform.plugin_admin("billing").await;
    platform.plugin_admin("reports").await;

    platform
        .roles
        .upsert_role(Role::plugin_scoped(
            "reports",
            "viewer",
            PermissionSet::from_pairs(&[(Resource::Plugin, canopy_rbac::Action::Read)]),
        ))
        .await
        .unwrap();

    // A billing admin cannot grant reports roles
    let subject = Uuid::now_v7();
    let denied = platform
        .delegation
        .assign_role(billing_admin, subject, "reports:viewer")
        .await;
    assert!(denied.is_err());
    assert!(platform
        .roles
        .get_user_roles(subject)
        .await
        .unwrap()
        .is_empty());

    // But the billing admin can deploy billing
    let slot = platform
        .slots
        .deploy(billing_admin, "billing", "1.0.0", ReleaseMetadata::new("sha256:a"))
        .await;
    assert!(slot.is_ok());

    // And cannot deploy reports
    let denied = platform
        .slots
        .deploy(billing_admin, "reports", "1.0.0", ReleaseMetadata::new("sha256:a"))
        .await;
    assert!(denied.is_err());
}

#[tokio::test]
async fn test_audit_trail_is_complete() {
    let platform = Platform::new().await;
    let deployer = platform.plugin_admin("billing").await;
    platform.release(deployer, "billing", "1.0.0").await;
    platform.release(deployer, "billing", "1.1.0").await;
    platform
        .slots
        .rollback(deployer, "billing", RollbackOptions::to_previous())
        .await
        .unwrap();

    let team = Uuid::now_v7();
    let owner = Uuid::now_v7();
    platform
        .access
        .store()
        .put_membership(TeamMembership::new(team, owner, TeamRole::Owner))
        .await
        .unwrap();
    let installation = platform
        .access
        .install(owner, team, "billing")
        .await
        .unwrap();
    platform
        .access
        .uninstall(owner, installation.id)
        .await
        .unwrap();

    // One entry per successful mutation, targeting the mutated entity
    for (action, expected) in [
        ("package.deployed", 2),
        ("package.promoted", 2),
        ("package.rolled_back", 1),
        ("installation.installed", 1),
        ("installation.uninstalled", 1),
    ] {
        let page = platform
            .audit
            .query(&AuditFilter::new().with_action(action))
            .await
            .unwrap();
        assert_eq!(page.total, expected, "audit count for {action}");
    }

    let package_entries = platform
        .audit
        .query(&AuditFilter::new().with_target(TargetKind::Package, "billing"))
        .await
        .unwrap();
    assert!(package_entries
        .entries
        .iter()
        .all(|e| e.actor_id == deployer));

    let install_entries = platform
        .audit
        .query(&AuditFilter::new().with_target(
            TargetKind::Installation,
            installation.id.to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(install_entries.total, 2);
}
