//! Delegated administration
//!
//! The delegation service answers "may actor X grant role Y" and wraps
//! role assignment/revocation with that check plus an audit record.
//! System admins may delegate any role; plugin admins only roles under
//! their own package prefix.

use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use canopy_audit::{AuditEntry, AuditSink, TargetKind};

use crate::actions::Action;
use crate::error::{RbacError, RbacResult};
use crate::resources::Resource;
use crate::roles::{Role, RoleAssignment, RoleScope};
use crate::store::RoleStore;

/// Delegation service over a role store.
///
/// All mutations here check `Forbidden` before touching the store and
/// append exactly one audit entry after a successful write.
pub struct DelegationService {
    store: Arc<dyn RoleStore>,
    audit: Arc<dyn AuditSink>,
}

impl DelegationService {
    /// Create a new delegation service.
    pub fn new(store: Arc<dyn RoleStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    /// The underlying role store.
    pub fn store(&self) -> &Arc<dyn RoleStore> {
        &self.store
    }

    /// Check whether a user is a system administrator.
    ///
    /// True iff the user holds any role granting `(Platform, Admin)`.
    pub async fn is_system_admin(&self, user_id: Uuid) -> RbacResult<bool> {
        self.store
            .has_permission(user_id, Resource::Platform, Action::Admin, None)
            .await
    }

    /// Check whether a user administers one plugin package.
    ///
    /// True iff the user holds the `"<package>:admin"` role or is a
    /// system administrator.
    pub async fn is_plugin_admin(&self, user_id: Uuid, package_id: &str) -> RbacResult<bool> {
        let admin_role = format!("{package_id}:admin");
        let holds_role = self
            .store
            .get_user_roles(user_id)
            .await?
            .iter()
            .any(|role| role.name == admin_role);
        if holds_role {
            return Ok(true);
        }
        self.is_system_admin(user_id).await
    }

    /// The role names a user may grant to others.
    ///
    /// System admins may assign any role; plugin admins only roles scoped
    /// to a package they administer.
    pub async fn assignable_roles(&self, user_id: Uuid) -> RbacResult<Vec<String>> {
        let roles = self.store.get_roles().await?;

        if self.is_system_admin(user_id).await? {
            return Ok(roles.into_iter().map(|r| r.name).collect());
        }

        let mut assignable = Vec::new();
        for role in roles {
            if let Some(package) = role.package_id() {
                if self.is_plugin_admin(user_id, package).await? {
                    assignable.push(role.name);
                }
            }
        }
        Ok(assignable)
    }

    /// Check whether `actor` may delegate (assign or revoke) `role`.
    async fn can_delegate(&self, actor: Uuid, role: &Role) -> RbacResult<bool> {
        if self.is_system_admin(actor).await? {
            return Ok(true);
        }
        match role.scope {
            // Only system admins touch system-scoped roles
            RoleScope::System => Ok(false),
            RoleScope::Plugin => match role.package_id() {
                Some(package) => self.is_plugin_admin(actor, package).await,
                None => Ok(false),
            },
        }
    }

    /// Resolve a role and enforce the delegation check, in that order.
    ///
    /// The `Forbidden` check runs before any mutation or audit write.
    async fn authorize(&self, actor: Uuid, role_name: &str) -> RbacResult<Role> {
        let role = self
            .store
            .get_role(role_name)
            .await?
            .ok_or_else(|| RbacError::UnknownRole {
                role: role_name.to_string(),
            })?;

        if !self.can_delegate(actor, &role).await? {
            return Err(RbacError::Forbidden {
                actor,
                role: role_name.to_string(),
            });
        }
        Ok(role)
    }

    /// Assign a role to a subject, with delegation check and audit.
    #[instrument(skip(self))]
    pub async fn assign_role(
        &self,
        actor: Uuid,
        subject: Uuid,
        role_name: &str,
    ) -> RbacResult<()> {
        let role = self.authorize(actor, role_name).await?;

        self.store
            .assign_role(RoleAssignment::new(subject, &role.name).with_assigner(actor))
            .await?;

        tracing::info!(actor = %actor, subject = %subject, role = %role.name, "Role assigned");

        self.audit
            .record(
                AuditEntry::new("role.assigned", actor, TargetKind::Role, &role.name)
                    .with_detail("subject", serde_json::json!(subject)),
            )
            .await?;
        Ok(())
    }

    /// Revoke a role from a subject, with delegation check and audit.
    #[instrument(skip(self))]
    pub async fn revoke_role(
        &self,
        actor: Uuid,
        subject: Uuid,
        role_name: &str,
    ) -> RbacResult<()> {
        let role = self.authorize(actor, role_name).await?;

        self.store.revoke_role(subject, &role.name).await?;

        tracing::info!(actor = %actor, subject = %subject, role = %role.name, "Role revoked");

        self.audit
            .record(
                AuditEntry::new("role.revoked", actor, TargetKind::Role, &role.name)
                    .with_detail("subject", serde_json::json!(subject)),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::PermissionSet;
    use crate::store::MemoryRoleStore;
    use canopy_audit::{AuditFilter, MemoryAuditLog};

    struct Fixture {
        delegation: DelegationService,
        store: Arc<MemoryRoleStore>,
        audit: Arc<MemoryAuditLog>,
        root: Uuid,
        billing_admin: Uuid,
    }

    /// Seed roles and two admins: a system admin and a billing admin.
    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryRoleStore::new());
        let audit = Arc::new(MemoryAuditLog::new());

        store.upsert_role(Role::system_admin()).await.unwrap();
        store.upsert_role(Role::plugin_admin("billing")).await.unwrap();
        store.upsert_role(Role::plugin_admin("reports")).await.unwrap();
        store
            .upsert_role(Role::plugin_scoped(
                "billing",
                "viewer",
                PermissionSet::from_pairs(&[(Resource::Plugin, Action::Read)]),
            ))
            .await
            .unwrap();

        let root = Uuid::now_v7();
        let billing_admin = Uuid::now_v7();
        store
            .assign_role(RoleAssignment::new(root, "platform-admin"))
            .await
            .unwrap();
        store
            .assign_role(RoleAssignment::new(billing_admin, "billing:admin"))
            .await
            .unwrap();

        Fixture {
            delegation: DelegationService::new(store.clone(), audit.clone()),
            store,
            audit,
            root,
            billing_admin,
        }
    }

    #[tokio::test]
    async fn test_admin_checks() {
        let f = fixture().await;

        assert!(f.delegation.is_system_admin(f.root).await.unwrap());
        assert!(!f.delegation.is_system_admin(f.billing_admin).await.unwrap());

        // Plugin admin of billing only; system admin of everything
        assert!(f
            .delegation
            .is_plugin_admin(f.billing_admin, "billing")
            .await
            .unwrap());
        assert!(!f
            .delegation
            .is_plugin_admin(f.billing_admin, "reports")
            .await
            .unwrap());
        assert!(f.delegation.is_plugin_admin(f.root, "reports").await.unwrap());
    }

    #[tokio::test]
    async fn test_plugin_admin_cannot_cross_prefix() {
        let f = fixture().await;
        let target = Uuid::now_v7();

        let result = f
            .delegation
            .assign_role(f.billing_admin, target, "reports:admin")
            .await;
        assert!(matches!(result, Err(RbacError::Forbidden { .. })));

        // Denied request mutates nothing and audits nothing
        assert!(f.store.get_user_roles(target).await.unwrap().is_empty());
        assert_eq!(f.audit.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_plugin_admin_assigns_own_prefix() {
        let f = fixture().await;
        let target = Uuid::now_v7();

        f.delegation
            .assign_role(f.billing_admin, target, "billing:viewer")
            .await
            .unwrap();

        let roles = f.store.get_user_roles(target).await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name, "billing:viewer");

        let page = f
            .audit
            .query(&AuditFilter::new().with_action("role.assigned"))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.entries[0].target_id, "billing:viewer");
    }

    #[tokio::test]
    async fn test_plugin_admin_cannot_touch_system_roles() {
        let f = fixture().await;
        let target = Uuid::now_v7();

        let result = f
            .delegation
            .assign_role(f.billing_admin, target, "platform-admin")
            .await;
        assert!(matches!(result, Err(RbacError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_revoke_with_audit() {
        let f = fixture().await;
        let target = Uuid::now_v7();

        f.delegation
            .assign_role(f.root, target, "billing:viewer")
            .await
            .unwrap();
        f.delegation
            .revoke_role(f.root, target, "billing:viewer")
            .await
            .unwrap();

        assert!(f.store.get_user_roles(target).await.unwrap().is_empty());
        assert_eq!(f.audit.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_assignable_roles() {
        let f = fixture().await;

        let mut for_root = f.delegation.assignable_roles(f.root).await.unwrap();
        for_root.sort();
        assert_eq!(
            for_root,
            vec!["billing:admin", "billing:viewer", "platform-admin", "reports:admin"]
        );

        let mut for_billing = f
            .delegation
            .assignable_roles(f.billing_admin)
            .await
            .unwrap();
        for_billing.sort();
        assert_eq!(for_billing, vec!["billing:admin", "billing:viewer"]);
    }
}
