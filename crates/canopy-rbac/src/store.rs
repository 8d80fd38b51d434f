//! Role store trait and in-memory implementation
//!
//! The store owns role definitions and user→role assignments. The
//! `(user_id, role_name)` uniqueness constraint lives here: a duplicate
//! assignment is a silent no-op, and the single write lock in the memory
//! backend makes the check-then-insert race-free.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::actions::Action;
use crate::error::{RbacError, RbacResult};
use crate::resources::Resource;
use crate::roles::{Role, RoleAssignment};

/// Store for role definitions and assignments.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Create or replace a role definition.
    ///
    /// Fails with `InvalidRoleName` if the name violates the scope's
    /// naming invariant.
    async fn upsert_role(&self, role: Role) -> RbacResult<()>;

    /// Delete a role definition.
    ///
    /// Fails with `RoleInUse` while any assignment references it;
    /// deleting an absent role is a no-op.
    async fn delete_role(&self, name: &str) -> RbacResult<()>;

    /// Look up one role by name.
    async fn get_role(&self, name: &str) -> RbacResult<Option<Role>>;

    /// All role definitions.
    async fn get_roles(&self) -> RbacResult<Vec<Role>>;

    /// Bind a user to a role.
    ///
    /// Fails with `UnknownRole` if the role does not exist; assigning an
    /// already-held role succeeds silently.
    async fn assign_role(&self, assignment: RoleAssignment) -> RbacResult<()>;

    /// Remove a user's role binding. Revoking an absent binding is a
    /// no-op.
    async fn revoke_role(&self, user_id: Uuid, role_name: &str) -> RbacResult<()>;

    /// All roles assigned to a user.
    async fn get_user_roles(&self, user_id: Uuid) -> RbacResult<Vec<Role>>;

    /// Check a permission as the union over the user's assigned roles.
    ///
    /// An unqualified check is the plain permission union. A
    /// `scope`-qualified check additionally requires the granting
    /// role's scope to match the package (system roles satisfy any
    /// package scope).
    async fn has_permission(
        &self,
        user_id: Uuid,
        resource: Resource,
        action: Action,
        scope: Option<&str>,
    ) -> RbacResult<bool> {
        let roles = self.get_user_roles(user_id).await?;
        Ok(roles
            .iter()
            .any(|role| role.grants(resource, action) && role.satisfies_scope(scope)))
    }
}

/// In-memory role store.
///
/// Suitable for single-process deployments and testing.
#[derive(Debug, Default)]
pub struct MemoryRoleStore {
    roles: Arc<RwLock<HashMap<String, Role>>>,
    assignments: Arc<RwLock<Vec<RoleAssignment>>>,
}

impl MemoryRoleStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn upsert_role(&self, role: Role) -> RbacResult<()> {
        role.validate()?;
        let mut roles = self.roles.write().await;
        tracing::debug!(role = %role.name, scope = role.scope.as_str(), "Role upserted");
        roles.insert(role.name.clone(), role);
        Ok(())
    }

    async fn delete_role(&self, name: &str) -> RbacResult<()> {
        // Assignment lock held across the in-use check
        let assignments = self.assignments.read().await;
        let in_use = assignments.iter().filter(|a| a.role_name == name).count();
        if in_use > 0 {
            return Err(RbacError::RoleInUse {
                role: name.to_string(),
                assignments: in_use,
            });
        }

        let mut roles = self.roles.write().await;
        roles.remove(name);
        Ok(())
    }

    async fn get_role(&self, name: &str) -> RbacResult<Option<Role>> {
        Ok(self.roles.read().await.get(name).cloned())
    }

    async fn get_roles(&self) -> RbacResult<Vec<Role>> {
        Ok(self.roles.read().await.values().cloned().collect())
    }

    async fn assign_role(&self, assignment: RoleAssignment) -> RbacResult<()> {
        if self.get_role(&assignment.role_name).await?.is_none() {
            return Err(RbacError::UnknownRole {
                role: assignment.role_name,
            });
        }

        let mut assignments = self.assignments.write().await;
        let exists = assignments
            .iter()
            .any(|a| a.user_id == assignment.user_id && a.role_name == assignment.role_name);
        if !exists {
            assignments.push(assignment);
        }
        Ok(())
    }

    async fn revoke_role(&self, user_id: Uuid, role_name: &str) -> RbacResult<()> {
        let mut assignments = self.assignments.write().await;
        assignments.retain(|a| !(a.user_id == user_id && a.role_name == role_name));
        Ok(())
    }

    async fn get_user_roles(&self, user_id: Uuid) -> RbacResult<Vec<Role>> {
        let assignments = self.assignments.read().await;
        let roles = self.roles.read().await;
        Ok(assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter_map(|a| roles.get(&a.role_name).cloned())
            .collect())
    }
}
