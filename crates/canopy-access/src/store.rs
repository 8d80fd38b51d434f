//! Access store trait and in-memory implementation

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AccessResult;
use crate::installation::{Installation, MemberAccess};
use crate::teams::TeamMembership;

/// Storage seam for teams, installations, and member overlays.
#[async_trait]
pub trait AccessStore: Send + Sync {
    /// Create or replace a team membership.
    async fn put_membership(&self, membership: TeamMembership) -> AccessResult<()>;

    /// Look up one member's membership in a team.
    async fn get_membership(
        &self,
        team_id: Uuid,
        member_id: Uuid,
    ) -> AccessResult<Option<TeamMembership>>;

    /// Create or replace an installation.
    async fn put_installation(&self, installation: Installation) -> AccessResult<()>;

    /// Look up an installation by id.
    async fn get_installation(&self, id: Uuid) -> AccessResult<Option<Installation>>;

    /// Look up a team's installation of a package.
    async fn find_installation(
        &self,
        team_id: Uuid,
        package_id: &str,
    ) -> AccessResult<Option<Installation>>;

    /// Installations owned by a team.
    async fn get_team_installations(&self, team_id: Uuid) -> AccessResult<Vec<Installation>>;

    /// Hard-delete an installation and every overlay row under it.
    async fn delete_installation(&self, id: Uuid) -> AccessResult<()>;

    /// Create or replace a member overlay row.
    async fn put_member_access(&self, row: MemberAccess) -> AccessResult<()>;

    /// Look up a member's overlay row on an installation.
    async fn get_member_access(
        &self,
        installation_id: Uuid,
        member_id: Uuid,
    ) -> AccessResult<Option<MemberAccess>>;
}

/// In-memory access store.
///
/// Suitable for single-process deployments and testing.
#[derive(Debug, Default)]
pub struct MemoryAccessStore {
    memberships: Arc<RwLock<HashMap<(Uuid, Uuid), TeamMembership>>>,
    installations: Arc<RwLock<HashMap<Uuid, Installation>>>,
    overlays: Arc<RwLock<HashMap<(Uuid, Uuid), MemberAccess>>>,
}

impl MemoryAccessStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccessStore for MemoryAccessStore {
    async fn put_membership(&self, membership: TeamMembership) -> AccessResult<()> {
        let mut memberships = self.memberships.write().await;
        memberships.insert((membership.team_id, membership.member_id), membership);
        Ok(())
    }

    async fn get_membership(
        &self,
        team_id: Uuid,
        member_id: Uuid,
    ) -> AccessResult<Option<TeamMembership>> {
        let memberships = self.memberships.read().await;
        Ok(memberships.get(&(team_id, member_id)).cloned())
    }

    async fn put_installation(&self, installation: Installation) -> AccessResult<()> {
        let mut installations = self.installations.write().await;
        installations.insert(installation.id, installation);
        Ok(())
    }

    async fn get_installation(&self, id: Uuid) -> AccessResult<Option<Installation>> {
        let installations = self.installations.read().await;
        Ok(installations.get(&id).cloned())
    }

    async fn find_installation(
        &self,
        team_id: Uuid,
        package_id: &str,
    ) -> AccessResult<Option<Installation>> {
        let installations = self.installations.read().await;
        Ok(installations
            .values()
            .find(|i| i.team_id == team_id && i.package_id == package_id)
            .cloned())
    }

    async fn get_team_installations(&self, team_id: Uuid) -> AccessResult<Vec<Installation>> {
        let installations = self.installations.read().await;
        let mut found: Vec<Installation> = installations
            .values()
            .filter(|i| i.team_id == team_id)
            .cloned()
            .collect();
        found.sort_by_key(|i| i.installed_at);
        Ok(found)
    }

    async fn delete_installation(&self, id: Uuid) -> AccessResult<()> {
        let mut installations = self.installations.write().await;
        installations.remove(&id);
        drop(installations);

        // Overlay rows have no meaning without their installation
        let mut overlays = self.overlays.write().await;
        overlays.retain(|(installation_id, _), _| *installation_id != id);
        Ok(())
    }

    async fn put_member_access(&self, row: MemberAccess) -> AccessResult<()> {
        let mut overlays = self.overlays.write().await;
        overlays.insert((row.installation_id, row.member_id), row);
        Ok(())
    }

    async fn get_member_access(
        &self,
        installation_id: Uuid,
        member_id: Uuid,
    ) -> AccessResult<Option<MemberAccess>> {
        let overlays = self.overlays.read().await;
        Ok(overlays.get(&(installation_id, member_id)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::teams::TeamRole;

    #[tokio::test]
    async fn test_find_installation_by_team_and_package() {
        let store = MemoryAccessStore::new();
        let team = Uuid::now_v7();
        let actor = Uuid::now_v7();

        store
            .put_installation(Installation::new(team, "billing", actor))
            .await
            .unwrap();
        store
            .put_installation(Installation::new(team, "reports", actor))
            .await
            .unwrap();

        let found = store.find_installation(team, "billing").await.unwrap();
        assert_eq!(found.unwrap().package_id, "billing");
        let other_team = store
            .find_installation(Uuid::now_v7(), "billing")
            .await
            .unwrap();
        assert!(other_team.is_none());
    }

    #[tokio::test]
    async fn test_delete_installation_drops_overlays() {
        let store = MemoryAccessStore::new();
        let team = Uuid::now_v7();
        let member = Uuid::now_v7();
        let installation = Installation::new(team, "billing", member);
        let id = installation.id;

        store.put_installation(installation).await.unwrap();
        store
            .put_member_access(MemberAccess::inheriting(id, member))
            .await
            .unwrap();

        store.delete_installation(id).await.unwrap();

        assert!(store.get_installation(id).await.unwrap().is_none());
        assert!(store
            .get_member_access(id, member)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_membership_upsert_replaces_role() {
        let store = MemoryAccessStore::new();
        let team = Uuid::now_v7();
        let member = Uuid::now_v7();

        store
            .put_membership(TeamMembership::new(team, member, TeamRole::Member))
            .await
            .unwrap();
        store
            .put_membership(TeamMembership::new(team, member, TeamRole::Admin))
            .await
            .unwrap();

        let membership = store.get_membership(team, member).await.unwrap().unwrap();
        assert_eq!(membership.role, TeamRole::Admin);
    }
}
