//! Team roles and memberships
//!
//! The team-role axis is distinct from plugin RBAC: a team role decides
//! what a member may do with the team's installations, while plugin
//! roles decide what a user may do to the plugin itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A member's role within a team.
///
/// Ordered by authority: `Member < Admin < Owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    /// Regular member.
    Member,
    /// Team administrator.
    Admin,
    /// Team owner.
    Owner,
}

impl TeamRole {
    /// String representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Member => "member",
            TeamRole::Admin => "admin",
            TeamRole::Owner => "owner",
        }
    }

    /// Parse a role from its string representation.
    pub fn parse(s: &str) -> Option<TeamRole> {
        match s {
            "member" => Some(TeamRole::Member),
            "admin" => Some(TeamRole::Admin),
            "owner" => Some(TeamRole::Owner),
            _ => None,
        }
    }

    /// All roles, lowest authority first.
    pub fn all() -> Vec<TeamRole> {
        vec![TeamRole::Member, TeamRole::Admin, TeamRole::Owner]
    }

    /// Whether this role carries team administration rights.
    pub fn is_admin(&self) -> bool {
        matches!(self, TeamRole::Admin | TeamRole::Owner)
    }
}

/// A user's membership in a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMembership {
    /// The team.
    pub team_id: Uuid,

    /// The member.
    pub member_id: Uuid,

    /// The member's role in this team.
    pub role: TeamRole,

    /// When the membership was created.
    pub joined_at: DateTime<Utc>,
}

impl TeamMembership {
    /// Create a membership, joined now.
    pub fn new(team_id: Uuid, member_id: Uuid, role: TeamRole) -> Self {
        Self {
            team_id,
            member_id,
            role,
            joined_at: Utc::now(),
        }
    }
}
