//! Audit entry types
//!
//! This module defines the structured record appended for every
//! administrative action on the platform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of entity an audit entry refers to.
///
/// Together with [`AuditEntry::target_id`] this identifies the mutated
/// entity by its natural key (package id, role name, installation id, ...).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A plugin package and its deployment slots
    Package,
    /// A role definition or assignment
    Role,
    /// A team's installation of a package
    Installation,
    /// A member-level access overlay on an installation
    MemberAccess,
}

impl TargetKind {
    /// Get string representation of the target kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::Role => "role",
            Self::Installation => "installation",
            Self::MemberAccess => "member_access",
        }
    }
}

/// One recorded administrative action.
///
/// Entries are append-only: once recorded they are never mutated or
/// removed. The `details` payload is free-form JSON supplied by the
/// mutation path (previous/new versions, the affected subject, a rollback
/// reason, and so on).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry ID
    pub id: Uuid,

    /// Action identifier (e.g., "package.promoted", "role.assigned")
    pub action: String,

    /// User who performed the action
    pub actor_id: Uuid,

    /// Kind of entity the action targeted
    pub target_kind: TargetKind,

    /// Natural key of the targeted entity
    pub target_id: String,

    /// Structured detail payload
    #[serde(default)]
    pub details: serde_json::Value,

    /// When the action occurred
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Create a new entry with an empty detail payload.
    ///
    /// # Arguments
    ///
    /// * `action` - Action identifier string
    /// * `actor_id` - The acting user
    /// * `target_kind` - Kind of the targeted entity
    /// * `target_id` - Natural key of the targeted entity
    pub fn new(
        action: impl Into<String>,
        actor_id: Uuid,
        target_kind: TargetKind,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            action: action.into(),
            actor_id,
            target_kind,
            target_id: target_id.into(),
            details: serde_json::Value::Null,
            timestamp: Utc::now(),
        }
    }

    /// Replace the whole detail payload.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Add a single key to the detail payload.
    ///
    /// A null payload is promoted to an object first; a non-object payload
    /// is replaced by an object holding only this key.
    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        if !self.details.is_object() {
            self.details = serde_json::Value::Object(serde_json::Map::new());
        }
        if let Some(map) = self.details.as_object_mut() {
            map.insert(key.into(), value);
        }
        self
    }
}
