//! Audit sink trait and in-memory implementation
//!
//! This module provides the [`AuditSink`] abstraction every log backend
//! implements, plus the in-memory backend used by single-process
//! deployments and tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::entry::{AuditEntry, TargetKind};

/// Audit log error types.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Underlying storage failed; propagated unchanged, never retried here.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;

/// Filter for querying the audit log.
///
/// All criteria are optional and combined with AND. Paging is
/// offset/limit over the matching entries in append order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Only entries by this actor
    pub actor_id: Option<Uuid>,

    /// Only entries with this exact action
    pub action: Option<String>,

    /// Only entries targeting this kind of entity
    pub target_kind: Option<TargetKind>,

    /// Only entries targeting this entity
    pub target_id: Option<String>,

    /// Only entries at or after this instant
    pub since: Option<DateTime<Utc>>,

    /// Only entries at or before this instant
    pub until: Option<DateTime<Utc>>,

    /// Number of matching entries to skip
    #[serde(default)]
    pub offset: usize,

    /// Maximum number of entries to return (None = unbounded)
    pub limit: Option<usize>,
}

impl AuditFilter {
    /// Create an empty filter matching every entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a single actor.
    pub fn with_actor(mut self, actor_id: Uuid) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    /// Restrict to a single action.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Restrict to a target kind.
    pub fn with_target_kind(mut self, kind: TargetKind) -> Self {
        self.target_kind = Some(kind);
        self
    }

    /// Restrict to a single target entity.
    pub fn with_target(mut self, kind: TargetKind, target_id: impl Into<String>) -> Self {
        self.target_kind = Some(kind);
        self.target_id = Some(target_id.into());
        self
    }

    /// Restrict to entries at or after `since`.
    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Restrict to entries at or before `until`.
    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// Set the page window.
    pub fn with_page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    /// Check whether an entry satisfies every set criterion.
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(actor) = self.actor_id {
            if entry.actor_id != actor {
                return false;
            }
        }
        if let Some(ref action) = self.action {
            if &entry.action != action {
                return false;
            }
        }
        if let Some(kind) = self.target_kind {
            if entry.target_kind != kind {
                return false;
            }
        }
        if let Some(ref target) = self.target_id {
            if &entry.target_id != target {
                return false;
            }
        }
        if let Some(since) = self.since {
            if entry.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if entry.timestamp > until {
                return false;
            }
        }
        true
    }
}

/// One page of query results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditPage {
    /// Matching entries within the page window, in append order
    pub entries: Vec<AuditEntry>,

    /// Total number of matching entries across all pages
    pub total: usize,

    /// Offset this page started at
    pub offset: usize,
}

/// Audit sink trait for append and query operations.
///
/// Implementations must be append-only: `record` never overwrites and
/// nothing removes entries.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one entry.
    async fn record(&self, entry: AuditEntry) -> AuditResult<()>;

    /// Query recorded entries.
    async fn query(&self, filter: &AuditFilter) -> AuditResult<AuditPage>;

    /// Total number of recorded entries.
    async fn count(&self) -> AuditResult<usize>;
}

/// In-memory audit log.
///
/// Suitable for single-process deployments and testing. Durable backends
/// implement [`AuditSink`] against their own storage.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl MemoryAuditLog {
    /// Create a new empty log.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditLog {
    async fn record(&self, entry: AuditEntry) -> AuditResult<()> {
        tracing::debug!(
            action = %entry.action,
            actor = %entry.actor_id,
            target_kind = entry.target_kind.as_str(),
            target = %entry.target_id,
            "Audit entry recorded"
        );

        let mut entries = self.entries.write().await;
        entries.push(entry);
        Ok(())
    }

    async fn query(&self, filter: &AuditFilter) -> AuditResult<AuditPage> {
        let entries = self.entries.read().await;

        let matching: Vec<&AuditEntry> = entries.iter().filter(|e| filter.matches(e)).collect();
        let total = matching.len();

        let page: Vec<AuditEntry> = matching
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(AuditPage {
            entries: page,
            total,
            offset: filter.offset,
        })
    }

    async fn count(&self) -> AuditResult<usize> {
        Ok(self.entries.read().await.len())
    }
}
