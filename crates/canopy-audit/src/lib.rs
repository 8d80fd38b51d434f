//! # Canopy Audit Log
//!
//! This crate provides the append-only administrative audit log for the
//! Canopy platform, shared by every crate that mutates platform state.
//!
//! ## Overview
//!
//! The canopy-audit crate handles:
//! - **Entries**: One structured record per administrative action
//! - **Sinks**: The [`AuditSink`] trait every backend implements
//! - **Queries**: Filtered, paged reads over the recorded history
//!
//! ## Design
//!
//! The log is a pure data sink: nothing in the platform reads it to make
//! decisions. Every mutation path appends exactly one entry as its final
//! step, so the recorded history is complete for the actions it covers
//! (role grants, deployments, promotions, rollbacks, configuration
//! changes). Entries are never updated or deleted.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use canopy_audit::{AuditEntry, AuditFilter, AuditSink, MemoryAuditLog, TargetKind};
//! use uuid::Uuid;
//!
//! # async fn example() -> canopy_audit::AuditResult<()> {
//! let log = MemoryAuditLog::new();
//!
//! let actor = Uuid::now_v7();
//! let entry = AuditEntry::new("package.promoted", actor, TargetKind::Package, "billing")
//!     .with_detail("new_version", serde_json::json!("1.2.0"));
//! log.record(entry).await?;
//!
//! let page = log.query(&AuditFilter::new().with_actor(actor)).await?;
//! assert_eq!(page.total, 1);
//! # Ok(())
//! # }
//! ```

pub mod entry;
pub mod log;

// Re-export main types for convenience
pub use entry::{AuditEntry, TargetKind};
pub use log::{AuditError, AuditFilter, AuditPage, AuditResult, AuditSink, MemoryAuditLog};
