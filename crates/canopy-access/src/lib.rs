//! # Canopy Access (Installations & Resolution)
//!
//! This crate binds teams to packages and resolves what each member may
//! see, use, and configure.
//!
//! ## Overview
//!
//! The canopy-access crate handles:
//! - **Team roles**: The member/admin/owner axis within a team
//! - **Installations**: A team's binding to a package, with shared
//!   config, an enabled flag, and an optional version pin
//! - **Member overlays**: Per-member tri-state overrides on an
//!   installation, created lazily
//! - **Resolution**: The three-layer access/config engine and the
//!   effective-version read
//! - **Service**: The gated, audited mutation surface
//!
//! ## Resolution layers
//!
//! Highest precedence last:
//!
//! ```text
//! 1. team-role defaults     visible, usable; configurable for admins
//! 2. installation.enabled   false forces can_use off
//! 3. member overlay         explicit fields win, None inherits
//! ```
//!
//! Config merging is shallow: the member's personal keys fully replace
//! shared values per key. The effective version is the pin when set,
//! otherwise the package's active deployment slot.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use canopy_access::{AccessOverrides, TeamRole};
//!
//! let overrides = AccessOverrides::new()
//!     .with_can_use(false)
//!     .with_visible(false);
//! assert!(TeamRole::Admin.is_admin());
//! # let _ = overrides;
//! ```

pub mod error;
pub mod installation;
pub mod resolve;
pub mod service;
pub mod store;
pub mod teams;

// Re-export main types for convenience
pub use error::{AccessError, AccessResult};
pub use installation::{AccessOverrides, ConfigMap, Installation, MemberAccess};
pub use resolve::{merge_config, resolve_access, ResolvedAccess};
pub use service::AccessService;
pub use store::{AccessStore, MemoryAccessStore};
pub use teams::{TeamMembership, TeamRole};
