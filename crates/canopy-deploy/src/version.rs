//! Semantic-version resolution
//!
//! Pure functions over a package's published version list, plus the
//! [`VersionResolver`] facade that reads the list from a store. Nothing
//! in this module mutates state.

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{DeployError, DeployResult};
use crate::registry::PackageStore;

/// Release metadata attached to a published version.
///
/// The content digest is what conflict detection compares: two publishes
/// of the same version number with different digests are a re-published
/// tag pointing at different content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseMetadata {
    /// Digest of the released artifact (e.g., "sha256:...").
    pub content_digest: String,

    /// When the version was published.
    pub published_at: DateTime<Utc>,

    /// Optional release notes.
    pub notes: Option<String>,
}

impl ReleaseMetadata {
    /// Create metadata for a digest, published now.
    pub fn new(content_digest: impl Into<String>) -> Self {
        Self {
            content_digest: content_digest.into(),
            published_at: Utc::now(),
            notes: None,
        }
    }

    /// Attach release notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// An immutable published version of a package.
///
/// Unique on `(package_id, version)`; once created it is never mutated,
/// only appended alongside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageVersion {
    /// The owning package.
    pub package_id: String,

    /// The semantic version.
    pub version: Version,

    /// Release metadata.
    pub metadata: ReleaseMetadata,
}

impl PackageVersion {
    /// Create a new package version record.
    pub fn new(package_id: impl Into<String>, version: Version, metadata: ReleaseMetadata) -> Self {
        Self {
            package_id: package_id.into(),
            version,
            metadata,
        }
    }
}

/// A detected re-publish conflict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionConflict {
    /// The package id.
    pub package_id: String,
    /// The conflicting version.
    pub version: Version,
    /// Digest already on record.
    pub existing_digest: String,
    /// Digest of the incoming publish.
    pub incoming_digest: String,
}

/// Upgrade eligibility relative to the latest published version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeInfo {
    /// Whether a newer version exists.
    pub available: bool,
    /// The version to upgrade to, if any.
    pub recommended: Option<Version>,
    /// Whether the upgrade crosses a major version boundary.
    pub breaking: bool,
}

/// Parse a version string as strict semver.
///
/// `semver` enforces `MAJOR.MINOR.PATCH[-prerelease][+build]` including
/// rejection of leading zeros in numeric components.
///
/// # Example
///
/// ```
/// use canopy_deploy::version::validate;
///
/// assert!(validate("1.2.0").is_ok());
/// assert!(validate("1.2.0-beta.1+build5").is_ok());
/// assert!(validate("1.2").is_err());
/// assert!(validate("01.2.0").is_err());
/// ```
pub fn validate(version: &str) -> DeployResult<Version> {
    Version::parse(version).map_err(|e| DeployError::InvalidVersion {
        version: version.to_string(),
        reason: e.to_string(),
    })
}

/// Pick the latest version from a history slice.
///
/// Prereleases are excluded unless requested. The slice need not be
/// sorted.
pub fn latest_in(history: &[PackageVersion], include_prerelease: bool) -> Option<&PackageVersion> {
    history
        .iter()
        .filter(|pv| include_prerelease || pv.version.pre.is_empty())
        .max_by(|a, b| a.version.cmp(&b.version))
}

/// Compare a current version against a history slice.
pub fn upgrade_from(
    history: &[PackageVersion],
    current: &Version,
    include_prerelease: bool,
) -> UpgradeInfo {
    match latest_in(history, include_prerelease) {
        Some(newest) if newest.version > *current => UpgradeInfo {
            available: true,
            breaking: newest.version.major > current.major,
            recommended: Some(newest.version.clone()),
        },
        _ => UpgradeInfo {
            available: false,
            recommended: None,
            breaking: false,
        },
    }
}

/// Version resolver over a package store.
///
/// A thin read-only facade: every method is a pure computation over the
/// store's version list.
pub struct VersionResolver {
    store: Arc<dyn PackageStore>,
}

impl VersionResolver {
    /// Create a resolver over a store.
    pub fn new(store: Arc<dyn PackageStore>) -> Self {
        Self { store }
    }

    /// Check whether publishing `(version, digest)` would conflict with
    /// an existing record.
    ///
    /// Returns `None` when the version is new or the digests match.
    pub async fn check_conflict(
        &self,
        package_id: &str,
        version: &Version,
        content_digest: &str,
    ) -> DeployResult<Option<VersionConflict>> {
        let existing = self.store.get_version(package_id, version).await?;
        Ok(existing.and_then(|pv| {
            if pv.metadata.content_digest == content_digest {
                None
            } else {
                Some(VersionConflict {
                    package_id: package_id.to_string(),
                    version: version.clone(),
                    existing_digest: pv.metadata.content_digest,
                    incoming_digest: content_digest.to_string(),
                })
            }
        }))
    }

    /// Full version history for a package, semver-sorted ascending.
    pub async fn history(&self, package_id: &str) -> DeployResult<Vec<PackageVersion>> {
        self.store.history(package_id).await
    }

    /// Highest published version, excluding prereleases unless requested.
    pub async fn latest(
        &self,
        package_id: &str,
        include_prerelease: bool,
    ) -> DeployResult<Option<PackageVersion>> {
        let history = self.store.history(package_id).await?;
        Ok(latest_in(&history, include_prerelease).cloned())
    }

    /// Compare a current version against the latest published one.
    pub async fn check_upgrade(
        &self,
        package_id: &str,
        current: &str,
        include_prerelease: bool,
    ) -> DeployResult<UpgradeInfo> {
        let current = validate(current)?;
        let history = self.store.history(package_id).await?;
        Ok(upgrade_from(&history, &current, include_prerelease))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pv(version: &str) -> PackageVersion {
        PackageVersion::new(
            "billing",
            Version::parse(version).unwrap(),
            ReleaseMetadata::new(format!("sha256:{version}")),
        )
    }

    #[test]
    fn test_validate_strict() {
        assert!(validate("1.0.0").is_ok());
        assert!(validate("0.1.0-alpha.1").is_ok());
        assert!(validate("2.0.0+build.42").is_ok());

        assert!(matches!(
            validate("1.0"),
            Err(DeployError::InvalidVersion { .. })
        ));
        assert!(validate("v1.0.0").is_err());
        assert!(validate("1.01.0").is_err());
        assert!(validate("").is_err());
    }

    #[test]
    fn test_latest_excludes_prereleases() {
        let history = vec![pv("1.0.0"), pv("1.2.0"), pv("2.1.0-rc.1"), pv("2.0.0")];

        let stable = latest_in(&history, false).unwrap();
        assert_eq!(stable.version.to_string(), "2.0.0");

        let pre = latest_in(&history, true).unwrap();
        assert_eq!(pre.version.to_string(), "2.1.0-rc.1");
    }

    #[test]
    fn test_latest_of_empty_history() {
        assert!(latest_in(&[], false).is_none());
        assert!(latest_in(&[], true).is_none());
    }

    #[test]
    fn test_upgrade_minor() {
        let history = vec![pv("1.0.0"), pv("1.2.0")];
        let info = upgrade_from(&history, &Version::parse("1.0.0").unwrap(), false);

        assert!(info.available);
        assert_eq!(info.recommended.unwrap().to_string(), "1.2.0");
        assert!(!info.breaking);
    }

    #[test]
    fn test_upgrade_breaking_iff_major_increases() {
        let history = vec![pv("1.0.0"), pv("2.0.0")];
        let info = upgrade_from(&history, &Version::parse("1.9.3").unwrap(), false);

        assert!(info.available);
        assert!(info.breaking);
    }

    #[test]
    fn test_upgrade_none_when_current() {
        let history = vec![pv("1.0.0"), pv("2.0.0")];
        let info = upgrade_from(&history, &Version::parse("2.0.0").unwrap(), false);

        assert!(!info.available);
        assert!(info.recommended.is_none());
        assert!(!info.breaking);
    }

    #[test]
    fn test_upgrade_prerelease_gated() {
        let history = vec![pv("1.0.0"), pv("1.1.0-beta.1")];
        let current = Version::parse("1.0.0").unwrap();

        assert!(!upgrade_from(&history, &current, false).available);
        let with_pre = upgrade_from(&history, &current, true);
        assert!(with_pre.available);
        assert_eq!(with_pre.recommended.unwrap().to_string(), "1.1.0-beta.1");
    }

    #[test]
    fn test_metadata_builder() {
        let meta = ReleaseMetadata::new("sha256:abc").with_notes("fixes panics");
        assert_eq!(meta.content_digest, "sha256:abc");
        assert_eq!(meta.notes.as_deref(), Some("fixes panics"));
    }

    async fn resolver_with_versions(versions: &[&str]) -> VersionResolver {
        let store = Arc::new(crate::registry::MemoryPackageStore::new());
        for version in versions {
            store.append_version(pv(version)).await.unwrap();
        }
        VersionResolver::new(store)
    }

    #[tokio::test]
    async fn test_resolver_conflict_on_digest_mismatch() {
        let resolver = resolver_with_versions(&["1.0.0"]).await;
        let version = Version::parse("1.0.0").unwrap();

        // Same digest: re-publish of identical content, no conflict
        let same = resolver
            .check_conflict("billing", &version, "sha256:1.0.0")
            .await
            .unwrap();
        assert!(same.is_none());

        let conflict = resolver
            .check_conflict("billing", &version, "sha256:other")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conflict.version, version);
        assert_eq!(conflict.existing_digest, "sha256:1.0.0");
        assert_eq!(conflict.incoming_digest, "sha256:other");

        // An unpublished version never conflicts
        let fresh = resolver
            .check_conflict("billing", &Version::parse("9.9.9").unwrap(), "sha256:x")
            .await
            .unwrap();
        assert!(fresh.is_none());
    }

    #[tokio::test]
    async fn test_resolver_latest_and_history() {
        let resolver = resolver_with_versions(&["1.2.0", "1.0.0", "2.1.0-rc.1", "2.0.0"]).await;

        let history = resolver.history("billing").await.unwrap();
        let order: Vec<String> = history.iter().map(|pv| pv.version.to_string()).collect();
        assert_eq!(order, ["1.0.0", "1.2.0", "2.0.0", "2.1.0-rc.1"]);

        let stable = resolver.latest("billing", false).await.unwrap().unwrap();
        assert_eq!(stable.version.to_string(), "2.0.0");
        let pre = resolver.latest("billing", true).await.unwrap().unwrap();
        assert_eq!(pre.version.to_string(), "2.1.0-rc.1");
    }

    #[tokio::test]
    async fn test_resolver_check_upgrade() {
        let resolver = resolver_with_versions(&["1.0.0", "2.0.0"]).await;

        let info = resolver.check_upgrade("billing", "1.4.0", false).await.unwrap();
        assert!(info.available);
        assert!(info.breaking);
        assert_eq!(info.recommended.unwrap().to_string(), "2.0.0");

        let bad = resolver.check_upgrade("billing", "not-semver", false).await;
        assert!(matches!(bad, Err(DeployError::InvalidVersion { .. })));
    }
}
