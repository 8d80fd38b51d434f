//! Deployment slot state
//!
//! Each package owns exactly two slots, labeled A and B, used for
//! blue/green rollout. Slots are created empty on first deploy, never
//! deleted, and perpetually retargeted to new versions.

use semver::Version;
use serde::{Deserialize, Serialize};

/// Label of one of the two deployment slots.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SlotLabel {
    /// Slot A.
    A,
    /// Slot B.
    B,
}

impl SlotLabel {
    /// The sibling slot.
    pub fn other(&self) -> SlotLabel {
        match self {
            SlotLabel::A => SlotLabel::B,
            SlotLabel::B => SlotLabel::A,
        }
    }

    /// Get the string representation of the label.
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotLabel::A => "a",
            SlotLabel::B => "b",
        }
    }
}

impl std::fmt::Display for SlotLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health of a deployed slot, fed by external probes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// No probe result yet.
    Unknown,
    /// Probes pass; eligible for promotion.
    Healthy,
    /// Probes fail; promotion is refused.
    Unhealthy,
}

/// One deployment slot of a package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentSlot {
    /// Slot label.
    pub label: SlotLabel,

    /// The targeted version; `None` for an empty slot.
    pub version: Option<Version>,

    /// Probe-reported health.
    pub health: HealthStatus,

    /// Share of traffic served, 0-100.
    pub traffic_percent: u8,

    /// Whether this slot currently serves all traffic.
    pub active: bool,
}

impl DeploymentSlot {
    /// Create an empty slot.
    pub fn empty(label: SlotLabel) -> Self {
        Self {
            label,
            version: None,
            health: HealthStatus::Unknown,
            traffic_percent: 0,
            active: false,
        }
    }

    /// Retarget this slot to a freshly deployed version.
    ///
    /// Health resets to unknown and traffic to zero; activation only
    /// ever happens through [`SlotPair::activate`].
    pub fn target(&mut self, version: Version) {
        self.version = Some(version);
        self.health = HealthStatus::Unknown;
        self.traffic_percent = 0;
        self.active = false;
    }
}

/// A reference to one package slot holding a version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRef {
    /// The package id.
    pub package_id: String,
    /// The slot label.
    pub slot: SlotLabel,
    /// The version the slot holds.
    pub version: Version,
}

/// The two slots of one package.
///
/// Invariants preserved by this type:
/// - at most one slot is active;
/// - traffic percentages sum to 100 once any promotion has happened
///   (both zero only during initial bootstrap).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotPair {
    /// The owning package.
    pub package_id: String,

    /// Slot A.
    pub slot_a: DeploymentSlot,

    /// Slot B.
    pub slot_b: DeploymentSlot,
}

impl SlotPair {
    /// Create an empty pair for a package's first deployment.
    pub fn new(package_id: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            slot_a: DeploymentSlot::empty(SlotLabel::A),
            slot_b: DeploymentSlot::empty(SlotLabel::B),
        }
    }

    /// Borrow a slot by label.
    pub fn slot(&self, label: SlotLabel) -> &DeploymentSlot {
        match label {
            SlotLabel::A => &self.slot_a,
            SlotLabel::B => &self.slot_b,
        }
    }

    /// Mutably borrow a slot by label.
    pub fn slot_mut(&mut self, label: SlotLabel) -> &mut DeploymentSlot {
        match label {
            SlotLabel::A => &mut self.slot_a,
            SlotLabel::B => &mut self.slot_b,
        }
    }

    /// The currently active slot, if any deployment has been promoted.
    pub fn active(&self) -> Option<&DeploymentSlot> {
        [&self.slot_a, &self.slot_b].into_iter().find(|s| s.active)
    }

    /// The version currently serving traffic.
    pub fn active_version(&self) -> Option<&Version> {
        self.active().and_then(|s| s.version.as_ref())
    }

    /// The slot a new deployment should target: the inactive one, or
    /// slot A while nothing is active.
    pub fn deploy_target(&self) -> SlotLabel {
        match self.active() {
            Some(active) => active.label.other(),
            None => SlotLabel::A,
        }
    }

    /// Find the slot holding a version, if either does.
    pub fn holding(&self, version: &Version) -> Option<SlotLabel> {
        [&self.slot_a, &self.slot_b]
            .into_iter()
            .find(|s| s.version.as_ref() == Some(version))
            .map(|s| s.label)
    }

    /// Flip traffic to `label`: it becomes active at 100%, the sibling
    /// drops to 0% and inactive.
    pub fn activate(&mut self, label: SlotLabel) {
        let sibling = label.other();
        {
            let target = self.slot_mut(label);
            target.active = true;
            target.traffic_percent = 100;
        }
        let displaced = self.slot_mut(sibling);
        displaced.active = false;
        displaced.traffic_percent = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_empty_pair() {
        let pair = SlotPair::new("billing");
        assert!(pair.active().is_none());
        assert_eq!(pair.deploy_target(), SlotLabel::A);
        assert_eq!(pair.slot_a.traffic_percent, 0);
        assert_eq!(pair.slot_b.traffic_percent, 0);
    }

    #[test]
    fn test_target_resets_slot() {
        let mut pair = SlotPair::new("billing");
        pair.slot_mut(SlotLabel::A).target(v("1.0.0"));

        let slot = pair.slot(SlotLabel::A);
        assert_eq!(slot.version, Some(v("1.0.0")));
        assert_eq!(slot.health, HealthStatus::Unknown);
        assert_eq!(slot.traffic_percent, 0);
        assert!(!slot.active);
    }

    #[test]
    fn test_activate_flips_exclusively() {
        let mut pair = SlotPair::new("billing");
        pair.slot_mut(SlotLabel::A).target(v("1.0.0"));
        pair.activate(SlotLabel::A);

        assert!(pair.slot_a.active);
        assert_eq!(pair.slot_a.traffic_percent, 100);
        assert!(!pair.slot_b.active);
        assert_eq!(pair.slot_b.traffic_percent, 0);

        pair.slot_mut(SlotLabel::B).target(v("1.1.0"));
        pair.activate(SlotLabel::B);

        assert!(!pair.slot_a.active);
        assert_eq!(pair.slot_a.traffic_percent, 0);
        assert!(pair.slot_b.active);
        assert_eq!(pair.slot_b.traffic_percent, 100);

        // Traffic always sums to 100 after first activation
        assert_eq!(pair.slot_a.traffic_percent + pair.slot_b.traffic_percent, 100);
    }

    #[test]
    fn test_deploy_target_is_inactive_sibling() {
        let mut pair = SlotPair::new("billing");
        pair.slot_mut(SlotLabel::A).target(v("1.0.0"));
        pair.activate(SlotLabel::A);

        assert_eq!(pair.deploy_target(), SlotLabel::B);
    }

    #[test]
    fn test_holding() {
        let mut pair = SlotPair::new("billing");
        pair.slot_mut(SlotLabel::B).target(v("1.1.0"));

        assert_eq!(pair.holding(&v("1.1.0")), Some(SlotLabel::B));
        assert_eq!(pair.holding(&v("9.9.9")), None);
    }

    #[test]
    fn test_active_version() {
        let mut pair = SlotPair::new("billing");
        assert!(pair.active_version().is_none());

        pair.slot_mut(SlotLabel::A).target(v("2.0.0"));
        pair.activate(SlotLabel::A);
        assert_eq!(pair.active_version(), Some(&v("2.0.0")));
    }
}
