//! Core types shared by every engine backend.

use serde::{Deserialize, Serialize};

use crate::evr::Evr;

/// A package build as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Package name (e.g., "bash")
    pub name: String,
    /// Epoch-version-release as the engine prints it (e.g., "5.2.26-3.fc40")
    pub evr: String,
    /// Architecture the package was built for (e.g., "x86_64", "noarch")
    pub arch: String,
}

impl PackageRecord {
    /// Create a new record.
    pub fn new(name: impl Into<String>, evr: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            evr: evr.into(),
            arch: arch.into(),
        }
    }

    /// Parsed EVR for ordering.
    pub fn parsed_evr(&self) -> Evr {
        Evr::parse(&self.evr)
    }

    /// Full `name-evr.arch` identifier.
    pub fn nevra(&self) -> String {
        format!("{}-{}.{}", self.name, self.evr, self.arch)
    }
}

impl std::fmt::Display for PackageRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.nevra())
    }
}

/// Kind of request submitted to the engine's pending goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalAction {
    /// Install the best match for a spec
    Install,
    /// Erase the installed package matching a spec
    Remove,
    /// Upgrade an installed package to the best newer match for a spec
    Upgrade,
}

impl GoalAction {
    /// The verb the engine uses for this action.
    pub fn verb(&self) -> &'static str {
        match self {
            GoalAction::Install => "install",
            GoalAction::Remove => "remove",
            GoalAction::Upgrade => "upgrade",
        }
    }
}

impl std::fmt::Display for GoalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.verb())
    }
}

/// A single entry of the engine's pending goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalEntry {
    pub action: GoalAction,
    /// Package spec: a name, or `name-version[-release]`
    pub spec: String,
}

impl GoalEntry {
    pub fn new(action: GoalAction, spec: impl Into<String>) -> Self {
        Self {
            action,
            spec: spec.into(),
        }
    }
}

/// A dependency-consistent transaction computed by the engine.
///
/// Upgrades appear in `install_set` with the new build; the builds they
/// replace are not listed in `remove_set`, which only carries packages
/// erased without replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTransaction {
    /// Packages that will be installed, upgraded, downgraded or reinstalled
    pub install_set: Vec<PackageRecord>,
    /// Packages that will be erased
    pub remove_set: Vec<PackageRecord>,
}

impl ResolvedTransaction {
    /// Check if the transaction changes nothing.
    pub fn is_empty(&self) -> bool {
        self.install_set.is_empty() && self.remove_set.is_empty()
    }

    /// Total number of package operations.
    pub fn len(&self) -> usize {
        self.install_set.len() + self.remove_set.len()
    }
}
