//! Current-state computation for requested package names

use crate::error::Result;
use crate::observe::list_observed;
use pkgkit::{Engine, PackageRecord};
use std::collections::HashSet;

/// Installed packages plus requested-but-missing names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentState {
    /// Latest installed build per (name, arch)
    pub present: Vec<PackageRecord>,
    /// Names available from repositories but not installed
    pub absent: Vec<String>,
}

impl CurrentState {
    /// Total number of reported entries
    pub fn len(&self) -> usize {
        self.present.len() + self.absent.len()
    }

    /// Check if nothing is reported
    pub fn is_empty(&self) -> bool {
        self.present.is_empty() && self.absent.is_empty()
    }
}

/// Compute the current state of `names`.
///
/// An empty filter lists every installed package and never enumerates
/// absent ones. With a filter, names the engine can install but has not
/// installed are reported once each, whatever the number of architectures
/// offering them. Names the engine knows nothing about are omitted.
pub fn diff_state<E: Engine + ?Sized>(engine: &E, names: &[String]) -> Result<CurrentState> {
    let present = list_observed(engine, names)?;
    if names.is_empty() {
        return Ok(CurrentState {
            present,
            absent: Vec::new(),
        });
    }

    let installed: HashSet<&str> = present.iter().map(|p| p.name.as_str()).collect();
    let mut seen = HashSet::new();
    let absent = engine
        .query_available(names)?
        .into_iter()
        .map(|p| p.name)
        .filter(|name| !installed.contains(name.as_str()) && seen.insert(name.clone()))
        .collect();

    Ok(CurrentState { present, absent })
}
