//! Change planner - maps desired states to engine intents
//!
//! Planning runs in three passes over the request:
//! 1. every ensure value is checked; `held` aborts the whole request
//! 2. the pre-change state of every requested name is captured
//! 3. each item is classified into at most one intent
//!
//! The planner only needs `&E`, so it cannot submit anything to the engine.

use crate::ensure::Ensure;
use crate::error::{Error, Result};
use crate::observe::list_observed;
use crate::types::{Baseline, DesiredItem, PackageState};
use pkgkit::{Engine, GoalAction, GoalEntry, PackageRecord};
use std::collections::HashMap;

/// Engine-level action planned for one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentKind {
    Install,
    Remove,
    UpgradeLatest,
    UpgradeToVersion(String),
}

/// A planned single-package action not yet submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanIntent {
    /// Requested package name
    pub name: String,
    pub kind: IntentKind,
    /// Spec handed to the engine: the name, or `name-version`
    pub spec: String,
    /// State captured before planning
    pub prior: PackageState,
}

impl PlanIntent {
    /// Goal entry to submit for this intent.
    pub fn goal_entry(&self) -> GoalEntry {
        let action = match self.kind {
            IntentKind::Install => GoalAction::Install,
            IntentKind::Remove => GoalAction::Remove,
            IntentKind::UpgradeLatest | IntentKind::UpgradeToVersion(_) => GoalAction::Upgrade,
        };
        GoalEntry::new(action, &self.spec)
    }
}

/// Result of planning a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub intents: Vec<PlanIntent>,
    pub baseline: Baseline,
}

impl Plan {
    /// Check if nothing needs to change
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

/// Reject requests containing ensure values that cannot be planned.
pub fn check_supported(items: &[DesiredItem]) -> Result<()> {
    if let Some(item) = items.iter().find(|i| !i.ensure.is_supported()) {
        log::warn!("Cannot plan ensure={} for {}", item.ensure, item.name);
        return Err(Error::NotImplemented);
    }
    Ok(())
}

/// Plan intents for `items` against the current engine state.
pub fn plan<E: Engine + ?Sized>(items: &[DesiredItem], engine: &E) -> Result<Plan> {
    check_supported(items)?;

    let names: Vec<String> = items.iter().map(|i| i.name.clone()).collect();
    let installed = newest_by_name(list_observed(engine, &names)?);

    let mut baseline = Baseline::default();
    for item in items {
        let state = installed
            .get(&item.name)
            .map_or(PackageState::Absent, PackageState::of);
        baseline.record(&item.name, state);
    }

    let intents: Vec<PlanIntent> = items
        .iter()
        .filter_map(|item| classify(item, baseline.get(&item.name)))
        .collect();

    log::info!(
        "Planned {} intent(s) for {} requested package(s)",
        intents.len(),
        items.len()
    );
    Ok(Plan { intents, baseline })
}

/// Highest installed build per name, across architectures.
fn newest_by_name(records: Vec<PackageRecord>) -> HashMap<String, PackageRecord> {
    let mut newest: HashMap<String, PackageRecord> = HashMap::new();
    for record in records {
        match newest.get(&record.name) {
            Some(current) if current.parsed_evr() >= record.parsed_evr() => {}
            _ => {
                newest.insert(record.name.clone(), record);
            }
        }
    }
    newest
}

fn classify(item: &DesiredItem, prior: &PackageState) -> Option<PlanIntent> {
    let installed = !prior.is_absent();
    let name = item.name.as_str();

    let (kind, spec) = match &item.ensure {
        Ensure::Present if !installed => (IntentKind::Install, name.to_string()),
        Ensure::Absent if installed => (IntentKind::Remove, name.to_string()),
        Ensure::Present | Ensure::Absent | Ensure::Held => return None,
        Ensure::Latest if installed => (IntentKind::UpgradeLatest, name.to_string()),
        Ensure::Latest => (IntentKind::Install, name.to_string()),
        Ensure::Version(version) => {
            let spec = format!("{name}-{version}");
            if installed {
                (IntentKind::UpgradeToVersion(version.clone()), spec)
            } else {
                (IntentKind::Install, spec)
            }
        }
    };

    log::debug!("{name}: {prior} -> {} ({spec})", item.ensure);
    Some(PlanIntent {
        name: name.to_string(),
        kind,
        spec,
        prior: prior.clone(),
    })
}
