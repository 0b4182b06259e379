//! In-memory engine backend.
//!
//! [`MemorySystem`] plays the role of the package database on disk: a set of
//! installed builds, a set of builds available from repositories, and simple
//! name-level requirements between packages. Every [`MemoryEngine`] opened
//! from it sees and mutates the same state, so a `set` followed by a `get`
//! observes the applied changes. Counters in [`EngineStats`] record every
//! engine call for assertions about resource discipline.

use crate::backend::{Engine, EngineFactory};
use crate::error::{Error, ErrorCategory, Result};
use crate::evr::Evr;
use crate::types::{GoalAction, GoalEntry, PackageRecord, ResolvedTransaction};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Engine calls that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    Open,
    Query,
    Resolve,
    Download,
    Apply,
}

/// Call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub opened: usize,
    pub closed: usize,
    pub queries: usize,
    pub submitted: usize,
    pub resolved: usize,
    pub downloads: usize,
    pub applies: usize,
}

impl EngineStats {
    /// Number of calls that change the goal or the system.
    pub fn mutating_calls(&self) -> usize {
        self.submitted + self.downloads + self.applies
    }
}

#[derive(Debug, Clone)]
struct FailureRule {
    category: ErrorCategory,
    message: String,
    /// `None` fails forever
    remaining: Option<u32>,
}

#[derive(Debug, Default)]
struct SystemState {
    installed: Vec<PackageRecord>,
    available: Vec<PackageRecord>,
    requires: HashMap<String, Vec<String>>,
    failures: HashMap<FailurePoint, FailureRule>,
    stats: EngineStats,
}

impl SystemState {
    fn check_failure(&mut self, point: FailurePoint) -> Result<()> {
        let Some(rule) = self.failures.get_mut(&point) else {
            return Ok(());
        };

        match rule.remaining {
            Some(0) => return Ok(()),
            Some(n) => rule.remaining = Some(n - 1),
            None => {}
        }

        let message = rule.message.clone();
        Err(match rule.category {
            ErrorCategory::Network => Error::Network { message },
            ErrorCategory::NotFound => Error::NotFound { spec: message },
            ErrorCategory::Conflict => Error::Conflict { message },
            ErrorCategory::Permission => Error::Permission { message },
            ErrorCategory::EngineNotFound => Error::EngineNotFound { binary: message },
            ErrorCategory::Other => Error::Other(message),
        })
    }

    fn installed_named(&self, name: &str) -> impl Iterator<Item = &PackageRecord> {
        self.installed.iter().filter(move |p| p.name == name)
    }

    fn best_available<'a>(
        &'a self,
        mut filter: impl FnMut(&PackageRecord) -> bool,
    ) -> Option<&'a PackageRecord> {
        self.available
            .iter()
            .filter(|p| filter(p))
            .max_by(|a, b| a.parsed_evr().cmp(&b.parsed_evr()))
    }
}

/// Shared in-memory package database.
#[derive(Debug, Clone, Default)]
pub struct MemorySystem {
    state: Arc<Mutex<SystemState>>,
}

impl MemorySystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SystemState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark a build as installed. Installed builds are also available.
    pub fn with_installed(self, name: &str, evr: &str, arch: &str) -> Self {
        {
            let mut state = self.lock();
            let record = PackageRecord::new(name, evr, arch);
            if !state.available.contains(&record) {
                state.available.push(record.clone());
            }
            state.installed.push(record);
        }
        self
    }

    /// Make a build available from a repository.
    pub fn with_available(self, name: &str, evr: &str, arch: &str) -> Self {
        self.lock()
            .available
            .push(PackageRecord::new(name, evr, arch));
        self
    }

    /// Declare that `name` requires `dependency`.
    pub fn with_requirement(self, name: &str, dependency: &str) -> Self {
        self.lock()
            .requires
            .entry(name.to_string())
            .or_default()
            .push(dependency.to_string());
        self
    }

    /// Make every call at `point` fail.
    pub fn fail_on(self, point: FailurePoint, category: ErrorCategory, message: &str) -> Self {
        self.insert_failure(point, category, message, None)
    }

    /// Make the next `times` calls at `point` fail.
    pub fn fail_times(
        self,
        point: FailurePoint,
        category: ErrorCategory,
        message: &str,
        times: u32,
    ) -> Self {
        self.insert_failure(point, category, message, Some(times))
    }

    fn insert_failure(
        self,
        point: FailurePoint,
        category: ErrorCategory,
        message: &str,
        remaining: Option<u32>,
    ) -> Self {
        self.lock().failures.insert(
            point,
            FailureRule {
                category,
                message: message.to_string(),
                remaining,
            },
        );
        self
    }

    /// Currently installed builds.
    pub fn installed(&self) -> Vec<PackageRecord> {
        self.lock().installed.clone()
    }

    /// Call counters so far.
    pub fn stats(&self) -> EngineStats {
        self.lock().stats
    }
}

impl EngineFactory for MemorySystem {
    type Engine = MemoryEngine;

    fn open(&self) -> Result<MemoryEngine> {
        let mut state = self.lock();
        state.check_failure(FailurePoint::Open)?;
        state.stats.opened += 1;

        Ok(MemoryEngine {
            state: Arc::clone(&self.state),
            goal: Vec::new(),
            closed: false,
        })
    }
}

/// Engine handle over a [`MemorySystem`].
#[derive(Debug)]
pub struct MemoryEngine {
    state: Arc<Mutex<SystemState>>,
    goal: Vec<GoalEntry>,
    closed: bool,
}

impl MemoryEngine {
    fn lock(&self) -> Result<MutexGuard<'_, SystemState>> {
        if self.closed {
            return Err(Error::Closed);
        }
        Ok(self.state.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn query(&self, names: &[String], installed: bool) -> Result<Vec<PackageRecord>> {
        let mut state = self.lock()?;
        state.check_failure(FailurePoint::Query)?;
        state.stats.queries += 1;

        let source = if installed {
            &state.installed
        } else {
            &state.available
        };
        Ok(source
            .iter()
            .filter(|p| names.is_empty() || names.contains(&p.name))
            .cloned()
            .collect())
    }
}

/// Whether `spec` names this build: `name`, `name-version`,
/// `name-version-release`, `name-evr` or the full NEVRA.
fn matches_spec(record: &PackageRecord, spec: &str) -> bool {
    if spec == record.name {
        return true;
    }
    let Some(rest) = spec
        .strip_prefix(record.name.as_str())
        .and_then(|r| r.strip_prefix('-'))
    else {
        return false;
    };

    let evr = Evr::parse(&record.evr);
    let version_release = match &evr.release {
        Some(release) => format!("{}-{release}", evr.version),
        None => evr.version.clone(),
    };

    rest == evr.version
        || rest == version_release
        || rest == record.evr
        || rest == format!("{}.{}", record.evr, record.arch)
}

/// Name part of a spec, as far as the known package names can tell.
fn spec_name<'a>(state: &'a SystemState, spec: &str) -> Option<&'a str> {
    state
        .available
        .iter()
        .chain(state.installed.iter())
        .find(|p| matches_spec(p, spec))
        .map(|p| p.name.as_str())
}

struct Resolution<'a> {
    state: &'a SystemState,
    transaction: ResolvedTransaction,
    planned: HashSet<String>,
}

impl Resolution<'_> {
    fn add_install(&mut self, record: &PackageRecord) -> Result<()> {
        if !self.planned.insert(record.name.clone()) {
            return Ok(());
        }
        self.transaction.install_set.push(record.clone());
        self.pull_requirements(&record.name)
    }

    fn pull_requirements(&mut self, name: &str) -> Result<()> {
        let state = self.state;
        let Some(deps) = state.requires.get(name) else {
            return Ok(());
        };

        for dep in deps {
            if state.installed_named(dep).next().is_some() || self.planned.contains(dep) {
                continue;
            }
            let candidate = state
                .best_available(|p| &p.name == dep)
                .ok_or_else(|| Error::Conflict {
                    message: format!("nothing provides {dep} needed by {name}"),
                })?;
            self.add_install(candidate)?;
        }
        Ok(())
    }

    fn install(&mut self, spec: &str) -> Result<()> {
        let state = self.state;
        let best = state
            .best_available(|p| matches_spec(p, spec))
            .ok_or_else(|| Error::NotFound {
                spec: spec.to_string(),
            })?;

        let already = state
            .installed_named(&best.name)
            .any(|p| spec == p.name || (p.arch == best.arch && p.evr == best.evr));
        if already {
            log::debug!("{spec} is already installed");
            return Ok(());
        }
        self.add_install(best)
    }

    fn upgrade(&mut self, spec: &str) -> Result<()> {
        let state = self.state;
        let name = spec_name(state, spec).ok_or_else(|| Error::NotFound {
            spec: spec.to_string(),
        })?;
        let current = state
            .installed_named(name)
            .map(PackageRecord::parsed_evr)
            .max()
            .ok_or_else(|| Error::NotFound {
                spec: format!("{spec} (not installed)"),
            })?;

        match state.best_available(|p| matches_spec(p, spec) && p.parsed_evr() > current)
        {
            Some(best) => self.add_install(best),
            None => {
                log::debug!("No upgrade available for {spec}");
                Ok(())
            }
        }
    }

    fn remove(&mut self, spec: &str) -> Result<()> {
        let victims: Vec<PackageRecord> = self
            .state
            .installed
            .iter()
            .filter(|p| matches_spec(p, spec))
            .cloned()
            .collect();
        if victims.is_empty() {
            return Err(Error::NotFound {
                spec: spec.to_string(),
            });
        }

        for victim in victims {
            self.add_removal(victim);
        }
        Ok(())
    }

    fn add_removal(&mut self, record: PackageRecord) {
        if self.transaction.remove_set.contains(&record) {
            return;
        }
        let name = record.name.clone();
        self.transaction.remove_set.push(record);

        // Installed packages that require the removed one go with it
        let dependents: Vec<PackageRecord> = self
            .state
            .installed
            .iter()
            .filter(|p| {
                self.state
                    .requires
                    .get(&p.name)
                    .is_some_and(|deps| deps.contains(&name))
            })
            .cloned()
            .collect();
        for dependent in dependents {
            self.add_removal(dependent);
        }
    }

    fn finish(self) -> Result<ResolvedTransaction> {
        let removed: HashSet<&str> = self
            .transaction
            .remove_set
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        if let Some(clash) = self
            .transaction
            .install_set
            .iter()
            .find(|p| removed.contains(p.name.as_str()))
        {
            return Err(Error::Conflict {
                message: format!("conflicting requests for {}", clash.name),
            });
        }
        Ok(self.transaction)
    }
}

impl Engine for MemoryEngine {
    fn query_installed(&self, names: &[String]) -> Result<Vec<PackageRecord>> {
        self.query(names, true)
    }

    fn query_available(&self, names: &[String]) -> Result<Vec<PackageRecord>> {
        self.query(names, false)
    }

    fn submit(&mut self, entry: GoalEntry) -> Result<()> {
        self.lock()?.stats.submitted += 1;
        self.goal.push(entry);
        Ok(())
    }

    fn resolve(&mut self) -> Result<ResolvedTransaction> {
        let mut state = self.lock()?;
        state.check_failure(FailurePoint::Resolve)?;
        state.stats.resolved += 1;

        let mut resolution = Resolution {
            state: &state,
            transaction: ResolvedTransaction::default(),
            planned: HashSet::new(),
        };
        for entry in &self.goal {
            match entry.action {
                GoalAction::Install => resolution.install(&entry.spec)?,
                GoalAction::Upgrade => resolution.upgrade(&entry.spec)?,
                GoalAction::Remove => resolution.remove(&entry.spec)?,
            }
        }
        resolution.finish()
    }

    fn download(&mut self, packages: &[PackageRecord]) -> Result<()> {
        let mut state = self.lock()?;
        state.check_failure(FailurePoint::Download)?;
        state.stats.downloads += 1;

        if let Some(missing) = packages.iter().find(|p| !state.available.contains(p)) {
            return Err(Error::NotFound {
                spec: missing.nevra(),
            });
        }
        Ok(())
    }

    fn apply(&mut self, transaction: &ResolvedTransaction) -> Result<()> {
        let mut state = self.lock()?;
        state.check_failure(FailurePoint::Apply)?;
        state.stats.applies += 1;

        for removed in &transaction.remove_set {
            state.installed.retain(|p| p != removed);
        }
        for added in &transaction.install_set {
            state
                .installed
                .retain(|p| !(p.name == added.name && p.arch == added.arch));
            state.installed.push(added.clone());
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.goal.clear();
        self.closed = true;
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats
            .closed += 1;
    }
}
