//! Core types for package state reconciliation

use crate::ensure::Ensure;
use pkgkit::{PackageRecord, RetryConfig};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Observable state of a single package name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageState {
    /// Not installed
    Absent,
    /// Installed at the given EVR
    Installed(String),
}

impl PackageState {
    /// State of an installed record
    pub fn of(record: &PackageRecord) -> Self {
        Self::Installed(record.evr.clone())
    }

    /// Check if state represents absence
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl fmt::Display for PackageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::Installed(evr) => write!(f, "{evr}"),
        }
    }
}

impl Serialize for PackageState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A package and the state requested for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredItem {
    pub name: String,
    pub ensure: Ensure,
}

impl DesiredItem {
    pub fn new(name: impl Into<String>, ensure: Ensure) -> Self {
        Self {
            name: name.into(),
            ensure,
        }
    }
}

/// Before/after pair for one package touched by a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub name: String,
    pub was: PackageState,
    pub is: PackageState,
}

static ABSENT: PackageState = PackageState::Absent;

/// Pre-change state of every requested package.
///
/// Captured once, before any goal is submitted, and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Baseline {
    states: HashMap<String, PackageState>,
}

impl Baseline {
    pub(crate) fn record(&mut self, name: &str, state: PackageState) {
        self.states.entry(name.to_string()).or_insert(state);
    }

    /// State of `name` before the request; unknown names were absent.
    pub fn get(&self, name: &str) -> &PackageState {
        self.states.get(name).unwrap_or(&ABSENT)
    }

    /// Number of recorded names
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Check if no names were recorded
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Options for execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Resolve only: skip download and apply
    pub noop: bool,
    /// Retry policy for artifact downloads
    pub retry: RetryConfig,
}
