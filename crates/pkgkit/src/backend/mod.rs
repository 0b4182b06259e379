//! Backend abstraction for package engine operations.
//!
//! The [`Engine`] trait is the capability object every reconciliation step
//! receives. Read-only queries take `&self`; goal submission, resolution,
//! download and apply take `&mut self`, so a caller holding only a shared
//! reference cannot mutate the system.

pub mod dnf;
pub mod memory;

use crate::error::Result;
use crate::types::{GoalAction, GoalEntry, PackageRecord, ResolvedTransaction};

/// An open handle on a package engine.
///
/// Implementations:
/// - [`dnf::DnfBackend`] drives the `dnf` command line
/// - [`memory::MemoryEngine`] works against an in-memory package set
pub trait Engine: Send {
    /// List installed builds, restricted to `names` when non-empty.
    ///
    /// Every installed build is returned; picking the latest per
    /// (name, arch) is the caller's job.
    fn query_installed(&self, names: &[String]) -> Result<Vec<PackageRecord>>;

    /// List builds available from repositories, restricted to `names` when
    /// non-empty.
    fn query_available(&self, names: &[String]) -> Result<Vec<PackageRecord>>;

    /// Add an entry to the pending goal. Nothing is changed on disk.
    fn submit(&mut self, entry: GoalEntry) -> Result<()>;

    /// Resolve the pending goal into one consistent transaction.
    fn resolve(&mut self) -> Result<ResolvedTransaction>;

    /// Fetch the artifacts for the given packages.
    fn download(&mut self, packages: &[PackageRecord]) -> Result<()>;

    /// Apply a resolved transaction to the system.
    fn apply(&mut self, transaction: &ResolvedTransaction) -> Result<()>;

    /// Release the handle. Must be safe to call more than once.
    fn close(&mut self);

    /// Request installation of `spec`.
    fn install(&mut self, spec: &str) -> Result<()> {
        self.submit(GoalEntry::new(GoalAction::Install, spec))
    }

    /// Request removal of `spec`.
    fn remove(&mut self, spec: &str) -> Result<()> {
        self.submit(GoalEntry::new(GoalAction::Remove, spec))
    }

    /// Request an upgrade of `spec`.
    fn upgrade(&mut self, spec: &str) -> Result<()> {
        self.submit(GoalEntry::new(GoalAction::Upgrade, spec))
    }
}

/// Opens engine handles.
///
/// Each `get`/`set` opens a fresh handle so nothing about the package
/// database is cached between invocations.
pub trait EngineFactory {
    type Engine: Engine;

    /// Open a new engine handle.
    fn open(&self) -> Result<Self::Engine>;
}
