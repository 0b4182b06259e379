//! # Declarative
//!
//! Package state reconciliation.
//!
//! This crate takes a declared set of package states, compares it with what
//! the package engine reports, and converges the system in one transaction.
//!
//! ## Core Concepts
//!
//! - **Ensure**: the requested state of a package (present, absent, latest, a version)
//! - **Baseline**: the state of every requested package before anything changed
//! - **PlanIntent**: a single install/remove/upgrade not yet submitted
//! - **ChangeRecord**: what a transaction did to one requested package
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{converge, DesiredItem, Ensure, ExecuteOptions};
//! use pkgkit::backend::dnf::{Dnf, DnfOptions};
//!
//! let dnf = Dnf::new(DnfOptions::default());
//! let items = vec![
//!     DesiredItem::new("tree", Ensure::Latest),
//!     DesiredItem::new("nano", Ensure::Absent),
//! ];
//!
//! let opts = ExecuteOptions { noop: true, ..Default::default() };
//! for change in converge(&dnf, &items, &opts)? {
//!     println!("{}: {} -> {}", change.name, change.was, change.is);
//! }
//! ```
//!
//! ## Ordering
//!
//! Within one request the planner only holds a shared engine reference, so
//! every baseline is captured before the executor submits the first goal
//! entry. Engine handles live in an [`EngineSession`] and are closed on
//! every exit path.

pub mod context;
pub mod diff;
pub mod ensure;
pub mod error;
pub mod executor;
pub mod observe;
pub mod planner;
pub mod reporter;
pub mod types;

// Re-export main types at crate root
pub use context::EngineSession;
pub use diff::{CurrentState, diff_state};
pub use ensure::Ensure;
pub use error::{Error, Result};
pub use executor::{converge, current_state, execute};
pub use observe::list_observed;
pub use planner::{IntentKind, Plan, PlanIntent, check_supported, plan};
pub use reporter::report;
pub use types::{Baseline, ChangeRecord, DesiredItem, ExecuteOptions, PackageState};
