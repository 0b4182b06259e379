//! # pkgkit
//!
//! Package engine capability for RPM-based systems.
//!
//! This crate provides:
//! - The [`Engine`] trait: queries, goal submission, resolution, download, apply
//! - A `dnf` command-line backend ([`backend::dnf`])
//! - An in-memory backend for exercising reconciliation logic ([`backend::memory`])
//! - RPM epoch-version-release ordering ([`Evr`])
//! - Retry with exponential backoff for transient failures
//!
//! ## Example
//!
//! ```no_run
//! use pkgkit::backend::dnf::{Dnf, DnfOptions};
//! use pkgkit::{Engine, EngineFactory};
//!
//! let dnf = Dnf::new(DnfOptions::default());
//! let mut engine = dnf.open().expect("Failed to open engine");
//!
//! for pkg in engine.query_installed(&["bash".to_string()]).expect("Query failed") {
//!     println!("{pkg}");
//! }
//!
//! engine.install("tree").expect("Failed to submit");
//! let txn = engine.resolve().expect("Resolution failed");
//! println!("{} package operations", txn.len());
//! engine.close();
//! ```

#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod evr;
pub mod retry;
pub mod types;

pub use backend::{Engine, EngineFactory};
pub use error::{Error, ErrorCategory, Result};
pub use evr::Evr;
pub use retry::{Attempt, LogCallback, RetryCallback, RetryConfig, with_retry};
pub use types::{GoalAction, GoalEntry, PackageRecord, ResolvedTransaction};
