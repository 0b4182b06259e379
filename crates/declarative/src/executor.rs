//! Transaction executor - submits intents, resolves, downloads and applies

use crate::context::EngineSession;
use crate::diff::{CurrentState, diff_state};
use crate::error::Result;
use crate::planner::{PlanIntent, check_supported, plan};
use crate::reporter::report;
use crate::types::{ChangeRecord, DesiredItem, ExecuteOptions};
use pkgkit::{Engine, EngineFactory, LogCallback, ResolvedTransaction, with_retry};
use std::collections::HashSet;

/// Drive the engine through one transaction for `intents`.
///
/// All intents are submitted before resolution. In no-op mode the engine
/// stops after resolving; otherwise the install set is downloaded (retrying
/// transient failures) and the transaction applied. Errors are returned
/// untouched; closing the engine is the caller's job.
pub fn execute<E: Engine + ?Sized>(
    engine: &mut E,
    intents: &[PlanIntent],
    opts: &ExecuteOptions,
) -> Result<ResolvedTransaction> {
    if intents.is_empty() {
        return Ok(ResolvedTransaction::default());
    }

    for intent in intents {
        engine.submit(intent.goal_entry())?;
    }

    let transaction = engine.resolve()?;
    log::info!(
        "Resolved transaction: {} to install, {} to remove",
        transaction.install_set.len(),
        transaction.remove_set.len()
    );

    if opts.noop {
        log::info!("No-op mode, skipping download and apply");
        return Ok(transaction);
    }

    if transaction.is_empty() {
        return Ok(transaction);
    }

    if !transaction.install_set.is_empty() {
        with_retry(&opts.retry, Some(&LogCallback), || {
            engine.download(&transaction.install_set)
        })?;
    }

    engine.apply(&transaction)?;
    log::info!("Applied {} package operation(s)", transaction.len());

    Ok(transaction)
}

/// Converge `items` in a fresh engine session and report what changed.
///
/// Unsupported ensure values are rejected before the engine is opened.
pub fn converge<F: EngineFactory>(
    factory: &F,
    items: &[DesiredItem],
    opts: &ExecuteOptions,
) -> Result<Vec<ChangeRecord>> {
    check_supported(items)?;

    let mut session = EngineSession::open(factory)?;
    let plan = plan(items, &*session)?;
    let transaction = execute(&mut *session, &plan.intents, opts)?;

    let requested: HashSet<String> = items.iter().map(|i| i.name.clone()).collect();
    Ok(report(&transaction, &requested, &plan.baseline))
}

/// Compute the current state of `names` in a fresh engine session.
pub fn current_state<F: EngineFactory>(factory: &F, names: &[String]) -> Result<CurrentState> {
    let session = EngineSession::open(factory)?;
    diff_state(&*session, names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::PackageState;
    use pkgkit::ErrorCategory;
    use pkgkit::RetryConfig;
    use pkgkit::backend::memory::{FailurePoint, MemorySystem};
    use std::time::Duration;

    fn system() -> MemorySystem {
        MemorySystem::new()
            .with_installed("bash", "1.0-1", "x86_64")
            .with_available("bash", "2.0-1", "x86_64")
            .with_available("tree", "1.8.0-10", "x86_64")
    }

    fn opts(noop: bool) -> ExecuteOptions {
        ExecuteOptions {
            noop,
            retry: RetryConfig {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
                backoff_factor: 1.0,
                max_delay: Duration::from_millis(5),
            },
        }
    }

    fn item(name: &str, ensure: &str) -> DesiredItem {
        DesiredItem::new(name, ensure.parse().unwrap())
    }

    #[test]
    fn test_no_intents_touch_nothing() {
        let system = system();
        let changes = converge(&system, &[item("bash", "present")], &opts(false)).unwrap();

        assert!(changes.is_empty());
        assert_eq!(system.stats().mutating_calls(), 0);
        assert_eq!(system.stats().resolved, 0);
    }

    #[test]
    fn test_noop_resolves_without_applying() {
        let system = system();
        let changes = converge(&system, &[item("tree", "latest")], &opts(true)).unwrap();

        assert_eq!(changes.len(), 1);
        let stats = system.stats();
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.downloads, 0);
        assert_eq!(stats.applies, 0);
        assert!(system.installed().iter().all(|p| p.name != "tree"));
    }

    #[test]
    fn test_upgrade_to_version_reports_prior() {
        let system = system();
        let changes = converge(&system, &[item("bash", "2.0")], &opts(false)).unwrap();

        assert_eq!(
            changes,
            vec![ChangeRecord {
                name: "bash".into(),
                was: PackageState::Installed("1.0-1".into()),
                is: PackageState::Installed("2.0-1".into()),
            }]
        );
    }

    #[test]
    fn test_transient_download_failure_retried() {
        let system = system().fail_times(FailurePoint::Download, ErrorCategory::Network, "mirror timeout", 2);
        let changes = converge(&system, &[item("tree", "present")], &opts(false)).unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(system.stats().downloads, 1);
        assert_eq!(system.stats().applies, 1);
    }

    #[test]
    fn test_engine_error_still_closes_session() {
        let system = system().fail_on(FailurePoint::Apply, ErrorCategory::Other, "rpm transaction failed");
        let err = converge(&system, &[item("tree", "present")], &opts(false)).unwrap_err();

        assert!(matches!(err, Error::Engine(_)));
        assert!(err.to_string().contains("rpm transaction failed"));
        let stats = system.stats();
        assert_eq!(stats.opened, stats.closed);
    }

    #[test]
    fn test_held_never_opens_engine() {
        let system = system();
        let items = [item("tree", "present"), item("bash", "held")];

        let err = converge(&system, &items, &opts(false)).unwrap_err();
        assert!(matches!(err, Error::NotImplemented));
        assert_eq!(system.stats().opened, 0);
    }

    #[test]
    fn test_current_state_after_converge() {
        let system = system();
        converge(&system, &[item("tree", "latest")], &opts(false)).unwrap();

        let state = current_state(&system, &["tree".to_string()]).unwrap();
        assert_eq!(state.present.len(), 1);
        assert_eq!(state.present[0].evr, "1.8.0-10");
        assert!(state.absent.is_empty());
    }
}
