//! Change reporting from a resolved transaction

use crate::types::{Baseline, ChangeRecord, PackageState};
use pkgkit::ResolvedTransaction;
use std::collections::HashSet;

/// Pair each requested package the transaction touches with its baseline.
///
/// Installs come first, then removals, each in engine order. Packages the
/// transaction pulls in or erases as dependencies are left out.
pub fn report(
    transaction: &ResolvedTransaction,
    requested: &HashSet<String>,
    baseline: &Baseline,
) -> Vec<ChangeRecord> {
    let installs = transaction
        .install_set
        .iter()
        .filter(|p| requested.contains(&p.name))
        .map(|p| ChangeRecord {
            name: p.name.clone(),
            was: baseline.get(&p.name).clone(),
            is: PackageState::of(p),
        });

    let removals = transaction
        .remove_set
        .iter()
        .filter(|p| requested.contains(&p.name))
        .map(|p| ChangeRecord {
            name: p.name.clone(),
            was: baseline.get(&p.name).clone(),
            is: PackageState::Absent,
        });

    installs.chain(removals).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgkit::PackageRecord;

    fn baseline() -> Baseline {
        let mut baseline = Baseline::default();
        baseline.record("bash", PackageState::Installed("5.2.26-1.fc40".into()));
        baseline.record("zsh", PackageState::Installed("5.9-14.fc40".into()));
        baseline.record("tree", PackageState::Absent);
        baseline.record("fish", PackageState::Installed("3.7.1-1.fc40".into()));
        baseline
    }

    #[test]
    fn test_each_install_uses_its_own_baseline() {
        let txn = ResolvedTransaction {
            install_set: vec![
                PackageRecord::new("tree", "1.8.0-10.fc40", "x86_64"),
                PackageRecord::new("zsh", "5.9-15.fc40", "x86_64"),
                PackageRecord::new("bash", "5.2.26-3.fc40", "x86_64"),
            ],
            remove_set: vec![PackageRecord::new("fish", "3.7.1-1.fc40", "x86_64")],
        };
        let requested: HashSet<String> = ["bash", "zsh", "tree", "fish"]
            .into_iter()
            .map(String::from)
            .collect();

        let changes = report(&txn, &requested, &baseline());
        let pairs: Vec<_> = changes
            .iter()
            .map(|c| (c.name.as_str(), c.was.to_string(), c.is.to_string()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("tree", "absent".to_string(), "1.8.0-10.fc40".to_string()),
                ("zsh", "5.9-14.fc40".to_string(), "5.9-15.fc40".to_string()),
                ("bash", "5.2.26-1.fc40".to_string(), "5.2.26-3.fc40".to_string()),
                ("fish", "3.7.1-1.fc40".to_string(), "absent".to_string()),
            ]
        );
    }

    #[test]
    fn test_dependencies_not_reported() {
        let txn = ResolvedTransaction {
            install_set: vec![
                PackageRecord::new("vim-enhanced", "9.1.0-1.fc40", "x86_64"),
                PackageRecord::new("vim-common", "9.1.0-1.fc40", "x86_64"),
            ],
            remove_set: Vec::new(),
        };
        let requested: HashSet<String> = HashSet::from(["vim-enhanced".to_string()]);

        let changes = report(&txn, &requested, &Baseline::default());
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].name, "vim-enhanced");
        assert!(changes[0].was.is_absent());
    }
}
