//! Observation of installed packages

use crate::error::Result;
use pkgkit::{Engine, PackageRecord};
use std::collections::HashMap;

/// List installed packages, restricted to `names` when non-empty.
///
/// The engine may report several builds of one (name, arch); only the
/// latest by EVR is kept. Order follows the engine's first report of each
/// (name, arch). Engine failures are propagated.
pub fn list_observed<E: Engine + ?Sized>(engine: &E, names: &[String]) -> Result<Vec<PackageRecord>> {
    let installed = engine.query_installed(names)?;
    log::debug!("Engine reported {} installed builds", installed.len());
    Ok(latest_per_arch(installed))
}

/// Keep the highest-EVR build per (name, arch).
pub(crate) fn latest_per_arch(records: Vec<PackageRecord>) -> Vec<PackageRecord> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut latest: Vec<PackageRecord> = Vec::with_capacity(records.len());

    for record in records {
        let key = (record.name.clone(), record.arch.clone());
        match index.get(&key) {
            Some(&i) => {
                if record.parsed_evr() > latest[i].parsed_evr() {
                    latest[i] = record;
                }
            }
            None => {
                index.insert(key, latest.len());
                latest.push(record);
            }
        }
    }

    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgkit::EngineFactory;
    use pkgkit::backend::memory::MemorySystem;

    #[test]
    fn test_latest_build_per_arch() {
        let records = vec![
            PackageRecord::new("kernel", "6.8.5-301.fc40", "x86_64"),
            PackageRecord::new("kernel", "6.10.3-200.fc40", "x86_64"),
            PackageRecord::new("glibc", "2.39-22.fc40", "i686"),
            PackageRecord::new("glibc", "2.39-22.fc40", "x86_64"),
            PackageRecord::new("kernel", "6.9.12-200.fc40", "x86_64"),
        ];

        let latest = latest_per_arch(records);
        assert_eq!(latest.len(), 3);
        assert_eq!(latest[0].evr, "6.10.3-200.fc40");
        assert_eq!(latest[1].arch, "i686");
        assert_eq!(latest[2].arch, "x86_64");
    }

    #[test]
    fn test_list_observed_filters_names() {
        let system = MemorySystem::new()
            .with_installed("bash", "5.2.26-3.fc40", "x86_64")
            .with_installed("tree", "1.8.0-10.fc40", "x86_64");
        let engine = system.open().unwrap();

        let all = list_observed(&engine, &[]).unwrap();
        assert_eq!(all.len(), 2);

        let only = list_observed(&engine, &["tree".to_string()]).unwrap();
        assert_eq!(only, vec![PackageRecord::new("tree", "1.8.0-10.fc40", "x86_64")]);
    }
}
