use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use super::graph::{EdgeKind, Forest, ForestBuilder};
use super::{DllName, FileRecord, LibraryClassifier};
use crate::error::{AuditError, Result};

/// Links per-file records of one directory into a classified [`Forest`].
#[derive(Debug, Clone)]
pub struct DependencyResolver<'a> {
    classifier: &'a LibraryClassifier,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(classifier: &'a LibraryClassifier) -> Self {
        Self { classifier }
    }

    /// Build the forest for `records`.
    ///
    /// The result depends only on the set of records, not on their order.
    /// Dependency cycles are accepted here and left to consumers to detect.
    pub fn resolve(&self, mut records: Vec<FileRecord>) -> Result<Forest> {
        records.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.name.as_str().cmp(b.name.as_str()))
        });

        let mut builder = ForestBuilder::new();
        let mut indices: HashMap<DllName, NodeIndex> = HashMap::with_capacity(records.len());

        for record in &records {
            let dynamic_loads = record.dynamic_loads.clone();
            let index = builder
                .add_bundled(record.name.clone(), &record.path, dynamic_loads)
                .ok_or_else(|| {
                    AuditError::Config(format!(
                        "file names differ only in case: {}",
                        record.path.display()
                    ))
                })?;
            indices.insert(record.name.clone(), index);
        }

        let mut claimed: HashSet<DllName> = HashSet::new();
        for record in &records {
            let source = indices[&record.name];
            let edges = record
                .dependencies
                .iter()
                .map(|dep| (dep, EdgeKind::Ordinary))
                .chain(
                    record
                        .delay_load_dependencies
                        .iter()
                        .map(|dep| (dep, EdgeKind::DelayLoad)),
                );

            for (dep, kind) in edges {
                let target = match indices.get(dep) {
                    Some(&target) => {
                        claimed.insert(dep.clone());
                        target
                    }
                    None => {
                        let category = self.classifier.classify(dep);
                        builder.external(dep, category)
                    }
                };
                builder.add_edge(source, target, kind);
            }
        }

        let mut roots: Vec<NodeIndex> = records
            .iter()
            .filter(|record| !claimed.contains(&record.name))
            .map(|record| indices[&record.name])
            .collect();

        // Files that are only referenced from within a cycle are reachable
        // from no root. One file of each such cycle becomes a root.
        let promoted = builder.cycle_entry_points(&roots);
        for &index in &promoted {
            warn!(
                "{} is only referenced from a dependency cycle; listing it as a root",
                builder.node(index).name()
            );
        }
        roots.extend(promoted);

        debug!(
            "Resolved {} files into {} roots ({} claimed)",
            records.len(),
            roots.len(),
            claimed.len()
        );
        Ok(builder.build(roots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn record(name: &str, deps: &[&str], delay: &[&str]) -> FileRecord {
        FileRecord {
            path: PathBuf::from(name),
            name: DllName::new(name),
            dependencies: deps.iter().map(|d| DllName::new(*d)).collect(),
            delay_load_dependencies: delay.iter().map(|d| DllName::new(*d)).collect(),
            dynamic_loads: Vec::new(),
        }
    }

    #[test]
    fn duplicate_case_insensitive_names_are_rejected() {
        let classifier = LibraryClassifier::default();
        let err = DependencyResolver::new(&classifier)
            .resolve(vec![record("a.dll", &[], &[]), record("A.DLL", &[], &[])])
            .unwrap_err();
        assert!(matches!(err, AuditError::Config(_)));
    }

    #[test]
    fn self_import_is_promoted_to_root() {
        let classifier = LibraryClassifier::default();
        let forest = DependencyResolver::new(&classifier)
            .resolve(vec![record("a.dll", &["A.dll"], &[])])
            .unwrap();
        assert_eq!(forest.root_count(), 1);
        assert!(forest.root("a.dll").is_some());
    }
}
