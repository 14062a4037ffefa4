//! Report grouping roots by the Micro-Manager device-adapter convention.
//!
//! Device adapters are named `mmgr_dal_*.dll` and are loaded by the
//! application at runtime, so they are expected to be roots. Any other root is
//! an orphan that something presumably loads with `LoadLibrary`.

use petgraph::graph::NodeIndex;
use regex::Regex;

use super::TreeFormatter;
use crate::core::Forest;
use crate::error::{AuditError, Result};

pub const DEFAULT_ADAPTER_PATTERN: &str = "^mmgr_dal_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    Orphan,
    ExternalDependency,
    BundledDependency,
    LoadLibrary,
    NoDependency,
}

impl Bucket {
    /// Report order.
    pub const ALL: [Bucket; 5] = [
        Bucket::Orphan,
        Bucket::ExternalDependency,
        Bucket::BundledDependency,
        Bucket::LoadLibrary,
        Bucket::NoDependency,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Bucket::Orphan => "Orphans (possibly loaded by LoadLibrary)",
            Bucket::ExternalDependency => "Device adapters with external dependencies",
            Bucket::BundledDependency => "Device adapters with bundled dependencies",
            Bucket::LoadLibrary => "Device adapters that call LoadLibrary",
            Bucket::NoDependency => "Device adapters with no dependencies",
        }
    }
}

pub struct BucketFormatter {
    adapter_pattern: Regex,
    tree: TreeFormatter,
}

impl BucketFormatter {
    /// `adapter_pattern` matches the file names of device adapters.
    pub fn new(adapter_pattern: &str) -> Result<Self> {
        let adapter_pattern = Regex::new(adapter_pattern).map_err(|err| {
            AuditError::Config(format!("invalid adapter pattern {adapter_pattern:?}: {err}"))
        })?;
        Ok(Self {
            adapter_pattern,
            tree: TreeFormatter::new(),
        })
    }

    /// Formatter used for the trees under each heading.
    pub fn with_tree_formatter(mut self, tree: TreeFormatter) -> Self {
        self.tree = tree;
        self
    }

    /// The single bucket `root` belongs to; earlier buckets take precedence.
    pub fn classify(&self, forest: &Forest, root: NodeIndex) -> Bucket {
        if !self.adapter_pattern.is_match(forest.node(root).name().as_str()) {
            Bucket::Orphan
        } else if forest.has_unclassified_dependency(root) {
            Bucket::ExternalDependency
        } else if forest.has_bundled_dependency(root) {
            Bucket::BundledDependency
        } else if forest.calls_dynamic_load(root) {
            Bucket::LoadLibrary
        } else {
            Bucket::NoDependency
        }
    }

    /// Roots grouped by bucket, in report order. Every root appears once.
    pub fn buckets(&self, forest: &Forest) -> Vec<(Bucket, Vec<NodeIndex>)> {
        let mut grouped: Vec<(Bucket, Vec<NodeIndex>)> =
            Bucket::ALL.iter().map(|&bucket| (bucket, Vec::new())).collect();
        for root in forest.roots() {
            let bucket = self.classify(forest, root);
            if let Some((_, members)) = grouped.iter_mut().find(|(b, _)| *b == bucket) {
                members.push(root);
            }
        }
        grouped
    }

    pub fn format_forest(&self, forest: &Forest) -> Result<String> {
        let mut sections = Vec::with_capacity(Bucket::ALL.len());
        for (bucket, roots) in self.buckets(forest) {
            let trees = self.tree.format_roots(forest, &roots)?;
            sections.push(format!("{} ({}):\n{}\n", bucket.title(), roots.len(), trees));
        }
        Ok(sections.join("\n"))
    }
}
