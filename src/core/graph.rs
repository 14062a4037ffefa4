use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction, Graph};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::DllName;

/// Where an external library is expected to come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Shipped with Windows.
    System,
    /// Part of the MSVC runtime redistributable.
    CompilerRuntime,
    /// Neither bundled nor known; usually a packaging problem.
    Unclassified,
}

impl Category {
    /// Annotation used in rendered reports.
    pub fn label(self) -> &'static str {
        match self {
            Category::System => "system",
            Category::CompilerRuntime => "compiler-runtime",
            Category::Unclassified => "EXTERNAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Resolved by the loader when the image is loaded.
    Ordinary,
    /// Resolved on first call through the delay-load helper.
    DelayLoad,
}

/// A file found in the scanned directory.
#[derive(Debug, Clone)]
pub struct BundledLibrary {
    pub name: DllName,
    pub path: PathBuf,
    /// Loader API functions the file imports, in the order first observed.
    pub dynamic_loads: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ExternalLibrary {
    pub name: DllName,
    pub category: Category,
}

#[derive(Debug, Clone)]
pub enum DllNode {
    Bundled(BundledLibrary),
    External(ExternalLibrary),
}

impl DllNode {
    pub fn name(&self) -> &DllName {
        match self {
            DllNode::Bundled(library) => &library.name,
            DllNode::External(library) => &library.name,
        }
    }

    pub fn is_bundled(&self) -> bool {
        matches!(self, DllNode::Bundled(_))
    }

    pub fn as_bundled(&self) -> Option<&BundledLibrary> {
        match self {
            DllNode::Bundled(library) => Some(library),
            DllNode::External(_) => None,
        }
    }

    /// `None` for bundled files.
    pub fn category(&self) -> Option<Category> {
        match self {
            DllNode::Bundled(_) => None,
            DllNode::External(library) => Some(library.category),
        }
    }
}

pub type DependencyGraph = Graph<DllNode, EdgeKind, Directed>;

/// Resolved dependency forest of one directory.
///
/// Every bundled file is a single node; parents that depend on the same file
/// share its index. The forest cannot be modified once built.
#[derive(Debug, Clone)]
pub struct Forest {
    graph: DependencyGraph,
    roots: BTreeMap<DllName, NodeIndex>,
}

impl Forest {
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn node(&self, index: NodeIndex) -> &DllNode {
        &self.graph[index]
    }

    /// Roots in case-insensitive name order.
    pub fn roots(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.roots.values().copied()
    }

    pub fn root_names(&self) -> impl Iterator<Item = &DllName> + '_ {
        self.roots.keys()
    }

    pub fn root(&self, name: &str) -> Option<NodeIndex> {
        self.roots.get(&DllName::new(name)).copied()
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Look up any node (root or not) by name.
    pub fn find(&self, name: &str) -> Option<NodeIndex> {
        let wanted = DllName::new(name);
        self.graph
            .node_indices()
            .find(|&index| self.graph[index].name() == &wanted)
    }

    /// Direct dependencies of `index` of the given kind, in case-insensitive
    /// name order.
    pub fn dependencies(&self, index: NodeIndex, kind: EdgeKind) -> Vec<NodeIndex> {
        let mut targets: Vec<NodeIndex> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .filter(|edge| *edge.weight() == kind)
            .map(|edge| edge.target())
            .collect();
        targets.sort_by(|a, b| self.graph[*a].name().cmp(self.graph[*b].name()));
        targets
    }

    /// Ordinary followed by delay-load dependencies.
    pub fn all_dependencies(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut targets = self.dependencies(index, EdgeKind::Ordinary);
        targets.extend(self.dependencies(index, EdgeKind::DelayLoad));
        targets
    }

    pub fn bundled(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .node_indices()
            .filter(|&index| self.graph[index].is_bundled())
    }

    pub fn bundled_count(&self) -> usize {
        self.bundled().count()
    }

    /// Every node reachable from a root, roots included.
    pub fn reachable(&self) -> HashSet<NodeIndex> {
        reachable_from(&self.graph, self.roots.values().copied())
    }

    /// Whether `index` directly depends on an external library of no known
    /// category.
    pub fn has_unclassified_dependency(&self, index: NodeIndex) -> bool {
        self.graph
            .neighbors_directed(index, Direction::Outgoing)
            .any(|dep| self.graph[dep].category() == Some(Category::Unclassified))
    }

    pub fn has_bundled_dependency(&self, index: NodeIndex) -> bool {
        self.graph
            .neighbors_directed(index, Direction::Outgoing)
            .any(|dep| self.graph[dep].is_bundled())
    }

    pub fn calls_dynamic_load(&self, index: NodeIndex) -> bool {
        self.graph[index]
            .as_bundled()
            .is_some_and(|library| !library.dynamic_loads.is_empty())
    }
}

fn reachable_from(
    graph: &DependencyGraph,
    starts: impl IntoIterator<Item = NodeIndex>,
) -> HashSet<NodeIndex> {
    let mut seen = HashSet::new();
    let mut stack: Vec<NodeIndex> = starts.into_iter().collect();
    while let Some(index) = stack.pop() {
        if seen.insert(index) {
            stack.extend(graph.neighbors_directed(index, Direction::Outgoing));
        }
    }
    seen
}

/// Incrementally assembles a [`Forest`].
///
/// Nodes are keyed by case-folded name: adding a name twice returns the
/// existing node, keeping the spelling it was first added with.
pub struct ForestBuilder {
    graph: DependencyGraph,
    node_map: HashMap<DllName, NodeIndex>,
    edges: HashSet<(NodeIndex, NodeIndex, EdgeKind)>,
}

impl ForestBuilder {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            node_map: HashMap::new(),
            edges: HashSet::new(),
        }
    }

    /// Add a bundled file. Returns `None` if the name is already taken.
    pub fn add_bundled(
        &mut self,
        name: DllName,
        path: &Path,
        dynamic_loads: Vec<String>,
    ) -> Option<NodeIndex> {
        if self.node_map.contains_key(&name) {
            return None;
        }
        let index = self.graph.add_node(DllNode::Bundled(BundledLibrary {
            name: name.clone(),
            path: path.to_path_buf(),
            dynamic_loads,
        }));
        self.node_map.insert(name, index);
        Some(index)
    }

    /// Get or create the external node for `name`.
    pub fn external(&mut self, name: &DllName, category: Category) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            return index;
        }
        let index = self.graph.add_node(DllNode::External(ExternalLibrary {
            name: name.clone(),
            category,
        }));
        self.node_map.insert(name.clone(), index);
        index
    }

    pub fn get(&self, name: &DllName) -> Option<NodeIndex> {
        self.node_map.get(name).copied()
    }

    /// Add a dependency edge; repeated edges are ignored. Returns whether the
    /// edge was new.
    pub fn add_edge(&mut self, source: NodeIndex, target: NodeIndex, kind: EdgeKind) -> bool {
        if !self.edges.insert((source, target, kind)) {
            return false;
        }
        self.graph.add_edge(source, target, kind);
        true
    }

    /// Bundled nodes not reachable from any of `roots`.
    pub fn unreachable_bundled(&self, roots: &[NodeIndex]) -> Vec<NodeIndex> {
        let reachable = reachable_from(&self.graph, roots.iter().copied());
        self.graph
            .node_indices()
            .filter(|index| self.graph[*index].is_bundled() && !reachable.contains(index))
            .collect()
    }

    /// One node per group of bundled files that only reference each other,
    /// such that adding them to `roots` makes every bundled node reachable.
    ///
    /// The unreachable part of the graph is condensed into strongly connected
    /// components; a component with no incoming edge from another component
    /// contributes its case-insensitively smallest member. Nodes downstream of
    /// such a component are never picked, so no picked node is referenced by
    /// another pick.
    pub fn cycle_entry_points(&self, roots: &[NodeIndex]) -> Vec<NodeIndex> {
        let unreachable: HashSet<NodeIndex> =
            self.unreachable_bundled(roots).into_iter().collect();
        if unreachable.is_empty() {
            return Vec::new();
        }

        let mut entry_points: Vec<NodeIndex> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| component.iter().any(|index| unreachable.contains(index)))
            .filter(|component| {
                let members: HashSet<NodeIndex> = component.iter().copied().collect();
                members.iter().all(|&index| {
                    self.graph
                        .neighbors_directed(index, Direction::Incoming)
                        .all(|parent| members.contains(&parent))
                })
            })
            .filter_map(|component| {
                component
                    .into_iter()
                    .min_by(|a, b| self.graph[*a].name().cmp(self.graph[*b].name()))
            })
            .collect();
        entry_points.sort_by(|a, b| self.graph[*a].name().cmp(self.graph[*b].name()));
        entry_points
    }

    pub fn node(&self, index: NodeIndex) -> &DllNode {
        &self.graph[index]
    }

    pub fn build(self, roots: impl IntoIterator<Item = NodeIndex>) -> Forest {
        let roots = roots
            .into_iter()
            .map(|index| (self.graph[index].name().clone(), index))
            .collect();
        Forest {
            graph: self.graph,
            roots,
        }
    }
}

impl Default for ForestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
