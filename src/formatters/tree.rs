//! Indented text rendering of a dependency forest.
//!
//! ```text
//! app.exe (bundled)
//!     (calls LoadLibraryW)
//!     core.dll (bundled)
//!         KERNEL32.dll (system)
//!     VCRUNTIME140.dll (compiler-runtime)
//!   D plugin.dll (bundled)
//!         libfoo.dll (EXTERNAL)
//! ```
//!
//! Ordinary dependencies come first, then delay-load dependencies marked with
//! `D`. A library shared by several parents is printed under each of them.

use petgraph::graph::NodeIndex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::core::{Category, DllNode, EdgeKind, Forest};
use crate::error::{AuditError, Result};

const INDENT: &str = "    ";
const DELAY_LOAD_MARK: &str = "  D ";

enum Step {
    /// Print `node`; its own line starts with `first`, nested lines with `rest`.
    Enter {
        node: NodeIndex,
        first: String,
        rest: String,
    },
    /// All of `node`'s dependencies have been printed.
    Leave(NodeIndex),
}

/// Renders a [`Forest`] as an indented tree, optionally hiding external
/// libraries of some categories.
#[derive(Debug, Clone, Default)]
pub struct TreeFormatter {
    hidden: HashSet<Category>,
}

impl TreeFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave out external libraries of `category`.
    pub fn hide(mut self, category: Category) -> Self {
        self.hidden.insert(category);
        self
    }

    pub fn with_hidden(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.hidden.extend(categories);
        self
    }

    pub fn is_hidden(&self, category: Category) -> bool {
        self.hidden.contains(&category)
    }

    pub fn format_to_file(&self, forest: &Forest, output_path: &Path) -> Result<()> {
        let content = self.format_forest(forest)?;
        fs::write(output_path, content + "\n")?;
        Ok(())
    }

    /// Every root of `forest`, in case-insensitive name order.
    pub fn format_forest(&self, forest: &Forest) -> Result<String> {
        let roots: Vec<NodeIndex> = forest.roots().collect();
        self.format_roots(forest, &roots)
    }

    /// The trees below `roots`, sorted by name regardless of the order given.
    pub fn format_roots(&self, forest: &Forest, roots: &[NodeIndex]) -> Result<String> {
        let mut sorted = roots.to_vec();
        sorted.sort_by(|a, b| forest.node(*a).name().cmp(forest.node(*b).name()));

        let mut lines = Vec::new();
        for root in sorted {
            self.render(forest, root, &mut lines)?;
        }
        Ok(lines.join("\n"))
    }

    fn render(&self, forest: &Forest, root: NodeIndex, lines: &mut Vec<String>) -> Result<()> {
        let mut on_path: HashSet<NodeIndex> = HashSet::new();
        let mut path: Vec<NodeIndex> = Vec::new();
        let mut stack = vec![Step::Enter {
            node: root,
            first: String::new(),
            rest: String::new(),
        }];

        while let Some(step) = stack.pop() {
            let (node, first, rest) = match step {
                Step::Leave(node) => {
                    on_path.remove(&node);
                    path.pop();
                    continue;
                }
                Step::Enter { node, first, rest } => (node, first, rest),
            };

            let library = match forest.node(node) {
                DllNode::External(external) => {
                    if !self.is_hidden(external.category) {
                        lines.push(format!(
                            "{first}{} ({})",
                            external.name,
                            external.category.label()
                        ));
                    }
                    continue;
                }
                DllNode::Bundled(library) => library,
            };

            if !on_path.insert(node) {
                path.push(node);
                return Err(AuditError::Cycle(describe_path(forest, &path)));
            }
            path.push(node);

            lines.push(format!("{first}{} (bundled)", library.name));
            for call in &library.dynamic_loads {
                lines.push(format!("{rest}{INDENT}(calls {call})"));
            }

            let nested = format!("{rest}{INDENT}");
            stack.push(Step::Leave(node));
            for dep in forest.dependencies(node, EdgeKind::DelayLoad).into_iter().rev() {
                stack.push(Step::Enter {
                    node: dep,
                    first: format!("{rest}{DELAY_LOAD_MARK}"),
                    rest: nested.clone(),
                });
            }
            for dep in forest.dependencies(node, EdgeKind::Ordinary).into_iter().rev() {
                stack.push(Step::Enter {
                    node: dep,
                    first: nested.clone(),
                    rest: nested.clone(),
                });
            }
        }

        Ok(())
    }
}

fn describe_path(forest: &Forest, path: &[NodeIndex]) -> String {
    path.iter()
        .map(|&index| forest.node(index).name().as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}
