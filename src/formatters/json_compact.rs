use petgraph::graph::NodeIndex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::core::{DllNode, EdgeKind, Forest};
use crate::error::Result;

/// Flat JSON form of a forest for programmatic consumption.
///
/// Each library is listed once and referenced by position, so shared
/// dependencies are not repeated and cyclic graphs need no special casing.
pub struct JsonCompactFormatter {
    pretty: bool,
}

impl JsonCompactFormatter {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn format_to_file(&self, forest: &Forest, output_path: &Path) -> Result<()> {
        let json_content = self.format_forest(forest)?;
        fs::write(output_path, json_content)?;
        Ok(())
    }

    pub fn format_forest(&self, forest: &Forest) -> Result<String> {
        let output = self.to_value(forest);
        let text = if self.pretty {
            serde_json::to_string_pretty(&output)?
        } else {
            serde_json::to_string(&output)?
        };
        Ok(text)
    }

    pub fn to_value(&self, forest: &Forest) -> Value {
        let graph = forest.graph();

        // Bundled files first, then externals, each by name.
        let mut order: Vec<NodeIndex> = graph.node_indices().collect();
        order.sort_by(|a, b| {
            let (na, nb) = (&graph[*a], &graph[*b]);
            nb.is_bundled()
                .cmp(&na.is_bundled())
                .then_with(|| na.name().cmp(nb.name()))
        });
        let ids: HashMap<NodeIndex, usize> =
            order.iter().enumerate().map(|(id, &idx)| (idx, id)).collect();

        let to_ids = |targets: Vec<NodeIndex>| -> Vec<usize> {
            targets.iter().map(|target| ids[target]).collect()
        };

        let nodes: Vec<Value> = order
            .iter()
            .map(|&idx| match &graph[idx] {
                DllNode::Bundled(library) => json!({
                    "n": library.name.as_str(),
                    "k": "bundled",
                    "calls": library.dynamic_loads,
                    "deps": to_ids(forest.dependencies(idx, EdgeKind::Ordinary)),
                    "delay": to_ids(forest.dependencies(idx, EdgeKind::DelayLoad)),
                }),
                DllNode::External(library) => json!({
                    "n": library.name.as_str(),
                    "k": library.category.label(),
                }),
            })
            .collect();

        let roots: Vec<usize> = forest.roots().map(|root| ids[&root]).collect();

        json!({
            "meta": {
                "files": forest.bundled_count(),
                "libraries": graph.node_count(),
                "edges": graph.edge_count(),
                "roots": roots.len(),
            },
            "roots": roots,
            "nodes": nodes,
        })
    }
}

impl Default for JsonCompactFormatter {
    fn default() -> Self {
        Self::new()
    }
}
