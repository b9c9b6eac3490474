//! File-level dependency graph
//!
//! A `petgraph` arena over interned paths: node weights are [`PathKey`]s,
//! an edge `a -> b` means file `a` imports file `b` through a relative
//! specifier.

use super::interner::{PathInterner, PathKey};
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct FileGraph {
    interner: PathInterner,
    graph: DiGraph<PathKey, ()>,
    index: FxHashMap<PathKey, NodeIndex>,
}

impl FileGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an adjacency list; every endpoint becomes a node
    pub fn from_edges<'a, I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (&'a PathBuf, &'a PathBuf)>,
    {
        let mut graph = Self::new();
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    pub fn add_node(&mut self, path: &Path) -> NodeIndex {
        let key = self.interner.intern(path);
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(key);
        self.index.insert(key, idx);
        idx
    }

    pub fn add_edge(&mut self, from: &Path, to: &Path) {
        let a = self.add_node(from);
        let b = self.add_node(to);
        if self.graph.find_edge(a, b).is_none() {
            self.graph.add_edge(a, b, ());
        }
    }

    pub fn node(&self, path: &Path) -> Option<NodeIndex> {
        self.interner.get(path).and_then(|key| self.index.get(&key).copied())
    }

    pub fn path(&self, idx: NodeIndex) -> &str {
        self.interner.resolve(self.graph[idx])
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All nodes ordered by path, for deterministic traversal
    pub fn nodes_by_path(&self) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self.graph.node_indices().collect();
        nodes.sort_by(|a, b| self.path(*a).cmp(self.path(*b)));
        nodes
    }

    /// Outgoing neighbours ordered by path
    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut next: Vec<NodeIndex> = self.graph.neighbors(idx).collect();
        next.sort_by(|a, b| self.path(*a).cmp(self.path(*b)));
        next.dedup();
        next
    }
}
