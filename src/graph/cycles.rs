//! Import cycle detection
//!
//! Depth-first search with an explicit frame stack, so deeply nested import
//! chains cannot overflow the thread stack. A back edge to a node that is
//! still on the path closes a cycle; the slice of the path from that node's
//! position to the top is the cycle.

use super::file_graph::FileGraph;
use petgraph::graph::NodeIndex;
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnPath,
    Done,
}

struct Frame {
    node: NodeIndex,
    next: Vec<NodeIndex>,
    cursor: usize,
}

/// Rotate a cycle so it starts at its smallest path.
/// The same cycle found from different start nodes normalizes identically.
fn normalize_cycle(cycle: &[String]) -> Vec<String> {
    if cycle.is_empty() {
        return vec![];
    }

    let min_idx = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| *v)
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut normalized = Vec::with_capacity(cycle.len() + 1);
    normalized.extend_from_slice(&cycle[min_idx..]);
    normalized.extend_from_slice(&cycle[..min_idx]);
    normalized
}

/// Find every distinct cycle reachable by DFS.
///
/// Each returned cycle lists its files starting from the smallest path and
/// repeats the first file at the end to show closure, e.g. `[a, b, a]`.
/// Cycles are deduplicated by their node set; single-node self loops are
/// dropped. Output is sorted.
pub fn find_cycles(graph: &FileGraph) -> Vec<Vec<String>> {
    let mut marks: FxHashMap<NodeIndex, Mark> = FxHashMap::default();
    let mut seen: FxHashSet<Vec<String>> = FxHashSet::default();
    let mut cycles: Vec<Vec<String>> = Vec::new();

    for start in graph.nodes_by_path() {
        if marks.contains_key(&start) {
            continue;
        }

        let mut path: Vec<NodeIndex> = vec![start];
        let mut position: FxHashMap<NodeIndex, usize> = FxHashMap::default();
        position.insert(start, 0);
        marks.insert(start, Mark::OnPath);
        let mut frames = vec![Frame {
            node: start,
            next: graph.successors(start),
            cursor: 0,
        }];

        while let Some(frame) = frames.last_mut() {
            if frame.cursor >= frame.next.len() {
                let node = frame.node;
                frames.pop();
                path.pop();
                position.remove(&node);
                marks.insert(node, Mark::Done);
                continue;
            }

            let next = frame.next[frame.cursor];
            frame.cursor += 1;

            match marks.get(&next).copied() {
                Some(Mark::OnPath) => {
                    let Some(&from) = position.get(&next) else {
                        continue;
                    };
                    let members: Vec<String> = path[from..]
                        .iter()
                        .map(|n| graph.path(*n).to_string())
                        .collect();
                    if members.len() < 2 {
                        continue;
                    }

                    let mut key = members.clone();
                    key.sort();
                    if seen.insert(key) {
                        let mut cycle = normalize_cycle(&members);
                        if let Some(first) = cycle.first().cloned() {
                            cycle.push(first);
                        }
                        cycles.push(cycle);
                    }
                }
                Some(Mark::Done) => {}
                None => {
                    marks.insert(next, Mark::OnPath);
                    position.insert(next, path.len());
                    path.push(next);
                    frames.push(Frame {
                        node: next,
                        next: graph.successors(next),
                        cursor: 0,
                    });
                }
            }
        }
    }

    cycles.sort();
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn graph_of(edges: &[(&str, &str)]) -> FileGraph {
        let owned: Vec<(PathBuf, PathBuf)> = edges
            .iter()
            .map(|(a, b)| (PathBuf::from(a), PathBuf::from(b)))
            .collect();
        FileGraph::from_edges(owned.iter().map(|(a, b)| (a, b)))
    }

    #[test]
    fn test_two_node_cycle_reported_once() {
        let graph = graph_of(&[("/r/a.ts", "/r/b.ts"), ("/r/b.ts", "/r/a.ts")]);
        let cycles = find_cycles(&graph);
        assert_eq!(cycles, vec![vec!["/r/a.ts", "/r/b.ts", "/r/a.ts"]]);
    }

    #[test]
    fn test_triangle_independent_of_insertion_order() {
        let orders: [&[(&str, &str)]; 3] = [
            &[("/r/a.ts", "/r/b.ts"), ("/r/b.ts", "/r/c.ts"), ("/r/c.ts", "/r/a.ts")],
            &[("/r/c.ts", "/r/a.ts"), ("/r/b.ts", "/r/c.ts"), ("/r/a.ts", "/r/b.ts")],
            &[("/r/b.ts", "/r/c.ts"), ("/r/c.ts", "/r/a.ts"), ("/r/a.ts", "/r/b.ts")],
        ];
        for edges in orders {
            let cycles = find_cycles(&graph_of(edges));
            assert_eq!(cycles.len(), 1);
            assert_eq!(cycles[0], vec!["/r/a.ts", "/r/b.ts", "/r/c.ts", "/r/a.ts"]);
        }
    }

    #[test]
    fn test_self_loop_discarded() {
        let graph = graph_of(&[("/r/index.ts", "/r/index.ts"), ("/r/index.ts", "/r/x.ts")]);
        assert!(find_cycles(&graph).is_empty());
    }

    #[test]
    fn test_acyclic_graph() {
        let graph = graph_of(&[
            ("/r/a.ts", "/r/b.ts"),
            ("/r/a.ts", "/r/c.ts"),
            ("/r/b.ts", "/r/d.ts"),
            ("/r/c.ts", "/r/d.ts"),
        ]);
        assert!(find_cycles(&graph).is_empty());
    }

    #[test]
    fn test_separate_cycles() {
        let graph = graph_of(&[
            ("/r/a.ts", "/r/b.ts"),
            ("/r/b.ts", "/r/a.ts"),
            ("/r/x.ts", "/r/y.ts"),
            ("/r/y.ts", "/r/x.ts"),
        ]);
        assert_eq!(find_cycles(&graph).len(), 2);
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let names: Vec<String> = (0..20_000).map(|i| format!("/r/f{:05}.ts", i)).collect();
        let mut edges: Vec<(PathBuf, PathBuf)> = names
            .windows(2)
            .map(|w| (PathBuf::from(&w[0]), PathBuf::from(&w[1])))
            .collect();
        edges.push((PathBuf::from(&names[names.len() - 1]), PathBuf::from(&names[0])));
        let graph = FileGraph::from_edges(edges.iter().map(|(a, b)| (a, b)));

        let cycles = find_cycles(&graph);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 20_001);
    }
}
