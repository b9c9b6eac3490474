//! Symbol graph construction
//!
//! Map phase: every file is scanned independently in parallel (regex
//! extraction plus candidate resolution). Reduce phase: the per-file results
//! are folded into the shared maps on one thread. The finished graph is
//! immutable.

use super::extract::{extract_symbols, ImportedSymbols};
use super::file_graph::FileGraph;
use super::resolve::{package_name, resolve_candidates};
use crate::files::{strip_extension, SourceFile};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One resolved import from the map phase
struct ResolvedImport {
    candidates: Vec<PathBuf>,
    symbols: ImportedSymbols,
}

/// Map-phase output for a single file
struct ScannedFile {
    path: PathBuf,
    exports: BTreeSet<String>,
    imports: Vec<ResolvedImport>,
    packages: Vec<String>,
}

fn scan_file(source: &SourceFile) -> ScannedFile {
    let symbols = extract_symbols(&source.content);
    let mut imports = Vec::new();
    let mut packages = Vec::new();

    for import in symbols.imports {
        if import.is_relative() {
            let candidates = resolve_candidates(&source.path, &import.source);
            // Index files re-exporting themselves
            if candidates.iter().any(|c| c == &source.path) {
                continue;
            }
            imports.push(ResolvedImport {
                candidates,
                symbols: import.symbols,
            });
        } else if let Some(name) = package_name(&import.source) {
            packages.push(name);
        }
    }

    ScannedFile {
        path: source.path.clone(),
        exports: symbols.exports,
        imports,
        packages,
    }
}

/// Export map, import map and file-level edges over one scanned tree
#[derive(Debug, Default)]
pub struct SymbolGraph {
    files: BTreeSet<PathBuf>,
    exports: BTreeMap<PathBuf, BTreeSet<String>>,
    /// Candidate target path -> symbols imported from it
    imports: FxHashMap<PathBuf, FxHashSet<String>>,
    /// Candidate targets imported as a whole (namespace, require, `export *`)
    wildcard_targets: FxHashSet<PathBuf>,
    /// Every candidate path some relative import may refer to
    inbound: FxHashSet<PathBuf>,
    /// importer -> scanned files it imports
    edges: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    /// Bare package name -> import occurrences
    package_imports: BTreeMap<String, usize>,
}

impl SymbolGraph {
    pub fn build(sources: &[SourceFile]) -> Self {
        let scanned: Vec<ScannedFile> = sources.par_iter().map(scan_file).collect();

        let mut graph = SymbolGraph {
            files: sources.iter().map(|s| s.path.clone()).collect(),
            ..Default::default()
        };

        for file in scanned {
            for import in file.imports {
                for candidate in &import.candidates {
                    graph.inbound.insert(candidate.clone());
                    match &import.symbols {
                        ImportedSymbols::Named(names) => {
                            graph
                                .imports
                                .entry(candidate.clone())
                                .or_default()
                                .extend(names.iter().cloned());
                        }
                        ImportedSymbols::Wildcard => {
                            graph.wildcard_targets.insert(candidate.clone());
                        }
                        ImportedSymbols::SideEffect => {}
                    }
                    if graph.files.contains(candidate) {
                        graph
                            .edges
                            .entry(file.path.clone())
                            .or_default()
                            .insert(candidate.clone());
                    }
                }
            }
            for package in file.packages {
                *graph.package_imports.entry(package).or_insert(0) += 1;
            }
            if !file.exports.is_empty() {
                graph.exports.insert(file.path, file.exports);
            }
        }

        debug!(
            "Symbol graph: {} files, {} exporting, {} edges, {} packages",
            graph.files.len(),
            graph.exports.len(),
            graph.edge_count(),
            graph.package_imports.len()
        );
        graph
    }

    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    pub fn contains_file(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    /// Files with at least one export, with their exported names
    pub fn exports(&self) -> impl Iterator<Item = (&PathBuf, &BTreeSet<String>)> {
        self.exports.iter()
    }

    pub fn exports_of(&self, path: &Path) -> Option<&BTreeSet<String>> {
        self.exports.get(path)
    }

    /// Whether any import could have pulled `symbol` out of `path`
    pub fn is_symbol_imported(&self, path: &Path, symbol: &str) -> bool {
        self.is_wildcard_imported(path)
            || self
                .imports
                .get(path)
                .map(|names| names.contains(symbol))
                .unwrap_or(false)
    }

    pub fn is_wildcard_imported(&self, path: &Path) -> bool {
        self.wildcard_targets.contains(path)
    }

    /// At least one relative import resolves here, by exact or extension-stripped path
    pub fn has_inbound(&self, path: &Path) -> bool {
        self.inbound.contains(path) || self.inbound.contains(&strip_extension(path))
    }

    /// Scanned files `path` imports
    pub fn dependencies(&self, path: &Path) -> impl Iterator<Item = &PathBuf> {
        self.edges.get(path).into_iter().flatten()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    pub fn package_imports(&self) -> &BTreeMap<String, usize> {
        &self.package_imports
    }

    pub fn package_import_count(&self, name: &str) -> usize {
        self.package_imports.get(name).copied().unwrap_or(0)
    }

    /// File-level graph restricted to relative imports between scanned files
    pub fn file_graph(&self) -> FileGraph {
        FileGraph::from_edges(
            self.edges
                .iter()
                .flat_map(|(from, targets)| targets.iter().map(move |to| (from, to))),
        )
    }
}
