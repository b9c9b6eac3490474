//! Symbol graph over a source tree
//!
//! Lexical export/import extraction, relative-import resolution and the
//! file-level dependency graph used by the dead-code, orphan and cycle
//! checks.

pub mod cycles;
pub mod extract;
pub mod file_graph;
pub mod interner;
pub mod resolve;
pub mod symbol_graph;

pub use cycles::find_cycles;
pub use extract::{
    extract_exports, extract_imports, extract_symbols, FileSymbols, ImportStatement,
    ImportedSymbols, DEFAULT_SYMBOL,
};
pub use file_graph::FileGraph;
pub use interner::{PathInterner, PathKey};
pub use resolve::{package_name, resolve_candidates};
pub use symbol_graph::SymbolGraph;
