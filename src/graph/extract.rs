//! Lexical export/import extraction
//!
//! Best-effort regex scanning over source text, not a grammar. Every function
//! here is a pure function of the file contents so the scan can fan out
//! across files in parallel.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Synthetic symbol recorded for `export default` / `import X from`
pub const DEFAULT_SYMBOL: &str = "default";

static EXPORT_DECL: OnceLock<Regex> = OnceLock::new();
static EXPORT_LIST: OnceLock<Regex> = OnceLock::new();
static EXPORT_DEFAULT: OnceLock<Regex> = OnceLock::new();
static EXPORT_STAR: OnceLock<Regex> = OnceLock::new();
static IMPORT_NAMED: OnceLock<Regex> = OnceLock::new();
static IMPORT_NAMESPACE: OnceLock<Regex> = OnceLock::new();
static IMPORT_DEFAULT: OnceLock<Regex> = OnceLock::new();
static IMPORT_BARE: OnceLock<Regex> = OnceLock::new();
static IMPORT_DYNAMIC: OnceLock<Regex> = OnceLock::new();
static REQUIRE: OnceLock<Regex> = OnceLock::new();

fn export_decl() -> &'static Regex {
    EXPORT_DECL.get_or_init(|| {
        Regex::new(
            r"\bexport\s+(?:declare\s+)?(?:async\s+)?(?:abstract\s+)?(?:function\s*\*?\s*|(?:const\s+enum|const|let|var|class|interface|type|enum)\s+)([A-Za-z_$][\w$]*)",
        )
        .expect("valid regex")
    })
}

fn export_list() -> &'static Regex {
    EXPORT_LIST.get_or_init(|| {
        Regex::new(r#"\bexport\s+(?:type\s+)?\{([^}]*)\}(?:\s*from\s*['"]([^'"]+)['"])?"#)
            .expect("valid regex")
    })
}

fn export_default() -> &'static Regex {
    EXPORT_DEFAULT.get_or_init(|| Regex::new(r"\bexport\s+default\b").expect("valid regex"))
}

fn export_star() -> &'static Regex {
    EXPORT_STAR.get_or_init(|| {
        Regex::new(r#"\bexport\s*\*\s*(?:as\s+[A-Za-z_$][\w$]*\s*)?from\s*['"]([^'"]+)['"]"#)
            .expect("valid regex")
    })
}

fn import_named() -> &'static Regex {
    IMPORT_NAMED.get_or_init(|| {
        Regex::new(
            r#"\bimport\s+(?:type\s+)?(?:([A-Za-z_$][\w$]*)\s*,\s*)?\{([^}]*)\}\s*from\s*['"]([^'"]+)['"]"#,
        )
        .expect("valid regex")
    })
}

fn import_namespace() -> &'static Regex {
    IMPORT_NAMESPACE.get_or_init(|| {
        Regex::new(
            r#"\bimport\s+(?:type\s+)?(?:[A-Za-z_$][\w$]*\s*,\s*)?\*\s*as\s+[A-Za-z_$][\w$]*\s+from\s*['"]([^'"]+)['"]"#,
        )
        .expect("valid regex")
    })
}

fn import_default() -> &'static Regex {
    IMPORT_DEFAULT.get_or_init(|| {
        Regex::new(r#"\bimport\s+(?:type\s+)?([A-Za-z_$][\w$]*)\s+from\s*['"]([^'"]+)['"]"#)
            .expect("valid regex")
    })
}

fn import_bare() -> &'static Regex {
    IMPORT_BARE.get_or_init(|| Regex::new(r#"\bimport\s*['"]([^'"]+)['"]"#).expect("valid regex"))
}

fn import_dynamic() -> &'static Regex {
    IMPORT_DYNAMIC.get_or_init(|| {
        Regex::new(r#"\bimport\s*\(\s*['"]([^'"]+)['"]\s*\)"#).expect("valid regex")
    })
}

fn require_call() -> &'static Regex {
    REQUIRE.get_or_init(|| {
        Regex::new(r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#).expect("valid regex")
    })
}

/// What an import statement pulls from its source module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportedSymbols {
    /// Specific names (`"default"` for default imports)
    Named(BTreeSet<String>),
    /// Namespace, `require`, dynamic `import()` or `export *`: every export counts as used
    Wildcard,
    /// `import './polyfill'`: module edge only
    SideEffect,
}

/// One import (or re-export) statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    /// Module specifier as written
    pub source: String,
    pub symbols: ImportedSymbols,
}

impl ImportStatement {
    fn named(source: &str, names: BTreeSet<String>) -> Self {
        Self {
            source: source.to_string(),
            symbols: ImportedSymbols::Named(names),
        }
    }

    fn wildcard(source: &str) -> Self {
        Self {
            source: source.to_string(),
            symbols: ImportedSymbols::Wildcard,
        }
    }

    /// Relative specifiers (`./x`, `../x`) resolve to file nodes
    pub fn is_relative(&self) -> bool {
        self.source.starts_with('.')
    }
}

/// Everything extracted from one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSymbols {
    pub exports: BTreeSet<String>,
    pub imports: Vec<ImportStatement>,
}

/// Split a `{ A, B as C, type D }` list into names, keeping the name before `as`
fn parse_name_list(list: &str) -> BTreeSet<String> {
    list.split(',')
        .filter_map(|raw| {
            let item = raw.trim();
            let item = item.strip_prefix("type ").map(str::trim).unwrap_or(item);
            let name = item.split_whitespace().next()?;
            if name.is_empty() {
                None
            } else {
                Some(name.to_string())
            }
        })
        .collect()
}

/// Extract exported symbol names
pub fn extract_exports(content: &str) -> BTreeSet<String> {
    let mut exports = BTreeSet::new();

    for cap in export_decl().captures_iter(content) {
        exports.insert(cap[1].to_string());
    }
    for cap in export_list().captures_iter(content) {
        exports.extend(parse_name_list(&cap[1]));
    }
    if export_default().is_match(content) {
        exports.insert(DEFAULT_SYMBOL.to_string());
    }

    exports
}

/// Extract import statements, including re-exports and CommonJS/dynamic loads
pub fn extract_imports(content: &str) -> Vec<ImportStatement> {
    let mut imports = Vec::new();

    for cap in import_named().captures_iter(content) {
        let mut names = parse_name_list(&cap[2]);
        if cap.get(1).is_some() {
            names.insert(DEFAULT_SYMBOL.to_string());
        }
        imports.push(ImportStatement::named(&cap[3], names));
    }
    for cap in import_namespace().captures_iter(content) {
        imports.push(ImportStatement::wildcard(&cap[1]));
    }
    for cap in import_default().captures_iter(content) {
        let mut names = BTreeSet::new();
        names.insert(DEFAULT_SYMBOL.to_string());
        imports.push(ImportStatement::named(&cap[2], names));
    }
    for cap in import_bare().captures_iter(content) {
        imports.push(ImportStatement {
            source: cap[1].to_string(),
            symbols: ImportedSymbols::SideEffect,
        });
    }
    for cap in import_dynamic()
        .captures_iter(content)
        .chain(require_call().captures_iter(content))
    {
        imports.push(ImportStatement::wildcard(&cap[1]));
    }

    // Re-exports import from their source too
    for cap in export_list().captures_iter(content) {
        if let Some(source) = cap.get(2) {
            imports.push(ImportStatement::named(source.as_str(), parse_name_list(&cap[1])));
        }
    }
    for cap in export_star().captures_iter(content) {
        imports.push(ImportStatement::wildcard(&cap[1]));
    }

    imports
}

/// Full per-file extraction
pub fn extract_symbols(content: &str) -> FileSymbols {
    FileSymbols {
        exports: extract_exports(content),
        imports: extract_imports(content),
    }
}
