//! File classification policy
//!
//! Dead-export, orphan and large-file checks all skip files that exist for
//! reasons a static import graph cannot see: framework entry points, route
//! conventions, public component contracts, tests, scripts and so on.
//!
//! Each reason is a named predicate over [`PathFacts`]. An
//! [`ExclusionPolicy`] is an ordered list of those predicates; the first one
//! that matches names the reason a file was skipped.

use std::path::Path;

/// SvelteKit / Next.js / Remix style route files
static ROUTE_MARKERS: &[&str] = &[
    "/+page",
    "/+layout",
    "/+server",
    "/+error",
    "/pages/",
    "/routes/",
    "/app/page.",
    "/app/layout.",
    "/route.ts",
    "/route.js",
    "/loading.tsx",
    "/not-found.tsx",
];

/// Framework lifecycle hook files, loaded by the runtime by name
static LIFECYCLE_HOOK_MARKERS: &[&str] = &[
    "hooks.server.",
    "hooks.client.",
    "hooks.ts",
    "hooks.js",
    "middleware.ts",
    "middleware.js",
    "instrumentation.ts",
    "instrumentation.js",
];

/// Directories whose modules are re-exported elsewhere by convention
static RE_EXPORT_DIRS: &[&str] = &["/config/", "/reporters/"];

static TEST_MARKERS: &[&str] = &[
    "/test/",
    "/tests/",
    "/__tests__/",
    "/spec/",
    "/e2e/",
    ".test.",
    ".spec.",
    "_test.",
];

static CLI_MARKERS: &[&str] = &["/bin/", "/cli/", "/cli.", "/commands/"];

static SCRIPT_MARKERS: &[&str] = &["/scripts/", "/script/"];

static EXAMPLE_MARKERS: &[&str] = &["/examples/", "/example/", "/demo/", "/demos/", "/playground/"];

static GENERATED_MARKERS: &[&str] = &[
    "/generated/",
    "/__generated__/",
    ".generated.",
    ".gen.",
    ".min.js",
];

/// Pre-computed facts about one root-relative path
#[derive(Debug, Clone)]
pub struct PathFacts {
    /// Root-relative path with a leading `/` so directory markers match at the top level
    pub path: String,
    pub file_name: String,
    /// File name up to the first `.`
    pub stem: String,
    pub extension: String,
    /// Under a configured library/SDK root
    pub in_library_root: bool,
}

impl PathFacts {
    pub fn new(relative: &str, library_roots: &[String]) -> Self {
        let relative = relative.replace('\\', "/");
        let path = format!("/{}", relative.trim_start_matches('/'));
        let file_name = Path::new(&relative)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let stem = file_name.split('.').next().unwrap_or_default().to_string();
        let extension = Path::new(&file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        let in_library_root = library_roots.iter().any(|root| {
            let root = root.trim_matches('/');
            !root.is_empty()
                && (relative == root || relative.starts_with(&format!("{}/", root)))
        });

        Self {
            path,
            file_name,
            stem,
            extension,
            in_library_root,
        }
    }

    fn contains_any(&self, markers: &[&str]) -> bool {
        markers.iter().any(|m| self.path.contains(m))
    }
}

/// `index.*` / `main.*` entry modules
pub fn is_entry_point(facts: &PathFacts) -> bool {
    matches!(facts.stem.as_str(), "index" | "main")
}

pub fn is_route_convention(facts: &PathFacts) -> bool {
    facts.file_name.starts_with('+') || facts.contains_any(ROUTE_MARKERS)
}

pub fn is_lifecycle_hook(facts: &PathFacts) -> bool {
    LIFECYCLE_HOOK_MARKERS
        .iter()
        .any(|m| facts.file_name.starts_with(m) || facts.file_name == *m)
}

/// UI components: props are a public contract, not dead code
pub fn is_component_file(facts: &PathFacts) -> bool {
    if matches!(facts.extension.as_str(), "svelte" | "vue") {
        return true;
    }
    if facts.path.contains("/components/") {
        return true;
    }
    matches!(facts.extension.as_str(), "tsx" | "jsx")
        && facts
            .stem
            .chars()
            .next()
            .map(|c| c.is_ascii_uppercase())
            .unwrap_or(false)
}

pub fn is_type_declaration(facts: &PathFacts) -> bool {
    facts.file_name.ends_with(".d.ts")
        || facts.file_name.ends_with(".d.mts")
        || facts.file_name.ends_with(".d.cts")
        || facts.stem == "types"
        || facts.path.contains("/types/")
}

pub fn is_library_root(facts: &PathFacts) -> bool {
    facts.in_library_root || facts.path.contains("/sdk/")
}

pub fn is_re_export_dir(facts: &PathFacts) -> bool {
    facts.contains_any(RE_EXPORT_DIRS)
}

/// `vite.config.ts`, `eslint.config.js`, ... consumed by tools, never imported
pub fn is_tool_config(facts: &PathFacts) -> bool {
    facts.file_name.contains(".config.") || facts.file_name.contains(".conf.")
}

pub fn is_test_file(facts: &PathFacts) -> bool {
    facts.contains_any(TEST_MARKERS)
}

pub fn is_cli_binary(facts: &PathFacts) -> bool {
    facts.contains_any(CLI_MARKERS)
}

pub fn is_script(facts: &PathFacts) -> bool {
    facts.contains_any(SCRIPT_MARKERS)
}

pub fn is_example(facts: &PathFacts) -> bool {
    facts.contains_any(EXAMPLE_MARKERS)
}

pub fn is_generated_file(facts: &PathFacts) -> bool {
    facts.contains_any(GENERATED_MARKERS)
}

/// A named classification predicate
#[derive(Clone, Copy)]
pub struct FileRule {
    pub name: &'static str,
    pub matches: fn(&PathFacts) -> bool,
}

impl std::fmt::Debug for FileRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FileRule").field(&self.name).finish()
    }
}

const fn rule(name: &'static str, matches: fn(&PathFacts) -> bool) -> FileRule {
    FileRule { name, matches }
}

pub const ENTRY_POINT: FileRule = rule("entry_point", is_entry_point);
pub const ROUTE_CONVENTION: FileRule = rule("route_convention", is_route_convention);
pub const LIFECYCLE_HOOK: FileRule = rule("lifecycle_hook", is_lifecycle_hook);
pub const COMPONENT: FileRule = rule("component", is_component_file);
pub const TYPE_DECLARATION: FileRule = rule("type_declaration", is_type_declaration);
pub const LIBRARY_ROOT: FileRule = rule("library_root", is_library_root);
pub const RE_EXPORT_DIR: FileRule = rule("re_export_dir", is_re_export_dir);
pub const TOOL_CONFIG: FileRule = rule("tool_config", is_tool_config);
pub const TEST_FILE: FileRule = rule("test_file", is_test_file);
pub const CLI_BINARY: FileRule = rule("cli_binary", is_cli_binary);
pub const SCRIPT: FileRule = rule("script", is_script);
pub const EXAMPLE: FileRule = rule("example", is_example);
pub const GENERATED: FileRule = rule("generated", is_generated_file);

/// Ordered list of exclusion predicates
#[derive(Debug, Clone)]
pub struct ExclusionPolicy {
    rules: Vec<FileRule>,
    library_roots: Vec<String>,
}

impl ExclusionPolicy {
    pub fn new(rules: Vec<FileRule>, library_roots: Vec<String>) -> Self {
        Self {
            rules,
            library_roots,
        }
    }

    /// Files whose exports are never reported dead
    pub fn dead_exports(library_roots: Vec<String>) -> Self {
        Self::new(
            vec![
                ENTRY_POINT,
                ROUTE_CONVENTION,
                LIFECYCLE_HOOK,
                COMPONENT,
                TYPE_DECLARATION,
                LIBRARY_ROOT,
                RE_EXPORT_DIR,
                TOOL_CONFIG,
            ],
            library_roots,
        )
    }

    /// Files never reported as orphans: the dead-export list plus
    /// tests, binaries, scripts and examples
    pub fn orphans(library_roots: Vec<String>) -> Self {
        let mut policy = Self::dead_exports(library_roots);
        policy
            .rules
            .extend([TEST_FILE, CLI_BINARY, SCRIPT, EXAMPLE]);
        policy
    }

    /// Files exempt from the size check
    pub fn large_files() -> Self {
        Self::new(vec![GENERATED, TYPE_DECLARATION], Vec::new())
    }

    pub fn rules(&self) -> &[FileRule] {
        &self.rules
    }

    /// Name of the first rule matching `relative`, if any
    pub fn classify(&self, relative: &str) -> Option<&'static str> {
        let facts = PathFacts::new(relative, &self.library_roots);
        self.rules
            .iter()
            .find(|r| (r.matches)(&facts))
            .map(|r| r.name)
    }

    pub fn excludes(&self, relative: &str) -> bool {
        self.classify(relative).is_some()
    }
}
