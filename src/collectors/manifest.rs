//! `package.json` reading
//!
//! Only the dependency tables matter here. Version values are kept as raw
//! JSON so workspace protocols, git URLs and objects all parse.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

pub const MANIFEST_FILE: &str = "package.json";

/// Packages run as tools (CLI, type packages, build plugins) rather than imported.
/// A trailing `*` matches a prefix.
pub static TOOLING_PACKAGES: &[&str] = &[
    "typescript",
    "@types/*",
    "eslint",
    "eslint-*",
    "@eslint/*",
    "@typescript-eslint/*",
    "typescript-eslint",
    "prettier",
    "prettier-plugin-*",
    "vite",
    "vitest",
    "@vitest/*",
    "jest",
    "@jest/*",
    "ts-jest",
    "tsx",
    "ts-node",
    "tslib",
    "husky",
    "lint-staged",
    "nodemon",
    "concurrently",
    "rimraf",
    "cross-env",
    "turbo",
    "svelte-check",
    "playwright",
    "@playwright/test",
    "@testing-library/*",
    "postcss",
    "autoprefixer",
    "tailwindcss",
    "@tailwindcss/*",
    "@changesets/cli",
];

/// Whether `name` matches a skip-list entry (exact or `prefix*`)
pub fn matches_skip_list(name: &str, list: &[impl AsRef<str>]) -> bool {
    list.iter().any(|entry| {
        let entry = entry.as_ref();
        match entry.strip_suffix('*') {
            Some(prefix) => name.starts_with(prefix),
            None => name == entry,
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyKind {
    Dependency,
    DevDependency,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, JsonValue>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, JsonValue>,
}

impl PackageManifest {
    /// Read `package.json` in `dir`; missing or malformed manifests read as `None`
    pub fn load(dir: &Path) -> Option<Self> {
        let path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                debug!("Ignoring malformed {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Every declared package with its table, regular dependencies first
    pub fn declared(&self) -> impl Iterator<Item = (&str, DependencyKind)> {
        self.dependencies
            .keys()
            .map(|k| (k.as_str(), DependencyKind::Dependency))
            .chain(
                self.dev_dependencies
                    .keys()
                    .map(|k| (k.as_str(), DependencyKind::DevDependency)),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_list_matching() {
        assert!(matches_skip_list("typescript", TOOLING_PACKAGES));
        assert!(matches_skip_list("@types/node", TOOLING_PACKAGES));
        assert!(matches_skip_list("eslint-plugin-svelte", TOOLING_PACKAGES));
        assert!(!matches_skip_list("left-pad", TOOLING_PACKAGES));
        assert!(!matches_skip_list("typescript-json", TOOLING_PACKAGES));
        assert!(matches_skip_list("left-pad", ["left-pad".to_string()].as_slice()));
    }

    #[test]
    fn test_load_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"name":"app","dependencies":{"left-pad":"^1.0.0","ui":"workspace:*"},
               "devDependencies":{"vitest":{"version":"1"}}}"#,
        )
        .unwrap();
        let manifest = PackageManifest::load(dir.path()).unwrap();
        let declared: Vec<(&str, DependencyKind)> = manifest.declared().collect();
        assert_eq!(
            declared,
            vec![
                ("left-pad", DependencyKind::Dependency),
                ("ui", DependencyKind::Dependency),
                ("vitest", DependencyKind::DevDependency),
            ]
        );
    }

    #[test]
    fn test_malformed_manifest_is_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{ nope").unwrap();
        assert!(PackageManifest::load(dir.path()).is_none());
        let empty = tempfile::tempdir().unwrap();
        assert!(PackageManifest::load(empty.path()).is_none());
    }
}
