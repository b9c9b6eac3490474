//! External duplicate-code detection
//!
//! The DRY collector talks to the clone detector through the
//! [`CloneDetector`] trait. [`JscpdRunner`] runs jscpd as a subprocess and
//! reads its JSON report; any failure along the way is an `Err` the caller
//! turns into "no duplicate-block data".

use crate::collectors::external_tool::{run_external_tool, run_js_tool};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tracing::debug;

/// Maximum fragment length kept per clone
pub const MAX_FRAGMENT_CHARS: usize = 200;

/// One detected clone pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateBlock {
    /// The two locations (root-relative paths)
    pub files: Vec<String>,
    pub lines: u32,
    pub fragment: String,
}

/// Parsed output of one clone-detector run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloneReport {
    /// Aggregate duplication percentage over the scanned tree
    pub percentage: f64,
    pub duplicates: Vec<DuplicateBlock>,
}

/// Parameters handed to the clone detector
#[derive(Debug, Clone)]
pub struct CloneRequest {
    pub root: PathBuf,
    pub min_lines: u32,
    pub min_tokens: u32,
    pub extensions: Vec<String>,
    pub ignore: Vec<String>,
    pub timeout: Duration,
}

pub trait CloneDetector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run detection; `Err` means the tool was unavailable or its output unusable
    fn detect(&self, request: &CloneRequest) -> Result<CloneReport>;
}

/// Truncate to at most [`MAX_FRAGMENT_CHARS`] characters
pub fn truncate_fragment(fragment: &str) -> String {
    match fragment.char_indices().nth(MAX_FRAGMENT_CHARS) {
        Some((idx, _)) => fragment[..idx].to_string(),
        None => fragment.to_string(),
    }
}

fn line_at(loc: Option<&JsonValue>) -> Option<u64> {
    loc.and_then(|l| l.get("line")).and_then(JsonValue::as_u64)
}

/// Name and line range of one side of a clone.
///
/// Accepts both `{name, startLoc: {line}, endLoc: {line}}` and
/// `{sourceId, start: {line}, end: {line}}`.
fn clone_side(side: &JsonValue) -> Option<(String, Option<u64>, Option<u64>)> {
    let name = side
        .get("name")
        .or_else(|| side.get("sourceId"))
        .and_then(JsonValue::as_str)?;
    let start = line_at(side.get("startLoc").or_else(|| side.get("start")));
    let end = line_at(side.get("endLoc").or_else(|| side.get("end")));
    let name = name.trim_start_matches("./").replace('\\', "/");
    Some((name, start, end))
}

fn parse_duplicate(entry: &JsonValue) -> Option<DuplicateBlock> {
    let first = entry.get("firstFile").or_else(|| entry.get("duplicationA"))?;
    let second = entry.get("secondFile").or_else(|| entry.get("duplicationB"))?;
    let (file_a, start, end) = clone_side(first)?;
    let (file_b, _, _) = clone_side(second)?;

    let lines = match entry.get("lines").and_then(JsonValue::as_u64) {
        Some(lines) => lines,
        None => {
            let (start, end) = (start?, end?);
            end.checked_sub(start)? + 1
        }
    };
    let fragment = entry
        .get("fragment")
        .and_then(JsonValue::as_str)
        .map(truncate_fragment)
        .unwrap_or_default();

    Some(DuplicateBlock {
        files: vec![file_a, file_b],
        lines: u32::try_from(lines).ok()?,
        fragment,
    })
}

/// Parse a clone-detector JSON report.
///
/// Malformed duplicate entries are skipped; a missing percentage reads as 0.
pub fn parse_clone_report(report: &JsonValue) -> CloneReport {
    let percentage = report
        .pointer("/statistics/total/percentage")
        .and_then(JsonValue::as_f64)
        .unwrap_or(0.0);

    let entries = report
        .get("duplicates")
        .and_then(JsonValue::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut duplicates = Vec::with_capacity(entries.len());
    for entry in entries {
        match parse_duplicate(entry) {
            Some(dup) => duplicates.push(dup),
            None => debug!("Skipping malformed clone entry"),
        }
    }

    CloneReport {
        percentage,
        duplicates,
    }
}

/// jscpd via bunx/npx
#[derive(Debug, Clone, Default)]
pub struct JscpdRunner {
    /// Command prefix replacing the detected `bunx`/`npx jscpd`
    launcher: Option<Vec<String>>,
}

impl JscpdRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run jscpd through an explicit command prefix instead of the JS runtime
    pub fn with_launcher(launcher: Vec<String>) -> Self {
        Self {
            launcher: Some(launcher),
        }
    }

    fn args(request: &CloneRequest, output: &TempDir) -> Vec<String> {
        let mut args = vec![
            "--silent".to_string(),
            "--reporters".to_string(),
            "json".to_string(),
            "--output".to_string(),
            output.path().to_string_lossy().to_string(),
            "--min-lines".to_string(),
            request.min_lines.to_string(),
            "--min-tokens".to_string(),
            request.min_tokens.to_string(),
        ];

        match request.extensions.as_slice() {
            [] => {}
            [ext] => {
                args.push("--pattern".to_string());
                args.push(format!("**/*.{}", ext));
            }
            exts => {
                args.push("--pattern".to_string());
                args.push(format!("**/*.{{{}}}", exts.join(",")));
            }
        }
        if !request.ignore.is_empty() {
            args.push("--ignore".to_string());
            args.push(request.ignore.join(","));
        }

        args.push(".".to_string());
        args
    }
}

impl CloneDetector for JscpdRunner {
    fn name(&self) -> &'static str {
        "jscpd"
    }

    fn detect(&self, request: &CloneRequest) -> Result<CloneReport> {
        let output = TempDir::new().context("Failed to create jscpd report directory")?;
        let args = Self::args(request, &output);

        let result = match &self.launcher {
            Some(launcher) => {
                let mut cmd = launcher.clone();
                cmd.extend(args);
                run_external_tool(&cmd, "jscpd", request.timeout, Some(&request.root))
            }
            None => run_js_tool("jscpd", &args, "jscpd", request.timeout, Some(&request.root)),
        };
        if !result.success {
            return Err(anyhow!(result
                .error
                .unwrap_or_else(|| "jscpd failed".to_string())));
        }
        if result.return_code != Some(0) {
            return Err(anyhow!(
                "jscpd exited with code {:?}: {}",
                result.return_code,
                result.stderr.lines().last().unwrap_or_default()
            ));
        }

        let report_path = output.path().join("jscpd-report.json");
        let content = std::fs::read_to_string(&report_path).with_context(|| {
            format!(
                "jscpd produced no report (exit code {:?}): {}",
                result.return_code,
                result.stderr.lines().last().unwrap_or_default()
            )
        })?;
        let json: JsonValue =
            serde_json::from_str(&content).context("Failed to parse jscpd JSON report")?;

        Ok(parse_clone_report(&json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_jscpd_shape() {
        let report = json!({
            "statistics": { "total": { "percentage": 12.5 } },
            "duplicates": [{
                "lines": 60,
                "fragment": "const a = 1;",
                "firstFile": { "name": "src/a.ts", "startLoc": { "line": 1 }, "endLoc": { "line": 60 } },
                "secondFile": { "name": "./src/b.ts", "startLoc": { "line": 10 }, "endLoc": { "line": 69 } }
            }]
        });
        let parsed = parse_clone_report(&report);
        assert_eq!(parsed.percentage, 12.5);
        assert_eq!(
            parsed.duplicates,
            vec![DuplicateBlock {
                files: vec!["src/a.ts".into(), "src/b.ts".into()],
                lines: 60,
                fragment: "const a = 1;".into(),
            }]
        );
    }

    #[test]
    fn test_parse_duplication_ab_shape_derives_lines() {
        let report = json!({
            "statistics": { "total": { "percentage": 3.0 } },
            "duplicates": [{
                "duplicationA": { "sourceId": "x.ts", "start": { "line": 5 }, "end": { "line": 34 } },
                "duplicationB": { "sourceId": "y.ts", "start": { "line": 1 }, "end": { "line": 30 } }
            }]
        });
        let parsed = parse_clone_report(&report);
        assert_eq!(parsed.duplicates.len(), 1);
        assert_eq!(parsed.duplicates[0].lines, 30);
        assert_eq!(parsed.duplicates[0].fragment, "");
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let report = json!({
            "duplicates": [
                { "firstFile": { "name": "a.ts" } },
                "not an object",
                { "lines": 12, "firstFile": { "name": "a.ts" }, "secondFile": { "name": "b.ts" } },
                { "firstFile": { "name": "a.ts", "startLoc": { "line": 9 }, "endLoc": { "line": 3 } },
                  "secondFile": { "name": "b.ts" } }
            ]
        });
        let parsed = parse_clone_report(&report);
        assert_eq!(parsed.percentage, 0.0);
        assert_eq!(parsed.duplicates.len(), 1);
        assert_eq!(parsed.duplicates[0].lines, 12);
    }

    #[test]
    fn test_fragment_truncation_is_char_safe() {
        let long = "é".repeat(500);
        let truncated = truncate_fragment(&long);
        assert_eq!(truncated.chars().count(), MAX_FRAGMENT_CHARS);
        assert_eq!(truncate_fragment("short"), "short");
    }

    #[test]
    fn test_jscpd_args() {
        let out = TempDir::new().unwrap();
        let request = CloneRequest {
            root: PathBuf::from("/repo"),
            min_lines: 5,
            min_tokens: 50,
            extensions: vec!["ts".into(), "svelte".into()],
            ignore: vec!["**/node_modules/**".into()],
            timeout: Duration::from_secs(1),
        };
        let args = JscpdRunner::args(&request, &out);
        assert!(args.windows(2).any(|w| w[0] == "--min-lines" && w[1] == "5"));
        assert!(args.windows(2).any(|w| w[0] == "--pattern" && w[1] == "**/*.{ts,svelte}"));
        assert_eq!(args.last().map(String::as_str), Some("."));

        let single = CloneRequest {
            extensions: vec!["ts".into()],
            ..request
        };
        let args = JscpdRunner::args(&single, &out);
        assert!(args.windows(2).any(|w| w[0] == "--pattern" && w[1] == "**/*.ts"));
    }

    /// Shell launcher that writes a one-clone report into `--output` and exits with `code`
    #[cfg(unix)]
    fn fake_jscpd(dir: &std::path::Path, code: i32) -> Vec<String> {
        let script = dir.join(format!("jscpd-{}.sh", code));
        let report = r#"{"statistics":{"total":{"percentage":40.0}},"duplicates":[{"lines":60,"fragment":"x","firstFile":{"name":"a.ts"},"secondFile":{"name":"b.ts"}}]}"#;
        std::fs::write(
            &script,
            format!(
                "out=\"\"\nwhile [ $# -gt 0 ]; do\n  if [ \"$1\" = \"--output\" ]; then out=\"$2\"; fi\n  shift\ndone\nprintf '%s' '{}' > \"$out/jscpd-report.json\"\nexit {}\n",
                report, code
            ),
        )
        .unwrap();
        vec!["sh".to_string(), script.to_string_lossy().to_string()]
    }

    #[cfg(unix)]
    fn request_for(root: &std::path::Path) -> CloneRequest {
        CloneRequest {
            root: root.to_path_buf(),
            min_lines: 5,
            min_tokens: 50,
            extensions: vec!["ts".into()],
            ignore: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_clean_exit_reads_report() {
        let dir = TempDir::new().unwrap();
        let runner = JscpdRunner::with_launcher(fake_jscpd(dir.path(), 0));
        let report = runner.detect(&request_for(dir.path())).unwrap();
        assert_eq!(report.percentage, 40.0);
        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(report.duplicates[0].lines, 60);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_discards_report() {
        let dir = TempDir::new().unwrap();
        let runner = JscpdRunner::with_launcher(fake_jscpd(dir.path(), 2));
        let err = runner.detect(&request_for(dir.path())).unwrap_err();
        assert!(err.to_string().contains("exited with code Some(2)"), "{}", err);
    }
}
