//! Collector integration tests over fixture trees

use anyhow::Result;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use triad_audit::collectors::{
    CloneDetector, CloneReport, CloneRequest, DryCollector, DuplicateBlock, HeideggerCollector,
    RamsCollector,
};
use triad_audit::{
    analyze_floor_plan, AuditContext, AuditEngine, AuditError, FloorPlan, Severity, TriadConfig,
    Violation, ViolationType,
};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn no_clones() -> TriadConfig {
    let mut config = TriadConfig::default();
    config.dry.clone_detector = false;
    config
}

fn of_type(violations: &[Violation], kind: ViolationType) -> Vec<&Violation> {
    violations.iter().filter(|v| v.kind == kind).collect()
}

/// Clone detector returning a fixed report
struct FakeDetector {
    report: CloneReport,
}

impl CloneDetector for FakeDetector {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn detect(&self, _request: &CloneRequest) -> Result<CloneReport> {
        Ok(self.report.clone())
    }
}

struct BrokenDetector;

impl CloneDetector for BrokenDetector {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn detect(&self, _request: &CloneRequest) -> Result<CloneReport> {
        anyhow::bail!("npx not found")
    }
}

#[test]
fn test_shared_sixty_line_block_is_high_duplicate() {
    let dir = TempDir::new().unwrap();
    let block: String = (0..60).map(|i| format!("total += values[{}];\n", i)).collect();
    write(dir.path(), "src/a.ts", &block);
    write(dir.path(), "src/b.ts", &block);

    let detector = FakeDetector {
        report: CloneReport {
            percentage: 50.0,
            duplicates: vec![DuplicateBlock {
                files: vec!["src/a.ts".into(), "src/b.ts".into()],
                lines: 60,
                fragment: "total += values[0];".into(),
            }],
        },
    };
    let ctx = AuditContext::new(dir.path(), TriadConfig::default()).unwrap();
    let metrics = DryCollector::with_detector(Box::new(detector)).run(&ctx);

    let blocks = of_type(&metrics.violations, ViolationType::DuplicateBlock);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].severity, Severity::High);
    assert_eq!(metrics.details.duplicate_blocks[0].lines, 60);
    assert!(metrics.details.clone_detection_ran);
    assert_eq!(metrics.score, 1.0);
}

#[test]
fn test_constant_in_three_files_is_medium_duplicate() {
    let dir = TempDir::new().unwrap();
    for name in ["a", "b", "c"] {
        write(
            dir.path(),
            &format!("src/{}.ts", name),
            "const MAX_RETRIES = 3;\nexport function go() {}\n",
        );
    }

    let ctx = AuditContext::new(dir.path(), no_clones()).unwrap();
    let metrics = DryCollector::new().run(&ctx);

    let constants = of_type(&metrics.violations, ViolationType::DuplicateConstant);
    assert_eq!(constants.len(), 1);
    assert_eq!(constants[0].severity, Severity::Medium);
    assert_eq!(constants[0].files, vec!["src/a.ts", "src/b.ts", "src/c.ts"]);
    assert!(!metrics.details.clone_detection_ran);
    assert_eq!(metrics.score, 10.0);
}

#[test]
fn test_clone_detector_failure_degrades() {
    let dir = TempDir::new().unwrap();
    for name in ["a", "b", "c"] {
        write(dir.path(), &format!("{}.ts", name), "const API_URL = '/api';\n");
    }

    let ctx = AuditContext::new(dir.path(), TriadConfig::default()).unwrap();
    let metrics = DryCollector::with_detector(Box::new(BrokenDetector)).run(&ctx);

    assert!(!metrics.details.clone_detection_ran);
    assert_eq!(metrics.details.duplication_percentage, 0.0);
    assert_eq!(of_type(&metrics.violations, ViolationType::DuplicateConstant).len(), 1);
    assert!(of_type(&metrics.violations, ViolationType::DuplicateBlock).is_empty());
    assert_eq!(metrics.score, 10.0);
}

#[test]
fn test_unimported_helper_is_dead_export() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/utils/format.ts", "export function helper() {}\n");
    write(dir.path(), "src/app.ts", "console.log('start');\n");

    let ctx = AuditContext::new(dir.path(), no_clones()).unwrap();
    let metrics = RamsCollector::new().run(&ctx);

    let dead = of_type(&metrics.violations, ViolationType::DeadExport);
    assert_eq!(dead.len(), 1);
    assert!(dead[0].message.contains("helper"));
    assert_eq!(dead[0].files, vec!["src/utils/format.ts"]);
}

#[test]
fn test_dead_export_soundness_with_namespace_import() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "src/lib/math.ts",
        "export const add = 1;\nexport function sub() {}\n",
    );
    write(dir.path(), "src/main.ts", "import * as math from './lib/math';\n");

    let ctx = AuditContext::new(dir.path(), no_clones()).unwrap();
    let metrics = RamsCollector::new().run(&ctx);
    assert!(metrics.details.dead_exports.is_empty());
}

#[test]
fn test_unused_runtime_dependency_is_high() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "package.json",
        r#"{"name":"app","dependencies":{"left-pad":"^1.3.0","lodash":"4"}}"#,
    );
    write(dir.path(), "src/index.ts", "import { merge } from 'lodash';\nmerge({}, {});\n");

    let ctx = AuditContext::new(dir.path(), no_clones()).unwrap();
    let metrics = RamsCollector::new().run(&ctx);

    let unused = of_type(&metrics.violations, ViolationType::UnusedDependency);
    assert_eq!(unused.len(), 1);
    assert_eq!(unused[0].severity, Severity::High);
    assert!(unused[0].message.contains("left-pad"));
    assert_eq!(metrics.score, 9.5);
}

#[test]
fn test_two_file_cycle_reported_once() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.ts", "import { b } from './b';\nexport const a = 1;\n");
    write(dir.path(), "b.ts", "import { a } from './a';\nexport const b = 2;\n");

    let ctx = AuditContext::new(dir.path(), no_clones()).unwrap();
    let metrics = HeideggerCollector::new().run(&ctx);

    let cycles = of_type(&metrics.violations, ViolationType::CircularDependency);
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].severity, Severity::High);
    assert_eq!(
        metrics.details.circular_dependencies[0].cycle,
        vec!["a.ts", "b.ts", "a.ts"]
    );
    assert!(metrics.details.orphaned_files.is_empty());
}

#[test]
fn test_rams_is_idempotent() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/one.ts", "export const a = 1;\nexport const b = 2;\n");
    write(dir.path(), "src/two.ts", "import { a } from './one';\n");
    write(dir.path(), "src/empty.ts", "// nothing yet\n");
    write(dir.path(), "package.json", r#"{"dependencies":{"left-pad":"1"}}"#);

    let first = {
        let ctx = AuditContext::new(dir.path(), no_clones()).unwrap();
        RamsCollector::new().run(&ctx)
    };
    let second = {
        let ctx = AuditContext::new(dir.path(), no_clones()).unwrap();
        RamsCollector::new().run(&ctx)
    };
    assert_eq!(first.violations, second.violations);
    assert_eq!(first.score, second.score);
}

#[test]
fn test_missing_documentation_is_capped() {
    let dir = TempDir::new().unwrap();
    for i in 1..=6 {
        write(
            dir.path(),
            &format!("src/m{}.ts", i),
            "export function f() {}\n",
        );
    }

    let ctx = AuditContext::new(dir.path(), no_clones()).unwrap();
    let metrics = HeideggerCollector::new().run(&ctx);

    let undocumented = of_type(&metrics.violations, ViolationType::MissingDocumentation);
    assert_eq!(undocumented.len(), 5);
    assert!(undocumented.iter().all(|v| v.severity == Severity::Low));
    assert_eq!(metrics.details.missing_documentation.len(), 5);
}

#[test]
fn test_orphans_are_capped_but_counted() {
    let dir = TempDir::new().unwrap();
    for name in ["alpha", "beta", "gamma", "delta"] {
        write(dir.path(), &format!("src/{}.ts", name), "export const x = 1;\n");
    }
    let mut config = no_clones();
    config.heidegger.max_orphans = 2;

    let ctx = AuditContext::new(dir.path(), config).unwrap();
    let metrics = HeideggerCollector::new().run(&ctx);

    assert_eq!(of_type(&metrics.violations, ViolationType::OrphanedFile).len(), 2);
    assert_eq!(metrics.details.orphaned_files.len(), 2);
    assert_eq!(metrics.details.total_orphans, 4);
}

#[test]
fn test_bare_package_is_high_incomplete() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "packages/x/lib.ts", "export const x = 1;\n");

    let ctx = AuditContext::new(dir.path(), no_clones()).unwrap();
    let metrics = HeideggerCollector::new().run(&ctx);

    let incomplete = of_type(&metrics.violations, ViolationType::IncompletePackage);
    assert_eq!(incomplete.len(), 1);
    assert_eq!(incomplete[0].severity, Severity::High);
    assert_eq!(incomplete[0].files, vec!["packages/x"]);
    assert_eq!(metrics.details.packages[0].completeness, 0.0);
}

#[test]
fn test_heidegger_and_dry_are_idempotent() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.ts", "import { b } from './b';\nexport function a() {}\n");
    write(dir.path(), "b.ts", "import { a } from './a';\nexport const API_URL = 'x';\n");
    write(dir.path(), "c.ts", "export const API_URL = 'x';\n");
    write(dir.path(), "d.ts", "export const API_URL = 'x';\n");
    write(dir.path(), "packages/x/lib.ts", "export const y = 1;\n");

    let run = || {
        let ctx = AuditContext::new(dir.path(), no_clones()).unwrap();
        (
            HeideggerCollector::new().run(&ctx),
            DryCollector::new().run(&ctx),
        )
    };
    let (heidegger_a, dry_a) = run();
    let (heidegger_b, dry_b) = run();

    assert_eq!(heidegger_a.violations, heidegger_b.violations);
    assert_eq!(heidegger_a.score, heidegger_b.score);
    assert_eq!(dry_a.violations, dry_b.violations);
    assert_eq!(dry_a.score, dry_b.score);
}

#[test]
fn test_expired_deadline_marks_incomplete() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/a.ts", "export const a = 1;\n");

    let ctx = AuditContext::new(dir.path(), no_clones())
        .unwrap()
        .with_deadline(Instant::now());
    let rams = RamsCollector::new().run(&ctx);
    let heidegger = HeideggerCollector::new().run(&ctx);

    assert!(!rams.complete);
    assert!(!heidegger.complete);
    assert!(rams.score >= 1.0 && rams.score <= 10.0);
    assert!(heidegger.score >= 1.0 && heidegger.score <= 10.0);
}

#[test]
fn test_missing_root_is_fatal() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    let err = AuditContext::new(&missing, TriadConfig::default()).unwrap_err();
    assert!(matches!(err, AuditError::MissingRoot(_)));
}

#[test]
fn test_engine_runs_all_collectors_on_one_context() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "README.md", "# demo\n");
    write(dir.path(), "src/index.ts", "import { fmt } from './fmt';\nfmt();\n");
    write(dir.path(), "src/fmt.ts", "/** Format */\nexport function fmt() {}\n");

    let ctx = AuditContext::new(dir.path(), no_clones()).unwrap();
    let mut engine = AuditEngine::new(2);
    engine.register(Arc::new(DryCollector::new()));
    engine.register(Arc::new(RamsCollector::new()));
    engine.register(Arc::new(HeideggerCollector::new()));
    let report = engine.run(&ctx).unwrap();

    assert_eq!(report.runs.len(), 3);
    assert!(report.runs.iter().all(|r| r.success));
    assert!(report.complete());
    let overall = report.overall_score.unwrap();
    assert!((1.0..=10.0).contains(&overall));
}

#[test]
fn test_ignore_patterns_exclude_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/keep.ts", "export const a = 1;\n");
    write(dir.path(), "legacy/old.ts", "export const b = 2;\n");
    write(dir.path(), "node_modules/pkg/index.js", "export const c = 3;\n");

    let mut config = no_clones();
    config.exclude.paths.push("legacy/**".into());
    let ctx = AuditContext::new(dir.path(), config).unwrap();
    let files: Vec<&str> = ctx.sources().iter().map(|s| s.relative.as_str()).collect();
    assert_eq!(files, vec!["src/keep.ts"]);
}

const ENTRY_INTO_BEDROOM: &str = r#"{
    "name": "bad entry",
    "entry": "front",
    "rooms": [
        { "id": "bed", "name": "Bedroom", "zone": "private" },
        { "id": "living", "name": "Living room", "zone": "open" }
    ],
    "doors": [
        { "id": "front", "connects": ["exterior", "bed"] },
        { "id": "inner", "connects": ["bed", "living"] }
    ]
}"#;

const BEDROOM_ON_PORCH: &str = r#"{
    "name": "porch bedroom",
    "entry": "front",
    "rooms": [
        { "id": "porch", "name": "Porch", "zone": "outer" },
        { "id": "hall", "name": "Hall", "zone": "public" },
        { "id": "living", "name": "Living room", "zone": "open" },
        { "id": "bed", "name": "Bedroom", "zone": "private" }
    ],
    "doors": [
        { "id": "front", "connects": ["exterior", "porch"] },
        { "id": "d1", "connects": ["porch", "hall"] },
        { "id": "d2", "connects": ["hall", "living"] },
        { "id": "d3", "connects": ["porch", "bed"] }
    ]
}"#;

#[test]
fn test_entry_into_private_room_is_critical() {
    let plan = FloorPlan::from_json(ENTRY_INTO_BEDROOM).unwrap();
    let metrics = analyze_floor_plan(&plan, &TriadConfig::default().scoring.architecture);

    let access = of_type(&metrics.violations, ViolationType::AccessViolation);
    assert_eq!(access.len(), 1);
    assert_eq!(access[0].severity, Severity::Critical);
}

#[test]
fn test_private_adjacent_to_outer_is_zone_violation() {
    let plan = FloorPlan::from_json(BEDROOM_ON_PORCH).unwrap();
    let metrics = analyze_floor_plan(&plan, &TriadConfig::default().scoring.architecture);

    let coherence = of_type(&metrics.violations, ViolationType::ZoneCoherence);
    assert_eq!(coherence.len(), 1);
    assert_eq!(coherence[0].severity, Severity::Medium);
    assert!(metrics.details.dwelling_reachable);
}

#[test]
fn test_malformed_floor_plan_is_fatal() {
    let err = FloorPlan::from_json(r#"{"name":"x","rooms":[],"doors":[],"entry":"none"}"#)
        .unwrap_err();
    assert!(matches!(err, AuditError::InvalidFloorPlan(_)));
    assert!(FloorPlan::from_json("[]").is_err());
}
