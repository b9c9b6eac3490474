//! Architecture collector: access, zone coherence and flow over a floor plan
//!
//! The same adjacency reasoning as the code collectors, applied to rooms and
//! doors instead of files and imports. Needs no source tree.

use crate::collectors::base::{AuditContext, Collector, CollectorReport};
use crate::collectors::floor_plan::{FloorPlan, RoomGraph, Zone};
use crate::config::ArchitectureScoring;
use crate::models::{Metrics, Severity, Violation, ViolationType};
use crate::scoring::architecture_score;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Service rooms an entry may reasonably open into
static MUDROOM_NAMES: &[&str] = &["mudroom", "mud room", "entry", "entrance", "foyer", "vestibule"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchitectureDetails {
    pub plan: String,
    pub entry_room: Option<String>,
    /// Shortest path from the entry room to the nearest open room
    pub entry_sequence: Vec<String>,
    pub dwelling_reachable: bool,
    pub private_accessible: bool,
    pub service_accessible: bool,
    /// Entry-to-private paths whose zone order steps back outward
    pub non_monotonic_paths: Vec<Vec<String>>,
}

fn is_mudroom(name: &str) -> bool {
    let name = name.to_lowercase();
    MUDROOM_NAMES.iter().any(|m| name.contains(m))
}

/// Whether zone indices never decrease along `zones`, ignoring service rooms
pub fn is_monotonic(zones: &[Zone]) -> bool {
    let mut last: Option<usize> = None;
    for zone in zones.iter().filter(|z| **z != Zone::Service) {
        let idx = zone.index();
        if let Some(prev) = last {
            if idx < prev {
                return false;
            }
        }
        last = Some(idx);
    }
    true
}

fn access_violations(plan: &FloorPlan, graph: &RoomGraph, entry: &str) -> Vec<Violation> {
    let mut violations = Vec::new();

    if let Some(room) = plan.room(entry) {
        match room.zone {
            Zone::Private => violations.push(Violation::new(
                ViolationType::AccessViolation,
                Severity::Critical,
                format!("Entry door opens directly into private room {}", room.name),
                vec![room.id.clone()],
                "Route the entry through a public or service room first",
            )),
            Zone::Service if !is_mudroom(&room.name) => violations.push(Violation::new(
                ViolationType::AccessViolation,
                Severity::High,
                format!("Entry door opens directly into service room {}", room.name),
                vec![room.id.clone()],
                "Add a foyer or mudroom between the entry and service space",
            )),
            _ => {}
        }
    }

    let tree = graph.bfs(entry);
    for target in &plan.rooms {
        if target.zone != Zone::Open && !target.is_guest_public() {
            continue;
        }
        let Some(path) = tree.path_to(&target.id) else {
            continue;
        };
        let private_step = path
            .iter()
            .skip(1)
            .take(path.len().saturating_sub(2))
            .filter_map(|id| plan.room(id))
            .find(|r| r.zone == Zone::Private);
        if let Some(private) = private_step {
            violations.push(Violation::new(
                ViolationType::AccessViolation,
                Severity::High,
                format!(
                    "Access to {} requires passing through private space ({})",
                    target.name, private.name
                ),
                path.clone(),
                format!("Give {} a route that avoids {}", target.name, private.name),
            ));
        }
    }

    violations
}

fn zone_coherence_violations(plan: &FloorPlan, graph: &RoomGraph) -> Vec<Violation> {
    let mut violations = Vec::new();
    for room in &plan.rooms {
        let mismatch = graph
            .neighbors(&room.id)
            .into_iter()
            .filter_map(|id| plan.room(id))
            .find(|n| !room.zone.may_neighbor(n.zone));
        if let Some(neighbor) = mismatch {
            violations.push(Violation::new(
                ViolationType::ZoneCoherence,
                Severity::Medium,
                format!(
                    "{} ({}) opens onto {} ({})",
                    room.name, room.zone, neighbor.name, neighbor.zone
                ),
                vec![room.id.clone(), neighbor.id.clone()],
                format!(
                    "Place a transitional room between {} and {}",
                    room.name, neighbor.name
                ),
            ));
        }
    }
    violations
}

/// Analyze a validated floor plan
pub fn analyze_floor_plan(
    plan: &FloorPlan,
    weights: &ArchitectureScoring,
) -> Metrics<ArchitectureDetails> {
    let graph = RoomGraph::build(plan);
    let mut details = ArchitectureDetails {
        plan: plan.name.clone(),
        ..Default::default()
    };
    let mut violations = Vec::new();

    let entry = plan.entry_room().unwrap_or_default().to_string();
    details.entry_room = plan.room(&entry).map(|r| r.id.clone());

    violations.extend(access_violations(plan, &graph, &entry));
    let coherence = zone_coherence_violations(plan, &graph);
    let zones_coherent = coherence.is_empty();
    violations.extend(coherence);

    // Flow: nearest open room, then private/service reachability
    let tree = graph.bfs(&entry);
    let nearest_open = tree
        .order
        .iter()
        .find(|id| plan.room(id).map(|r| r.zone == Zone::Open).unwrap_or(false));
    if let Some(open) = nearest_open {
        details.dwelling_reachable = true;
        details.entry_sequence = tree.path_to(open).unwrap_or_default();
    } else {
        violations.push(Violation::new(
            ViolationType::FlowViolation,
            Severity::Critical,
            format!("{}: cannot reach open dwelling space from the entry", plan.name),
            details.entry_room.iter().cloned().collect(),
            "Connect the entry sequence to an open living area",
        ));
    }

    for room in &plan.rooms {
        if !tree.reaches(&room.id) {
            continue;
        }
        match room.zone {
            Zone::Service => details.service_accessible = true,
            Zone::Private => {
                details.private_accessible = true;
                if let Some(path) = tree.path_to(&room.id) {
                    let zones: Vec<Zone> = path
                        .iter()
                        .filter_map(|id| plan.room(id).map(|r| r.zone))
                        .collect();
                    if !is_monotonic(&zones) {
                        debug!("Non-monotonic path to {}: {:?}", room.id, path);
                        details.non_monotonic_paths.push(path);
                    }
                }
            }
            _ => {}
        }
    }

    let counts = crate::models::SeverityCounts::from_violations(&violations);
    let score = architecture_score(&counts, zones_coherent, details.dwelling_reachable, weights);
    info!(
        "Architecture '{}': {} violations, dwelling reachable: {}, score {:.1}",
        plan.name,
        violations.len(),
        details.dwelling_reachable,
        score
    );
    Metrics::new(details, score, violations, true)
}

/// Collector over a fixed floor plan
#[derive(Debug, Clone)]
pub struct ArchitectureCollector {
    plan: FloorPlan,
}

impl ArchitectureCollector {
    pub fn new(plan: FloorPlan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &FloorPlan {
        &self.plan
    }
}

impl Collector for ArchitectureCollector {
    fn name(&self) -> &'static str {
        "architecture"
    }

    fn description(&self) -> &'static str {
        "Floor-plan access, zone coherence and flow"
    }

    fn collect(&self, ctx: &AuditContext) -> Result<CollectorReport> {
        Ok(CollectorReport::Architecture(analyze_floor_plan(
            &self.plan,
            &ctx.config().scoring.architecture,
        )))
    }
}
