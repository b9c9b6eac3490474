//! Floor-plan model and room adjacency graph
//!
//! Rooms are nodes, doors are undirected edges. The outside world is the
//! pseudo-room [`EXTERIOR`]; it can appear in a door's `connects` but is
//! never traversed when searching paths between rooms.

use crate::error::{AuditError, AuditResult};
use petgraph::graph::{NodeIndex, UnGraph};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const EXTERIOR: &str = "exterior";

/// Zone hierarchy, outermost first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Outer,
    Service,
    Public,
    Private,
    Open,
}

impl Zone {
    pub const ALL: [Zone; 5] = [Zone::Outer, Zone::Service, Zone::Public, Zone::Private, Zone::Open];

    /// Position in the hierarchy
    pub fn index(self) -> usize {
        self as usize
    }

    /// Zones a room of this zone may share a door with
    pub fn allowed_neighbors(self) -> &'static [Zone] {
        match self {
            Zone::Outer | Zone::Service | Zone::Public => &Zone::ALL,
            Zone::Private | Zone::Open => &[Zone::Service, Zone::Public, Zone::Private, Zone::Open],
        }
    }

    pub fn may_neighbor(self, other: Zone) -> bool {
        self.allowed_neighbors().contains(&other)
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Zone::Outer => "outer",
            Zone::Service => "service",
            Zone::Public => "public",
            Zone::Private => "private",
            Zone::Open => "open",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub zone: Zone,
    /// Guest-facing room
    #[serde(default)]
    pub guest: bool,
}

impl Room {
    /// Guest-designated public room (flag or "guest" in the name)
    pub fn is_guest_public(&self) -> bool {
        self.zone == Zone::Public && (self.guest || self.name.to_lowercase().contains("guest"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Door {
    pub id: String,
    pub connects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorPlan {
    pub name: String,
    pub rooms: Vec<Room>,
    pub doors: Vec<Door>,
    /// Id of the entry door
    pub entry: String,
}

impl FloorPlan {
    /// Parse and validate a JSON floor plan
    pub fn from_json(json: &str) -> AuditResult<Self> {
        let plan: FloorPlan = serde_json::from_str(json)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Reject plans the analysis cannot interpret
    pub fn validate(&self) -> AuditResult<()> {
        let mut ids = FxHashSet::default();
        for room in &self.rooms {
            if room.id == EXTERIOR {
                return Err(AuditError::InvalidFloorPlan(format!(
                    "room id '{}' is reserved",
                    EXTERIOR
                )));
            }
            if !ids.insert(room.id.as_str()) {
                return Err(AuditError::InvalidFloorPlan(format!(
                    "duplicate room id '{}'",
                    room.id
                )));
            }
        }

        for door in &self.doors {
            if door.connects.len() != 2 {
                return Err(AuditError::InvalidFloorPlan(format!(
                    "door '{}' connects {} rooms, expected 2",
                    door.id,
                    door.connects.len()
                )));
            }
            for end in &door.connects {
                if end != EXTERIOR && !ids.contains(end.as_str()) {
                    return Err(AuditError::InvalidFloorPlan(format!(
                        "door '{}' references unknown room '{}'",
                        door.id, end
                    )));
                }
            }
        }

        if self.entry_door().is_none() {
            return Err(AuditError::InvalidFloorPlan(format!(
                "entry door '{}' does not exist",
                self.entry
            )));
        }
        Ok(())
    }

    pub fn entry_door(&self) -> Option<&Door> {
        self.doors.iter().find(|d| d.id == self.entry)
    }

    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    /// Room the entry door opens into: its non-exterior side
    pub fn entry_room(&self) -> Option<&str> {
        let door = self.entry_door()?;
        door.connects
            .iter()
            .find(|id| id.as_str() != EXTERIOR)
            .or_else(|| door.connects.get(1))
            .map(String::as_str)
    }
}

/// Undirected room graph built from the doors
#[derive(Debug)]
pub struct RoomGraph {
    graph: UnGraph<String, String>,
    index: FxHashMap<String, NodeIndex>,
}

impl RoomGraph {
    pub fn build(plan: &FloorPlan) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut index = FxHashMap::default();

        let exterior = graph.add_node(EXTERIOR.to_string());
        index.insert(EXTERIOR.to_string(), exterior);
        for room in &plan.rooms {
            let idx = graph.add_node(room.id.clone());
            index.insert(room.id.clone(), idx);
        }
        for door in &plan.doors {
            if let [a, b] = door.connects.as_slice() {
                if let (Some(&ia), Some(&ib)) = (index.get(a), index.get(b)) {
                    graph.add_edge(ia, ib, door.id.clone());
                }
            }
        }

        Self { graph, index }
    }

    /// Neighbouring room ids (exterior excluded), sorted
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors(idx)
            .map(|n| self.graph[n].as_str())
            .filter(|n| *n != EXTERIOR)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Breadth-first search from `start`, returning each reachable room's
    /// predecessor. The exterior is never entered.
    pub fn bfs(&self, start: &str) -> BfsTree {
        let mut order = Vec::new();
        let mut parent: FxHashMap<String, Option<String>> = FxHashMap::default();
        if start == EXTERIOR || !self.index.contains_key(start) {
            return BfsTree { order, parent };
        }

        let mut queue = VecDeque::new();
        parent.insert(start.to_string(), None);
        queue.push_back(start.to_string());
        while let Some(current) = queue.pop_front() {
            for next in self.neighbors(&current) {
                if !parent.contains_key(next) {
                    parent.insert(next.to_string(), Some(current.clone()));
                    queue.push_back(next.to_string());
                }
            }
            order.push(current);
        }

        BfsTree { order, parent }
    }
}

/// Shortest-path tree from one BFS
#[derive(Debug, Clone)]
pub struct BfsTree {
    /// Rooms in visit order (nearest first)
    pub order: Vec<String>,
    parent: FxHashMap<String, Option<String>>,
}

impl BfsTree {
    pub fn reaches(&self, id: &str) -> bool {
        self.parent.contains_key(id)
    }

    /// Shortest path from the BFS start to `target`, both inclusive
    pub fn path_to(&self, target: &str) -> Option<Vec<String>> {
        if !self.reaches(target) {
            return None;
        }
        let mut path = vec![target.to_string()];
        let mut current = target;
        while let Some(Some(prev)) = self.parent.get(current) {
            path.push(prev.clone());
            current = prev.as_str();
        }
        path.reverse();
        Some(path)
    }
}
