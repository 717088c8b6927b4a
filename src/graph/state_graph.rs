use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ExplorerError, Result};

use super::exit_strategy::{ExitStrategy, LearnedExit};
use super::geometry::BoundingBox;

/// Identifier of the state the application opens in.
pub const ROOT_STATE_ID: &str = "root";

// ============================================================================
// Elements
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementStatus {
    Pending,
    Explored,
    NonInteractive,
}

impl fmt::Display for ElementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementStatus::Pending => "pending",
            ElementStatus::Explored => "explored",
            ElementStatus::NonInteractive => "non_interactive",
        };
        f.write_str(name)
    }
}

/// A clickable or observable region inside a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,

    /// Owning state
    pub state_id: String,

    /// Window-relative bounds, fixed once discovered
    pub bounding_box: BoundingBox,

    /// Detected caption or OCR text
    pub name: String,

    pub enabled: bool,
    pub interactive: bool,
    pub status: ElementStatus,

    /// Why a terminal status was assigned (e.g. `navigation_failed`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

impl Element {
    pub fn new(id: impl Into<String>, state_id: impl Into<String>, name: impl Into<String>, bounding_box: BoundingBox) -> Self {
        Self {
            id: id.into(),
            state_id: state_id.into(),
            bounding_box,
            name: name.into(),
            enabled: true,
            interactive: true,
            status: ElementStatus::Pending,
            annotation: None,
        }
    }
}

// ============================================================================
// States and edges
// ============================================================================

/// One distinct visual configuration of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub id: String,

    /// State that was showing when this one was first reached
    pub parent_state_id: Option<String>,

    /// Element in the parent state whose click produced this state
    pub trigger_element_id: Option<String>,

    pub elements: BTreeMap<String, Element>,

    /// Where the caller's frame store keeps the reference capture
    pub reference_screenshot_path: String,

    /// Learned ways out, keyed by target state id
    #[serde(default)]
    pub exit_strategies: BTreeMap<String, LearnedExit>,
}

impl State {
    pub fn root(reference_screenshot_path: impl Into<String>) -> Self {
        Self::new(ROOT_STATE_ID, None, None, reference_screenshot_path)
    }

    pub fn new(
        id: impl Into<String>,
        parent_state_id: Option<String>,
        trigger_element_id: Option<String>,
        reference_screenshot_path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parent_state_id,
            trigger_element_id,
            elements: BTreeMap::new(),
            reference_screenshot_path: reference_screenshot_path.into(),
            exit_strategies: BTreeMap::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_STATE_ID
    }

    pub fn add_element(&mut self, element: Element) {
        self.elements.insert(element.id.clone(), element);
    }

    pub fn find_element_by_name(&self, name: &str) -> Option<&Element> {
        self.elements
            .values()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }
}

/// A directed, confirmed transition between two states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from_state_id: String,
    pub to_state_id: String,
    pub trigger_element_id: String,

    /// Human-readable description of the action (usually "click <name>")
    pub action_label: String,
}

// ============================================================================
// StateGraph
// ============================================================================

/// Graph of discovered states and transitions (the fDOM).
///
/// States are never removed. Edges always reference existing states and are
/// recorded at most once per `(from, to, trigger)` triple.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateGraph {
    pub states: BTreeMap<String, State>,

    /// Edges in discovery order
    pub edges: Vec<Edge>,

    /// State ids in creation order
    #[serde(default)]
    pub state_order: Vec<String>,
}

impl StateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph containing only the root state.
    pub fn with_root(reference_screenshot_path: impl Into<String>) -> Self {
        let mut graph = Self::new();
        let root = State::root(reference_screenshot_path);
        graph.state_order.push(root.id.clone());
        graph.states.insert(root.id.clone(), root);
        graph
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn has_state(&self, id: &str) -> bool {
        self.states.contains_key(id)
    }

    pub fn state(&self, id: &str) -> Result<&State> {
        self.states
            .get(id)
            .ok_or_else(|| ExplorerError::UnknownState(id.to_string()))
    }

    pub fn state_mut(&mut self, id: &str) -> Result<&mut State> {
        self.states
            .get_mut(id)
            .ok_or_else(|| ExplorerError::UnknownState(id.to_string()))
    }

    /// States in the order they were discovered.
    pub fn states_in_order(&self) -> impl Iterator<Item = &State> {
        self.state_order.iter().filter_map(|id| self.states.get(id))
    }

    /// Id for the next state to be created.
    pub fn next_state_id(&self) -> String {
        let mut index = self.states.len();
        loop {
            let candidate = format!("state_{}", index);
            if !self.states.contains_key(&candidate) {
                return candidate;
            }
            index += 1;
        }
    }

    /// Insert a newly discovered state. States are created exactly once.
    pub fn add_state(&mut self, state: State) -> Result<()> {
        if self.states.contains_key(&state.id) {
            return Err(ExplorerError::InvalidInput(format!(
                "state '{}' already exists",
                state.id
            )));
        }
        if let Some(parent) = &state.parent_state_id {
            if !self.states.contains_key(parent) {
                return Err(ExplorerError::UnknownState(parent.clone()));
            }
        }
        self.state_order.push(state.id.clone());
        self.states.insert(state.id.clone(), state);
        Ok(())
    }

    /// Record a transition. Returns `false` when the same edge already exists.
    pub fn add_edge(&mut self, edge: Edge) -> Result<bool> {
        for id in [&edge.from_state_id, &edge.to_state_id] {
            if !self.states.contains_key(id) {
                return Err(ExplorerError::UnknownState(id.clone()));
            }
        }

        let duplicate = self.edges.iter().any(|e| {
            e.from_state_id == edge.from_state_id
                && e.to_state_id == edge.to_state_id
                && e.trigger_element_id == edge.trigger_element_id
        });
        if duplicate {
            return Ok(false);
        }

        self.edges.push(edge);
        Ok(true)
    }

    pub fn element(&self, state_id: &str, element_id: &str) -> Result<&Element> {
        self.state(state_id)?
            .elements
            .get(element_id)
            .ok_or_else(|| ExplorerError::UnknownElement {
                state_id: state_id.to_string(),
                element_id: element_id.to_string(),
            })
    }

    fn element_mut(&mut self, state_id: &str, element_id: &str) -> Result<&mut Element> {
        self.state_mut(state_id)?
            .elements
            .get_mut(element_id)
            .ok_or_else(|| ExplorerError::UnknownElement {
                state_id: state_id.to_string(),
                element_id: element_id.to_string(),
            })
    }

    /// Move an element out of `Pending`. Re-applying the current status is a
    /// no-op; any other move is rejected.
    pub fn mark_element(&mut self, state_id: &str, element_id: &str, status: ElementStatus) -> Result<()> {
        let element = self.element_mut(state_id, element_id)?;
        if element.status == status {
            return Ok(());
        }
        if element.status != ElementStatus::Pending || status == ElementStatus::Pending {
            return Err(ExplorerError::InvalidStatusTransition {
                element_id: element_id.to_string(),
                from: element.status.to_string(),
                to: status.to_string(),
            });
        }
        element.status = status;
        Ok(())
    }

    pub fn annotate_element(&mut self, state_id: &str, element_id: &str, annotation: &str) -> Result<()> {
        self.element_mut(state_id, element_id)?.annotation = Some(annotation.to_string());
        Ok(())
    }

    /// All pending elements as `(state_id, element_id)`, states in discovery
    /// order.
    pub fn pending_elements(&self) -> Vec<(String, String)> {
        self.states_in_order()
            .flat_map(|s| {
                s.elements
                    .values()
                    .filter(|e| e.status == ElementStatus::Pending)
                    .map(|e| (s.id.clone(), e.id.clone()))
            })
            .collect()
    }

    pub fn status_counts(&self) -> HashMap<ElementStatus, usize> {
        let mut counts = HashMap::new();
        for element in self.states.values().flat_map(|s| s.elements.values()) {
            *counts.entry(element.status).or_insert(0) += 1;
        }
        counts
    }

    /// First-discovered edge between two states.
    pub fn edge_between(&self, from: &str, to: &str) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|e| e.from_state_id == from && e.to_state_id == to)
    }

    /// Minimum-hop state sequence from `from` to `to` (inclusive).
    ///
    /// Unweighted BFS; ties go to the edge discovered first.
    pub fn shortest_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        if !self.has_state(from) || !self.has_state(to) {
            return None;
        }
        if from == to {
            return Some(vec![from.to_string()]);
        }

        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in &self.edges {
            adjacency
                .entry(edge.from_state_id.as_str())
                .or_default()
                .push(edge.to_state_id.as_str());
        }

        let mut previous: HashMap<&str, &str> = HashMap::new();
        let mut visited: HashSet<&str> = HashSet::from([from]);
        let mut queue: VecDeque<&str> = VecDeque::from([from]);

        while let Some(node) = queue.pop_front() {
            for &next in adjacency.get(node).map(Vec::as_slice).unwrap_or(&[]) {
                if !visited.insert(next) {
                    continue;
                }
                previous.insert(next, node);
                if next == to {
                    let mut path = vec![to.to_string()];
                    let mut cursor = to;
                    while let Some(&prev) = previous.get(cursor) {
                        path.push(prev.to_string());
                        cursor = prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }
        None
    }

    // ---- Exit strategies ----

    pub fn exit_strategy(&self, from: &str, target: &str) -> Option<&LearnedExit> {
        self.states.get(from)?.exit_strategies.get(target)
    }

    pub fn exit_strategy_mut(&mut self, from: &str, target: &str) -> Option<&mut LearnedExit> {
        self.states.get_mut(from)?.exit_strategies.get_mut(target)
    }

    /// Store (or replace) the strategy for leaving `from` towards `target`.
    pub fn set_exit_strategy(&mut self, from: &str, target: &str, strategy: ExitStrategy) -> Result<()> {
        if !self.has_state(target) {
            return Err(ExplorerError::UnknownState(target.to_string()));
        }
        self.state_mut(from)?
            .exit_strategies
            .insert(target.to_string(), LearnedExit::new(strategy));
        Ok(())
    }
}
