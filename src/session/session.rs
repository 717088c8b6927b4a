use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::click::executor::{ClickExecutor, ClickResult, InteractionType};
use crate::error::{ExplorerError, NavigationError, Result};
use crate::graph::chain::{ChainEntry, NavigationChain};
use crate::graph::state_graph::{Edge, Element, ElementStatus, ROOT_STATE_ID, State, StateGraph};
use crate::navigation::context::NavigationContext;
use crate::navigation::controller::{BacktrackOutcome, NavigationController, NavigationOutcome};
use crate::platform::Collaborators;
use crate::platform::desktop::AppWindow;
use crate::trace::{logger::TraceLogger, trace::TraceEvent};
use crate::visual::frame::{Frame, Region};

use super::detector::ElementDetector;
use super::operation::{Operation, OperationResult};

// ============================================================================
// Session configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Upper bound on explore steps for `run`
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Failed click attempts before an element is given up on
    #[serde(default = "default_max_click_attempts")]
    pub max_click_attempts: u32,

    /// JSONL exploration trace; disabled when unset
    #[serde(default)]
    pub trace_path: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_click_attempts: default_max_click_attempts(),
            trace_path: None,
        }
    }
}

fn default_max_steps() -> usize { 500 }
fn default_max_click_attempts() -> u32 { 3 }

// ============================================================================
// Step outcomes
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The click moved the application to `to` (`discovered` when new)
    Transition {
        element_id: String,
        from: String,
        to: String,
        discovered: bool,
    },
    NonInteractive { element_id: String },
    /// The click closed the application, which was relaunched at root
    ApplicationClosed { element_id: String },
    /// The element was retired without a usable click
    Skipped { element_id: String, reason: String },
    /// The click could not be performed; the element stays pending
    Retry { element_id: String, error: String },
    /// No pending elements remain
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorationSummary {
    pub steps: usize,
    pub states: usize,
    pub edges: usize,
    pub pending: usize,
}

// ============================================================================
// ExplorationSession
// ============================================================================

/// Owns the graph, navigation chain and current position of one exploration
/// run, and drives click → verify → record cycles over pending elements.
pub struct ExplorationSession {
    graph: StateGraph,
    chain: NavigationChain,
    current_state: String,
    window: AppWindow,
    env: Collaborators,
    detector: Box<dyn ElementDetector>,
    executor: ClickExecutor,
    controller: NavigationController,
    config: SessionConfig,
    tracer: TraceLogger,
    click_attempts: HashMap<(String, String), u32>,
    step: u64,
}

impl ExplorationSession {
    /// Session over `graph`, assuming the application currently shows root.
    /// An empty graph gets its root state on the first step.
    pub fn new(
        graph: StateGraph,
        window: AppWindow,
        env: Collaborators,
        detector: Box<dyn ElementDetector>,
        executor: ClickExecutor,
        controller: NavigationController,
        config: SessionConfig,
    ) -> Self {
        let tracer = match &config.trace_path {
            Some(path) => TraceLogger::open(path),
            None => TraceLogger::disabled(),
        };
        Self {
            graph,
            chain: NavigationChain::new(),
            current_state: ROOT_STATE_ID.to_string(),
            window,
            env,
            detector,
            executor,
            controller,
            config,
            tracer,
            click_attempts: HashMap::new(),
            step: 0,
        }
    }

    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    pub fn chain(&self) -> &NavigationChain {
        &self.chain
    }

    pub fn current_state(&self) -> &str {
        &self.current_state
    }

    pub fn window(&self) -> &AppWindow {
        &self.window
    }

    /// Capture the root state if the graph does not have one yet.
    pub fn initialize(&mut self) -> Result<()> {
        if self.graph.has_state(ROOT_STATE_ID) {
            return Ok(());
        }
        let frame = self.env.desktop.capture_window(self.window.handle)?;
        let path = self.env.frames.save_reference(ROOT_STATE_ID, &frame)?;

        self.graph.add_state(State::root(path))?;
        let found = self.add_detected_elements(ROOT_STATE_ID, &frame)?;
        info!(elements = found, "root state captured");

        self.current_state = ROOT_STATE_ID.to_string();
        self.save()
    }

    /// Handle one operation. Every variant is routed here.
    pub fn dispatch(&mut self, operation: Operation) -> Result<OperationResult> {
        match operation {
            Operation::Click { state_id, element_id } => {
                self.click(&state_id, &element_id).map(OperationResult::Click)
            }
            Operation::NavigateTo { from, to } => {
                self.navigate_to(&from, &to).map(OperationResult::NavigateTo)
            }
            Operation::NavigateBack { target } => {
                self.navigate_back_to(&target).map(OperationResult::NavigateBack)
            }
            Operation::ExploreStep => self.explore_step().map(OperationResult::ExploreStep),
        }
    }

    /// Explore until nothing is pending or the step budget runs out.
    pub fn run(&mut self) -> Result<ExplorationSummary> {
        self.initialize()?;
        let mut steps = 0;
        while steps < self.config.max_steps {
            steps += 1;
            if self.explore_step()? == StepOutcome::Finished {
                break;
            }
        }

        let summary = ExplorationSummary {
            steps,
            states: self.graph.state_count(),
            edges: self.graph.edges.len(),
            pending: self.graph.pending_elements().len(),
        };
        info!(?summary, "exploration finished");
        Ok(summary)
    }

    /// Take the next pending element, move to its state and click it.
    pub fn explore_step(&mut self) -> Result<StepOutcome> {
        self.initialize()?;
        self.step += 1;

        let Some((state_id, element_id)) = self.next_pending() else {
            self.tracer
                .log(&TraceEvent::now(self.step, &self.current_state).with_outcome("finished"));
            return Ok(StepOutcome::Finished);
        };
        let trace = TraceEvent::now(self.step, &self.current_state).with_element(&element_id);
        let element = self.graph.element(&state_id, &element_id)?.clone();

        if !element.enabled {
            self.retire(&state_id, &element_id, ElementStatus::NonInteractive, "disabled")?;
            self.tracer.log(&trace.with_outcome("skipped_disabled"));
            return Ok(StepOutcome::Skipped {
                element_id,
                reason: "disabled".into(),
            });
        }

        if self.current_state != state_id {
            if let Err(e) = self.travel_to(&state_id) {
                if matches!(e, ExplorerError::Unrecoverable(_) | ExplorerError::HookInstall(_)) {
                    return Err(e);
                }
                warn!(element = %element_id, state = %state_id, "cannot reach element: {}", e);
                self.retire(&state_id, &element_id, ElementStatus::Explored, "navigation_failed")?;
                self.tracer
                    .log(&trace.with_outcome("unreachable").with_error(&e));
                return Ok(StepOutcome::Skipped {
                    element_id,
                    reason: e.to_string(),
                });
            }
        }

        let from = state_id.clone();
        let result = self.click(&state_id, &element_id)?;
        let closed_app = result.interaction_type == Some(InteractionType::ApplicationClosed);

        let (label, outcome) = if closed_app {
            ("closes_application", StepOutcome::ApplicationClosed { element_id })
        } else if !result.success {
            let error = result.error.clone().unwrap_or_default();
            ("click_failed", StepOutcome::Retry { element_id, error })
        } else if result.state_changed {
            let to = result
                .new_state_id
                .clone()
                .unwrap_or_else(|| ROOT_STATE_ID.to_string());
            let discovered = self
                .graph
                .state(&to)
                .map(|s| s.trigger_element_id.as_deref() == Some(element_id.as_str()) && s.parent_state_id.as_deref() == Some(from.as_str()))
                .unwrap_or(false);
            ("state_change", StepOutcome::Transition { element_id, from, to, discovered })
        } else {
            ("non_interactive", StepOutcome::NonInteractive { element_id })
        };

        self.tracer.log(&trace.with_click(&result).with_outcome(label));
        Ok(outcome)
    }

    /// Click an element of the current state and record what it did.
    pub fn click(&mut self, state_id: &str, element_id: &str) -> Result<ClickResult> {
        if state_id.is_empty() || element_id.is_empty() {
            return Err(ExplorerError::InvalidInput("click needs a state and an element".into()));
        }
        let element = self.graph.element(state_id, element_id)?.clone();
        if self.current_state != state_id {
            return Err(ExplorerError::InvalidInput(format!(
                "element '{}' belongs to '{}' but the application is in '{}'",
                element_id, state_id, self.current_state
            )));
        }

        if !self.window.exists(self.env.desktop.as_mut()) {
            warn!(element = element_id, "application window missing before click, restarting");
            let settle = self.controller.config.restart_settle_ms;
            self.nav_context().restart_application(settle)?;
            return Ok(ClickResult::failed("application window missing"));
        }

        let origin = match self.env.desktop.window_rect(self.window.handle) {
            Ok(rect) => rect.origin(),
            Err(e) => return self.click_failed(state_id, element_id, ClickResult::failed(e)),
        };
        let result = self
            .executor
            .execute(self.env.desktop.as_mut(), &self.window, &element, origin);

        // A click that closes the window usually surfaces as a failed capture.
        // No edge is recorded; the relaunch puts us back at root.
        if !self.window.exists(self.env.desktop.as_mut()) {
            warn!(element = element_id, "click closed the application");
            self.retire(state_id, element_id, ElementStatus::Explored, "closes_application")?;
            let settle = self.controller.config.restart_settle_ms;
            self.nav_context().restart_application(settle)?;
            return Ok(ClickResult {
                success: true,
                state_changed: false,
                new_state_id: None,
                interaction_type: Some(InteractionType::ApplicationClosed),
                error: None,
                changed_region: None,
                ..result
            });
        }

        if !result.success {
            return self.click_failed(state_id, element_id, result);
        }
        if !result.state_changed {
            self.graph
                .mark_element(state_id, element_id, ElementStatus::NonInteractive)?;
            self.save()?;
            return Ok(result);
        }
        let mut result = result;

        let frame = self.env.desktop.capture_window(self.window.handle)?;
        let to = match self.identify_state(&frame, state_id, result.changed_region)? {
            Some(existing) => existing,
            None => self.create_state(&frame, state_id, element_id)?,
        };

        self.graph.add_edge(Edge {
            from_state_id: state_id.to_string(),
            to_state_id: to.clone(),
            trigger_element_id: element_id.to_string(),
            action_label: format!("click {}", element.name),
        })?;
        self.graph
            .mark_element(state_id, element_id, ElementStatus::Explored)?;
        self.record_hop(&element, state_id, &to);
        self.save()?;

        info!(from = state_id, to = %to, element = element_id, "transition recorded");
        result.new_state_id = Some(to);
        Ok(result)
    }

    /// Forward navigation along recorded edges.
    pub fn navigate_to(&mut self, from: &str, to: &str) -> Result<NavigationOutcome> {
        let controller = &self.controller;
        let mut ctx = NavigationContext {
            graph: &mut self.graph,
            chain: &mut self.chain,
            current_state: &mut self.current_state,
            window: &mut self.window,
            env: &mut self.env,
            executor: &self.executor,
        };
        controller.navigate_to(&mut ctx, from, to)
    }

    /// Backtrack to `target` through the recovery cascade. Each attempt is
    /// traced with the strategy that settled it.
    pub fn navigate_back_to(&mut self, target: &str) -> Result<BacktrackOutcome> {
        let from = self.current_state.clone();
        let controller = &self.controller;
        let mut ctx = NavigationContext {
            graph: &mut self.graph,
            chain: &mut self.chain,
            current_state: &mut self.current_state,
            window: &mut self.window,
            env: &mut self.env,
            executor: &self.executor,
        };
        let result = controller.navigate_back_to(&mut ctx, target);
        self.tracer.backtrack(self.step, &from, &result);
        let outcome = result?;
        self.save()?;
        Ok(outcome)
    }

    // ---- internals ----

    fn nav_context(&mut self) -> NavigationContext<'_> {
        NavigationContext {
            graph: &mut self.graph,
            chain: &mut self.chain,
            current_state: &mut self.current_state,
            window: &mut self.window,
            env: &mut self.env,
            executor: &self.executor,
        }
    }

    fn save(&mut self) -> Result<()> {
        self.env.store.save(&self.graph)
    }

    /// Pending elements of the current state first, then discovery order.
    fn next_pending(&self) -> Option<(String, String)> {
        let pending = self.graph.pending_elements();
        pending
            .iter()
            .find(|(state, _)| *state == self.current_state)
            .or_else(|| pending.first())
            .cloned()
    }

    /// Forward path if one exists, otherwise back to root and forward again.
    fn travel_to(&mut self, target: &str) -> Result<()> {
        let current = self.current_state.clone();
        match self.navigate_to(&current, target) {
            Ok(_) => Ok(()),
            Err(ExplorerError::Navigation(NavigationError::NoPathFound { .. })) => {
                debug!(from = %current, target_state = target, "no forward path, backtracking to root");
                if self.current_state != ROOT_STATE_ID {
                    self.navigate_back_to(ROOT_STATE_ID)?;
                }
                if self.current_state != target {
                    let from = self.current_state.clone();
                    self.navigate_to(&from, target)?;
                }
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn click_failed(&mut self, state_id: &str, element_id: &str, result: ClickResult) -> Result<ClickResult> {
        let attempts = self
            .click_attempts
            .entry((state_id.to_string(), element_id.to_string()))
            .or_insert(0);
        *attempts += 1;
        if *attempts >= self.config.max_click_attempts {
            warn!(element = element_id, attempts = *attempts, "giving up on element");
            self.retire(state_id, element_id, ElementStatus::Explored, "click_failed")?;
        }
        Ok(result)
    }

    fn retire(&mut self, state_id: &str, element_id: &str, status: ElementStatus, annotation: &str) -> Result<()> {
        self.graph.mark_element(state_id, element_id, status)?;
        self.graph.annotate_element(state_id, element_id, annotation)?;
        self.save()
    }

    /// Match a post-click frame against known states other than the one the
    /// click started from. The whole frame must match; when the click changed
    /// a region, that region must match as well, so a small popup cannot hide
    /// behind an otherwise identical backdrop.
    fn identify_state(&mut self, frame: &Frame, from: &str, region: Option<Region>) -> Result<Option<String>> {
        let candidates: Vec<(String, String)> = self
            .graph
            .states_in_order()
            .filter(|s| s.id != from)
            .map(|s| (s.id.clone(), s.reference_screenshot_path.clone()))
            .collect();

        let verifier = &self.executor.verifier;
        let threshold = verifier.config.same_state_similarity;
        for (id, path) in candidates {
            let reference = self.env.frames.load_reference(&path)?;
            let similarity = verifier.similarity_percentage(frame, &reference);
            if similarity < threshold {
                continue;
            }
            if let Some(region) = region {
                let local = verifier.region_similarity(frame, &reference, region);
                if local < threshold {
                    debug!(state = %id, similarity, local, "backdrop matches but changed region differs");
                    continue;
                }
            }
            debug!(state = %id, similarity, "frame matches known state");
            return Ok(Some(id));
        }
        Ok(None)
    }

    fn create_state(&mut self, frame: &Frame, parent: &str, trigger: &str) -> Result<String> {
        let id = self.graph.next_state_id();
        let path = self.env.frames.save_reference(&id, frame)?;
        self.graph.add_state(State::new(
            id.clone(),
            Some(parent.to_string()),
            Some(trigger.to_string()),
            path,
        ))?;
        let found = self.add_detected_elements(&id, frame)?;
        info!(state = %id, parent, elements = found, "new state discovered");
        Ok(id)
    }

    fn add_detected_elements(&mut self, state_id: &str, frame: &Frame) -> Result<usize> {
        let detected = match self.detector.detect(frame) {
            Ok(found) => found,
            Err(e) => {
                warn!(state = state_id, "element detection failed: {}", e);
                Vec::new()
            }
        };

        let state = self.graph.state_mut(state_id)?;
        for (index, found) in detected.iter().enumerate() {
            let mut element = Element::new(
                format!("{}_e{:03}", state_id, index),
                state_id,
                found.name.clone(),
                found.bounding_box,
            );
            element.enabled = found.enabled;
            element.interactive = found.interactive;
            state.add_element(element);
        }
        Ok(detected.len())
    }

    /// Keep the chain in step with a click-driven move to `to`.
    fn record_hop(&mut self, element: &Element, from: &str, to: &str) {
        if to == ROOT_STATE_ID {
            self.chain.clear();
        } else if self.chain.entries().iter().any(|e| e.from_state_id == to) {
            self.chain.truncate_to(to);
        } else {
            self.chain.push(ChainEntry {
                element_id: element.id.clone(),
                element_name: element.name.clone(),
                from_state_id: from.to_string(),
                to_state_id: to.to_string(),
            });
        }
        self.current_state = to.to_string();
    }
}
