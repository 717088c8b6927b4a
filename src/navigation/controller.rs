use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ExplorerError, NavigationError, Result};
use crate::graph::chain::ChainEntry;
use crate::graph::state_graph::ROOT_STATE_ID;
use crate::visual::verifier::VisualVerifier;

use super::context::{BacktrackContext, NavigationContext};
use super::strategies::{BacktrackStrategy, default_cascade};

// ============================================================================
// Navigation configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Wait after a backtrack action before checking arrival
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Wait after hovering a candidate safe point
    #[serde(default = "default_hover_settle_ms")]
    pub hover_settle_ms: u64,

    /// Wait after relaunching the application
    #[serde(default = "default_restart_settle_ms")]
    pub restart_settle_ms: u64,

    /// How long the operator has to respond before the app is restarted
    #[serde(default = "default_operator_timeout_secs")]
    pub operator_timeout_secs: u64,

    /// Words that mark a dialog-level dismiss control
    #[serde(default = "default_close_tokens")]
    pub close_tokens: Vec<String>,

    /// Height of the title-bar band ignored by the close-button heuristic
    #[serde(default = "default_title_bar_height")]
    pub title_bar_height: i32,

    /// Size of the top-right corner holding the application close control
    #[serde(default = "default_close_corner_width")]
    pub close_corner_width: i32,

    #[serde(default = "default_close_corner_height")]
    pub close_corner_height: i32,

    /// Slack for matching recorded clicks against element bounds
    #[serde(default = "default_hit_tolerance")]
    pub hit_tolerance: i32,

    #[serde(default = "default_escape_key")]
    pub escape_key: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            hover_settle_ms: default_hover_settle_ms(),
            restart_settle_ms: default_restart_settle_ms(),
            operator_timeout_secs: default_operator_timeout_secs(),
            close_tokens: default_close_tokens(),
            title_bar_height: default_title_bar_height(),
            close_corner_width: default_close_corner_width(),
            close_corner_height: default_close_corner_height(),
            hit_tolerance: default_hit_tolerance(),
            escape_key: default_escape_key(),
        }
    }
}

fn default_settle_ms() -> u64 { 500 }
fn default_hover_settle_ms() -> u64 { 100 }
fn default_restart_settle_ms() -> u64 { 2000 }
fn default_operator_timeout_secs() -> u64 { 10 }
fn default_close_tokens() -> Vec<String> {
    ["close", "cancel", "ok", "done"].iter().map(|s| s.to_string()).collect()
}
fn default_title_bar_height() -> i32 { 32 }
fn default_close_corner_width() -> i32 { 120 }
fn default_close_corner_height() -> i32 { 48 }
fn default_hit_tolerance() -> i32 { 4 }
fn default_escape_key() -> String { "Escape".to_string() }

// ============================================================================
// Outcomes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationOutcome {
    /// States visited, `from` and `to` included
    pub path: Vec<String>,
    pub reached: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktrackOutcome {
    /// Name of the strategy that got us there
    pub strategy: String,
    pub reached: String,
    /// Whether the application had to be relaunched on the way
    pub restarted: bool,
}

// ============================================================================
// NavigationController
// ============================================================================

/// Decides how to move between known states: forward along recorded edges,
/// or back through an ordered cascade of recovery strategies.
pub struct NavigationController {
    pub config: NavigationConfig,
    pub verifier: VisualVerifier,
    strategies: Vec<Box<dyn BacktrackStrategy>>,
}

impl NavigationController {
    pub fn new(config: NavigationConfig, verifier: VisualVerifier) -> Self {
        Self::with_strategies(config, verifier, default_cascade())
    }

    /// Controller with a custom cascade, tried in the given order.
    pub fn with_strategies(
        config: NavigationConfig,
        verifier: VisualVerifier,
        strategies: Vec<Box<dyn BacktrackStrategy>>,
    ) -> Self {
        Self {
            config,
            verifier,
            strategies,
        }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Walk the minimum-hop path of recorded edges from `from` to `to`.
    ///
    /// Each hop re-resolves its trigger element and clicks it; the first
    /// hop that does not land on the expected state aborts the walk.
    pub fn navigate_to(&self, ctx: &mut NavigationContext<'_>, from: &str, to: &str) -> Result<NavigationOutcome> {
        if from.is_empty() || to.is_empty() {
            return Err(ExplorerError::InvalidInput("navigation needs both a source and a target state".into()));
        }
        ctx.graph.state(from)?;
        ctx.graph.state(to)?;

        if *ctx.current_state != from {
            warn!(current = %ctx.current_state, from, "navigating from a state other than the current one");
        }

        let path = ctx
            .graph
            .shortest_path(from, to)
            .ok_or_else(|| NavigationError::NoPathFound {
                from: from.to_string(),
                to: to.to_string(),
            })?;
        info!(from, to, hops = path.len() - 1, "forward navigation");

        *ctx.current_state = from.to_string();
        for hop in path.windows(2) {
            let (hop_from, hop_to) = (hop[0].as_str(), hop[1].as_str());
            self.take_hop(ctx, hop_from, hop_to)?;
        }

        Ok(NavigationOutcome {
            reached: to.to_string(),
            path,
        })
    }

    fn take_hop(&self, ctx: &mut NavigationContext<'_>, from: &str, to: &str) -> Result<()> {
        let hop_failed = |trigger: &str, reason: String| NavigationError::HopFailed {
            reached: from.to_string(),
            trigger_element_id: trigger.to_string(),
            reason,
        };

        let edge = ctx
            .graph
            .edge_between(from, to)
            .cloned()
            .ok_or_else(|| hop_failed("", format!("no edge {} -> {}", from, to)))?;
        let element = ctx
            .graph
            .element(from, &edge.trigger_element_id)
            .map_err(|e| hop_failed(&edge.trigger_element_id, e.to_string()))?
            .clone();

        let origin = ctx.origin()?;
        let result = ctx
            .executor
            .execute(ctx.env.desktop.as_mut(), ctx.window, &element, origin);
        if !result.state_changed {
            let reason = result
                .error
                .unwrap_or_else(|| "click produced no state change".to_string());
            return Err(hop_failed(&edge.trigger_element_id, reason).into());
        }

        let reference = ctx.reference_frame(to)?;
        let frame = ctx.capture()?;
        if !self.verifier.is_same_state(&frame, &reference) {
            return Err(hop_failed(&edge.trigger_element_id, format!("screen does not match '{}'", to)).into());
        }

        debug!(from, to, element = %element.id, "hop confirmed");
        ctx.chain.push(ChainEntry {
            element_id: element.id.clone(),
            element_name: element.name.clone(),
            from_state_id: from.to_string(),
            to_state_id: to.to_string(),
        });
        *ctx.current_state = to.to_string();
        if to == ROOT_STATE_ID {
            ctx.chain.clear();
        }
        Ok(())
    }

    /// Return to `target` using the first strategy whose result is confirmed
    /// by the arrival check.
    pub fn navigate_back_to(&self, ctx: &mut NavigationContext<'_>, target: &str) -> Result<BacktrackOutcome> {
        if target.is_empty() {
            return Err(ExplorerError::InvalidInput("backtracking needs a target state".into()));
        }
        ctx.graph.state(target)?;

        let reference = ctx.reference_frame(target)?;
        let mut bctx = BacktrackContext::new(ctx, target, &reference, &self.config, &self.verifier);

        if bctx.arrived()? {
            bctx.nav.arrive_at(target);
            return Ok(BacktrackOutcome {
                strategy: "already_there".into(),
                reached: target.to_string(),
                restarted: false,
            });
        }
        if bctx.window_lost {
            bctx.restart_application()?;
            return self.resume_after_restart(bctx.nav, target, "window_lost");
        }

        for strategy in &self.strategies {
            info!(strategy = strategy.name(), from = %bctx.nav.current_state, target_state = target, "backtrack attempt");
            let arrived = strategy.attempt(&mut bctx)?;

            if strategy.may_close_window() && !bctx.window_lost && !bctx.restarted && !bctx.nav.window_exists() {
                bctx.window_lost = true;
            }
            if bctx.window_lost && !bctx.restarted {
                warn!(strategy = strategy.name(), "application window closed during backtrack");
                bctx.restart_application()?;
            }
            if bctx.restarted {
                return self.resume_after_restart(bctx.nav, target, strategy.name());
            }

            if arrived {
                info!(strategy = strategy.name(), target_state = target, "backtrack confirmed");
                bctx.nav.arrive_at(target);
                return Ok(BacktrackOutcome {
                    strategy: strategy.name().to_string(),
                    reached: target.to_string(),
                    restarted: false,
                });
            }
        }

        Err(NavigationError::BacktrackExhausted {
            last_state: bctx.nav.current_state.clone(),
            target: target.to_string(),
        }
        .into())
    }

    /// After a relaunch we are at root; walk forward to the target if needed.
    fn resume_after_restart(&self, ctx: &mut NavigationContext<'_>, target: &str, strategy: &str) -> Result<BacktrackOutcome> {
        if target != ROOT_STATE_ID {
            self.navigate_to(ctx, ROOT_STATE_ID, target)?;
        }
        Ok(BacktrackOutcome {
            strategy: strategy.to_string(),
            reached: target.to_string(),
            restarted: true,
        })
    }
}
