use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::graph::exit_strategy::ExitStrategy;
use crate::graph::geometry::{BoundingBox, Point};
use crate::graph::state_graph::ElementStatus;
use crate::platform::recorder::RecordingSession;

use super::context::BacktrackContext;
use super::learning::synthesize_exit_strategy;
use super::safe_area::find_safe_click_point;

/// One step of the backtracking cascade.
///
/// `attempt` acts on the application and returns `true` only once the
/// screen has been confirmed to match the target state.
pub trait BacktrackStrategy {
    fn name(&self) -> &'static str;

    /// Whether the strategy's input may have closed the application window.
    fn may_close_window(&self) -> bool {
        false
    }

    fn attempt(&self, ctx: &mut BacktrackContext<'_, '_>) -> Result<bool>;
}

/// The fixed cascade order.
pub fn default_cascade() -> Vec<Box<dyn BacktrackStrategy>> {
    vec![
        Box::new(LearnedStrategyReplay),
        Box::new(CloseButton),
        Box::new(EscapeKey),
        Box::new(ReverseChain),
        Box::new(HumanAssist),
    ]
}

// ============================================================================
// 1. Learned strategy replay
// ============================================================================

pub struct LearnedStrategyReplay;

impl BacktrackStrategy for LearnedStrategyReplay {
    fn name(&self) -> &'static str {
        "learned_strategy"
    }

    fn attempt(&self, ctx: &mut BacktrackContext<'_, '_>) -> Result<bool> {
        let from = ctx.current_state();
        let target = ctx.target;
        let Some(learned) = ctx.nav.graph.exit_strategy(&from, target).cloned() else {
            return Ok(false);
        };
        debug!(from = %from, target_state = target, kind = learned.strategy.label(), "replaying learned exit");

        let performed = match &learned.strategy {
            ExitStrategy::ClickElement { element_id } => {
                match ctx.nav.graph.element(&from, element_id) {
                    Ok(element) => {
                        let point = element.bounding_box.center();
                        ctx.click_point(point)?;
                        true
                    }
                    Err(_) => {
                        warn!(element = %element_id, "learned element no longer present");
                        false
                    }
                }
            }
            ExitStrategy::ClickCoordinates { x, y } => {
                ctx.click_point(Point::new(*x, *y))?;
                true
            }
            ExitStrategy::KeySequence { keys } => {
                for key in keys {
                    ctx.send_key(key)?;
                }
                ctx.settle();
                true
            }
            ExitStrategy::ManualNavigation => false,
        };
        if !performed {
            return Ok(false);
        }

        let arrived = ctx.arrived()?;
        if let Some(entry) = ctx.nav.graph.exit_strategy_mut(&from, target) {
            entry.record_use(arrived);
        }
        ctx.nav.save_graph()?;
        Ok(arrived)
    }
}

// ============================================================================
// 2. Close-button heuristic
// ============================================================================

pub struct CloseButton;

/// Whether `name` contains one of the dismiss tokens as a whole word.
pub fn is_dismiss_label(name: &str, tokens: &[String]) -> bool {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| tokens.iter().any(|t| t.eq_ignore_ascii_case(word)))
}

/// Whether the element sits in the title-bar band or the window's
/// top-right corner, where application-level close controls live.
pub fn in_application_chrome(bbox: &BoundingBox, window_width: u32, title_bar_height: i32, corner: (i32, i32)) -> bool {
    let center = bbox.center();
    let (corner_width, corner_height) = corner;
    center.y < title_bar_height
        || (center.x >= window_width as i32 - corner_width && center.y < corner_height)
}

impl BacktrackStrategy for CloseButton {
    fn name(&self) -> &'static str {
        "close_button"
    }

    fn may_close_window(&self) -> bool {
        true
    }

    fn attempt(&self, ctx: &mut BacktrackContext<'_, '_>) -> Result<bool> {
        let from = ctx.current_state();
        let width = ctx.nav.env.desktop.window_rect(ctx.nav.window.handle)?.width;
        let config = ctx.config;

        let buttons: Vec<(String, Point)> = ctx
            .nav
            .graph
            .state(&from)?
            .elements
            .values()
            .filter(|e| e.enabled && is_dismiss_label(&e.name, &config.close_tokens))
            .filter(|e| {
                !in_application_chrome(
                    &e.bounding_box,
                    width,
                    config.title_bar_height,
                    (config.close_corner_width, config.close_corner_height),
                )
            })
            .map(|e| (e.name.clone(), e.bounding_box.center()))
            .collect();

        for (name, point) in buttons {
            debug!(button = %name, "trying dismiss button");
            ctx.click_point(point)?;
            if ctx.arrived()? {
                return Ok(true);
            }
            if ctx.window_lost {
                return Ok(false);
            }
        }

        // Fall back to clicking somewhere inert to dismiss a popup.
        if let Some(point) = find_safe_click_point(ctx)? {
            ctx.click_point(point)?;
            return ctx.arrived();
        }
        Ok(false)
    }
}

// ============================================================================
// 3. ESC key
// ============================================================================

pub struct EscapeKey;

impl BacktrackStrategy for EscapeKey {
    fn name(&self) -> &'static str {
        "escape_key"
    }

    fn may_close_window(&self) -> bool {
        true
    }

    fn attempt(&self, ctx: &mut BacktrackContext<'_, '_>) -> Result<bool> {
        let key = ctx.config.escape_key.clone();
        ctx.send_key(&key)?;
        ctx.settle();
        ctx.arrived()
    }
}

// ============================================================================
// 4. Reverse navigation-chain replay
// ============================================================================

pub struct ReverseChain;

impl BacktrackStrategy for ReverseChain {
    fn name(&self) -> &'static str {
        "reverse_chain"
    }

    fn may_close_window(&self) -> bool {
        true
    }

    fn attempt(&self, ctx: &mut BacktrackContext<'_, '_>) -> Result<bool> {
        while let Some(entry) = ctx.nav.chain.pop() {
            let current = ctx.current_state();
            let state = ctx.nav.graph.state(&current)?;

            // Same caption visible in the current state, or the trigger
            // itself when we are still in the state it opened.
            let point = match state.find_element_by_name(&entry.element_name) {
                Some(element) => Some(element.bounding_box.center()),
                None if entry.to_state_id == current => ctx
                    .nav
                    .graph
                    .element(&entry.from_state_id, &entry.element_id)
                    .ok()
                    .map(|e| e.bounding_box.center()),
                None => None,
            };
            let Some(point) = point else {
                debug!(element = %entry.element_id, "chain trigger not present, skipped");
                continue;
            };

            debug!(element = %entry.element_id, "re-clicking chain trigger");
            ctx.click_point(point)?;
            if ctx.arrived()? {
                return Ok(true);
            }
            if ctx.window_lost {
                return Ok(false);
            }
        }
        Ok(false)
    }
}

// ============================================================================
// 5. Human assistance
// ============================================================================

/// Ask an operator to navigate, recording their clicks to learn a strategy.
/// Without a response before the timeout, or when the response does not land
/// on the target, the element that led here is retired and the application
/// restarted.
pub struct HumanAssist;

impl BacktrackStrategy for HumanAssist {
    fn name(&self) -> &'static str {
        "human_assist"
    }

    fn attempt(&self, ctx: &mut BacktrackContext<'_, '_>) -> Result<bool> {
        let from = ctx.current_state();
        let target = ctx.target;
        let timeout = Duration::from_secs(ctx.config.operator_timeout_secs);

        ctx.nav.env.operator.announce(&format!(
            "Automatic navigation failed. Please return the application from '{}' to '{}'.",
            from, target
        ));

        let (acknowledged, clicks) = {
            let recording = RecordingSession::begin(ctx.nav.env.recorder.as_mut())?;
            let acknowledged = ctx.nav.env.operator.wait_for_acknowledgement(timeout);
            (acknowledged, recording.finish())
        };

        if acknowledged {
            let origin = ctx.nav.origin()?;
            let strategy = synthesize_exit_strategy(
                ctx.nav.graph.state(&from)?,
                &clicks,
                origin,
                ctx.config.hit_tolerance,
            );
            ctx.settle();
            if ctx.arrived()? {
                info!(from = %from, target_state = target, kind = strategy.label(), "learned exit strategy");
                ctx.nav.graph.set_exit_strategy(&from, target, strategy)?;
                ctx.nav.save_graph()?;
                return Ok(true);
            }
            if ctx.window_lost {
                // The controller relaunches after a lost window.
                return Ok(false);
            }
            warn!(from = %from, target_state = target, "operator responded but target not reached, retiring trigger and restarting");
        } else {
            warn!(from = %from, "operator did not respond, retiring trigger and restarting");
        }

        let state = ctx.nav.graph.state(&from)?;
        if let (Some(parent), Some(trigger)) = (state.parent_state_id.clone(), state.trigger_element_id.clone()) {
            if let Err(e) = ctx.nav.graph.mark_element(&parent, &trigger, ElementStatus::Explored) {
                warn!("could not retire trigger element: {}", e);
            }
            ctx.nav.graph.annotate_element(&parent, &trigger, "navigation_failed")?;
            ctx.nav.save_graph()?;
        }

        ctx.restart_application()?;
        Ok(false)
    }
}
