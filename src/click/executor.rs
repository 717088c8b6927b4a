use std::cell::Cell;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::graph::geometry::Point;
use crate::graph::state_graph::Element;
use crate::platform::desktop::{AppWindow, Desktop, WindowHandle};
use crate::visual::frame::{Frame, FrameHash, Region};
use crate::visual::verifier::{NoChange, VisualVerifier};

use super::candidates::{NudgeDirection, candidate_points};

// ============================================================================
// Click configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickConfig {
    /// Wait after each click before capturing the "after" frame
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Offset applied to the primary point by the nudge retry
    #[serde(default = "default_nudge_px")]
    pub nudge_px: i32,

    /// Focus requests before a click is abandoned
    #[serde(default = "default_focus_attempts")]
    pub focus_attempts: u32,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            nudge_px: default_nudge_px(),
            focus_attempts: default_focus_attempts(),
        }
    }
}

fn default_settle_ms() -> u64 { 800 }
fn default_nudge_px() -> i32 { 5 }
fn default_focus_attempts() -> u32 { 2 }

// ============================================================================
// Click result
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    StateChange,
    NonInteractive,
    /// The click closed the application window
    ApplicationClosed,
}

/// Outcome of one click attempt on an element.
///
/// `success == false` only when the click could not be performed at all
/// (focus or capture failure). A click that changed nothing is a success
/// classified as [`InteractionType::NonInteractive`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickResult {
    pub success: bool,
    pub state_changed: bool,

    /// Filled in by whoever records the resulting state
    pub new_state_id: Option<String>,

    pub interaction_type: Option<InteractionType>,
    pub error: Option<String>,

    /// Window-relative point that produced the change
    #[serde(default)]
    pub clicked_at: Option<Point>,

    #[serde(default)]
    pub changed_region: Option<Region>,
}

impl ClickResult {
    pub fn changed(clicked_at: Point, region: Region) -> Self {
        Self {
            success: true,
            state_changed: true,
            new_state_id: None,
            interaction_type: Some(InteractionType::StateChange),
            error: None,
            clicked_at: Some(clicked_at),
            changed_region: Some(region),
        }
    }

    pub fn non_interactive() -> Self {
        Self {
            success: true,
            state_changed: false,
            new_state_id: None,
            interaction_type: Some(InteractionType::NonInteractive),
            error: None,
            clicked_at: None,
            changed_region: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            state_changed: false,
            new_state_id: None,
            interaction_type: None,
            error: Some(error.to_string()),
            clicked_at: None,
            changed_region: None,
        }
    }
}

// ============================================================================
// ClickExecutor
// ============================================================================

/// Clicks elements and decides, from the captured frames, whether the click
/// produced a meaningful state change.
pub struct ClickExecutor {
    pub config: ClickConfig,
    pub verifier: VisualVerifier,
    nudges: Cell<usize>,
}

impl ClickExecutor {
    pub fn new(config: ClickConfig, verifier: VisualVerifier) -> Self {
        Self {
            config,
            verifier,
            nudges: Cell::new(0),
        }
    }

    /// Click `element` and classify the outcome.
    ///
    /// Candidates are tried in order and the first confirmed change wins.
    /// When none confirm, the primary point is nudged once and the full
    /// click-and-verify sequence repeated.
    pub fn execute(&self, desktop: &mut dyn Desktop, window: &AppWindow, element: &Element, origin: Point) -> ClickResult {
        if !self.ensure_focus(desktop, window.handle) {
            warn!(element = %element.id, "window focus failed, click skipped");
            return ClickResult::failed("window focus failed");
        }

        let before = match desktop.capture_window(window.handle) {
            Ok(frame) => frame,
            Err(e) => return ClickResult::failed(e),
        };
        let before_hash = self.verifier.hash(&before);

        let candidates = candidate_points(&element.bounding_box);
        for (index, point) in candidates.iter().enumerate() {
            debug!(element = %element.id, candidate = index, x = point.x, y = point.y, "clicking candidate");
            match self.click_and_verify(desktop, window.handle, origin, *point, &before, before_hash) {
                Ok(Some(region)) => {
                    info!(element = %element.id, candidate = index, ?region, "state change confirmed");
                    return ClickResult::changed(*point, region);
                }
                Ok(None) => continue,
                Err(e) => return ClickResult::failed(e),
            }
        }

        let direction = NudgeDirection::for_attempt(self.nudges.get());
        self.nudges.set(self.nudges.get() + 1);
        let nudged = direction.apply(candidates[0], self.config.nudge_px);
        debug!(element = %element.id, ?direction, "candidates exhausted, nudging");

        match self.click_and_verify(desktop, window.handle, origin, nudged, &before, before_hash) {
            Ok(Some(region)) => {
                info!(element = %element.id, ?region, "state change confirmed after nudge");
                ClickResult::changed(nudged, region)
            }
            Ok(None) => {
                info!(element = %element.id, "no response, classified non-interactive");
                ClickResult::non_interactive()
            }
            Err(e) => ClickResult::failed(e),
        }
    }

    /// Focus the window, retrying up to the configured number of attempts.
    pub fn ensure_focus(&self, desktop: &mut dyn Desktop, handle: WindowHandle) -> bool {
        (0..self.config.focus_attempts.max(1)).any(|_| desktop.focus_window(handle))
    }

    /// Click a window-relative point and wait for the UI to settle.
    pub fn click_at(&self, desktop: &mut dyn Desktop, origin: Point, point: Point) -> Result<()> {
        let target = origin.offset(point.x, point.y);
        desktop.set_cursor_position(target.x, target.y)?;
        desktop.click(target.x, target.y)?;
        desktop.sleep(Duration::from_millis(self.config.settle_ms));
        Ok(())
    }

    fn click_and_verify(
        &self,
        desktop: &mut dyn Desktop,
        handle: WindowHandle,
        origin: Point,
        point: Point,
        before: &Frame,
        before_hash: FrameHash,
    ) -> Result<Option<Region>> {
        self.click_at(desktop, origin, point)?;
        let after = desktop.capture_window(handle)?;

        // Equal hashes are trusted outright; unequal hashes still need a
        // region above the noise floor.
        if self.verifier.hash(&after) == before_hash {
            return Ok(None);
        }
        match self.verifier.extract_changed_region(before, &after) {
            Ok(region) => Ok(Some(region)),
            Err(NoChange) => {
                debug!(x = point.x, y = point.y, "hash changed without a region, discarded as noise");
                Ok(None)
            }
        }
    }
}
