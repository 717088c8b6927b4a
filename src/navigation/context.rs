use std::time::Duration;

use tracing::{debug, warn};

use crate::click::executor::ClickExecutor;
use crate::error::{ExplorerError, Result};
use crate::graph::chain::NavigationChain;
use crate::graph::geometry::Point;
use crate::graph::state_graph::{ROOT_STATE_ID, StateGraph};
use crate::platform::Collaborators;
use crate::platform::desktop::AppWindow;
use crate::visual::frame::Frame;
use crate::visual::verifier::VisualVerifier;

use super::controller::NavigationConfig;

/// Mutable exploration state lent to the navigation controller for one call.
///
/// Everything here is owned by the exploration session; the controller only
/// borrows it.
pub struct NavigationContext<'a> {
    pub graph: &'a mut StateGraph,
    pub chain: &'a mut NavigationChain,
    pub current_state: &'a mut String,
    pub window: &'a mut AppWindow,
    pub env: &'a mut Collaborators,
    pub executor: &'a ClickExecutor,
}

impl NavigationContext<'_> {
    /// Screen position of the window's top-left corner.
    pub fn origin(&mut self) -> Result<Point> {
        Ok(self.env.desktop.window_rect(self.window.handle)?.origin())
    }

    pub fn capture(&mut self) -> Result<Frame> {
        self.env.desktop.capture_window(self.window.handle)
    }

    pub fn window_exists(&mut self) -> bool {
        self.window.exists(self.env.desktop.as_mut())
    }

    pub fn reference_frame(&mut self, state_id: &str) -> Result<Frame> {
        let path = self.graph.state(state_id)?.reference_screenshot_path.clone();
        self.env.frames.load_reference(&path)
    }

    pub fn save_graph(&mut self) -> Result<()> {
        self.env.store.save(&*self.graph)
    }

    pub fn sleep_ms(&mut self, ms: u64) {
        self.env.desktop.sleep(Duration::from_millis(ms));
    }

    /// Record arrival at `state_id`. Reaching root clears the chain; any
    /// other state drops the hops taken after leaving it.
    pub fn arrive_at(&mut self, state_id: &str) {
        *self.current_state = state_id.to_string();
        if state_id == ROOT_STATE_ID {
            self.chain.clear();
        } else {
            self.chain.truncate_to(state_id);
        }
    }

    /// Relaunch the application and reset pathing to root.
    pub fn restart_application(&mut self, settle_ms: u64) -> Result<()> {
        warn!(from = %self.current_state, "restarting application");
        let handle = self
            .env
            .desktop
            .restart_application()
            .map_err(|e| ExplorerError::Unrecoverable(format!("restart failed: {}", e)))?;
        self.window.handle = handle;
        self.sleep_ms(settle_ms);
        self.env.desktop.focus_window(handle);

        self.chain.clear();
        *self.current_state = ROOT_STATE_ID.to_string();
        Ok(())
    }
}

/// Per-call state of one backtracking cascade.
pub struct BacktrackContext<'c, 'a> {
    pub nav: &'c mut NavigationContext<'a>,
    pub target: &'c str,
    pub config: &'c NavigationConfig,
    pub verifier: &'c VisualVerifier,
    reference: &'c Frame,

    /// Set when a check found the application window gone
    pub window_lost: bool,

    /// Set once the application has been relaunched during this cascade
    pub restarted: bool,
}

impl<'c, 'a> BacktrackContext<'c, 'a> {
    pub fn new(
        nav: &'c mut NavigationContext<'a>,
        target: &'c str,
        reference: &'c Frame,
        config: &'c NavigationConfig,
        verifier: &'c VisualVerifier,
    ) -> Self {
        Self {
            nav,
            target,
            config,
            verifier,
            reference,
            window_lost: false,
            restarted: false,
        }
    }

    pub fn current_state(&self) -> String {
        self.nav.current_state.clone()
    }

    /// Whether the screen now matches the target's reference frame.
    pub fn arrived(&mut self) -> Result<bool> {
        if !self.nav.window_exists() {
            self.window_lost = true;
            return Ok(false);
        }
        let frame = self.nav.capture()?;
        let similarity = self.verifier.similarity_percentage(&frame, self.reference);
        debug!(target_state = self.target, similarity, "arrival check");
        Ok(similarity >= self.verifier.config.same_state_similarity)
    }

    pub fn settle(&mut self) {
        self.nav.sleep_ms(self.config.settle_ms);
    }

    /// Click a window-relative point.
    pub fn click_point(&mut self, point: Point) -> Result<()> {
        let origin = self.nav.origin()?;
        self.nav
            .executor
            .click_at(self.nav.env.desktop.as_mut(), origin, point)
    }

    pub fn send_key(&mut self, key: &str) -> Result<()> {
        self.nav.env.desktop.send_key(key)
    }

    pub fn restart_application(&mut self) -> Result<()> {
        self.nav.restart_application(self.config.restart_settle_ms)?;
        self.restarted = true;
        self.window_lost = false;
        Ok(())
    }
}
