use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use ui_explorer::error::{ExplorerError, Result};
use ui_explorer::graph::geometry::{BoundingBox, Point};
use ui_explorer::graph::state_graph::StateGraph;
use ui_explorer::platform::Collaborators;
use ui_explorer::platform::desktop::{AppWindow, Desktop, WindowHandle, WindowRect};
use ui_explorer::platform::frame_store::FrameStore;
use ui_explorer::platform::operator::Operator;
use ui_explorer::platform::recorder::ClickRecorder;
use ui_explorer::session::detector::{DetectedElement, ElementDetector};
use ui_explorer::visual::frame::Frame;

// ============================================================================
// Scripted application
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Goto(String),
    CloseWindow,
}

pub fn goto(screen: &str) -> Effect {
    Effect::Goto(screen.to_string())
}

/// A fake application: named screens plus click zones and key bindings that
/// move between them.
pub struct FakeApp {
    pub screens: HashMap<String, Frame>,
    pub current: String,
    pub home: String,
    zones: Vec<(String, BoundingBox, Effect)>,
    keys: Vec<(String, String, Effect)>,
    hovers: Vec<(String, BoundingBox, String)>,
    /// Overlay shown while the cursor rests on a hover zone: (screen, overlay)
    hovering: Option<(String, String)>,

    pub open: bool,
    pub focusable: bool,
    pub restart_fails: bool,
    pub origin: Point,
    pub handle: u64,

    /// Every click, in screen coordinates
    pub clicks: Vec<Point>,
    pub keys_sent: Vec<String>,
    pub restarts: usize,
    pub slept: Duration,
}

pub type SharedApp = Rc<RefCell<FakeApp>>;

impl FakeApp {
    pub fn new(home: &str, frame: Frame) -> Self {
        let mut screens = HashMap::new();
        screens.insert(home.to_string(), frame);
        Self {
            screens,
            current: home.to_string(),
            home: home.to_string(),
            zones: Vec::new(),
            keys: Vec::new(),
            hovers: Vec::new(),
            hovering: None,
            open: true,
            focusable: true,
            restart_fails: false,
            origin: Point::new(100, 50),
            handle: 1,
            clicks: Vec::new(),
            keys_sent: Vec::new(),
            restarts: 0,
            slept: Duration::ZERO,
        }
    }

    pub fn screen(mut self, name: &str, frame: Frame) -> Self {
        self.screens.insert(name.to_string(), frame);
        self
    }

    /// Clicking inside `bbox` (window-relative) while `screen` shows applies `effect`.
    pub fn on_click(mut self, screen: &str, bbox: BoundingBox, effect: Effect) -> Self {
        self.zones.push((screen.to_string(), bbox, effect));
        self
    }

    pub fn on_key(mut self, screen: &str, key: &str, effect: Effect) -> Self {
        self.keys.push((screen.to_string(), key.to_string(), effect));
        self
    }

    /// Resting the cursor inside `bbox` while `screen` shows displays `overlay`.
    pub fn on_hover(mut self, screen: &str, bbox: BoundingBox, overlay: &str) -> Self {
        self.hovers.push((screen.to_string(), bbox, overlay.to_string()));
        self
    }

    /// What the window currently shows, hover overlays included.
    pub fn visible(&self) -> Frame {
        match &self.hovering {
            Some((screen, overlay)) if *screen == self.current => self.frame(overlay),
            _ => self.frame(&self.current),
        }
    }

    /// Move the cursor to a screen position.
    pub fn hover(&mut self, at: Point) {
        let local = Point::new(at.x - self.origin.x, at.y - self.origin.y);
        self.hovering = self
            .hovers
            .iter()
            .find(|(screen, bbox, _)| *screen == self.current && bbox.contains(local, 0))
            .map(|(screen, _, overlay)| (screen.clone(), overlay.clone()));
    }

    pub fn frame(&self, screen: &str) -> Frame {
        self.screens[screen].clone()
    }

    pub fn shared(self) -> SharedApp {
        Rc::new(RefCell::new(self))
    }

    /// Click at a screen position.
    pub fn click(&mut self, at: Point) {
        self.clicks.push(at);
        if !self.open {
            return;
        }
        let local = Point::new(at.x - self.origin.x, at.y - self.origin.y);
        let effect = self
            .zones
            .iter()
            .find(|(screen, bbox, _)| *screen == self.current && bbox.contains(local, 0))
            .map(|(_, _, effect)| effect.clone());
        if let Some(effect) = effect {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Goto(screen) => self.current = screen,
            Effect::CloseWindow => self.open = false,
        }
    }
}

// ============================================================================
// Desktop
// ============================================================================

pub struct FakeDesktop {
    app: SharedApp,
}

impl Desktop for FakeDesktop {
    fn find_window(&mut self, _title_pattern: &str) -> Option<WindowHandle> {
        let app = self.app.borrow();
        app.open.then_some(WindowHandle(app.handle))
    }

    fn window_rect(&mut self, _handle: WindowHandle) -> Result<WindowRect> {
        let app = self.app.borrow();
        if !app.open {
            return Err(ExplorerError::Platform("window is gone".into()));
        }
        let frame = &app.screens[&app.current];
        Ok(WindowRect {
            x: app.origin.x,
            y: app.origin.y,
            width: frame.width(),
            height: frame.height(),
        })
    }

    fn focus_window(&mut self, _handle: WindowHandle) -> bool {
        let app = self.app.borrow();
        app.open && app.focusable
    }

    fn set_cursor_position(&mut self, x: i32, y: i32) -> Result<()> {
        self.app.borrow_mut().hover(Point::new(x, y));
        Ok(())
    }

    fn click(&mut self, x: i32, y: i32) -> Result<()> {
        self.app.borrow_mut().click(Point::new(x, y));
        Ok(())
    }

    fn send_key(&mut self, key: &str) -> Result<()> {
        let mut app = self.app.borrow_mut();
        app.keys_sent.push(key.to_string());
        let effect = app
            .keys
            .iter()
            .find(|(screen, k, _)| *screen == app.current && k == key)
            .map(|(_, _, effect)| effect.clone());
        if let Some(effect) = effect {
            app.apply(effect);
        }
        Ok(())
    }

    fn capture_window(&mut self, _handle: WindowHandle) -> Result<Frame> {
        let app = self.app.borrow();
        if !app.open {
            return Err(ExplorerError::Platform("window is gone".into()));
        }
        Ok(app.visible())
    }

    fn restart_application(&mut self) -> Result<WindowHandle> {
        let mut app = self.app.borrow_mut();
        if app.restart_fails {
            return Err(ExplorerError::Platform("launch failed".into()));
        }
        app.restarts += 1;
        app.handle += 1;
        app.open = true;
        app.current = app.home.clone();
        app.hovering = None;
        Ok(WindowHandle(app.handle))
    }

    fn sleep(&mut self, duration: Duration) {
        self.app.borrow_mut().slept += duration;
    }
}

// ============================================================================
// Frame store, operator, recorder, detector
// ============================================================================

pub type SharedFrames = Rc<RefCell<HashMap<String, Frame>>>;

pub struct MemoryFrameStore {
    frames: SharedFrames,
}

impl FrameStore for MemoryFrameStore {
    fn save_reference(&mut self, state_id: &str, frame: &Frame) -> Result<String> {
        let path = format!("mem://{}", state_id);
        self.frames.borrow_mut().insert(path.clone(), frame.clone());
        Ok(path)
    }

    fn load_reference(&mut self, path: &str) -> Result<Frame> {
        self.frames
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| ExplorerError::Platform(format!("no frame at {}", path)))
    }
}

/// Operator that either ignores the request or performs scripted clicks
/// (window-relative) and acknowledges.
pub struct ScriptedOperator {
    app: SharedApp,
    acknowledge: bool,
    clicks: Vec<Point>,
    announcements: Rc<RefCell<Vec<String>>>,
}

impl Operator for ScriptedOperator {
    fn announce(&mut self, message: &str) {
        self.announcements.borrow_mut().push(message.to_string());
    }

    fn wait_for_acknowledgement(&mut self, _timeout: Duration) -> bool {
        if !self.acknowledge {
            return false;
        }
        let mut app = self.app.borrow_mut();
        for point in &self.clicks {
            let at = app.origin.offset(point.x, point.y);
            app.click(at);
        }
        true
    }
}

/// Hands back every click the fake app saw between `start` and `stop`.
pub struct FakeRecorder {
    app: SharedApp,
    started_at: Option<usize>,
}

impl ClickRecorder for FakeRecorder {
    fn start(&mut self) -> Result<()> {
        self.started_at = Some(self.app.borrow().clicks.len());
        Ok(())
    }

    fn stop(&mut self) -> Vec<Point> {
        match self.started_at.take() {
            Some(start) => self.app.borrow().clicks[start..].to_vec(),
            None => Vec::new(),
        }
    }
}

/// Reports a fixed element list per screen, recognised by exact frame.
pub struct ScreenDetector {
    app: SharedApp,
    elements: HashMap<String, Vec<DetectedElement>>,
}

impl ScreenDetector {
    pub fn new(app: &SharedApp) -> Self {
        Self {
            app: app.clone(),
            elements: HashMap::new(),
        }
    }

    pub fn with(mut self, screen: &str, elements: Vec<DetectedElement>) -> Self {
        self.elements.insert(screen.to_string(), elements);
        self
    }
}

impl ElementDetector for ScreenDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedElement>> {
        let app = self.app.borrow();
        let screen = app
            .screens
            .iter()
            .find(|(_, f)| *f == frame)
            .map(|(name, _)| name.clone());
        Ok(screen
            .and_then(|name| self.elements.get(&name).cloned())
            .unwrap_or_default())
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Collaborators wired to one fake application, with handles kept for
/// assertions after they have been boxed away.
pub struct Harness {
    pub app: SharedApp,
    pub frames: SharedFrames,
    pub saves: Rc<RefCell<Vec<StateGraph>>>,
    pub announcements: Rc<RefCell<Vec<String>>>,
    operator_acknowledges: bool,
    operator_clicks: Vec<Point>,
}

impl Harness {
    pub fn new(app: FakeApp) -> Self {
        Self {
            app: app.shared(),
            frames: Rc::new(RefCell::new(HashMap::new())),
            saves: Rc::new(RefCell::new(Vec::new())),
            announcements: Rc::new(RefCell::new(Vec::new())),
            operator_acknowledges: false,
            operator_clicks: Vec::new(),
        }
    }

    /// Operator who acknowledges after clicking `clicks` (window-relative).
    pub fn with_operator(mut self, clicks: Vec<Point>) -> Self {
        self.operator_acknowledges = true;
        self.operator_clicks = clicks;
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        let saves = self.saves.clone();
        Collaborators {
            desktop: Box::new(FakeDesktop { app: self.app.clone() }),
            frames: Box::new(MemoryFrameStore { frames: self.frames.clone() }),
            store: Box::new(move |graph: &StateGraph| {
                saves.borrow_mut().push(graph.clone());
                Ok::<(), ExplorerError>(())
            }),
            operator: Box::new(ScriptedOperator {
                app: self.app.clone(),
                acknowledge: self.operator_acknowledges,
                clicks: self.operator_clicks.clone(),
                announcements: self.announcements.clone(),
            }),
            recorder: Box::new(FakeRecorder {
                app: self.app.clone(),
                started_at: None,
            }),
        }
    }

    pub fn window(&self) -> AppWindow {
        AppWindow::new(WindowHandle(self.app.borrow().handle), "Fake App")
    }

    /// Store `screen` as the reference frame of `state_id` and return its path.
    pub fn register(&self, state_id: &str, screen: &str) -> String {
        let path = format!("mem://{}", state_id);
        let frame = self.app.borrow().frame(screen);
        self.frames.borrow_mut().insert(path.clone(), frame);
        path
    }

    pub fn current_screen(&self) -> String {
        self.app.borrow().current.clone()
    }

    pub fn show(&self, screen: &str) {
        self.app.borrow_mut().current = screen.to_string();
    }

    pub fn last_saved(&self) -> Option<StateGraph> {
        self.saves.borrow().last().cloned()
    }
}
