use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::geometry::Point;
use crate::visual::frame::Frame;

/// Opaque handle issued by the window service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub u64);

/// Window position and size in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl WindowRect {
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// The window service, pointer/keyboard input and frame source the core
/// drives. Implementations wrap the OS; tests use a scripted fake.
///
/// All pointer coordinates are screen coordinates. Callers convert from
/// window-relative positions by adding the window origin.
pub trait Desktop {
    fn find_window(&mut self, title_pattern: &str) -> Option<WindowHandle>;
    fn window_rect(&mut self, handle: WindowHandle) -> Result<WindowRect>;
    fn focus_window(&mut self, handle: WindowHandle) -> bool;
    fn set_cursor_position(&mut self, x: i32, y: i32) -> Result<()>;
    fn click(&mut self, x: i32, y: i32) -> Result<()>;
    fn send_key(&mut self, key: &str) -> Result<()>;
    fn capture_window(&mut self, handle: WindowHandle) -> Result<Frame>;

    /// Close whatever is left of the target application, launch it again
    /// and return the new main window.
    fn restart_application(&mut self) -> Result<WindowHandle>;

    /// Block while the UI settles.
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// The application window under exploration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppWindow {
    pub handle: WindowHandle,
    pub title_pattern: String,
}

impl AppWindow {
    pub fn new(handle: WindowHandle, title_pattern: impl Into<String>) -> Self {
        Self {
            handle,
            title_pattern: title_pattern.into(),
        }
    }

    /// Whether the window service can still find the application.
    pub fn exists(&self, desktop: &mut dyn Desktop) -> bool {
        desktop.find_window(&self.title_pattern).is_some()
    }
}
