use image::Rgb;
use ui_explorer::graph::geometry::BoundingBox;
use ui_explorer::visual::frame::Frame;

// ============================================================================
// Synthetic screens (200x150 window)
// ============================================================================

pub const WIDTH: u32 = 200;
pub const HEIGHT: u32 = 150;
pub const BACKGROUND: [u8; 3] = [200, 200, 200];

// Root toolbar
pub const FILE_BUTTON: BoundingBox = BoundingBox { x1: 10, y1: 40, x2: 60, y2: 58 };
pub const HELP_BUTTON: BoundingBox = BoundingBox { x1: 70, y1: 40, x2: 120, y2: 58 };
pub const LOGO: BoundingBox = BoundingBox { x1: 140, y1: 40, x2: 190, y2: 58 };
pub const QUIT_BUTTON: BoundingBox = BoundingBox { x1: 140, y1: 120, x2: 190, y2: 140 };

// File menu popup and its entry
pub const FILE_MENU: BoundingBox = BoundingBox { x1: 10, y1: 60, x2: 90, y2: 140 };
pub const SETTINGS_ITEM: BoundingBox = BoundingBox { x1: 15, y1: 70, x2: 85, y2: 85 };

// About dialog and its OK button
pub const ABOUT_DIALOG: BoundingBox = BoundingBox { x1: 60, y1: 50, x2: 180, y2: 130 };
pub const ABOUT_OK: BoundingBox = BoundingBox { x1: 130, y1: 105, x2: 170, y2: 125 };

// Settings page, only left through its Back control
pub const SETTINGS_PANEL: BoundingBox = BoundingBox { x1: 20, y1: 40, x2: 180, y2: 140 };
pub const SETTINGS_BACK: BoundingBox = BoundingBox { x1: 150, y1: 120, x2: 175, y2: 135 };

pub fn blank() -> Frame {
    Frame::solid(WIDTH, HEIGHT, BACKGROUND)
}

/// Copy of `frame` with `bbox` filled in `rgb`.
pub fn paint(frame: &Frame, bbox: BoundingBox, rgb: [u8; 3]) -> Frame {
    let mut image = frame.image().clone();
    for y in bbox.y1.max(0)..bbox.y2.min(image.height() as i32) {
        for x in bbox.x1.max(0)..bbox.x2.min(image.width() as i32) {
            image.put_pixel(x as u32, y as u32, Rgb(rgb));
        }
    }
    Frame::new(image)
}

pub fn root_screen() -> Frame {
    blank()
}

pub fn file_menu_screen() -> Frame {
    paint(&root_screen(), FILE_MENU, [60, 60, 60])
}

pub fn about_screen() -> Frame {
    let dialog = paint(&root_screen(), ABOUT_DIALOG, [90, 90, 140]);
    paint(&dialog, ABOUT_OK, [240, 240, 240])
}

pub fn settings_screen() -> Frame {
    let panel = paint(&root_screen(), SETTINGS_PANEL, [40, 80, 40]);
    paint(&panel, SETTINGS_BACK, [220, 220, 60])
}
