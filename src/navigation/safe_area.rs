use std::time::Duration;

use tracing::debug;

use crate::error::Result;
use crate::graph::geometry::Point;
use crate::graph::state_graph::{ElementStatus, ROOT_STATE_ID};
use crate::visual::frame::FrameHash;

use super::context::BacktrackContext;

/// Find a window-relative point that is safe to click: clicking it must not
/// trigger any new action.
///
/// Preference order: centroid of a known non-interactive element in the
/// current state, a "Home"-like element of the root state, then a blank
/// header spot whose hover leaves the frame hash unchanged.
pub fn find_safe_click_point(ctx: &mut BacktrackContext<'_, '_>) -> Result<Option<Point>> {
    let current = ctx.current_state();

    let inert = ctx
        .nav
        .graph
        .state(&current)?
        .elements
        .values()
        .find(|e| e.status == ElementStatus::NonInteractive)
        .map(|e| e.bounding_box.center());
    if let Some(point) = inert {
        debug!(x = point.x, y = point.y, "safe point from non-interactive element");
        return Ok(Some(point));
    }

    let home = ctx
        .nav
        .graph
        .state(ROOT_STATE_ID)
        .ok()
        .and_then(|root| {
            root.elements
                .values()
                .find(|e| e.name.to_lowercase().contains("home"))
        })
        .map(|e| e.bounding_box.center());
    if let Some(point) = home {
        debug!(x = point.x, y = point.y, "safe point from home element");
        return Ok(Some(point));
    }

    let rect = ctx.nav.env.desktop.window_rect(ctx.nav.window.handle)?;
    let baseline = ctx.verifier.hash(&ctx.nav.capture()?);
    for spot in header_spots(rect.width, ctx.config.title_bar_height) {
        if hover_is_inert(ctx, spot, baseline)? {
            debug!(x = spot.x, y = spot.y, "safe point from blank header");
            return Ok(Some(spot));
        }
    }
    Ok(None)
}

/// Candidate blank spots just below the title bar.
pub fn header_spots(window_width: u32, title_bar_height: i32) -> Vec<Point> {
    let width = window_width as i32;
    let y = title_bar_height + 8;
    vec![
        Point::new(width / 2, y),
        Point::new(width / 3, y),
        Point::new(width * 2 / 3, y),
    ]
}

/// Hover `point` and report whether the window still hashes to `baseline`,
/// the frame captured before any spot was hovered.
fn hover_is_inert(ctx: &mut BacktrackContext<'_, '_>, point: Point, baseline: FrameHash) -> Result<bool> {
    let origin = ctx.nav.origin()?;

    ctx.nav
        .env
        .desktop
        .set_cursor_position(origin.x + point.x, origin.y + point.y)?;
    ctx.nav
        .env
        .desktop
        .sleep(Duration::from_millis(ctx.config.hover_settle_ms));

    let after = ctx.nav.capture()?;
    Ok(ctx.verifier.hash(&after) == baseline)
}
