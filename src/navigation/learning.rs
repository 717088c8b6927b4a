use crate::graph::exit_strategy::ExitStrategy;
use crate::graph::geometry::Point;
use crate::graph::state_graph::State;

/// Turn the clicks an operator made while recovering from `state` into a
/// replayable exit strategy.
///
/// Only the last click counts: it is the one that completed the recovery.
/// A click inside one of the state's elements (within `tolerance` pixels)
/// becomes `ClickElement`, preferring the smallest enclosing element; any
/// other click becomes window-relative `ClickCoordinates`. No clicks at all
/// means the operator used something we cannot replay.
pub fn synthesize_exit_strategy(state: &State, screen_clicks: &[Point], origin: Point, tolerance: i32) -> ExitStrategy {
    let Some(last) = screen_clicks.last() else {
        return ExitStrategy::ManualNavigation;
    };
    let point = Point::new(last.x - origin.x, last.y - origin.y);

    let hit = state
        .elements
        .values()
        .filter(|e| e.bounding_box.contains(point, tolerance))
        .min_by_key(|e| e.bounding_box.area());

    match hit {
        Some(element) => ExitStrategy::ClickElement {
            element_id: element.id.clone(),
        },
        None => ExitStrategy::ClickCoordinates {
            x: point.x,
            y: point.y,
        },
    }
}
