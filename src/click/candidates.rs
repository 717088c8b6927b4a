use serde::{Deserialize, Serialize};

use crate::graph::geometry::{BoundingBox, Point};

/// Three click points for an element: the centre first, then one quarter
/// of the long dimension to either side along the midline.
///
/// Wide elements (menu bars, tab strips) spread horizontally, everything
/// else vertically.
pub fn candidate_points(bbox: &BoundingBox) -> [Point; 3] {
    let center = bbox.center();
    if bbox.width() > bbox.height() {
        let offset = bbox.width() / 4;
        [center, center.offset(-offset, 0), center.offset(offset, 0)]
    } else {
        let offset = bbox.height() / 4;
        [center, center.offset(0, -offset), center.offset(0, offset)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeDirection {
    Right,
    Down,
    Left,
    Up,
}

impl NudgeDirection {
    pub const ALL: [NudgeDirection; 4] = [
        NudgeDirection::Right,
        NudgeDirection::Down,
        NudgeDirection::Left,
        NudgeDirection::Up,
    ];

    /// Direction used for the `attempt`-th nudge (rotates through all four).
    pub fn for_attempt(attempt: usize) -> Self {
        Self::ALL[attempt % Self::ALL.len()]
    }

    pub fn apply(&self, point: Point, delta: i32) -> Point {
        match self {
            NudgeDirection::Right => point.offset(delta, 0),
            NudgeDirection::Down => point.offset(0, delta),
            NudgeDirection::Left => point.offset(-delta, 0),
            NudgeDirection::Up => point.offset(0, -delta),
        }
    }
}
