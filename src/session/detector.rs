use crate::error::Result;
use crate::graph::geometry::BoundingBox;
use crate::visual::frame::Frame;

/// An element found on a captured frame by an external detector
/// (object detection, OCR, accessibility tree...).
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedElement {
    pub name: String,
    pub bounding_box: BoundingBox,
    pub enabled: bool,
    pub interactive: bool,
}

impl DetectedElement {
    pub fn new(name: impl Into<String>, bounding_box: BoundingBox) -> Self {
        Self {
            name: name.into(),
            bounding_box,
            enabled: true,
            interactive: true,
        }
    }
}

/// Populates the elements of a newly discovered state.
pub trait ElementDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedElement>>;
}
