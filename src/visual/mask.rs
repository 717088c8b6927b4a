use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;
use imageproc::point::Point;

use super::frame::Region;

const SET: Luma<u8> = Luma([255]);
const CLEAR: Luma<u8> = Luma([0]);

/// Binary change mask: 255 where the grayscale difference exceeds
/// `threshold`, 0 elsewhere.
///
/// Frames of different sizes are compared over their common top-left area.
pub fn threshold_diff(before: &GrayImage, after: &GrayImage, threshold: u8) -> GrayImage {
    let width = before.width().min(after.width());
    let height = before.height().min(after.height());

    GrayImage::from_fn(width, height, |x, y| {
        let a = before.get_pixel(x, y).0[0];
        let b = after.get_pixel(x, y).0[0];
        if a.abs_diff(b) > threshold { SET } else { CLEAR }
    })
}

/// Dilation with a square `kernel`×`kernel` structuring element, applied
/// `iterations` times. A square kernel is the L∞ ball of radius `kernel / 2`.
pub fn dilate_square(mask: &GrayImage, kernel: u32, iterations: u32) -> GrayImage {
    let radius = (kernel / 2).min(u8::MAX as u32) as u8;
    let mut current = mask.clone();
    if radius == 0 {
        return current;
    }
    for _ in 0..iterations {
        current = dilate(&current, Norm::LInf, radius);
    }
    current
}

/// Outer contour of one blob of set pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blob {
    pub region: Region,
    /// Area enclosed by the contour polygon, in px²
    pub area: f64,
}

/// Outer contours of the mask, ignoring anything nested inside a hole.
pub fn external_contours(mask: &GrayImage) -> Vec<Blob> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .filter_map(|c| {
            let min_x = c.points.iter().map(|p| p.x).min()?;
            let min_y = c.points.iter().map(|p| p.y).min()?;
            let max_x = c.points.iter().map(|p| p.x).max()?;
            let max_y = c.points.iter().map(|p| p.y).max()?;
            Some(Blob {
                region: Region {
                    x: min_x as u32,
                    y: min_y as u32,
                    width: (max_x - min_x + 1) as u32,
                    height: (max_y - min_y + 1) as u32,
                },
                area: polygon_area(&c.points),
            })
        })
        .collect()
}

/// Shoelace area of a closed polygon.
fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice.abs() as f64 / 2.0
}
