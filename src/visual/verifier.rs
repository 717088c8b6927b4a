use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use tracing::debug;

use super::frame::{Frame, FrameHash, Region};
use super::mask::{dilate_square, external_contours, threshold_diff};

// ============================================================================
// Verifier configuration
// ============================================================================

/// Tunable constants for visual change detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Grayscale difference (0-255) above which a pixel counts as changed
    #[serde(default = "default_pixel_threshold")]
    pub pixel_threshold: u8,

    /// Contours enclosing less than this area (px²) are treated as noise
    #[serde(default = "default_min_region_area")]
    pub min_region_area: u64,

    /// Side of the square dilation kernel
    #[serde(default = "default_dilate_kernel")]
    pub dilate_kernel: u32,

    #[serde(default = "default_dilate_iterations")]
    pub dilate_iterations: u32,

    /// Side of the grayscale grid frames are reduced to before hashing
    #[serde(default = "default_hash_grid")]
    pub hash_grid: u32,

    /// Similarity percentage at or above which two frames are the same state
    #[serde(default = "default_same_state_similarity")]
    pub same_state_similarity: f64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            pixel_threshold: default_pixel_threshold(),
            min_region_area: default_min_region_area(),
            dilate_kernel: default_dilate_kernel(),
            dilate_iterations: default_dilate_iterations(),
            hash_grid: default_hash_grid(),
            same_state_similarity: default_same_state_similarity(),
        }
    }
}

fn default_pixel_threshold() -> u8 { 15 }
fn default_min_region_area() -> u64 { 500 }
fn default_dilate_kernel() -> u32 { 5 }
fn default_dilate_iterations() -> u32 { 2 }
fn default_hash_grid() -> u32 { 16 }
fn default_same_state_similarity() -> f64 { 99.0 }

/// Returned by [`VisualVerifier::extract_changed_region`] when no blob
/// survives the noise floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoChange;

// ============================================================================
// VisualVerifier
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct VisualVerifier {
    pub config: VerifierConfig,
}

impl VisualVerifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    /// Cheap identity pre-filter: equal hashes mean "nothing changed".
    pub fn hash(&self, frame: &Frame) -> FrameHash {
        let grid = self.config.hash_grid.max(1);
        let small = imageops::resize(&frame.to_gray(), grid, grid, FilterType::Triangle);

        let mut hasher = Sha1::new();
        hasher.update(small.as_raw());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest);
        FrameHash(bytes)
    }

    /// Bounding box that unions every changed contour above the noise floor.
    pub fn extract_changed_region(&self, before: &Frame, after: &Frame) -> Result<Region, NoChange> {
        let mask = threshold_diff(&before.to_gray(), &after.to_gray(), self.config.pixel_threshold);
        let dilated = dilate_square(&mask, self.config.dilate_kernel, self.config.dilate_iterations);

        let blobs = external_contours(&dilated);
        let total = blobs.len();
        let region = blobs
            .into_iter()
            .filter(|c| c.area >= self.config.min_region_area as f64)
            .map(|c| c.region)
            .reduce(|acc, r| acc.union(&r));

        match region {
            Some(region) => {
                debug!(?region, blobs = total, "changed region extracted");
                Ok(region)
            }
            None => {
                debug!(blobs = total, "no contour above noise floor");
                Err(NoChange)
            }
        }
    }

    /// Percentage (0-100) of pixels whose grayscale difference stays within
    /// the pixel threshold. `b` is resized to `a` when dimensions differ.
    pub fn similarity_percentage(&self, a: &Frame, b: &Frame) -> f64 {
        let gray_a = a.to_gray();
        let mut gray_b = b.to_gray();
        if gray_a.dimensions() != gray_b.dimensions() {
            gray_b = imageops::resize(&gray_b, gray_a.width(), gray_a.height(), FilterType::Triangle);
        }

        let total = gray_a.as_raw().len();
        if total == 0 {
            return 100.0;
        }

        let similar = gray_a
            .as_raw()
            .iter()
            .zip(gray_b.as_raw())
            .filter(|(pa, pb)| pa.abs_diff(**pb) <= self.config.pixel_threshold)
            .count();

        similar as f64 * 100.0 / total as f64
    }

    /// Similarity restricted to `region` of `a`. The region is clipped to the
    /// frame; an empty clip compares the whole frames.
    pub fn region_similarity(&self, a: &Frame, b: &Frame, region: Region) -> f64 {
        let x = region.x.min(a.width());
        let y = region.y.min(a.height());
        let width = region.width.min(a.width() - x);
        let height = region.height.min(a.height() - y);
        if width == 0 || height == 0 {
            return self.similarity_percentage(a, b);
        }

        let mut image_b = b.image().clone();
        if image_b.dimensions() != a.image().dimensions() {
            image_b = imageops::resize(&image_b, a.width(), a.height(), FilterType::Triangle);
        }
        let crop_a = imageops::crop_imm(a.image(), x, y, width, height).to_image();
        let crop_b = imageops::crop_imm(&image_b, x, y, width, height).to_image();
        self.similarity_percentage(&Frame::new(crop_a), &Frame::new(crop_b))
    }

    /// Whether two frames show the same application state.
    pub fn is_same_state(&self, a: &Frame, b: &Frame) -> bool {
        self.similarity_percentage(a, b) >= self.config.same_state_similarity
    }
}
