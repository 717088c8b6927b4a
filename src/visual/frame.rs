use std::fmt;

use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

/// A captured window raster (RGB, window-relative pixel coordinates).
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Uniformly coloured frame.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, image::Rgb(rgb)),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    pub fn to_gray(&self) -> GrayImage {
        image::imageops::grayscale(&self.image)
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        Self::new(image)
    }
}

/// Digest of a downsampled grayscale frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHash(pub [u8; 20]);

impl fmt::Display for FrameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Axis-aligned pixel rectangle inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Smallest region covering both.
    pub fn union(&self, other: &Region) -> Region {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Region {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}
