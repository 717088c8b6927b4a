use std::path::PathBuf;

use crate::error::{ExplorerError, Result};
use crate::visual::frame::Frame;

/// Persists reference captures for states. The core only ever exchanges
/// raster buffers; where they live is up to the implementation.
pub trait FrameStore {
    /// Store the reference frame for `state_id` and return its path.
    fn save_reference(&mut self, state_id: &str, frame: &Frame) -> Result<String>;
    fn load_reference(&mut self, path: &str) -> Result<Frame>;
}

/// PNG files, one per state, in a single directory.
pub struct DiskFrameStore {
    dir: PathBuf,
}

impl DiskFrameStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FrameStore for DiskFrameStore {
    fn save_reference(&mut self, state_id: &str, frame: &Frame) -> Result<String> {
        std::fs::create_dir_all(&self.dir).map_err(|e| ExplorerError::Io {
            context: format!("creating {}", self.dir.display()),
            source: e,
        })?;

        let path = self.dir.join(format!("{}.png", state_id));
        frame.image().save(&path).map_err(|e| ExplorerError::Image {
            context: format!("saving {}", path.display()),
            source: e,
        })?;
        Ok(path.display().to_string())
    }

    fn load_reference(&mut self, path: &str) -> Result<Frame> {
        load_frame(path)
    }
}

/// Decode any image file the `image` crate understands into a frame.
pub fn load_frame(path: &str) -> Result<Frame> {
    let image = image::open(path).map_err(|e| ExplorerError::Image {
        context: format!("loading {}", path),
        source: e,
    })?;
    Ok(Frame::new(image.to_rgb8()))
}
