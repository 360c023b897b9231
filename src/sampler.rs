use image::imageops::{self, FilterType};
use image::RgbaImage;
use log::debug;

use crate::grid::CharacterGrid;

/// Offscreen RGBA surface a frame is drawn into before mapping.
///
/// The surface always matches the current character grid, one pixel per cell.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    surface: RgbaImage,
    filter: FilterType,
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSampler {
    pub fn new() -> Self {
        Self {
            surface: RgbaImage::new(0, 0),
            filter: FilterType::Triangle,
        }
    }

    /// Use a different resampling filter
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Resize the backing surface to the grid, discarding its contents
    pub fn resize(&mut self, grid: CharacterGrid) {
        if self.surface.dimensions() == (grid.width, grid.height) {
            return;
        }
        debug!("Resizing pixel surface to {}x{}", grid.width, grid.height);
        self.surface = RgbaImage::new(grid.width, grid.height);
    }

    /// Draw the full frame scaled into the surface.
    ///
    /// Returns `false` without touching the surface when either side has no
    /// pixels.
    pub fn draw(&mut self, frame: &RgbaImage) -> bool {
        let (width, height) = self.surface.dimensions();
        if width == 0 || height == 0 || frame.width() == 0 || frame.height() == 0 {
            return false;
        }
        self.surface = if frame.dimensions() == (width, height) {
            frame.clone()
        } else {
            imageops::resize(frame, width, height, self.filter)
        };
        true
    }

    /// Read back the sampled pixels
    pub fn pixels(&self) -> &RgbaImage {
        &self.surface
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.surface.dimensions()
    }
}
