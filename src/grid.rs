/// Glyph cells are roughly twice as tall as they are wide
pub const CELL_ASPECT_CORRECTION: f64 = 0.5;

/// Target shape, in character cells, a frame is downsampled to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterGrid {
    pub width: u32,
    pub height: u32,
}

impl CharacterGrid {
    /// Derive the grid for a requested width and the media's intrinsic size.
    ///
    /// Returns `None` while the media dimensions are unknown (zero).
    pub fn derive(grid_width: u32, media_width: u32, media_height: u32) -> Option<Self> {
        if media_width == 0 || media_height == 0 {
            return None;
        }
        let aspect = media_height as f64 / media_width as f64;
        let height = (grid_width as f64 * aspect * CELL_ASPECT_CORRECTION).floor() as u32;
        Some(Self {
            width: grid_width,
            height,
        })
    }

    /// Number of cells
    pub fn cells(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// A grid with no rows or columns produces no output
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Length, in chars, of the text block for this grid (row terminators included)
    pub fn text_len(&self) -> usize {
        self.height as usize * (self.width as usize + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_hd_grid() {
        let grid = CharacterGrid::derive(80, 1920, 1080).unwrap();
        assert_eq!(grid, CharacterGrid { width: 80, height: 22 });
        assert_eq!(grid.text_len(), 22 * 81);
    }

    #[test]
    fn test_portrait_grid() {
        let grid = CharacterGrid::derive(40, 1080, 1920).unwrap();
        // floor(40 * 1.777.. * 0.5) = floor(35.55..)
        assert_eq!(grid.height, 35);
    }

    #[test]
    fn test_unknown_dimensions() {
        assert!(CharacterGrid::derive(80, 0, 1080).is_none());
        assert!(CharacterGrid::derive(80, 1920, 0).is_none());
    }

    #[test]
    fn test_degenerate_height() {
        let grid = CharacterGrid::derive(20, 4000, 100).unwrap();
        assert_eq!(grid.height, 0);
        assert!(grid.is_empty());
        assert_eq!(grid.cells(), 0);
    }
}
