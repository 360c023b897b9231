//! Player settings, loaded from an optional JSON file.

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::cli::RampStyle;
use crate::{AsciiPlayerError, Result};

/// User-adjustable player settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Character grid width
    pub grid_width: u32,
    /// Contrast exponent
    pub contrast: f64,
    /// Character ramp
    pub palette: RampStyle,
    /// Restart at the end of the media
    pub loop_playback: bool,
    /// Render ticks per second
    pub tick_rate: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grid_width: crate::DEFAULT_GRID_WIDTH,
            contrast: crate::DEFAULT_CONTRAST,
            palette: RampStyle::default(),
            loop_playback: false,
            tick_rate: crate::DEFAULT_TICK_RATE,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings =
            serde_json::from_str(&content).map_err(|source| AsciiPlayerError::Settings {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("Loaded settings from {}: {:?}", path.display(), settings);
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !(crate::MIN_GRID_WIDTH..=crate::MAX_GRID_WIDTH).contains(&self.grid_width) {
            return Err(AsciiPlayerError::InvalidConfig(format!(
                "Grid width must be between {} and {}, got {}",
                crate::MIN_GRID_WIDTH,
                crate::MAX_GRID_WIDTH,
                self.grid_width
            )));
        }

        if !(crate::MIN_CONTRAST..=crate::MAX_CONTRAST).contains(&self.contrast) {
            return Err(AsciiPlayerError::InvalidConfig(format!(
                "Contrast must be between {:.1} and {:.1}, got {}",
                crate::MIN_CONTRAST,
                crate::MAX_CONTRAST,
                self.contrast
            )));
        }

        if !(self.tick_rate.is_finite() && self.tick_rate > 0.0) {
            return Err(AsciiPlayerError::InvalidConfig(
                "Tick rate must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
