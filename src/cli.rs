use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::{AsciiPlayerError, Result};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the video file to load at startup (press `o` to open one later)
    pub file_path: Option<PathBuf>,

    /// Character grid width (20-200)
    #[arg(short, long)]
    pub width: Option<u32>,

    /// Contrast exponent (0.1-3.0, 1.0 = unchanged)
    #[arg(short, long)]
    pub contrast: Option<f64>,

    /// Character ramp to map brightness onto
    #[arg(short, long)]
    pub palette: Option<RampStyle>,

    /// Loop the video playback at the end of the media
    #[arg(short, long)]
    pub loop_playback: bool,

    /// Start playing as soon as the file is loaded
    #[arg(long)]
    pub autoplay: bool,

    /// Refresh ticks per second for the render loop
    #[arg(long, value_name = "HZ")]
    pub tick_rate: Option<f64>,

    /// JSON settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Show video information only (don't play)
    #[arg(long)]
    pub info_only: bool,

    /// Print the first frame as ASCII to stdout and exit
    #[arg(long)]
    pub single_frame: bool,
}

#[derive(clap::ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RampStyle {
    /// Ten ASCII glyphs, " .:-=+*#%@"
    #[default]
    Ascii,
    /// Seventy ASCII glyphs for finer gradients
    Extended,
    /// Unicode shade blocks
    Blocks,
}

impl Cli {
    /// Validate command line arguments
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.file_path {
            if !path.exists() {
                return Err(AsciiPlayerError::InvalidConfig(format!(
                    "Video file does not exist: {}",
                    path.display()
                )));
            }
        }

        if (self.info_only || self.single_frame) && self.file_path.is_none() {
            return Err(AsciiPlayerError::InvalidConfig(
                "A video file is required for --info-only and --single-frame".to_string(),
            ));
        }

        if let Some(config) = &self.config {
            if !config.exists() {
                return Err(AsciiPlayerError::InvalidConfig(format!(
                    "Settings file does not exist: {}",
                    config.display()
                )));
            }
        }

        Ok(())
    }

    /// Settings from the optional file, overridden by the flags given here
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        if let Some(width) = self.width {
            settings.grid_width = width;
        }
        if let Some(contrast) = self.contrast {
            settings.contrast = contrast;
        }
        if let Some(palette) = self.palette {
            settings.palette = palette;
        }
        if let Some(tick_rate) = self.tick_rate {
            settings.tick_rate = tick_rate;
        }
        settings.loop_playback |= self.loop_playback;

        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ascii-video-player").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert!(cli.file_path.is_none());
        assert!(cli.validate().is_ok());

        let settings = cli.settings().unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = parse(&["-w", "120", "-c", "1.5", "-p", "blocks", "--loop-playback"]);
        let settings = cli.settings().unwrap();
        assert_eq!(settings.grid_width, 120);
        assert_eq!(settings.contrast, 1.5);
        assert_eq!(settings.palette, RampStyle::Blocks);
        assert!(settings.loop_playback);
    }

    #[test]
    fn test_out_of_range_width() {
        let cli = parse(&["--width", "10"]);
        let err = cli.settings().unwrap_err();
        assert!(err.to_string().contains("Grid width"));
    }

    #[test]
    fn test_missing_file() {
        let cli = parse(&["nonexistent.mp4"]);
        let err = cli.validate().unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_info_only_needs_file() {
        let cli = parse(&["--info-only"]);
        assert!(cli.validate().is_err());
    }
}
