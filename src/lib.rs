//! ASCII Video Player - live ASCII art playback of video files in the terminal
//!
//! Frames are sampled at refresh-tick cadence, downsampled to a small
//! character grid and mapped through a luminance ramp, while the audio track
//! runs on the same playback clock. The player core talks to its host through
//! the capability traits in [`host`], so the terminal front end in `main.rs`
//! is only one possible host.

pub mod audio;
pub mod cli;
pub mod clock;
pub mod config;
pub mod converter;
pub mod decoder;
pub mod grid;
pub mod host;
pub mod input;
pub mod playback;
pub mod player;
pub mod renderer;
pub mod sampler;
pub mod scheduler;

use std::path::PathBuf;

pub use cli::{Cli, RampStyle};
pub use config::Settings;
pub use converter::{map_pixels, CharacterRamp, ConversionConfig, FrameConverter};
pub use grid::CharacterGrid;
pub use host::{AudioTrack, MediaMetadata, MediaSource, OutputSurface, TickHandle, TickScheduler, Timeline};
pub use playback::{format_time, transition, Command, Effect, PlaybackState, Progress, Status};
pub use player::Player;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name
pub const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");

/// Default ASCII character ramp for luminance mapping
pub const DEFAULT_ASCII_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Extended ASCII character ramp with more granular detail
pub const EXTENDED_ASCII_RAMP: &[char] = &[
    ' ', '`', '.', '\'', '^', '"', ',', ':', ';', 'I', 'l', '!', 'i', '>', '<',
    '~', '+', '_', '-', '?', ']', '[', '}', '{', '1', ')', '(', '|', '\\', '/',
    't', 'f', 'j', 'r', 'x', 'n', 'u', 'v', 'c', 'z', 'X', 'Y', 'U', 'J', 'C',
    'L', 'Q', '0', 'O', 'Z', 'm', 'w', 'q', 'p', 'd', 'b', 'k', 'h', 'a', 'o',
    '*', '#', 'M', 'W', '&', '8', '%', 'B', '@'
];

/// Block character ramp for a more solid appearance
pub const BLOCK_ASCII_RAMP: &[char] = &[' ', '░', '▒', '▓', '█'];

pub const DEFAULT_GRID_WIDTH: u32 = 80;
pub const MIN_GRID_WIDTH: u32 = 20;
pub const MAX_GRID_WIDTH: u32 = 200;
pub const GRID_WIDTH_STEP: i32 = 5;

pub const DEFAULT_CONTRAST: f64 = 1.0;
pub const MIN_CONTRAST: f64 = 0.1;
pub const MAX_CONTRAST: f64 = 3.0;
pub const CONTRAST_STEP: f64 = 0.1;

/// Typical display refresh rate
pub const DEFAULT_TICK_RATE: f64 = 60.0;

/// Error types used throughout the application
#[derive(thiserror::Error, Debug)]
pub enum AsciiPlayerError {
    #[error("Video decoding error: {0}")]
    VideoDecoding(#[from] ffmpeg_next::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to parse settings file '{}': {source}", .path.display())]
    Settings {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, AsciiPlayerError>;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        format_time, map_pixels, transition, AsciiPlayerError, AudioTrack, CharacterGrid,
        CharacterRamp, Cli, Command, ConversionConfig, Effect, FrameConverter, MediaMetadata,
        MediaSource, OutputSurface, PlaybackState, Player, Progress, RampStyle, Result,
        Settings, Status, TickHandle, TickScheduler, Timeline,
    };
}
