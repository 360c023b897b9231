//! Capabilities the player needs from its host environment.
//!
//! The player core only talks to these traits, so the state machine and the
//! mapping pipeline run the same against the terminal host and against the
//! in-memory fakes used in tests.

use std::path::Path;

use anyhow::Result;
use image::RgbaImage;

use crate::playback::{Progress, Status};

/// Intrinsic properties of a loaded media source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaMetadata {
    pub width: u32,
    pub height: u32,
    /// Duration in seconds, 0.0 when unknown
    pub duration: f64,
}

/// A seekable playback timeline
pub trait Timeline {
    /// Start or resume advancing the position
    fn play(&mut self) -> Result<()>;

    /// Halt the position where it is
    fn pause(&mut self);

    /// Current position in seconds
    fn position(&self) -> f64;

    /// Move the position, in seconds
    fn seek(&mut self, seconds: f64) -> Result<()>;
}

/// The primary media timeline that also yields video frames
pub trait MediaSource: Timeline {
    /// Open a file, replacing any previous source
    fn load(&mut self, path: &Path) -> Result<()>;

    /// Known once the container headers have been read
    fn metadata(&self) -> Option<MediaMetadata>;

    /// Decoded frame at the current position
    fn current_frame(&mut self) -> Option<&RgbaImage>;

    /// True once the position has reached the end of the media
    fn is_finished(&self) -> bool;
}

/// Audio timeline driven alongside the media
pub trait AudioTrack: Timeline {
    fn load(&mut self, path: &Path) -> Result<()>;
}

/// Identifies one scheduled refresh tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(pub u64);

/// Refresh-aligned one-shot tick scheduling
pub trait TickScheduler {
    /// Request a single tick near the next refresh
    fn schedule(&mut self) -> TickHandle;

    /// Drop a pending tick. Unknown handles are ignored.
    fn cancel(&mut self, handle: TickHandle);
}

/// Where the player shows its text block and labels
pub trait OutputSurface {
    /// Replace the displayed text block wholesale
    fn show_frame(&mut self, text: &str);
    fn set_status(&mut self, status: Status);
    fn set_fps(&mut self, fps: u32);
    fn set_progress(&mut self, progress: &Progress);
    fn set_resolution(&mut self, width: u32, height: u32);
    fn set_grid_width(&mut self, width: u32);
    fn set_contrast(&mut self, contrast: f64);
    fn set_source_name(&mut self, name: &str);
}

/// Audio track used when no sound output is available
#[derive(Debug, Default)]
pub struct SilentAudio {
    position: f64,
}

impl Timeline for SilentAudio {
    fn play(&mut self) -> Result<()> {
        Ok(())
    }

    fn pause(&mut self) {}

    fn position(&self) -> f64 {
        self.position
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        self.position = seconds;
        Ok(())
    }
}

impl AudioTrack for SilentAudio {
    fn load(&mut self, _path: &Path) -> Result<()> {
        self.position = 0.0;
        Ok(())
    }
}
