use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use log::{debug, error, info, warn};

use crate::config::Settings;
use crate::converter::{CharacterRamp, ConversionConfig, FrameConverter};
use crate::grid::CharacterGrid;
use crate::host::{AudioTrack, MediaMetadata, MediaSource, OutputSurface, TickHandle, TickScheduler};
use crate::playback::{transition, Command, Effect, FpsCounter, PlaybackState, Progress, Status};
use crate::sampler::FrameSampler;

/// ASCII video player core.
///
/// Couples the media timeline, the audio timeline and the per-tick
/// sample → map → display pipeline. All host access goes through the
/// capability traits in [`crate::host`].
pub struct Player<M, A, S, O> {
    media: M,
    audio: A,
    scheduler: S,
    output: O,
    state: PlaybackState,
    converter: FrameConverter,
    sampler: FrameSampler,
    grid_width: u32,
    grid: Option<CharacterGrid>,
    metadata: Option<MediaMetadata>,
    pending_tick: Option<TickHandle>,
    fps: FpsCounter,
    loop_playback: bool,
}

impl<M, A, S, O> Player<M, A, S, O>
where
    M: MediaSource,
    A: AudioTrack,
    S: TickScheduler,
    O: OutputSurface,
{
    pub fn new(media: M, audio: A, scheduler: S, output: O, settings: &Settings) -> Self {
        let converter = FrameConverter::new(ConversionConfig {
            ramp: CharacterRamp::for_style(settings.palette),
            contrast: clamp_contrast(settings.contrast),
        });

        let mut player = Self {
            media,
            audio,
            scheduler,
            output,
            state: PlaybackState::Stopped,
            converter,
            sampler: FrameSampler::new(),
            grid_width: clamp_grid_width(settings.grid_width),
            grid: None,
            metadata: None,
            pending_tick: None,
            fps: FpsCounter::new(),
            loop_playback: settings.loop_playback,
        };

        player.output.set_grid_width(player.grid_width);
        player.output.set_contrast(player.converter.contrast());
        player.output.set_status(Status::SystemReady);
        player
    }

    /// Load a newly selected file. `None` (nothing selected) is ignored.
    pub fn load_file(&mut self, path: Option<&Path>) -> Result<()> {
        let Some(path) = path else {
            debug!("No file selected");
            return Ok(());
        };

        // Everything derived from the previous source is dropped
        self.cancel_tick();
        self.media.pause();
        self.audio.pause();
        self.state = PlaybackState::Stopped;
        self.metadata = None;
        self.grid = None;

        self.output.set_status(Status::Loading);
        self.output.set_source_name(&display_name(path));
        info!("Loading {}", path.display());

        if let Err(e) = self.media.load(path) {
            error!("Failed to load '{}': {:#}", path.display(), e);
            return Err(e);
        }
        if let Err(e) = self.audio.load(path) {
            warn!("No audio for '{}': {:#}", path.display(), e);
        }

        self.on_metadata_ready();
        Ok(())
    }

    /// Derive everything that depends on the media's intrinsic properties.
    ///
    /// A no-op while the metadata is still unknown.
    pub fn on_metadata_ready(&mut self) {
        let Some(metadata) = self.media.metadata() else {
            debug!("Media metadata not ready yet");
            return;
        };
        info!(
            "Media ready: {}x{}, {:.2}s",
            metadata.width, metadata.height, metadata.duration
        );

        self.metadata = Some(metadata);
        self.output.set_resolution(metadata.width, metadata.height);
        self.update_grid();
        self.output.set_status(Status::Loaded);

        self.render_frame();
        self.update_progress();
    }

    /// Apply a transport command
    pub fn command(&mut self, command: Command) {
        let (next, effects) = transition(self.state, command, self.controls_enabled());
        if next != self.state {
            info!("Playback {:?} -> {:?}", self.state, next);
        }
        self.state = next;

        for effect in effects {
            self.apply(effect);
        }
    }

    /// Handle a fired refresh tick.
    ///
    /// Only the currently pending tick is honoured; a cancelled or stale
    /// handle does nothing.
    pub fn on_tick(&mut self, handle: TickHandle, now: Instant) {
        if self.pending_tick != Some(handle) {
            debug!("Ignoring stale tick {:?}", handle);
            return;
        }
        self.pending_tick = None;

        if self.state != PlaybackState::Playing {
            return;
        }

        self.render_frame();
        if let Some(fps) = self.fps.tick(now) {
            self.output.set_fps(fps);
        }
        self.update_progress();
        self.handle_end_of_media();

        if self.state == PlaybackState::Playing {
            self.pending_tick = Some(self.scheduler.schedule());
        }
    }

    /// Change the grid width. The surface is resized and the frame redrawn.
    pub fn set_grid_width(&mut self, width: u32) {
        let width = clamp_grid_width(width);
        if width == self.grid_width {
            return;
        }
        self.grid_width = width;
        self.output.set_grid_width(width);
        self.update_grid();

        // Grid changes show at once, in every state
        self.render_frame();
    }

    pub fn adjust_grid_width(&mut self, delta: i32) {
        let width = (self.grid_width as i64 + delta as i64).max(0) as u32;
        self.set_grid_width(width);
    }

    /// Change the contrast. Takes effect on the next render.
    pub fn set_contrast(&mut self, contrast: f64) {
        let contrast = clamp_contrast(contrast);
        self.converter.set_contrast(contrast);
        self.output.set_contrast(contrast);
    }

    pub fn adjust_contrast(&mut self, delta: f64) {
        // Keep slider values on tenths
        let contrast = ((self.converter.contrast() + delta) * 10.0).round() / 10.0;
        self.set_contrast(contrast);
    }

    /// Recompute the progress bar and time label from the media position
    pub fn update_progress(&mut self) {
        let Some(metadata) = self.metadata else {
            return;
        };
        if let Some(progress) = Progress::compute(self.media.position(), metadata.duration) {
            self.output.set_progress(&progress);
        }
    }

    /// Sample the current frame and replace the displayed text block
    pub fn render_frame(&mut self) {
        let Some(grid) = self.grid else {
            return;
        };
        if grid.is_empty() {
            self.output.show_frame("");
            return;
        }
        let Some(frame) = self.media.current_frame() else {
            return;
        };
        if !self.sampler.draw(frame) {
            return;
        }
        let text = self.converter.convert(self.sampler.pixels());
        self.output.show_frame(&text);
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn grid(&self) -> Option<CharacterGrid> {
        self.grid
    }

    pub fn grid_width(&self) -> u32 {
        self.grid_width
    }

    pub fn contrast(&self) -> f64 {
        self.converter.contrast()
    }

    pub fn pending_tick(&self) -> Option<TickHandle> {
        self.pending_tick
    }

    /// Transport controls are enabled once a source's metadata is known
    pub fn controls_enabled(&self) -> bool {
        self.metadata.is_some()
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::SetStatus(status) => self.output.set_status(status),
            Effect::StartTimelines => {
                if let Err(e) = self.media.play() {
                    warn!("Failed to start media timeline: {:#}", e);
                }
                if let Err(e) = self.audio.play() {
                    warn!("Failed to start audio timeline: {:#}", e);
                }
            }
            Effect::HaltTimelines => {
                self.media.pause();
                self.audio.pause();
            }
            Effect::ResetPositions => self.seek_all(0.0),
            Effect::ScheduleTick => {
                if self.pending_tick.is_none() {
                    self.pending_tick = Some(self.scheduler.schedule());
                }
            }
            Effect::CancelTick => self.cancel_tick(),
            Effect::RenderFrame => self.render_frame(),
            Effect::RefreshProgress => self.update_progress(),
        }
    }

    fn cancel_tick(&mut self) {
        if let Some(handle) = self.pending_tick.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn seek_all(&mut self, seconds: f64) {
        if let Err(e) = self.media.seek(seconds) {
            warn!("Failed to seek media to {:.2}s: {:#}", seconds, e);
        }
        if let Err(e) = self.audio.seek(seconds) {
            warn!("Failed to seek audio to {:.2}s: {:#}", seconds, e);
        }
    }

    fn update_grid(&mut self) {
        let Some(metadata) = self.metadata else {
            return;
        };
        let Some(grid) = CharacterGrid::derive(self.grid_width, metadata.width, metadata.height)
        else {
            return;
        };
        debug!("Character grid {}x{}", grid.width, grid.height);
        self.sampler.resize(grid);
        self.grid = Some(grid);
    }

    /// At the end the last frame stays up; with looping both timelines restart
    fn handle_end_of_media(&mut self) {
        if !self.loop_playback || !self.media.is_finished() {
            return;
        }
        info!("End of media, restarting loop");
        self.seek_all(0.0);
        if let Err(e) = self.media.play() {
            warn!("Failed to restart media timeline: {:#}", e);
        }
        if let Err(e) = self.audio.play() {
            warn!("Failed to restart audio timeline: {:#}", e);
        }
    }
}

fn clamp_grid_width(width: u32) -> u32 {
    width.clamp(crate::MIN_GRID_WIDTH, crate::MAX_GRID_WIDTH)
}

fn clamp_contrast(contrast: f64) -> f64 {
    if contrast.is_nan() {
        return crate::DEFAULT_CONTRAST;
    }
    contrast.clamp(crate::MIN_CONTRAST, crate::MAX_CONTRAST)
}

/// File name for the header line, shortened when longer than 30 chars
pub fn display_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if name.chars().count() > 30 {
        let head: String = name.chars().take(27).collect();
        format!("{}...", head)
    } else {
        name
    }
}
