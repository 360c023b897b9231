//! Playback state machine, frame-rate counter and progress display.
//!
//! [`transition`] is a pure function: it decides the next state and the list
//! of [`Effect`]s, and the player applies those effects to its host.

use std::fmt;
use std::time::{Duration, Instant};

/// Window after which the measured frame rate is reported
pub const FPS_WINDOW: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Transport commands, shared by the transport keys and the shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    Stop,
    /// Pause when playing, play otherwise
    TogglePlayback,
}

impl Command {
    /// Resolve [`Command::TogglePlayback`] against the current state
    pub fn resolve(self, state: PlaybackState) -> Command {
        match self {
            Command::TogglePlayback if state == PlaybackState::Playing => Command::Pause,
            Command::TogglePlayback => Command::Play,
            other => other,
        }
    }
}

/// Text of the status label. Only positive states are ever shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    SystemReady,
    Loading,
    Loaded,
    Playing,
    Paused,
    Stopped,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::SystemReady => "SYSTEM READY",
            Status::Loading => "LOADING",
            Status::Loaded => "LOADED",
            Status::Playing => "PLAYING",
            Status::Paused => "PAUSED",
            Status::Stopped => "STOPPED",
        };
        f.write_str(label)
    }
}

/// Host work requested by a transition, applied in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    SetStatus(Status),
    /// Start the media and audio timelines together
    StartTimelines,
    /// Halt both timelines
    HaltTimelines,
    /// Seek both timelines to zero
    ResetPositions,
    ScheduleTick,
    CancelTick,
    /// Sample and map the current frame once
    RenderFrame,
    RefreshProgress,
}

/// Decide the next state for a command.
///
/// With controls disabled (nothing loaded yet) every command is ignored.
pub fn transition(
    state: PlaybackState,
    command: Command,
    controls_enabled: bool,
) -> (PlaybackState, Vec<Effect>) {
    if !controls_enabled {
        return (state, Vec::new());
    }

    match (state, command.resolve(state)) {
        (PlaybackState::Playing, Command::Play) => (state, Vec::new()),
        (_, Command::Play) => (
            PlaybackState::Playing,
            vec![
                Effect::SetStatus(Status::Playing),
                Effect::StartTimelines,
                Effect::ScheduleTick,
            ],
        ),
        (PlaybackState::Paused, Command::Pause) => (state, Vec::new()),
        (_, Command::Pause) => (
            PlaybackState::Paused,
            vec![
                Effect::SetStatus(Status::Paused),
                Effect::HaltTimelines,
                Effect::CancelTick,
            ],
        ),
        (_, Command::Stop) => (
            PlaybackState::Stopped,
            vec![
                Effect::SetStatus(Status::Stopped),
                Effect::HaltTimelines,
                Effect::ResetPositions,
                Effect::CancelTick,
                Effect::RenderFrame,
                Effect::RefreshProgress,
            ],
        ),
        (_, Command::TogglePlayback) => unreachable!("toggle is resolved above"),
    }
}

/// Rolling frames-per-second measurement over render ticks
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    window_start: Option<Instant>,
    frames: u32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one rendered frame. Returns the measured rate once per window.
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            self.frames = 0;
            return None;
        };

        self.frames += 1;
        let elapsed = now.saturating_duration_since(start);
        if elapsed < FPS_WINDOW {
            return None;
        }

        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        let fps = (self.frames as f64 * 1000.0 / elapsed_ms).round() as u32;
        self.window_start = Some(now);
        self.frames = 0;
        Some(fps)
    }
}

/// Playback progress as shown by the progress bar and time label
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub percent: f64,
    pub label: String,
}

impl Progress {
    /// Progress for a position within a duration. `None` while the duration is unknown.
    pub fn compute(position: f64, duration: f64) -> Option<Self> {
        if !(duration.is_finite() && duration > 0.0) {
            return None;
        }
        let percent = position / duration * 100.0;
        let label = format!("{} / {}", format_time(position), format_time(duration));
        Some(Self { percent, label })
    }
}

/// Format seconds as zero-padded `mm:ss`; minutes are not wrapped into hours
pub fn format_time(seconds: f64) -> String {
    let seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    };
    let mins = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{:02}:{:02}", mins, secs)
}
