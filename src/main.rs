use ascii_video_player::audio::AudioOutput;
use ascii_video_player::cli::Cli;
use ascii_video_player::config::Settings;
use ascii_video_player::converter::{CharacterRamp, ConversionConfig, FrameConverter};
use ascii_video_player::decoder::{VideoDecoder, VideoSource};
use ascii_video_player::grid::CharacterGrid;
use ascii_video_player::host::MediaSource;
use ascii_video_player::input::{drain_events, InputAction, InputRouter, MAX_EVENTS_PER_TURN};
use ascii_video_player::player::Player;
use ascii_video_player::renderer::Renderer;
use ascii_video_player::sampler::FrameSampler;
use ascii_video_player::scheduler::FrameScheduler;

use clap::Parser;
use crossterm::event::{self, Event};
use anyhow::{Result, anyhow};
use log::{info, debug, error};
use std::io::Write;
use std::ops::ControlFlow;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Longest the loop waits before polling input again
const IDLE_POLL: Duration = Duration::from_millis(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging; stay quiet by default so the TUI is not overwritten
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    // Validate CLI arguments
    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid settings: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting ASCII Video Player v{}", env!("CARGO_PKG_VERSION"));

    // If info-only mode, skip terminal initialization and just get video info
    if cli.info_only {
        if let Some(path) = &cli.file_path {
            return print_info(path);
        }
    }

    let interactive = atty::is(atty::Stream::Stdout) && atty::is(atty::Stream::Stdin);
    if cli.single_frame || !interactive {
        return match &cli.file_path {
            Some(path) => print_single_frame(path, &settings),
            None => {
                error!("Not running in a terminal; pass a video file to print a single frame");
                std::process::exit(1);
            }
        };
    }

    run(&cli, &settings).await
}

/// Interactive playback until the user quits
async fn run(cli: &Cli, settings: &Settings) -> Result<()> {
    // Opened before raw mode so device warnings land on a sane terminal
    let audio = AudioOutput::open();

    let mut renderer = Renderer::new(true)?;
    renderer.init()?;

    let scheduler = FrameScheduler::new(settings.tick_rate);
    let mut player = Player::new(VideoSource::new(), audio, scheduler, renderer, settings);
    let mut input = InputRouter::new();

    if let Some(path) = &cli.file_path {
        info!("Playing: {}", path.display());
        if player.load_file(Some(path.as_path())).is_ok() && cli.autoplay {
            player.command(ascii_video_player::Command::Play);
        }
    }

    loop {
        player.output_mut().present()?;

        // A bounded batch of input events, so key repeat cannot starve ticks
        let flow = drain_events(
            MAX_EVENTS_PER_TURN,
            || {
                Ok(if event::poll(Duration::ZERO)? {
                    Some(event::read()?)
                } else {
                    None
                })
            },
            |event| {
                match event {
                    Event::Key(key_event) => match input.handle_key(key_event) {
                        InputAction::Quit => {
                            info!("Quit requested by user");
                            return Ok(ControlFlow::Break(()));
                        }
                        InputAction::Command(command) => player.command(command),
                        InputAction::AdjustGridWidth(delta) => player.adjust_grid_width(delta),
                        InputAction::AdjustContrast(delta) => player.adjust_contrast(delta),
                        InputAction::OpenFile(path) => {
                            if let Err(e) = player.load_file(path.as_deref()) {
                                debug!("Load failed: {:#}", e);
                            }
                        }
                        InputAction::PromptChanged | InputAction::Ignored => {}
                    },
                    Event::Resize(width, height) => {
                        debug!("Terminal resized to {}x{}", width, height);
                        player.output_mut().update_dimensions()?;
                    }
                    _ => {}
                }
                player.output_mut().set_prompt(input.prompt());
                Ok(ControlFlow::Continue(()))
            },
        )?;
        if flow.is_break() {
            break;
        }

        // Fire the pending refresh tick once it is due
        if let Some(handle) = player.scheduler_mut().take_due(Instant::now()) {
            player.on_tick(handle, Instant::now());
            continue;
        }

        let wait = player
            .scheduler()
            .time_until_due(Instant::now())
            .map_or(IDLE_POLL, |due| due.min(IDLE_POLL));
        sleep(wait).await;
    }

    // Cleanup
    info!("Cleaning up and exiting");
    player.output_mut().cleanup()?;
    Ok(())
}

/// Print stream information for `--info-only`
fn print_info(path: &Path) -> Result<()> {
    info!("Info-only mode: loading video information");
    let decoder = VideoDecoder::new(path)?;

    let video_fps = decoder.fps();
    let video_duration = decoder.duration();
    let (video_width, video_height) = decoder.dimensions();

    println!("Video Information:");
    println!("  File: {}", path.display());
    println!("  Dimensions: {}x{}", video_width, video_height);
    println!("  Frame Rate: {:.2} FPS", video_fps);
    println!("  Duration: {} ({:.2} seconds)",
             ascii_video_player::format_time(video_duration), video_duration);
    if video_height > 0 {
        println!("  Aspect Ratio: {:.2}", video_width as f64 / video_height as f64);
    }
    Ok(())
}

/// Render the first frame to stdout without touching the terminal mode
fn print_single_frame(path: &Path, settings: &Settings) -> Result<()> {
    let mut source = VideoSource::new();
    source.load(path)?;

    let metadata = source
        .metadata()
        .ok_or_else(|| anyhow!("Video dimensions of '{}' are unknown", path.display()))?;
    let grid = CharacterGrid::derive(settings.grid_width, metadata.width, metadata.height)
        .ok_or_else(|| anyhow!("Video dimensions of '{}' are unknown", path.display()))?;

    let mut sampler = FrameSampler::new();
    sampler.resize(grid);
    let converter = FrameConverter::new(ConversionConfig {
        ramp: CharacterRamp::for_style(settings.palette),
        contrast: settings.contrast,
    });

    let frame = source
        .current_frame()
        .ok_or_else(|| anyhow!("No frame could be decoded from '{}'", path.display()))?;
    let text = if sampler.draw(frame) {
        converter.convert(sampler.pixels())
    } else {
        String::new()
    };

    let mut stdout = std::io::stdout();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
