use ascii_video_player::prelude::*;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};
use assert_cmd::Command;
use predicates::prelude::*;

/// Helper function to create a file that is not a decodable video
fn create_dummy_video() -> std::result::Result<(TempDir, PathBuf), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let video_path = temp_dir.path().join("test_video.mp4");
    std::fs::write(&video_path, b"dummy video content")?;
    Ok((temp_dir, video_path))
}

/// Helper function to write a settings file
fn write_settings(contents: &str) -> std::result::Result<(TempDir, PathBuf), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("settings.json");
    std::fs::write(&path, contents)?;
    Ok((temp_dir, path))
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("ascii-video-player").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ASCII video player"))
        .stdout(predicate::str::contains("--contrast"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("ascii-video-player").unwrap();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_missing_file() {
    let mut cmd = Command::cargo_bin("ascii-video-player").unwrap();
    cmd.arg("nonexistent.mp4");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_invalid_width() {
    let mut cmd = Command::cargo_bin("ascii-video-player").unwrap();
    cmd.arg("--width").arg("5");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Grid width must be between 20 and 200"));
}

#[test]
fn test_cli_invalid_palette() {
    let mut cmd = Command::cargo_bin("ascii-video-player").unwrap();
    cmd.arg("--palette").arg("rainbow");
    cmd.assert().failure();
}

#[test]
fn test_cli_settings_file_validated() {
    let (_dir, settings) = write_settings(r#"{ "contrast": 9.0 }"#).unwrap();

    let mut cmd = Command::cargo_bin("ascii-video-player").unwrap();
    cmd.arg("--config").arg(&settings);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Contrast must be between"));
}

#[test]
fn test_cli_malformed_settings_file() {
    let (_dir, settings) = write_settings("{ not json").unwrap();

    let mut cmd = Command::cargo_bin("ascii-video-player").unwrap();
    cmd.arg("--config").arg(&settings);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse settings file"));
}

#[test]
fn test_cli_undecodable_file() {
    let (_dir, video_path) = create_dummy_video().unwrap();

    let mut cmd = Command::cargo_bin("ascii-video-player").unwrap();
    cmd.arg(&video_path)
        .arg("--single-frame")
        .timeout(std::time::Duration::from_secs(10));
    cmd.assert().failure();
}

#[test]
fn test_cli_without_terminal_needs_file() {
    // assert_cmd pipes stdout, so the player cannot go interactive
    let mut cmd = Command::cargo_bin("ascii-video-player").unwrap();
    cmd.timeout(std::time::Duration::from_secs(10));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Not running in a terminal"));
}

mod settings_tests {
    use super::*;

    #[test]
    fn test_load_settings_file() {
        let (_dir, path) = write_settings(
            r#"{ "grid_width": 120, "contrast": 1.5, "palette": "blocks", "loop_playback": true }"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.grid_width, 120);
        assert_eq!(settings.contrast, 1.5);
        assert_eq!(settings.palette, RampStyle::Blocks);
        assert!(settings.loop_playback);
        assert_eq!(settings.tick_rate, 60.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_missing_settings_file() {
        let dir = tempdir().unwrap();
        let result = Settings::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(AsciiPlayerError::Io(_))));
    }
}

mod pipeline_tests {
    use super::*;
    use ascii_video_player::sampler::FrameSampler;
    use image::{Rgba, RgbaImage};

    fn sample(frame: &RgbaImage, grid_width: u32, contrast: f64) -> String {
        let grid = CharacterGrid::derive(grid_width, frame.width(), frame.height()).unwrap();
        let mut sampler = FrameSampler::new();
        sampler.resize(grid);
        assert!(sampler.draw(frame));
        map_pixels(sampler.pixels(), contrast, &CharacterRamp::default())
    }

    #[test]
    fn test_full_hd_black_frame() {
        let frame = RgbaImage::from_pixel(1920, 1080, Rgba([0, 0, 0, 255]));
        let text = sample(&frame, 80, 1.0);

        assert_eq!(text.lines().count(), 22);
        assert_eq!(text.chars().count(), 22 * 81);
        assert!(text.lines().all(|line| line == " ".repeat(80)));
    }

    #[test]
    fn test_white_frame_any_contrast() {
        let frame = RgbaImage::from_pixel(640, 360, Rgba([255, 255, 255, 255]));
        for contrast in [0.1, 1.0, 3.0] {
            let text = sample(&frame, 40, contrast);
            assert_eq!(text.matches('\n').count(), 11);
            assert!(text.lines().all(|line| line == "@".repeat(40)));
        }
    }

    #[test]
    fn test_left_to_right_gradient_gets_denser() {
        let frame = RgbaImage::from_fn(200, 100, |x, _| {
            let v = (x * 255 / 199) as u8;
            Rgba([v, v, v, 255])
        });
        let text = sample(&frame, 20, 1.0);
        let ramp = CharacterRamp::default();
        let row: Vec<usize> = text
            .lines()
            .next()
            .unwrap()
            .chars()
            .map(|c| ramp.glyphs().iter().position(|g| *g == c).unwrap())
            .collect();

        assert!(row.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(row[0], 0);
        assert!(*row.last().unwrap() >= 8);
    }
}

mod playback_tests {
    use super::*;
    use ascii_video_player::Command as Transport;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(125.0), "02:05");
        assert_eq!(format_time(59.0), "00:59");
        assert_eq!(format_time(3600.0), "60:00");
    }

    #[test]
    fn test_space_and_escape_share_the_transport_path() {
        let (state, _) = transition(PlaybackState::Stopped, Transport::TogglePlayback, true);
        assert_eq!(state, PlaybackState::Playing);

        let (state, effects) = transition(state, Transport::Stop, true);
        assert_eq!(state, PlaybackState::Stopped);
        assert!(effects.contains(&Effect::ResetPositions));
        assert!(effects.contains(&Effect::CancelTick));
    }
}
