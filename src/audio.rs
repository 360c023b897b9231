//! Audio timeline played next to the video.
//!
//! With the `audio` feature the track is decoded by rodio and played on the
//! default output device. Without it, or when no device can be opened, a
//! silent track keeps the same interface.

use std::path::Path;

use anyhow::Result;

use crate::host::{AudioTrack, SilentAudio, Timeline};

#[cfg(feature = "audio")]
pub use speaker::SpeakerAudio;

/// Whichever audio output is available on this machine
pub enum AudioOutput {
    Silent(SilentAudio),
    #[cfg(feature = "audio")]
    Speaker(SpeakerAudio),
}

impl AudioOutput {
    /// Open the default output device, falling back to silence
    pub fn open() -> Self {
        #[cfg(feature = "audio")]
        match SpeakerAudio::open() {
            Ok(speaker) => return AudioOutput::Speaker(speaker),
            Err(e) => log::warn!("Audio output unavailable, playing silently: {:#}", e),
        }

        #[cfg(not(feature = "audio"))]
        log::debug!("Built without audio support, playing silently");

        AudioOutput::Silent(SilentAudio::default())
    }

    pub fn silent() -> Self {
        AudioOutput::Silent(SilentAudio::default())
    }

    pub fn is_silent(&self) -> bool {
        matches!(self, AudioOutput::Silent(_))
    }
}

impl Timeline for AudioOutput {
    fn play(&mut self) -> Result<()> {
        match self {
            AudioOutput::Silent(track) => track.play(),
            #[cfg(feature = "audio")]
            AudioOutput::Speaker(track) => track.play(),
        }
    }

    fn pause(&mut self) {
        match self {
            AudioOutput::Silent(track) => track.pause(),
            #[cfg(feature = "audio")]
            AudioOutput::Speaker(track) => track.pause(),
        }
    }

    fn position(&self) -> f64 {
        match self {
            AudioOutput::Silent(track) => track.position(),
            #[cfg(feature = "audio")]
            AudioOutput::Speaker(track) => track.position(),
        }
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        match self {
            AudioOutput::Silent(track) => track.seek(seconds),
            #[cfg(feature = "audio")]
            AudioOutput::Speaker(track) => track.seek(seconds),
        }
    }
}

impl AudioTrack for AudioOutput {
    fn load(&mut self, path: &Path) -> Result<()> {
        match self {
            AudioOutput::Silent(track) => track.load(path),
            #[cfg(feature = "audio")]
            AudioOutput::Speaker(track) => track.load(path),
        }
    }
}

#[cfg(feature = "audio")]
mod speaker {
    use std::fs::File;
    use std::io::BufReader;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use anyhow::{anyhow, Context, Result};
    use log::debug;
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

    use crate::clock::MediaClock;
    use crate::host::{AudioTrack, Timeline};

    /// Audio track played through the default output device
    pub struct SpeakerAudio {
        // Dropping the stream stops all sound
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sink: Option<Sink>,
        path: Option<PathBuf>,
        clock: MediaClock,
    }

    impl SpeakerAudio {
        pub fn open() -> Result<Self> {
            let (stream, handle) = OutputStream::try_default()
                .map_err(|e| anyhow!("Failed to open audio output: {}", e))?;
            Ok(Self {
                _stream: stream,
                handle,
                sink: None,
                path: None,
                clock: MediaClock::default(),
            })
        }

        /// Queue the track, paused, starting `offset` seconds in
        fn queue_from(&mut self, offset: f64) -> Result<()> {
            let Some(path) = self.path.as_ref() else {
                return Ok(());
            };

            let file = File::open(path)
                .with_context(|| format!("Failed to open '{}'", path.display()))?;
            let source = Decoder::new(BufReader::new(file))
                .map_err(|e| anyhow!("Failed to decode audio in '{}': {}", path.display(), e))?;

            let sink = Sink::try_new(&self.handle)
                .map_err(|e| anyhow!("Failed to create audio sink: {}", e))?;
            sink.pause();
            sink.append(source.skip_duration(Duration::from_secs_f64(offset.max(0.0))));

            // Replacing the sink stops the previous one
            self.sink = Some(sink);
            debug!("Audio queued at {:.2}s", offset);
            Ok(())
        }
    }

    impl Timeline for SpeakerAudio {
        fn play(&mut self) -> Result<()> {
            let sink = self.sink.as_ref().ok_or_else(|| anyhow!("No audio loaded"))?;
            sink.play();
            self.clock.start();
            Ok(())
        }

        fn pause(&mut self) {
            if let Some(sink) = &self.sink {
                sink.pause();
            }
            self.clock.pause();
        }

        fn position(&self) -> f64 {
            self.clock.position()
        }

        fn seek(&mut self, seconds: f64) -> Result<()> {
            let was_running = self.clock.is_running();
            self.queue_from(seconds)?;
            self.clock.seek(seconds);
            if was_running {
                if let Some(sink) = &self.sink {
                    sink.play();
                }
            }
            Ok(())
        }
    }

    impl AudioTrack for SpeakerAudio {
        fn load(&mut self, path: &Path) -> Result<()> {
            self.sink = None;
            self.clock = MediaClock::default();
            self.path = Some(path.to_path_buf());
            self.queue_from(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_build_plays_sound() {
        // Only `--no-default-features` builds are silent
        let manifest = include_str!("../Cargo.toml");
        assert!(manifest.contains(r#"default = ["audio"]"#));
    }

    #[test]
    fn test_silent_output_tracks_seeks() {
        let mut audio = AudioOutput::silent();
        assert!(audio.is_silent());
        audio.load(Path::new("clip.mp4")).unwrap();
        audio.play().unwrap();
        audio.seek(12.5).unwrap();
        assert_eq!(audio.position(), 12.5);
        audio.seek(0.0).unwrap();
        assert_eq!(audio.position(), 0.0);
    }
}
