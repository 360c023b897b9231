use ffmpeg_next as ffmpeg;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow, bail};
use image::RgbaImage;
use log::{debug, info, warn};

use crate::AsciiPlayerError;
use crate::clock::MediaClock;
use crate::host::{MediaMetadata, MediaSource, Timeline};

/// Backward jumps smaller than this are treated as decoder jitter, not seeks
const SEEK_TOLERANCE: f64 = 0.05;

/// Video decoder that extracts frames from video files
pub struct VideoDecoder {
    input_context: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: Option<(ffmpeg::software::scaling::Context, (ffmpeg::format::Pixel, u32, u32))>,
    time_base: f64,
    frame_count: u64,
    fps: f64,
    duration: f64,
    eof_sent: bool,
}

/// Represents a decoded video frame with metadata
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGBA pixels at the intrinsic size
    pub image: RgbaImage,
    /// Timestamp in seconds
    pub timestamp: f64,
}

impl VideoDecoder {
    /// Create a new VideoDecoder from a file path
    pub fn new(path: &Path) -> Result<Self> {
        // Initialize FFmpeg with error handling
        match ffmpeg::init() {
            Ok(_) => debug!("FFmpeg initialized successfully"),
            Err(e) => {
                debug!("FFmpeg init error: {:?}", e);
                // Continue anyway as this might not be fatal
            }
        }

        debug!("Attempting to open video file: {}", path.display());
        let input_context = ffmpeg::format::input(&path)
            .map_err(|e| {
                info!("FFmpeg error details: {:?}", e);
                anyhow!("Failed to open video file '{}': {}", path.display(), e)
            })?;

        // Find the best video stream
        let stream = input_context
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| AsciiPlayerError::UnsupportedFormat(
                format!("No video stream found in file '{}'", path.display())
            ))?;

        let stream_index = stream.index();

        info!("Found video stream {} in file '{}'", stream_index, path.display());

        // Create decoder context
        let context_decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| anyhow!("Failed to create codec context: {}", e))?;

        let decoder = context_decoder
            .decoder()
            .video()
            .map_err(|e| anyhow!("Failed to create video decoder: {}", e))?;

        let time_base = stream.time_base();
        let time_base = if time_base.denominator() != 0 {
            time_base.numerator() as f64 / time_base.denominator() as f64
        } else {
            0.0
        };

        // Get video metadata
        let fps = stream.avg_frame_rate();
        let fps = if fps.denominator() != 0 && fps.numerator() != 0 {
            fps.numerator() as f64 / fps.denominator() as f64
        } else {
            25.0 // Default fallback FPS
        };

        // Stream duration first, container duration as a fallback
        let duration = if stream.duration() != ffmpeg::ffi::AV_NOPTS_VALUE && stream.duration() > 0 {
            stream.duration() as f64 * time_base
        } else if input_context.duration() > 0 {
            input_context.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64
        } else {
            0.0
        };

        debug!("Video info: {}x{}, {:.2} FPS, {:.2}s duration",
               decoder.width(), decoder.height(), fps, duration);

        Ok(Self {
            input_context,
            stream_index,
            decoder,
            scaler: None,
            time_base,
            frame_count: 0,
            fps,
            duration,
            eof_sent: false,
        })
    }

    /// Get video FPS
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Get video duration in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Get video dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.decoder.width(), self.decoder.height())
    }

    /// Seek to the keyframe at or before `timestamp` seconds
    pub fn seek_to(&mut self, timestamp: f64) -> Result<()> {
        let position = (timestamp.max(0.0) * ffmpeg::ffi::AV_TIME_BASE as f64) as i64;

        self.input_context.seek(position, ..position)
            .map_err(|e| anyhow!("Failed to seek to timestamp {}: {}", timestamp, e))?;

        // Reset decoder state
        self.decoder.flush();
        self.eof_sent = false;

        debug!("Seeked to timestamp: {:.2}s", timestamp);
        Ok(())
    }

    /// Get the next frame from the video
    pub fn next_frame(&mut self) -> Result<Option<VideoFrame>> {
        let mut decoded_frame = ffmpeg::frame::Video::empty();

        loop {
            match self.decoder.receive_frame(&mut decoded_frame) {
                Ok(()) => {
                    self.frame_count += 1;
                    return self.convert_frame(&decoded_frame).map(Some);
                }
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::ffi::EAGAIN => {
                    // Need more input
                }
                Err(ffmpeg::Error::Eof) => return Ok(None),
                Err(e) => {
                    return Err(anyhow!("Failed to receive frame from decoder: {}", e));
                }
            }

            if self.eof_sent {
                return Ok(None);
            }

            match self.read_packet() {
                Some(packet) => {
                    self.decoder.send_packet(&packet)
                        .map_err(|e| anyhow!("Failed to send packet to decoder: {}", e))?;
                }
                None => {
                    // Drain whatever the decoder still holds
                    self.decoder.send_eof()
                        .map_err(|e| anyhow!("Failed to send EOF to decoder: {}", e))?;
                    self.eof_sent = true;
                }
            }
        }
    }

    /// Next packet belonging to our video stream
    fn read_packet(&mut self) -> Option<ffmpeg::Packet> {
        let stream_index = self.stream_index;
        for (stream, packet) in self.input_context.packets() {
            if stream.index() == stream_index {
                return Some(packet);
            }
        }
        None
    }

    /// Convert FFmpeg frame to an RGBA image
    fn convert_frame(&mut self, frame: &ffmpeg::frame::Video) -> Result<VideoFrame> {
        let width = frame.width();
        let height = frame.height();
        let key = (frame.format(), width, height);

        // (Re)create the scaler when the source format or size changes
        if self.scaler.as_ref().map(|(_, k)| *k) != Some(key) {
            let scaler = ffmpeg::software::scaling::Context::get(
                frame.format(),
                width,
                height,
                ffmpeg::format::Pixel::RGBA,
                width,
                height,
                ffmpeg::software::scaling::Flags::BILINEAR,
            ).map_err(|e| anyhow!("Failed to create scaling context: {}", e))?;
            self.scaler = Some((scaler, key));
        }

        let mut rgba_frame = ffmpeg::frame::Video::empty();
        if let Some((ref mut scaler, _)) = self.scaler {
            scaler.run(frame, &mut rgba_frame)
                .map_err(|e| anyhow!("Failed to scale frame: {}", e))?;
        }

        // Calculate timestamp
        let timestamp = match frame.timestamp() {
            Some(ts) if ts != ffmpeg::ffi::AV_NOPTS_VALUE && self.time_base > 0.0 => {
                ts as f64 * self.time_base
            }
            _ => (self.frame_count.saturating_sub(1)) as f64 / self.fps,
        };

        // Rows may be padded past width * 4 bytes
        let stride = rgba_frame.stride(0);
        let row_len = width as usize * 4;
        let data = rgba_frame.data(0);
        let mut pixels = Vec::with_capacity(row_len * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            pixels.extend_from_slice(&data[start..start + row_len]);
        }

        let image = RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| anyhow!("Decoded frame does not fill {}x{}", width, height))?;

        debug!("Decoded frame {}: {}x{}, timestamp: {:.3}s",
               self.frame_count, width, height, timestamp);

        Ok(VideoFrame {
            image,
            timestamp,
        })
    }
}

/// Media source backed by FFmpeg and a wall-clock timeline.
///
/// Frames are decoded lazily: asking for the current frame decodes forward
/// until the frame at the clock position, and a backward jump seeks the
/// decoder first.
#[derive(Default)]
pub struct VideoSource {
    path: Option<PathBuf>,
    decoder: Option<VideoDecoder>,
    metadata: Option<MediaMetadata>,
    clock: MediaClock,
    current: Option<VideoFrame>,
    upcoming: Option<VideoFrame>,
    exhausted: bool,
}

impl VideoSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the loaded file
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Decode forward until the current frame is the one shown at `target`
    fn advance_to(&mut self, target: f64) -> Result<()> {
        let Some(decoder) = self.decoder.as_mut() else {
            return Ok(());
        };

        let rewound = self
            .current
            .as_ref()
            .map_or(false, |frame| target + SEEK_TOLERANCE < frame.timestamp);
        if rewound {
            decoder.seek_to(target)?;
            self.current = None;
            self.upcoming = None;
            self.exhausted = false;
        }

        loop {
            if self.upcoming.is_none() && !self.exhausted {
                match decoder.next_frame()? {
                    Some(frame) => self.upcoming = Some(frame),
                    None => {
                        debug!("Reached end of video stream");
                        self.exhausted = true;
                    }
                }
            }

            let due = match &self.upcoming {
                Some(next) => self.current.is_none() || next.timestamp <= target,
                None => false,
            };
            if !due {
                return Ok(());
            }
            self.current = self.upcoming.take();
        }
    }
}

impl Timeline for VideoSource {
    fn play(&mut self) -> Result<()> {
        if self.decoder.is_none() {
            bail!("No video loaded");
        }
        self.clock.start();
        Ok(())
    }

    fn pause(&mut self) {
        self.clock.pause();
    }

    fn position(&self) -> f64 {
        self.clock.position()
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        self.clock.seek(seconds);
        Ok(())
    }
}

impl MediaSource for VideoSource {
    fn load(&mut self, path: &Path) -> Result<()> {
        // Drop the previous source even if the new one fails to open
        *self = Self::default();

        let decoder = VideoDecoder::new(path)?;
        let (width, height) = decoder.dimensions();
        let duration = decoder.duration();

        self.metadata = (width > 0 && height > 0).then_some(MediaMetadata {
            width,
            height,
            duration,
        });
        self.clock = MediaClock::new(Some(duration));
        self.decoder = Some(decoder);
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn metadata(&self) -> Option<MediaMetadata> {
        self.metadata
    }

    fn current_frame(&mut self) -> Option<&RgbaImage> {
        let target = self.clock.position();
        if let Err(e) = self.advance_to(target) {
            warn!("Failed to decode frame at {:.2}s: {:#}", target, e);
            self.exhausted = true;
        }
        self.current.as_ref().map(|frame| &frame.image)
    }

    fn is_finished(&self) -> bool {
        let duration = self.metadata.map_or(0.0, |m| m.duration);
        if duration > 0.0 {
            self.clock.position() >= duration
        } else {
            self.exhausted && self.upcoming.is_none()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_decoder_creation() {
        // This test requires a sample video file
        let test_video = PathBuf::from("tests/assets/sample.mp4");
        if test_video.exists() {
            let result = VideoDecoder::new(&test_video);
            assert!(result.is_ok(), "Failed to create decoder: {:?}", result.err());
        }
    }

    #[test]
    fn test_invalid_file() {
        let invalid_path = PathBuf::from("nonexistent.mp4");
        let result = VideoDecoder::new(&invalid_path);
        assert!(result.is_err(), "Should fail for nonexistent file");
    }

    #[test]
    fn test_unloaded_source_is_not_ready() {
        let mut source = VideoSource::new();
        assert!(source.metadata().is_none());
        assert!(source.current_frame().is_none());
        assert!(source.play().is_err());
        assert_eq!(source.position(), 0.0);
    }

    #[test]
    fn test_failed_load_clears_previous_source() {
        let mut source = VideoSource::new();
        assert!(source.load(Path::new("nonexistent.mp4")).is_err());
        assert!(source.path().is_none());
        assert!(source.metadata().is_none());
    }
}
