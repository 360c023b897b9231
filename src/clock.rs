use std::time::Instant;

/// Wall-clock driven playback position.
///
/// The position advances with real time while running and is clamped to the
/// media duration when one is known.
#[derive(Debug, Clone, Default)]
pub struct MediaClock {
    /// Position at the last start/seek/pause
    offset: f64,
    /// When the clock was last started, while running
    started_at: Option<Instant>,
    duration: Option<f64>,
}

impl MediaClock {
    pub fn new(duration: Option<f64>) -> Self {
        Self {
            offset: 0.0,
            started_at: None,
            duration: duration.filter(|d| d.is_finite() && *d > 0.0),
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn start_at(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    pub fn pause_at(&mut self, now: Instant) {
        self.offset = self.position_at(now);
        self.started_at = None;
    }

    pub fn pause(&mut self) {
        self.pause_at(Instant::now());
    }

    pub fn seek_at(&mut self, seconds: f64, now: Instant) {
        self.offset = self.clamp(seconds);
        if self.started_at.is_some() {
            self.started_at = Some(now);
        }
    }

    pub fn seek(&mut self, seconds: f64) {
        self.seek_at(seconds, Instant::now());
    }

    pub fn position_at(&self, now: Instant) -> f64 {
        let elapsed = self
            .started_at
            .map(|start| now.saturating_duration_since(start).as_secs_f64())
            .unwrap_or(0.0);
        self.clamp(self.offset + elapsed)
    }

    pub fn position(&self) -> f64 {
        self.position_at(Instant::now())
    }

    /// True once the position has reached a known duration
    pub fn is_at_end_at(&self, now: Instant) -> bool {
        match self.duration {
            Some(duration) => self.position_at(now) >= duration,
            None => false,
        }
    }

    fn clamp(&self, seconds: f64) -> f64 {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        match self.duration {
            Some(duration) => seconds.min(duration),
            None => seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_advances_only_while_running() {
        let t0 = Instant::now();
        let mut clock = MediaClock::new(Some(10.0));
        assert_eq!(clock.position_at(t0 + Duration::from_secs(1)), 0.0);

        clock.start_at(t0);
        assert!((clock.position_at(t0 + Duration::from_millis(1500)) - 1.5).abs() < 1e-9);

        clock.pause_at(t0 + Duration::from_secs(2));
        assert!(!clock.is_running());
        assert!((clock.position_at(t0 + Duration::from_secs(5)) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_seek_and_clamp() {
        let t0 = Instant::now();
        let mut clock = MediaClock::new(Some(4.0));
        clock.seek_at(9.0, t0);
        assert_eq!(clock.position_at(t0), 4.0);
        assert!(clock.is_at_end_at(t0));

        clock.seek_at(-1.0, t0);
        assert_eq!(clock.position_at(t0), 0.0);
        assert!(!clock.is_at_end_at(t0));
    }

    #[test]
    fn test_unknown_duration_never_ends() {
        let t0 = Instant::now();
        let mut clock = MediaClock::new(None);
        clock.start_at(t0);
        assert!(!clock.is_at_end_at(t0 + Duration::from_secs(3600)));
    }
}
