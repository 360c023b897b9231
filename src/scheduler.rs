use std::time::{Duration, Instant};

use log::debug;

use crate::host::{TickHandle, TickScheduler};

/// Refresh-aligned tick source for the terminal event loop.
///
/// Holds at most one pending tick. Deadlines follow a fixed cadence from the
/// previous deadline, so slow ticks arrive late instead of piling up.
#[derive(Debug)]
pub struct FrameScheduler {
    interval: Duration,
    next_id: u64,
    pending: Option<(TickHandle, Instant)>,
    last_deadline: Option<Instant>,
}

impl FrameScheduler {
    /// Scheduler firing `rate` ticks per second
    pub fn new(rate: f64) -> Self {
        let rate = if rate.is_finite() && rate > 0.0 {
            rate
        } else {
            crate::DEFAULT_TICK_RATE
        };
        Self {
            interval: Duration::from_secs_f64(1.0 / rate),
            next_id: 0,
            pending: None,
            last_deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn schedule_at(&mut self, now: Instant) -> TickHandle {
        self.next_id += 1;
        let handle = TickHandle(self.next_id);

        let deadline = match self.last_deadline {
            Some(last) if last + self.interval > now => last + self.interval,
            _ => now + self.interval,
        };
        self.pending = Some((handle, deadline));
        handle
    }

    /// Time left until the pending tick is due, if one is pending
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending
            .map(|(_, deadline)| deadline.saturating_duration_since(now))
    }

    /// Take the pending tick if its deadline has passed
    pub fn take_due(&mut self, now: Instant) -> Option<TickHandle> {
        match self.pending {
            Some((handle, deadline)) if deadline <= now => {
                self.pending = None;
                self.last_deadline = Some(deadline);
                Some(handle)
            }
            _ => None,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl TickScheduler for FrameScheduler {
    fn schedule(&mut self) -> TickHandle {
        self.schedule_at(Instant::now())
    }

    fn cancel(&mut self, handle: TickHandle) {
        if matches!(self.pending, Some((pending, _)) if pending == handle) {
            debug!("Cancelled tick {:?}", handle);
            self.pending = None;
            self.last_deadline = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_interval() {
        let t0 = Instant::now();
        let mut scheduler = FrameScheduler::new(50.0);
        let handle = scheduler.schedule_at(t0);

        assert_eq!(scheduler.take_due(t0), None);
        assert_eq!(scheduler.time_until_due(t0), Some(Duration::from_millis(20)));
        assert_eq!(scheduler.take_due(t0 + Duration::from_millis(20)), Some(handle));
        assert_eq!(scheduler.take_due(t0 + Duration::from_millis(40)), None);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_cancel_drops_pending_tick() {
        let t0 = Instant::now();
        let mut scheduler = FrameScheduler::new(60.0);
        let handle = scheduler.schedule_at(t0);
        scheduler.cancel(handle);
        assert_eq!(scheduler.take_due(t0 + Duration::from_secs(1)), None);
        assert_eq!(scheduler.time_until_due(t0), None);
    }

    #[test]
    fn test_cancel_ignores_other_handles() {
        let t0 = Instant::now();
        let mut scheduler = FrameScheduler::new(60.0);
        let old = scheduler.schedule_at(t0);
        let current = scheduler.schedule_at(t0);
        assert_ne!(old, current);

        scheduler.cancel(old);
        assert!(scheduler.has_pending());
    }

    #[test]
    fn test_cadence_follows_previous_deadline() {
        let t0 = Instant::now();
        let mut scheduler = FrameScheduler::new(50.0);
        scheduler.schedule_at(t0);
        // Fired 5ms late
        scheduler.take_due(t0 + Duration::from_millis(25)).unwrap();

        scheduler.schedule_at(t0 + Duration::from_millis(25));
        assert_eq!(
            scheduler.time_until_due(t0 + Duration::from_millis(25)),
            Some(Duration::from_millis(15))
        );
    }

    #[test]
    fn test_invalid_rate_falls_back() {
        let scheduler = FrameScheduler::new(0.0);
        assert!(scheduler.interval() > Duration::ZERO);
    }
}
