//! Frame clock, frame-rate cap and FPS reporting.

use std::time::{Duration, Instant};

/// Tracks delta time between frames.
#[derive(Debug)]
pub struct FrameClock {
    last_tick: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
        }
    }

    /// Seconds since the previous tick; advances the clock.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> f32 {
        let delta = now.saturating_duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        delta
    }

    pub fn reset(&mut self) {
        self.last_tick = Instant::now();
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-rate frame scheduler. `None` interval means uncapped.
#[derive(Debug)]
pub struct FrameLimiter {
    interval: Option<Duration>,
    next: Instant,
}

impl FrameLimiter {
    pub fn new(max_fps: u32) -> Self {
        let interval = (max_fps > 0).then(|| Duration::from_secs_f64(1.0 / f64::from(max_fps)));
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// `true` when a frame is due at `now`; schedules the following one.
    pub fn ready(&mut self, now: Instant) -> bool {
        let Some(interval) = self.interval else {
            return true;
        };
        if now < self.next {
            return false;
        }
        self.next += interval;
        // Fell behind by more than a frame: restart the schedule from now.
        if self.next <= now {
            self.next = now + interval;
        }
        true
    }

    /// When the next frame is due, or `None` if uncapped.
    pub fn deadline(&self) -> Option<Instant> {
        self.interval.map(|_| self.next)
    }
}

/// Counts frames and yields the rate once per `period`.
#[derive(Debug)]
pub struct FpsCounter {
    period: Duration,
    window_start: Instant,
    frames: u32,
}

impl FpsCounter {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            window_start: Instant::now(),
            frames: 0,
        }
    }

    pub fn frame(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.period {
            return None;
        }
        let fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.window_start = now;
        Some(fps)
    }
}
