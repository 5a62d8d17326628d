//! This module provides the clock of a Chip8 emulator. The [`Clock`] struct
//! decides when the next cycle is due and owns the delay timer and the sound
//! timer, which are decremented once per executed cycle.
//!
//! The default cycle rate is 60Hz.

use std::time::{Duration, Instant};

/// Handles cycle scheduling and the [`super::Chip8`] sound and delay timers.
pub struct Clock {
    /// The current value of the delay timer.
    pub delay_timer: u8,
    /// The current value of the sound timer.
    pub sound_timer: u8,
    /// Time between two cycles.
    interval: Duration,
    /// The deadline of the next cycle. `None` until the first cycle fires.
    next_tick: Option<Instant>,
}

impl Default for Clock {
    fn default() -> Self {
        Self::with_frequency(Self::DEFAULT_FREQUENCY_HZ)
    }
}

impl Clock {
    /// The default frequency (in Hz) at which cycles are executed.
    pub const DEFAULT_FREQUENCY_HZ: u32 = 60;

    /// How far a caller may fall behind before the missed cycles are dropped
    /// and the schedule restarts from the current time.
    pub const MAX_LAG: Duration = Duration::from_millis(100);

    /// Create a new `Clock` running at [`Clock::DEFAULT_FREQUENCY_HZ`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new `Clock` running at `hz` cycles per second. A rate of zero
    /// is treated as 1Hz.
    #[must_use]
    pub fn with_frequency(hz: u32) -> Self {
        Self::with_interval(Duration::from_secs(1) / hz.max(1))
    }

    /// Create a new `Clock` with `interval` between cycles.
    #[must_use]
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            delay_timer: 0,
            sound_timer: 0,
            interval,
            next_tick: None,
        }
    }

    /// The time between two cycles.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns whether a cycle is due at `now`, and if so consumes it.
    ///
    /// The deadline advances by exactly one interval per cycle, so a caller
    /// that polls less often than the cycle rate gets one cycle per missed
    /// deadline by polling again until this returns `false`. A caller more
    /// than [`Clock::MAX_LAG`] behind is re-anchored to `now` instead.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_tick {
            Some(deadline) if now < deadline => false,
            Some(deadline) => {
                let next = deadline + self.interval;
                self.next_tick = Some(if now.saturating_duration_since(next) > Self::MAX_LAG {
                    now + self.interval
                } else {
                    next
                });
                true
            }
            None => {
                self.next_tick = Some(now + self.interval);
                true
            }
        }
    }

    /// How long a scheduler may sleep from `now` before the next cycle is due.
    #[must_use]
    pub fn until_next_tick(&self, now: Instant) -> Duration {
        self.next_tick
            .map_or(Duration::ZERO, |deadline| deadline.saturating_duration_since(now))
    }

    /// Decrement both timers toward zero. Returns `true` if the sound timer
    /// just expired.
    pub fn tick_timers(&mut self) -> bool {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        let beep = self.sound_timer == 1;
        self.sound_timer = self.sound_timer.saturating_sub(1);
        beep
    }
}
