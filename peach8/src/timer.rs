//! Delay and sound countdowns.
//!
//! Both timers count down at 60 Hz while non-zero. The pacing is done by
//! `Divider`, which turns the uptime reported by `Context` into a number of
//! elapsed periods, so the rate doesn't depend on how often the machine is
//! ticked.

use core::time::Duration;

pub const TIMER_FREQUENCY: u64 = 60;
const NANOS_PER_SEC: u128 = 1_000_000_000;

#[cfg(feature = "atomic")]
pub use atomic::Timer;
#[cfg(not(feature = "atomic"))]
pub use racy::Timer;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimerState {
    On,
    Off,
    Finished,
}

pub mod racy {
    use super::TimerState;

    #[derive(Debug)]
    pub struct Timer(u8);

    impl Timer {
        pub fn new() -> Self {
            Self(0)
        }

        #[inline]
        pub fn store(&mut self, value: u8) {
            self.0 = value;
        }

        #[inline]
        pub fn load(&self) -> u8 {
            self.0
        }

        #[inline]
        pub fn decrement(&mut self) -> TimerState {
            if self.0 > 0 {
                self.0 -= 1;
                if self.0 == 0 {
                    TimerState::Finished
                } else {
                    TimerState::On
                }
            } else {
                TimerState::Off
            }
        }
    }
}

#[cfg(feature = "atomic")]
pub mod atomic {
    use super::TimerState;
    use core::sync::atomic::{AtomicU8, Ordering};

    #[derive(Debug)]
    pub struct Timer(AtomicU8);

    impl Timer {
        pub fn new() -> Self {
            Self(AtomicU8::new(0))
        }

        #[inline]
        pub fn store(&mut self, value: u8) {
            self.0.store(value, Ordering::Release);
        }

        #[inline]
        pub fn load(&self) -> u8 {
            self.0.load(Ordering::Acquire)
        }

        #[inline]
        pub fn decrement(&mut self) -> TimerState {
            let previous = self
                .0
                .fetch_update(Ordering::Release, Ordering::Acquire, |value| {
                    Some(value.saturating_sub(1))
                })
                .unwrap_or_else(|value| value);
            match previous {
                0 => TimerState::Off,
                1 => TimerState::Finished,
                _ => TimerState::On,
            }
        }
    }
}

/// Clock divider producing 60 Hz ticks out of a monotonic uptime
///
/// The first poll anchors the divider, later polls return how many whole
/// periods passed since the previous one. Periods are counted from the anchor,
/// so no fraction of a period is lost between polls. A clock going backwards
/// re-anchors the divider.
#[derive(Debug, Default)]
pub struct Divider {
    origin: Option<Duration>,
    ticks: u64,
}

impl Divider {
    pub fn new() -> Self {
        Self {
            origin: None,
            ticks: 0,
        }
    }

    pub fn poll(&mut self, now: Duration) -> u64 {
        let origin = *self.origin.get_or_insert(now);
        let elapsed = match now.checked_sub(origin) {
            Some(elapsed) => elapsed,
            None => {
                self.origin = Some(now);
                self.ticks = 0;
                return 0;
            }
        };
        // one nanosecond of slack absorbs the truncation of `Duration` arithmetic
        let total = ((elapsed.as_nanos() + 1) * TIMER_FREQUENCY as u128 / NANOS_PER_SEC) as u64;
        let due = total.saturating_sub(self.ticks);
        self.ticks = total;
        due
    }
}
