//! The platform seam.
//!
//! `Peach8` never touches hardware itself. Display, speaker, keyboard,
//! randomness and time all come from a `Context` the platform hands over at
//! construction, which keeps the crate `no_std` and lets tests run with a
//! fully scripted machine.

use core::time::Duration;

use crate::frame::FrameView;

/// Everything `Peach8` needs from the platform it runs on
pub trait Context {
    /// A cycle changed the frame, `frame` is its new content
    ///
    /// Called at most once per cycle, after the instruction has finished.
    fn on_frame(&mut self, frame: FrameView<'_>);

    /// The sound timer was loaded with a non-zero value
    fn sound_on(&mut self);

    /// The sound timer was loaded with zero or ran out
    fn sound_off(&mut self);

    /// Pressed state of keys `0x0..=0xF`, sampled once at the start of every cycle
    fn get_keys(&mut self) -> &[bool; 16];

    fn gen_random(&mut self) -> u8;

    /// Monotonic time since some fixed point, drives the 60 Hz timers
    fn uptime(&mut self) -> Duration;
}
