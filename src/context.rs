//! `Context` for running `Peach8` as a desktop process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::info;
use peach8::{Context, Frame, FrameView};

#[derive(Debug, Default)]
struct Latch {
    keys: [AtomicBool; 16],
    quit: AtomicBool,
}

/// Key latch shared between the machine and whoever produces key events
///
/// Cloning gives another handle to the same 16 keys, so presses can come from
/// any thread. The same handle carries the user's request to stop.
#[derive(Clone, Debug, Default)]
pub struct SharedKeys(Arc<Latch>);

impl SharedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: u8, pressed: bool) {
        self.0.keys[(key & 0x0F) as usize].store(pressed, Ordering::Release);
    }

    pub fn press(&self, key: u8) {
        self.set(key, true);
    }

    pub fn release(&self, key: u8) {
        self.set(key, false);
    }

    pub fn snapshot(&self) -> [bool; 16] {
        let mut keys = [false; 16];
        keys.iter_mut()
            .zip(self.0.keys.iter())
            .for_each(|(key, shared)| *key = shared.load(Ordering::Acquire));
        keys
    }

    pub fn request_quit(&self) {
        self.0.quit.store(true, Ordering::Release);
    }

    pub fn quit_requested(&self) -> bool {
        self.0.quit.load(Ordering::Acquire)
    }
}

pub struct HostContext {
    keys: SharedKeys,
    latched: [bool; 16],
    started: Instant,
    frame: Option<Frame>,
    frames: u64,
    sound: bool,
}

impl HostContext {
    pub fn new(keys: SharedKeys) -> Self {
        Self {
            keys,
            latched: [false; 16],
            started: Instant::now(),
            frame: None,
            frames: 0,
            sound: false,
        }
    }

    pub fn keys(&self) -> &SharedKeys {
        &self.keys
    }

    /// Last frame published by the machine
    pub fn frame(&self) -> Option<FrameView<'_>> {
        self.frame.as_ref().map(Frame::view)
    }

    /// Number of frames published so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_sound_on(&self) -> bool {
        self.sound
    }
}

impl Context for HostContext {
    fn on_frame(&mut self, frame: FrameView<'_>) {
        self.frame = Some(frame.copy_frame());
        self.frames += 1;
    }

    fn sound_on(&mut self) {
        if !self.sound {
            info!("beep on");
        }
        self.sound = true;
    }

    fn sound_off(&mut self) {
        if self.sound {
            info!("beep off");
        }
        self.sound = false;
    }

    fn get_keys(&mut self) -> &[bool; 16] {
        self.latched = self.keys.snapshot();
        &self.latched
    }

    fn gen_random(&mut self) -> u8 {
        rand::random::<u8>()
    }

    fn uptime(&mut self) -> Duration {
        self.started.elapsed()
    }
}
