//! CHIP-8 virtual machine.
//!
//! `Peach8` interprets programs for the CHIP-8 console. Everything platform
//! specific (display, keyboard, sound, randomness, clock) is reached through
//! the `Context` trait, so the crate runs on bare metal as well as on a desktop.
#![no_std]

pub mod builder;
pub mod context;
pub mod error;
pub mod frame;
pub mod keypad;
pub mod opcode;
pub mod peach;
pub mod state;
pub mod timer;
#[cfg(test)]
mod utils;

pub use builder::Builder;
pub use context::Context;
pub use error::Error;
pub use frame::{Frame, FrameView};
pub use opcode::OpCode;
pub use peach::Peach8;
pub use state::MachineState;

#[cfg(feature = "embedded-graphics")]
pub use embedded_graphics;

pub use nb;
