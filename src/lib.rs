//! Headless host for the `peach8` CHIP-8 machine.
//!
//! Loads program and font files, provides a desktop `Context`, and runs the
//! machine at a fixed instruction rate.

pub mod context;
pub mod error;
pub mod input;
pub mod loader;
pub mod runner;

pub use context::{HostContext, SharedKeys};
pub use error::{HostError, LoadError};
pub use runner::{Options, Stop};
