//! Paced run loop.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};
use peach8::{Builder, Context, OpCode, Peach8};

use crate::context::{HostContext, SharedKeys};
use crate::error::HostError;
use crate::loader;

pub const DEFAULT_IPS: u32 = 500;

/// Everything needed to start a program
#[derive(Clone, Debug)]
pub struct Options {
    pub rom: PathBuf,
    pub font: Option<PathBuf>,
    /// Instructions per second, 0 runs unpaced
    pub ips: u32,
    pub max_cycles: Option<u64>,
}

/// Why a run ended without an error
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stop {
    /// Next instruction jumps to itself
    Halted { cycles: u64 },
    CycleLimit { cycles: u64 },
    /// The user asked to stop
    Quit { cycles: u64 },
}

/// Load everything `options` names and assemble the machine
pub fn prepare(options: &Options, keys: SharedKeys) -> Result<Peach8<HostContext>, HostError> {
    let rom = loader::load_rom(&options.rom).map_err(HostError::RomLoad)?;
    let font = match &options.font {
        Some(path) => Some(loader::load_font(path).map_err(HostError::FontLoad)?),
        None => None,
    };

    let mut builder = Builder::new()
        .with_context(HostContext::new(keys))
        .with_program(&rom);
    if let Some(font) = &font {
        builder = builder.with_font(font);
    }
    builder.build().map_err(HostError::Setup)
}

/// Whether the instruction at pc is a jump to itself
pub fn is_halted<C: Context>(chip: &Peach8<C>) -> bool {
    let state = chip.state();
    match state.read_word(state.pc) {
        Ok(word) => OpCode::from(word) == OpCode::_1NNN { nnn: state.pc },
        Err(_) => false,
    }
}

/// Drive `chip` until it halts, hits the cycle limit, the user quits or it fails
///
/// Cycles spent waiting for a key count towards the limit.
pub fn run(chip: &mut Peach8<HostContext>, options: &Options) -> Result<Stop, HostError> {
    let period = match options.ips {
        0 => None,
        ips => Some(Duration::from_secs(1) / ips),
    };
    let mut deadline = Instant::now();
    let mut cycles = 0u64;

    loop {
        if chip.context().keys().quit_requested() {
            info!("quit after {} cycles", cycles);
            return Ok(Stop::Quit { cycles });
        }
        if is_halted(chip) {
            info!("halted at {:#05x} after {} cycles", chip.state().pc, cycles);
            return Ok(Stop::Halted { cycles });
        }
        if options.max_cycles.map_or(false, |max| cycles >= max) {
            info!("stopped after {} cycles", cycles);
            return Ok(Stop::CycleLimit { cycles });
        }

        match chip.tick() {
            Ok(()) => {}
            Err(nb::Error::WouldBlock) => {
                if cycles % 1000 == 0 {
                    debug!("waiting for key");
                }
            }
            Err(nb::Error::Other(err)) => return Err(HostError::Execution(err)),
        }
        cycles += 1;

        if let Some(period) = period {
            deadline += period;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else {
                // fell behind, don't try to catch up with a burst
                deadline = now;
            }
        }
    }
}
