//! Registers, memory and peripherals of a single machine.
//!
//! Memory layout:
//!
//! | range            | content                                   |
//! |------------------|-------------------------------------------|
//! | `0x000..0x050`   | hexadecimal font, 16 glyphs of 5 bytes    |
//! | `0x0A0..0x0C0`   | call stack, 16 big-endian return addresses |
//! | `0x200..0x1000`  | program                                   |

use crate::error::Error;
use crate::frame::Frame;
use crate::keypad::Keypad;
use crate::timer::Timer;

pub const MEMORY_SIZE: usize = 4096;
pub const FONT_ADDR: usize = 0x000;
pub const FONT_LEN: usize = 80;
pub const GLYPH_LEN: u16 = 5;
pub const STACK_ADDR: u16 = 0x0A0;
pub const STACK_END: u16 = 0x0C0;
pub const PROGRAM_ADDR: u16 = 0x200;

/// Highest meaningful address, `I` and jump targets are 12 bit wide
pub const ADDR_MAX: u16 = 0x0FFF;

#[rustfmt::skip]
pub const FONT: [u8; FONT_LEN] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Whole mutable state of the machine
///
/// Owned by `Peach8`, which is the only one mutating it. Hosts get a shared
/// reference through `Peach8::state`.
#[derive(Debug)]
pub struct MachineState {
    /// Address of the next instruction
    pub pc: u16,
    /// Address of the next free stack slot
    pub sp: u16,
    /// Index register
    pub i: u16,
    /// Most recently fetched instruction word
    pub instruction: u16,
    /// General purpose registers, `v[0xF]` doubles as a flag
    pub v: [u8; 16],
    pub memory: [u8; MEMORY_SIZE],
    pub frame: Frame,
    pub keys: Keypad,
    pub delay_timer: Timer,
    pub sound_timer: Timer,
}

impl MachineState {
    /// Power-on state with the built-in font in place
    pub fn new() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        memory[FONT_ADDR..FONT_ADDR + FONT_LEN].copy_from_slice(&FONT);
        Self {
            pc: PROGRAM_ADDR,
            sp: STACK_ADDR,
            i: 0,
            instruction: 0,
            v: [0; 16],
            memory,
            frame: Frame::new(),
            keys: Keypad::new(),
            delay_timer: Timer::new(),
            sound_timer: Timer::new(),
        }
    }

    /// Big-endian word at `addr`
    pub fn read_word(&self, addr: u16) -> Result<u16, Error> {
        let block = self.block(addr, 2)?;
        Ok(u16::from_be_bytes([block[0], block[1]]))
    }

    /// Memory block `addr..addr + len`, checked against the address space
    pub fn block(&self, addr: u16, len: usize) -> Result<&[u8], Error> {
        let start = addr as usize;
        self.memory
            .get(start..start + len)
            .ok_or(Error::MemoryOutOfBounds { addr, len })
    }

    pub(crate) fn block_mut(&mut self, addr: u16, len: usize) -> Result<&mut [u8], Error> {
        let start = addr as usize;
        self.memory
            .get_mut(start..start + len)
            .ok_or(Error::MemoryOutOfBounds { addr, len })
    }

    /// Number of return addresses on the stack
    pub fn stack_depth(&self) -> usize {
        ((self.sp - STACK_ADDR) / 2) as usize
    }

    pub(crate) fn push_return(&mut self, addr: u16) -> Result<(), Error> {
        if self.sp >= STACK_END {
            return Err(Error::StackOverflow { pc: self.pc });
        }
        let sp = self.sp;
        self.block_mut(sp, 2)?.copy_from_slice(&addr.to_be_bytes());
        self.sp += 2;
        Ok(())
    }

    pub(crate) fn pop_return(&mut self) -> Result<u16, Error> {
        if self.sp <= STACK_ADDR {
            return Err(Error::StackUnderflow { pc: self.pc });
        }
        let addr = self.read_word(self.sp - 2)?;
        self.sp -= 2;
        Ok(addr)
    }
}

impl Default for MachineState {
    fn default() -> Self {
        Self::new()
    }
}
