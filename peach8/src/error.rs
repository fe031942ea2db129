use core::fmt;

/// Errors raised while loading or running a program
///
/// Every variant is fatal for the running program. Handlers check addresses
/// before writing, so a failed instruction leaves memory untouched.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    /// Fetched word doesn't decode to any known instruction
    UnknownOpcode { raw: u16, pc: u16 },
    /// Program counter would leave the address space
    PcOutOfBounds { pc: u16 },
    /// Subroutine call with the stack region already full
    StackOverflow { pc: u16 },
    /// Return executed outside of any subroutine
    StackUnderflow { pc: u16 },
    /// Memory block `addr..addr + len` is not fully addressable
    MemoryOutOfBounds { addr: u16, len: usize },
    /// Index register would point past the address space
    IndexOutOfBounds { addr: usize },
    /// Program doesn't fit between the load address and the end of memory
    ProgramTooLarge { len: usize },
    /// Program has no instructions at all
    EmptyProgram,
    /// Font has to hold exactly 16 glyphs of 5 bytes
    InvalidFont { len: usize },
    /// Builder was finished without a required part
    Incomplete(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::UnknownOpcode { raw, pc } => {
                write!(f, "unknown instruction {:#06x} at {:#05x}", raw, pc)
            }
            Error::PcOutOfBounds { pc } => {
                write!(f, "program counter {:#06x} out of address space", pc)
            }
            Error::StackOverflow { pc } => {
                write!(f, "cannot enter subroutine at {:#05x}, stack is full", pc)
            }
            Error::StackUnderflow { pc } => {
                write!(f, "cannot return at {:#05x}, not in subroutine", pc)
            }
            Error::MemoryOutOfBounds { addr, len } => write!(
                f,
                "memory access of {} bytes at {:#05x} out of address space",
                len, addr
            ),
            Error::IndexOutOfBounds { addr } => {
                write!(f, "index register {:#06x} out of address space", addr)
            }
            Error::ProgramTooLarge { len } => {
                write!(f, "program of {} bytes doesn't fit in memory", len)
            }
            Error::EmptyProgram => write!(f, "program is empty"),
            Error::InvalidFont { len } => {
                write!(f, "font has {} bytes, expected 80", len)
            }
            Error::Incomplete(what) => write!(f, "{} not provided", what),
        }
    }
}
