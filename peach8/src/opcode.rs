//! Instruction decoding.
//!
//! ```
//! use peach8::opcode::{Fields, OpCode};
//!
//! assert_eq!(OpCode::from(0x0ABC), OpCode::_0NNN { nnn: 0x0ABC });
//! assert_eq!(OpCode::from(0xD12F), OpCode::_DXYN { x: 0x1, y: 0x2, n: 0xF });
//! assert_eq!(OpCode::from(0xE1FF), OpCode::Unknown { raw: 0xE1FF });
//! assert_eq!(Fields::from(0x8AB4).n, 0x4);
//! ```

/// Nibble and byte fields of an instruction word `FXYN`
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Fields {
    /// Top nibble, selects the instruction family
    pub family: u8,
    pub x: u8,
    pub y: u8,
    /// Lowest nibble
    pub n: u8,
    /// Lowest byte
    pub nn: u8,
    /// Lowest 12 bits, an address
    pub nnn: u16,
}

impl From<u16> for Fields {
    fn from(raw: u16) -> Self {
        let nibble = |shift: u16| ((raw >> shift) & 0xF) as u8;
        Self {
            family: nibble(12),
            x: nibble(8),
            y: nibble(4),
            n: nibble(0),
            nn: (raw & 0xFF) as u8,
            nnn: raw & 0x0FFF,
        }
    }
}

/// One of the 35 chip-8 instructions, with its operands already extracted
///
/// Decoding is total: words that are not instructions become `Unknown`,
/// it's up to the executor to decide what to do with those.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OpCode {
    /// Machine code routine, unsupported
    _0NNN { nnn: u16 },
    /// Clear screen
    _00E0,
    /// Return from subroutine
    _00EE,
    /// Jump to NNN
    _1NNN { nnn: u16 },
    /// Call subroutine at NNN
    _2NNN { nnn: u16 },
    /// Skip if VX == NN
    _3XNN { x: u8, nn: u8 },
    /// Skip if VX != NN
    _4XNN { x: u8, nn: u8 },
    /// Skip if VX == VY
    _5XY0 { x: u8, y: u8 },
    /// VX = NN
    _6XNN { x: u8, nn: u8 },
    /// VX += NN, VF untouched
    _7XNN { x: u8, nn: u8 },
    /// VX = VY
    _8XY0 { x: u8, y: u8 },
    /// VX |= VY
    _8XY1 { x: u8, y: u8 },
    /// VX &= VY
    _8XY2 { x: u8, y: u8 },
    /// VX ^= VY
    _8XY3 { x: u8, y: u8 },
    /// VX += VY, VF = carry
    _8XY4 { x: u8, y: u8 },
    /// VX -= VY, VF = no borrow
    _8XY5 { x: u8, y: u8 },
    /// VX >>= 1, VF = bit shifted out
    _8XY6 { x: u8, y: u8 },
    /// VX = VY - VX, VF = no borrow
    _8XY7 { x: u8, y: u8 },
    /// VX <<= 1, VF = bit shifted out
    _8XYE { x: u8, y: u8 },
    /// Skip if VX != VY
    _9XY0 { x: u8, y: u8 },
    /// I = NNN
    _ANNN { nnn: u16 },
    /// Jump to NNN + V0
    _BNNN { nnn: u16 },
    /// VX = random & NN
    _CXNN { x: u8, nn: u8 },
    /// Draw N rows of sprite at I to column VX, row VY, VF = collision
    _DXYN { x: u8, y: u8, n: u8 },
    /// Skip if key VX is down
    _EX9E { x: u8 },
    /// Skip if key VX is up
    _EXA1 { x: u8 },
    /// VX = delay timer
    _FX07 { x: u8 },
    /// Block until a key goes down, VX = key
    _FX0A { x: u8 },
    /// Delay timer = VX
    _FX15 { x: u8 },
    /// Sound timer = VX
    _FX18 { x: u8 },
    /// I += VX
    _FX1E { x: u8 },
    /// I = address of glyph VX
    _FX29 { x: u8 },
    /// Memory at I, I+1, I+2 = decimal digits of VX
    _FX33 { x: u8 },
    /// Memory from I = V0..=VX
    _FX55 { x: u8 },
    /// V0..=VX = memory from I
    _FX65 { x: u8 },
    /// Word that isn't a chip-8 instruction
    Unknown { raw: u16 },
}

impl From<u16> for OpCode {
    #[rustfmt::skip]
    fn from(raw: u16) -> Self {
        use OpCode::*;
        let Fields { family, x, y, n, nn, nnn } = Fields::from(raw);
        match (family, n) {
            (0x0, _) => match nnn {
                0x0E0 => _00E0,
                0x0EE => _00EE,
                _     => _0NNN { nnn },
            },
            (0x1, _)   => _1NNN { nnn },
            (0x2, _)   => _2NNN { nnn },
            (0x3, _)   => _3XNN { x, nn },
            (0x4, _)   => _4XNN { x, nn },
            (0x5, _)   => _5XY0 { x, y },
            (0x6, _)   => _6XNN { x, nn },
            (0x7, _)   => _7XNN { x, nn },
            (0x8, 0x0) => _8XY0 { x, y },
            (0x8, 0x1) => _8XY1 { x, y },
            (0x8, 0x2) => _8XY2 { x, y },
            (0x8, 0x3) => _8XY3 { x, y },
            (0x8, 0x4) => _8XY4 { x, y },
            (0x8, 0x5) => _8XY5 { x, y },
            (0x8, 0x6) => _8XY6 { x, y },
            (0x8, 0x7) => _8XY7 { x, y },
            (0x8, 0xE) => _8XYE { x, y },
            (0x9, _)   => _9XY0 { x, y },
            (0xA, _)   => _ANNN { nnn },
            (0xB, _)   => _BNNN { nnn },
            (0xC, _)   => _CXNN { x, nn },
            (0xD, _)   => _DXYN { x, y, n },
            (0xE, _) => match nn {
                0x9E => _EX9E { x },
                0xA1 => _EXA1 { x },
                _    => Unknown { raw },
            },
            (0xF, _) => match nn {
                0x07 => _FX07 { x },
                0x0A => _FX0A { x },
                0x15 => _FX15 { x },
                0x18 => _FX18 { x },
                0x1E => _FX1E { x },
                0x29 => _FX29 { x },
                0x33 => _FX33 { x },
                0x55 => _FX55 { x },
                0x65 => _FX65 { x },
                _    => Unknown { raw },
            },
            _ => Unknown { raw },
        }
    }
}
