use bitvec::prelude::*;
use log::{debug, error, trace, warn};

use crate::context::Context;
use crate::error::Error;
use crate::frame::{FrameView, HEIGHT, WIDTH};
use crate::keypad::Keypad;
use crate::opcode::OpCode;
use crate::state::{
    MachineState, ADDR_MAX, FONT_ADDR, FONT_LEN, GLYPH_LEN, MEMORY_SIZE, PROGRAM_ADDR,
};
use crate::timer::{Divider, TimerState};

/// The virtual machine
///
/// Owns the machine state and the platform `Context`. Drive it by calling
/// `tick` in a loop, or `tick_chip` and `tick_timers` separately when the
/// platform provides its own 60 Hz interrupt.
pub struct Peach8<C: Context + Sized> {
    ctx: C,
    state: MachineState,
    divider: Divider,
    key_wait: Option<Keypad>,
    frame_dirty: bool,
}

impl<C: Context + Sized> Peach8<C> {
    pub fn new(ctx: C) -> Self {
        Self {
            ctx,
            state: MachineState::new(),
            divider: Divider::new(),
            key_wait: None,
            frame_dirty: false,
        }
    }

    /// Create a machine with `prog` loaded at 0x200
    pub fn load(ctx: C, prog: &[u8]) -> Result<Self, Error> {
        let mut peach = Self::new(ctx);
        peach.load_program(prog)?;
        Ok(peach)
    }

    /// Load program from slice of bytes to memory from 0x200 (_start address)
    pub fn load_program(&mut self, prog: &[u8]) -> Result<(), Error> {
        if prog.is_empty() {
            return Err(Error::EmptyProgram);
        }
        let start = PROGRAM_ADDR as usize;
        if prog.len() > MEMORY_SIZE - start {
            return Err(Error::ProgramTooLarge { len: prog.len() });
        }
        self.state.memory[start..start + prog.len()].copy_from_slice(prog);
        debug!("loaded {} bytes of program at {:#05x}", prog.len(), start);
        Ok(())
    }

    /// Replace the built-in font, `font` has to hold 16 glyphs of 5 bytes
    pub fn load_font(&mut self, font: &[u8]) -> Result<(), Error> {
        if font.len() != FONT_LEN {
            return Err(Error::InvalidFont { len: font.len() });
        }
        self.state.memory[FONT_ADDR..FONT_ADDR + FONT_LEN].copy_from_slice(font);
        debug!("loaded font at {:#05x}", FONT_ADDR);
        Ok(())
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn frame(&self) -> FrameView<'_> {
        self.state.frame.view()
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    /// Whether the last cycle blocked on FX0A
    pub fn is_waiting_for_key(&self) -> bool {
        self.key_wait.is_some()
    }

    /// Run one cycle and let the timers catch up with the context's uptime
    ///
    /// Returns `WouldBlock` while the program waits for a key press, the
    /// timers keep counting down in the meantime.
    pub fn tick(&mut self) -> nb::Result<(), Error> {
        let result = self.tick_chip();
        let due = self.divider.poll(self.ctx.uptime());
        self.decrement_timers(due);
        result
    }

    /// Run one fetch-decode-execute cycle, timers are left untouched
    pub fn tick_chip(&mut self) -> nb::Result<(), Error> {
        self.state.keys.latch(self.ctx.get_keys());

        let pc = self.state.pc;
        let result = match self.fetch() {
            Ok(word) => {
                let opcode = OpCode::from(word);
                trace!("{:#05x}: {:04X} {:?}", pc, word, opcode);
                self.execute(opcode)
            }
            Err(err) => Err(nb::Error::Other(err)),
        };
        if let Err(nb::Error::Other(err)) = result {
            error!("{}", err);
        }

        if self.frame_dirty {
            self.frame_dirty = false;
            self.ctx.on_frame(self.state.frame.view());
        }
        result
    }

    /// Decrement both timers once, for platforms driving them at 60 Hz themselves
    pub fn tick_timers(&mut self) {
        self.decrement_timers(1);
    }

    fn decrement_timers(&mut self, times: u64) {
        for _ in 0..times {
            let delay = self.state.delay_timer.decrement();
            let sound = self.state.sound_timer.decrement();
            if sound == TimerState::Finished {
                debug!("sound timer finished");
                self.ctx.sound_off();
            }
            if delay != TimerState::On && sound != TimerState::On {
                break;
            }
        }
    }

    fn fetch(&mut self) -> Result<u16, Error> {
        let pc = self.state.pc;
        let word = self
            .state
            .read_word(pc)
            .map_err(|_| Error::PcOutOfBounds { pc })?;
        self.state.instruction = word;
        Ok(word)
    }

    fn pc_increment(&mut self) -> Result<(), Error> {
        if self.state.pc < 0x0FFEu16 {
            self.state.pc += 2;
            Ok(())
        } else {
            Err(Error::PcOutOfBounds { pc: self.state.pc })
        }
    }

    /// Step over the next instruction when `condition` holds
    ///
    /// Fails without touching pc when the instruction after the skipped one
    /// would be past the end of memory.
    fn skip_if(&mut self, condition: bool) -> Result<(), Error> {
        if !condition {
            return Ok(());
        }
        if self.state.pc < 0x0FFCu16 {
            self.state.pc += 2;
            Ok(())
        } else {
            Err(Error::PcOutOfBounds { pc: self.state.pc })
        }
    }
}

// OpCodes impls
impl<C: Context + Sized> Peach8<C> {
    #[rustfmt::skip]
    fn execute(&mut self, opcode: OpCode) -> nb::Result<(), Error> {
        match opcode {
            OpCode::_0NNN { nnn }     => self.exec_ml_subroutine_at(nnn),
            OpCode::_00E0             => self.clear_screen(),
            OpCode::_00EE             => return self.subroutine_return(),
            OpCode::_1NNN { nnn }     => return self.jump_to(nnn),
            OpCode::_2NNN { nnn }     => return self.exec_subroutine_at(nnn),
            OpCode::_3XNN { x, nn }   => self.skip_if_vx_eq_nn(x, nn),
            OpCode::_4XNN { x, nn }   => self.skip_if_vx_ne_nn(x, nn),
            OpCode::_5XY0 { x, y }    => self.skip_if_vx_eq_vy(x, y),
            OpCode::_6XNN { x, nn }   => self.assign_vx_nn(x, nn),
            OpCode::_7XNN { x, nn }   => self.assign_add_vx_nn(x, nn),
            OpCode::_8XY0 { x, y }    => self.assign_vx_vy(x, y),
            OpCode::_8XY1 { x, y }    => self.assign_or_vx_vy(x, y),
            OpCode::_8XY2 { x, y }    => self.assign_and_vx_vy(x, y),
            OpCode::_8XY3 { x, y }    => self.assign_xor_vx_vy(x, y),
            OpCode::_8XY4 { x, y }    => self.assign_add_vx_vy(x, y),
            OpCode::_8XY5 { x, y }    => self.assign_sub_vx_vy(x, y),
            OpCode::_8XY6 { x, .. }   => self.assign_vx_shifted_r(x),
            OpCode::_8XY7 { x, y }    => self.assign_vx_vy_sub_vx(x, y),
            OpCode::_8XYE { x, .. }   => self.assign_vx_shifted_l(x),
            OpCode::_9XY0 { x, y }    => self.skip_if_vx_ne_vy(x, y),
            OpCode::_ANNN { nnn }     => self.assign_i_nnn(nnn),
            OpCode::_BNNN { nnn }     => return self.jump_to_nnn_add_v0(nnn),
            OpCode::_CXNN { x, nn }   => self.assign_vx_random_and_nn(x, nn),
            OpCode::_DXYN { x, y, n } => self.draw_n_at_vx_vy(x, y, n),
            OpCode::_EX9E { x }       => self.skip_if_vx_in_keys(x),
            OpCode::_EXA1 { x }       => self.skip_if_vx_not_in_keys(x),
            OpCode::_FX07 { x }       => self.assign_vx_delay_t(x),
            OpCode::_FX0A { x }       => self.assign_vx_wait_for_key(x),
            OpCode::_FX15 { x }       => self.assign_delay_t_vx(x),
            OpCode::_FX18 { x }       => self.assign_sound_t_vx(x),
            OpCode::_FX1E { x }       => self.assign_add_i_vx(x),
            OpCode::_FX29 { x }       => self.assign_i_addr_of_sprite_vx(x),
            OpCode::_FX33 { x }       => self.assign_mem_at_i_bcd_of_vx(x),
            OpCode::_FX55 { x }       => self.assign_mem_at_i_v0_to_vx(x),
            OpCode::_FX65 { x }       => self.assign_v0_to_vx_mem_at_i(x),
            OpCode::Unknown { raw }   => {
                return Err(nb::Error::Other(Error::UnknownOpcode { raw, pc: self.state.pc }))
            }
        }?;
        Ok(self.pc_increment()?)
    }

    /// 0NNN
    /// Native routines don't exist here, logged and skipped
    fn exec_ml_subroutine_at(&mut self, nnn: u16) -> nb::Result<(), Error> {
        warn!(
            "{:#05x}: machine code routine at {:#05x} is not supported, ignoring",
            self.state.pc, nnn
        );
        Ok(())
    }

    /// 00E0
    fn clear_screen(&mut self) -> nb::Result<(), Error> {
        self.state.frame.clear();
        self.frame_dirty = true;
        Ok(())
    }

    /// 00EE
    /// Pop the return address off the stack into pc
    fn subroutine_return(&mut self) -> nb::Result<(), Error> {
        self.state.pc = self.state.pop_return()?;
        Ok(())
    }

    /// 1NNN
    fn jump_to(&mut self, nnn: u16) -> nb::Result<(), Error> {
        self.state.pc = nnn;
        Ok(())
    }

    /// 2NNN
    /// Push the address of the next instruction, then jump
    fn exec_subroutine_at(&mut self, nnn: u16) -> nb::Result<(), Error> {
        let ret = self.state.pc + 2;
        self.state.push_return(ret)?;
        self.state.pc = nnn;
        Ok(())
    }

    /// 3XNN
    fn skip_if_vx_eq_nn(&mut self, x: u8, nn: u8) -> nb::Result<(), Error> {
        Ok(self.skip_if(self.state.v[x as usize] == nn)?)
    }

    /// 4XNN
    fn skip_if_vx_ne_nn(&mut self, x: u8, nn: u8) -> nb::Result<(), Error> {
        Ok(self.skip_if(self.state.v[x as usize] != nn)?)
    }

    /// 5XY0
    fn skip_if_vx_eq_vy(&mut self, x: u8, y: u8) -> nb::Result<(), Error> {
        Ok(self.skip_if(self.state.v[x as usize] == self.state.v[y as usize])?)
    }

    /// 6XNN
    fn assign_vx_nn(&mut self, x: u8, nn: u8) -> nb::Result<(), Error> {
        self.state.v[x as usize] = nn;
        Ok(())
    }

    /// 7XNN
    /// Wrapping add, VF is left alone
    fn assign_add_vx_nn(&mut self, x: u8, nn: u8) -> nb::Result<(), Error> {
        self.state.v[x as usize] = self.state.v[x as usize].wrapping_add(nn);
        Ok(())
    }

    /// 8XY0
    fn assign_vx_vy(&mut self, x: u8, y: u8) -> nb::Result<(), Error> {
        self.state.v[x as usize] = self.state.v[y as usize];
        Ok(())
    }

    /// 8XY1
    fn assign_or_vx_vy(&mut self, x: u8, y: u8) -> nb::Result<(), Error> {
        self.state.v[x as usize] |= self.state.v[y as usize];
        Ok(())
    }

    /// 8XY2
    fn assign_and_vx_vy(&mut self, x: u8, y: u8) -> nb::Result<(), Error> {
        self.state.v[x as usize] &= self.state.v[y as usize];
        Ok(())
    }

    /// 8XY3
    fn assign_xor_vx_vy(&mut self, x: u8, y: u8) -> nb::Result<(), Error> {
        self.state.v[x as usize] ^= self.state.v[y as usize];
        Ok(())
    }

    /// 8XY4
    /// VF is written after VX, so with X = F the carry wins
    fn assign_add_vx_vy(&mut self, x: u8, y: u8) -> nb::Result<(), Error> {
        let (value, carry) = self.state.v[x as usize].overflowing_add(self.state.v[y as usize]);
        self.state.v[x as usize] = value;
        self.state.v[0xF] = carry as u8;
        Ok(())
    }

    /// 8XY5
    /// VF = 1 when VX >= VY, i.e. no borrow
    fn assign_sub_vx_vy(&mut self, x: u8, y: u8) -> nb::Result<(), Error> {
        let (value, borrow) = self.state.v[x as usize].overflowing_sub(self.state.v[y as usize]);
        self.state.v[x as usize] = value;
        self.state.v[0xF] = !borrow as u8;
        Ok(())
    }

    /// 8XY6
    /// Shifts VX in place, VY is ignored
    fn assign_vx_shifted_r(&mut self, x: u8) -> nb::Result<(), Error> {
        let lsb = self.state.v[x as usize] & 1u8;
        self.state.v[x as usize] >>= 1;
        self.state.v[0xF] = lsb;
        Ok(())
    }

    /// 8XY7
    /// VX = VY - VX, VF = 1 when VY >= VX
    fn assign_vx_vy_sub_vx(&mut self, x: u8, y: u8) -> nb::Result<(), Error> {
        let (value, borrow) = self.state.v[y as usize].overflowing_sub(self.state.v[x as usize]);
        self.state.v[x as usize] = value;
        self.state.v[0xF] = !borrow as u8;
        Ok(())
    }

    /// 8XYE
    /// Shifts VX in place, VY is ignored
    fn assign_vx_shifted_l(&mut self, x: u8) -> nb::Result<(), Error> {
        let msb = self.state.v[x as usize] >> 7;
        self.state.v[x as usize] <<= 1;
        self.state.v[0xF] = msb;
        Ok(())
    }

    /// 9XY0
    fn skip_if_vx_ne_vy(&mut self, x: u8, y: u8) -> nb::Result<(), Error> {
        Ok(self.skip_if(self.state.v[x as usize] != self.state.v[y as usize])?)
    }

    /// ANNN
    fn assign_i_nnn(&mut self, nnn: u16) -> nb::Result<(), Error> {
        self.state.i = nnn;
        Ok(())
    }

    /// BNNN
    /// Target past the end of memory is an error
    fn jump_to_nnn_add_v0(&mut self, nnn: u16) -> nb::Result<(), Error> {
        let addr = nnn + self.state.v[0] as u16;
        if addr <= ADDR_MAX {
            self.state.pc = addr;
            Ok(())
        } else {
            Err(Error::PcOutOfBounds { pc: addr }.into())
        }
    }

    /// CXNN
    /// Random byte from the context, masked with NN
    fn assign_vx_random_and_nn(&mut self, x: u8, nn: u8) -> nb::Result<(), Error> {
        self.state.v[x as usize] = self.ctx.gen_random() & nn;
        Ok(())
    }

    /// DXYN
    /// XOR N rows from memory at I onto the frame, VX is the column and VY the row.
    /// Every pixel wraps around the edges. VF reports whether any lit pixel went dark.
    fn draw_n_at_vx_vy(&mut self, x: u8, y: u8, n: u8) -> nb::Result<(), Error> {
        let len = n as usize;
        let mut sprite = [0u8; 15];
        sprite[..len].copy_from_slice(self.state.block(self.state.i, len)?);

        let left = self.state.v[x as usize] as usize % WIDTH;
        let top = self.state.v[y as usize] as usize % HEIGHT;
        let mut collision = false;
        for (dy, row) in sprite[..len].iter().enumerate() {
            for (dx, lit) in row.view_bits::<Msb0>().iter().by_vals().enumerate() {
                if lit {
                    collision |=
                        self.state
                            .frame
                            .xor_bit((left + dx) % WIDTH, (top + dy) % HEIGHT, true)?;
                }
            }
        }
        self.state.v[0xF] = collision as u8;
        self.frame_dirty = true;
        Ok(())
    }

    /// EX9E
    /// Only the low nibble of VX selects the key
    fn skip_if_vx_in_keys(&mut self, x: u8) -> nb::Result<(), Error> {
        Ok(self.skip_if(self.state.keys.is_pressed(self.state.v[x as usize]))?)
    }

    /// EXA1
    fn skip_if_vx_not_in_keys(&mut self, x: u8) -> nb::Result<(), Error> {
        Ok(self.skip_if(!self.state.keys.is_pressed(self.state.v[x as usize]))?)
    }

    /// FX07
    fn assign_vx_delay_t(&mut self, x: u8) -> nb::Result<(), Error> {
        self.state.v[x as usize] = self.state.delay_timer.load();
        Ok(())
    }

    /// FX0A
    /// Blocks with `WouldBlock` until a key goes down, pc stays put meanwhile.
    /// Keys already held when the wait starts don't count.
    fn assign_vx_wait_for_key(&mut self, x: u8) -> nb::Result<(), Error> {
        let current = self.state.keys;
        let key = match self.key_wait.replace(current) {
            Some(previous) => current.newly_pressed(&previous),
            None => None,
        };
        let key = match key {
            Some(key) => key,
            None => return Err(nb::Error::WouldBlock),
        };
        debug!("key {:X} pressed", key);
        self.key_wait = None;
        self.state.v[x as usize] = key;
        Ok(())
    }

    /// FX15
    fn assign_delay_t_vx(&mut self, x: u8) -> nb::Result<(), Error> {
        self.state.delay_timer.store(self.state.v[x as usize]);
        Ok(())
    }

    /// FX18
    /// Loading a non-zero value starts the tone, zero stops it
    fn assign_sound_t_vx(&mut self, x: u8) -> nb::Result<(), Error> {
        let value = self.state.v[x as usize];
        self.state.sound_timer.store(value);
        if value > 0 {
            debug!("sound on for {} ticks", value);
            self.ctx.sound_on();
        } else {
            self.ctx.sound_off();
        }
        Ok(())
    }

    /// FX1E
    /// Result past 0xFFF is an error, I keeps its old value
    fn assign_add_i_vx(&mut self, x: u8) -> nb::Result<(), Error> {
        let addr = self.state.i + self.state.v[x as usize] as u16;
        if addr <= ADDR_MAX {
            self.state.i = addr;
            Ok(())
        } else {
            Err(Error::IndexOutOfBounds { addr: addr as usize }.into())
        }
    }

    /// FX29
    /// Glyphs are 5 bytes each, VX isn't masked
    fn assign_i_addr_of_sprite_vx(&mut self, x: u8) -> nb::Result<(), Error> {
        self.state.i = FONT_ADDR as u16 + self.state.v[x as usize] as u16 * GLYPH_LEN;
        Ok(())
    }

    /// FX33
    /// Hundreds, tens, ones
    fn assign_mem_at_i_bcd_of_vx(&mut self, x: u8) -> nb::Result<(), Error> {
        let value = self.state.v[x as usize];
        let i = self.state.i;
        self.state
            .block_mut(i, 3)?
            .copy_from_slice(&[value / 100, (value % 100) / 10, value % 10]);
        Ok(())
    }

    /// FX55
    /// I is left unchanged
    fn assign_mem_at_i_v0_to_vx(&mut self, x: u8) -> nb::Result<(), Error> {
        let (start, len) = (self.state.i as usize, x as usize + 1);
        let block = self
            .state
            .memory
            .get_mut(start..start + len)
            .ok_or(Error::MemoryOutOfBounds { addr: self.state.i, len })?;
        block.copy_from_slice(&self.state.v[..len]);
        Ok(())
    }

    /// FX65
    /// I is left unchanged
    fn assign_v0_to_vx_mem_at_i(&mut self, x: u8) -> nb::Result<(), Error> {
        let (start, len) = (self.state.i as usize, x as usize + 1);
        let block = self
            .state
            .memory
            .get(start..start + len)
            .ok_or(Error::MemoryOutOfBounds { addr: self.state.i, len })?;
        self.state.v[..len].copy_from_slice(block);
        Ok(())
    }
}
