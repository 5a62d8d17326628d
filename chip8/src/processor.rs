//! This module contains the implementation of the Chip8 central processing
//! unit (CPU). The CPU executes the instructions stored in the memory of the
//! Chip8 computer.

use std::collections::VecDeque;
use std::fmt::{self, Write};

use crate::error::{Error, Result};
use crate::memory::{Memory, PROGRAM_START};
use crate::opcode::{Instruction, Opcode};
use crate::stack::Stack;
use crate::Tick;

use super::Bus;

/// The maximum amount of instructions that should be stored
/// in the [`Cpu`]'s buffer of instructions.
const INSTRUCTION_BUFFER_LENGTH: usize = 100;

/// The flag register.
const VF: usize = 0xF;

/// Describes how the program counter should be updated after
/// executing an instruction.
enum ProgramCounterUpdate {
    /// Go directly to the next instruction (pc + 2)
    Next,

    /// Skip the next instruction (pc + 4).
    SkipNext,

    /// Jump to the given address.
    Jump(u16),

    /// Leave the program counter where it is.
    Stay,
}

impl ProgramCounterUpdate {
    fn skip_if(condition: bool) -> Self {
        if condition {
            Self::SkipNext
        } else {
            Self::Next
        }
    }
}

/// An instruction the [`Cpu`] has executed.
#[derive(Clone, Copy, Debug)]
pub struct Trace {
    /// The memory address where the instruction is located.
    pub address: u16,

    /// The raw instruction word.
    pub opcode: Opcode,

    /// The decoded instruction.
    pub instruction: Instruction,
}

/// This struct represents the central processing unit of a computer.
pub struct Cpu {
    /// An array of 16 unsigned 8-bit integers representing the Vx registers.
    pub v: [u8; 16],

    /// The index register. Arithmetic on it wraps at 16 bits; memory accesses
    /// through it are masked to 12 bits.
    pub i: u16,

    /// The program counter.
    pub pc: u16,

    /// Return addresses of the active subroutine calls.
    pub stack: Stack,

    /// The last `INSTRUCTION_BUFFER_LENGTH` instructions that the [`Cpu`]
    /// has executed, newest first.
    pub instructions: VecDeque<Trace>,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// Create a new [`Cpu`] with every register cleared and the program
    /// counter at [`PROGRAM_START`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            stack: Stack::new(),
            instructions: VecDeque::with_capacity(INSTRUCTION_BUFFER_LENGTH),
        }
    }

    /// Execute one processor cycle. This will fetch, decode, and execute the
    /// next opcode from memory. While a `LD Vx, K` is pending no instruction
    /// is fetched; the cycle only checks whether the key press has arrived.
    ///
    /// # Errors
    ///
    /// Returns an error if the opcode is unknown, the call stack over- or
    /// underflows, or the random source fails.
    pub fn cycle(&mut self, bus: &mut Bus) -> Result<Tick> {
        if bus.input.waiting() {
            return Ok(match bus.input.take_request_response() {
                Some(response) => {
                    self.v[response.register] = response.key_code;
                    self.pc = self.pc.wrapping_add(2);
                    Tick::KeyCommitted(response.key_code)
                }
                None => Tick::BlockedOnKey,
            });
        }

        let address = self.pc;
        let opcode = Opcode(bus.memory.read_word(address));
        let instruction = Instruction::decode(opcode, address)?;
        log::debug!("{address:#05X}: {opcode}  {instruction}");

        let pc_update = self.execute(instruction, bus)?;

        self.push_instruction(Trace {
            address,
            opcode,
            instruction,
        });

        match pc_update {
            ProgramCounterUpdate::Next => self.pc = self.pc.wrapping_add(2),
            ProgramCounterUpdate::SkipNext => self.pc = self.pc.wrapping_add(4),
            ProgramCounterUpdate::Jump(addr) => self.pc = addr,
            ProgramCounterUpdate::Stay => {}
        }
        Ok(Tick::Executed(instruction))
    }

    /// Push an instruction to the instruction buffer. This will
    /// remove the last instruction in the list if the length has exceeded
    /// the [`INSTRUCTION_BUFFER_LENGTH`].
    fn push_instruction(&mut self, trace: Trace) {
        self.instructions.push_front(trace);
        if self.instructions.len() > INSTRUCTION_BUFFER_LENGTH {
            self.instructions.pop_back();
        }
    }

    /// Apply the effects of `instruction` to the registers and the [`Bus`].
    fn execute(&mut self, instruction: Instruction, bus: &mut Bus) -> Result<ProgramCounterUpdate> {
        use Instruction as I;

        let update = match instruction {
            I::Cls => {
                bus.graphics.clear();
                ProgramCounterUpdate::Next
            }
            I::Ret => {
                let address = self
                    .stack
                    .pop()
                    .ok_or(Error::StackUnderflow { address: self.pc })?;
                ProgramCounterUpdate::Jump(address.wrapping_add(2))
            }
            I::Jump(nnn) => ProgramCounterUpdate::Jump(nnn),
            I::Call(nnn) => {
                self.stack
                    .push(self.pc)
                    .ok_or(Error::StackOverflow { address: self.pc })?;
                ProgramCounterUpdate::Jump(nnn)
            }
            I::SkipEqImm { x, kk } => ProgramCounterUpdate::skip_if(self.v[x] == kk),
            I::SkipNeImm { x, kk } => ProgramCounterUpdate::skip_if(self.v[x] != kk),
            I::SkipEqReg { x, y } => ProgramCounterUpdate::skip_if(self.v[x] == self.v[y]),
            I::SkipNeReg { x, y } => ProgramCounterUpdate::skip_if(self.v[x] != self.v[y]),
            I::LoadImm { x, kk } => {
                self.v[x] = kk;
                ProgramCounterUpdate::Next
            }
            I::AddImm { x, kk } => {
                self.v[x] = self.v[x].wrapping_add(kk);
                ProgramCounterUpdate::Next
            }
            I::LoadReg { x, y } => {
                self.v[x] = self.v[y];
                ProgramCounterUpdate::Next
            }
            I::Or { x, y } => {
                self.v[x] |= self.v[y];
                ProgramCounterUpdate::Next
            }
            I::And { x, y } => {
                self.v[x] &= self.v[y];
                ProgramCounterUpdate::Next
            }
            I::Xor { x, y } => {
                self.v[x] ^= self.v[y];
                ProgramCounterUpdate::Next
            }
            I::AddReg { x, y } => {
                let (result, carry) = self.v[x].overflowing_add(self.v[y]);
                self.set_with_flag(x, result, carry)
            }
            I::Sub { x, y } => {
                let no_borrow = self.v[x] >= self.v[y];
                self.set_with_flag(x, self.v[x].wrapping_sub(self.v[y]), no_borrow)
            }
            I::SubN { x, y } => {
                let no_borrow = self.v[y] >= self.v[x];
                self.set_with_flag(x, self.v[y].wrapping_sub(self.v[x]), no_borrow)
            }
            I::Shr { x } => {
                let shifted_out = self.v[x] & 0x01 != 0;
                self.set_with_flag(x, self.v[x] >> 1, shifted_out)
            }
            I::Shl { x } => {
                let shifted_out = self.v[x] & 0x80 != 0;
                self.set_with_flag(x, self.v[x] << 1, shifted_out)
            }
            I::LoadIndex(nnn) => {
                self.i = nnn;
                ProgramCounterUpdate::Next
            }
            I::JumpV0(nnn) => ProgramCounterUpdate::Jump(nnn + u16::from(self.v[0])),
            I::Random { x, kk } => {
                let mut buf = [0u8; 1];
                getrandom::getrandom(&mut buf)?;
                self.v[x] = buf[0] & kk;
                ProgramCounterUpdate::Next
            }
            I::Draw { x, y, n } => {
                let sprite = bus.memory.bytes(self.i, u16::from(n));
                let collision = bus.graphics.draw_sprite(
                    usize::from(self.v[x]),
                    usize::from(self.v[y]),
                    sprite,
                );
                self.v[VF] = collision.into();
                ProgramCounterUpdate::Next
            }
            I::SkipKeyPressed { x } => {
                ProgramCounterUpdate::skip_if(bus.input.is_key_pressed(self.v[x]))
            }
            I::SkipKeyNotPressed { x } => {
                ProgramCounterUpdate::skip_if(!bus.input.is_key_pressed(self.v[x]))
            }
            I::LoadDelay { x } => {
                self.v[x] = bus.clock.delay_timer;
                ProgramCounterUpdate::Next
            }
            I::WaitKey { x } => {
                bus.input.request_key_press(x);
                ProgramCounterUpdate::Stay
            }
            I::SetDelay { x } => {
                bus.clock.delay_timer = self.v[x];
                ProgramCounterUpdate::Next
            }
            I::SetSound { x } => {
                bus.clock.sound_timer = self.v[x];
                ProgramCounterUpdate::Next
            }
            I::AddIndex { x } => {
                self.i = self.i.wrapping_add(u16::from(self.v[x]));
                ProgramCounterUpdate::Next
            }
            I::LoadGlyph { x } => {
                self.i = Memory::glyph_address(self.v[x]);
                ProgramCounterUpdate::Next
            }
            I::StoreBcd { x } => {
                let value = self.v[x];
                for (offset, digit) in [value / 100, (value / 10) % 10, value % 10]
                    .into_iter()
                    .enumerate()
                {
                    bus.memory[self.i.wrapping_add(offset as u16)] = digit;
                }
                ProgramCounterUpdate::Next
            }
            I::StoreRegisters { x } => {
                for (offset, &value) in self.v[..=x].iter().enumerate() {
                    bus.memory[self.i.wrapping_add(offset as u16)] = value;
                }
                ProgramCounterUpdate::Next
            }
            I::LoadRegisters { x } => {
                for (offset, register) in self.v[..=x].iter_mut().enumerate() {
                    *register = bus.memory[self.i.wrapping_add(offset as u16)];
                }
                ProgramCounterUpdate::Next
            }
        };
        Ok(update)
    }

    /// Stores `value` in Vx, then the flag in VF. VF is written last so it
    /// holds the flag even when `x` is `0xF`.
    fn set_with_flag(&mut self, x: usize, value: u8, flag: bool) -> ProgramCounterUpdate {
        self.v[x] = value;
        self.v[VF] = flag.into();
        ProgramCounterUpdate::Next
    }

    /// Writes the registers, the stack and the recent instruction history.
    ///
    /// # Errors
    ///
    /// Propagates any error from the underlying writer.
    pub fn dump(&self, out: &mut impl Write) -> fmt::Result {
        writeln!(out, "PC: {:#05X}  I: {:#06X}", self.pc, self.i)?;
        for (row, registers) in self.v.chunks(8).enumerate() {
            for (col, value) in registers.iter().enumerate() {
                write!(out, "V{:X}: {value:#04X}  ", row * 8 + col)?;
            }
            writeln!(out)?;
        }
        write!(out, "Stack ({}):", self.stack.len())?;
        for frame in self.stack.frames() {
            write!(out, " {frame:#05X}")?;
        }
        writeln!(out)?;
        writeln!(out, "Recent instructions:")?;
        for trace in &self.instructions {
            writeln!(
                out,
                "  {:#05X}: {}  {}",
                trace.address, trace.opcode, trace.instruction
            )?;
        }
        Ok(())
    }
}
