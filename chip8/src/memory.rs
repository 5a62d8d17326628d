//! The `memory` module provides a struct and some associated functions to
//! represent the memory of a Chip8 system. The memory is represented as an
//! array of 8-bit unsigned integers ([`u8`]), with a size of 4096 bytes.
//!
//! Every address is masked to 12 bits before use, so a runaway program
//! wraps around inside the 4 KiB space instead of faulting.

use std::fmt::{self, Write};
use std::ops::{Index, IndexMut};

use crate::error::{Error, Result};

/// The total size of the Chip8 memory.
pub const MEMORY_SIZE: usize = 4096;

/// The address where programs are loaded and where execution starts.
pub const PROGRAM_START: u16 = 0x200;

/// The largest program that fits between [`PROGRAM_START`] and the end of memory.
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

/// Mask applied to every address.
const ADDRESS_MASK: u16 = 0x0FFF;

/// Bytes per glyph in the built-in font.
pub const FONT_GLYPH_SIZE: u16 = 5;

/// Built-in Chip8 font data. This is stored in the interpreter's memory.
const FONT: [u8; 80] = [
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

/// The [`Memory`] struct represents the memory of a Chip8 system. It contains
/// a fixed-size array of [`u8`] values that can be accessed using the [`Index`]
/// and [`IndexMut`] traits with a [`u16`] address.
pub struct Memory {
    memory: [u8; MEMORY_SIZE],
}

impl Default for Memory {
    fn default() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        memory[..FONT.len()].copy_from_slice(&FONT);
        Self { memory }
    }
}

impl Index<u16> for Memory {
    type Output = u8;

    fn index(&self, address: u16) -> &Self::Output {
        &self.memory[usize::from(address & ADDRESS_MASK)]
    }
}

impl IndexMut<u16> for Memory {
    fn index_mut(&mut self, address: u16) -> &mut Self::Output {
        &mut self.memory[usize::from(address & ADDRESS_MASK)]
    }
}

impl Memory {
    /// Creates a new [`Memory`] object with the font loaded and everything
    /// else zeroed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies `data` into memory starting at [`PROGRAM_START`]. Memory after
    /// the program is zeroed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RomTooLarge`] if `data` is longer than
    /// [`MAX_PROGRAM_SIZE`]. Memory is left untouched in that case.
    pub fn load_rom(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > MAX_PROGRAM_SIZE {
            return Err(Error::RomTooLarge {
                size: data.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }

        let program = &mut self.memory[usize::from(PROGRAM_START)..];
        program.fill(0);
        program[..data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Reads the big-endian instruction word at `address`.
    #[must_use]
    pub fn read_word(&self, address: u16) -> u16 {
        u16::from_be_bytes([self[address], self[address.wrapping_add(1)]])
    }

    /// Borrows `len` bytes starting at `address`, wrapping at the end of memory.
    pub fn bytes(&self, address: u16, len: u16) -> impl Iterator<Item = u8> + '_ {
        (0..len).map(move |offset| self[address.wrapping_add(offset)])
    }

    /// Address of the font glyph for the low nibble of `digit`.
    #[must_use]
    pub fn glyph_address(digit: u8) -> u16 {
        u16::from(digit & 0x0F) * FONT_GLYPH_SIZE
    }

    /// Writes a hex dump of interpreter memory followed by program/work memory.
    ///
    /// # Errors
    ///
    /// Propagates any error from the underlying writer.
    pub fn dump(&self, out: &mut impl Write) -> fmt::Result {
        let (interpreter, program) = self.memory.split_at(usize::from(PROGRAM_START));
        writeln!(out, "Interpreter memory:")?;
        Self::dump_region(out, 0, interpreter)?;
        writeln!(out, "Program and work memory:")?;
        Self::dump_region(out, usize::from(PROGRAM_START), program)
    }

    fn dump_region(out: &mut impl Write, base: usize, region: &[u8]) -> fmt::Result {
        for (row, chunk) in region.chunks(16).enumerate() {
            write!(out, "{:03X}:", base + row * 16)?;
            for byte in chunk {
                write!(out, " {byte:02X}")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}
