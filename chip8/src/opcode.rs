//! # Opcodes
//!
//! Chip8 opcodes are 16 bits each. The top nibble picks the instruction
//! family; the families `0`, `8`, `E` and `F` hold several instructions told
//! apart by the low nibble or the low byte.
//!
//! Operand fields sit at the same bit positions in every instruction:
//! - `[_x__]` register Vx, or the last register of a range V0..=Vx
//! - `[__y_]` register Vy
//! - `[_nnn]` a 12-bit address
//! - `[__kk]` an 8-bit immediate
//! - `[___n]` a 4-bit immediate

use std::fmt;

use crate::error::{Error, Result};

/// A raw 16-bit instruction word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Opcode(pub u16);

impl Opcode {
    /// `[n___]`
    #[must_use]
    pub const fn primary(self) -> u8 {
        (self.0 >> 12) as u8
    }

    /// `[_x__]`
    #[must_use]
    pub const fn x(self) -> usize {
        ((self.0 & 0x0F00) >> 8) as usize
    }

    /// `[__y_]`
    #[must_use]
    pub const fn y(self) -> usize {
        ((self.0 & 0x00F0) >> 4) as usize
    }

    /// `[___n]`
    #[must_use]
    pub const fn n(self) -> u8 {
        (self.0 & 0x000F) as u8
    }

    /// `[__kk]`
    #[must_use]
    pub const fn kk(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    /// `[_nnn]`
    #[must_use]
    pub const fn nnn(self) -> u16 {
        self.0 & 0x0FFF
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

/// A decoded instruction with its operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// `00E0` clear the display.
    Cls,
    /// `00EE` return from a subroutine.
    Ret,
    /// `1nnn` jump to `nnn`.
    Jump(u16),
    /// `2nnn` call the subroutine at `nnn`.
    Call(u16),
    /// `3xkk` skip if `Vx == kk`.
    SkipEqImm { x: usize, kk: u8 },
    /// `4xkk` skip if `Vx != kk`.
    SkipNeImm { x: usize, kk: u8 },
    /// `5xy0` skip if `Vx == Vy`.
    SkipEqReg { x: usize, y: usize },
    /// `6xkk` set `Vx = kk`.
    LoadImm { x: usize, kk: u8 },
    /// `7xkk` set `Vx = Vx + kk`, no carry flag.
    AddImm { x: usize, kk: u8 },
    /// `8xy0` set `Vx = Vy`.
    LoadReg { x: usize, y: usize },
    /// `8xy1`
    Or { x: usize, y: usize },
    /// `8xy2`
    And { x: usize, y: usize },
    /// `8xy3`
    Xor { x: usize, y: usize },
    /// `8xy4` add with carry into VF.
    AddReg { x: usize, y: usize },
    /// `8xy5` `Vx = Vx - Vy`, VF = no borrow.
    Sub { x: usize, y: usize },
    /// `8xy6` shift Vx right, VF = bit shifted out.
    Shr { x: usize },
    /// `8xy7` `Vx = Vy - Vx`, VF = no borrow.
    SubN { x: usize, y: usize },
    /// `8xyE` shift Vx left, VF = bit shifted out.
    Shl { x: usize },
    /// `9xy0` skip if `Vx != Vy`.
    SkipNeReg { x: usize, y: usize },
    /// `Annn` set `I = nnn`.
    LoadIndex(u16),
    /// `Bnnn` jump to `nnn + V0`.
    JumpV0(u16),
    /// `Cxkk` set `Vx = random & kk`.
    Random { x: usize, kk: u8 },
    /// `Dxyn` draw an `n` row sprite from `I` at `(Vx, Vy)`.
    Draw { x: usize, y: usize, n: u8 },
    /// `Ex9E` skip if key `Vx` is pressed.
    SkipKeyPressed { x: usize },
    /// `ExA1` skip if key `Vx` is not pressed.
    SkipKeyNotPressed { x: usize },
    /// `Fx07` set `Vx = DT`.
    LoadDelay { x: usize },
    /// `Fx0A` wait for a key press and store it in Vx.
    WaitKey { x: usize },
    /// `Fx15` set `DT = Vx`.
    SetDelay { x: usize },
    /// `Fx18` set `ST = Vx`.
    SetSound { x: usize },
    /// `Fx1E` set `I = I + Vx`.
    AddIndex { x: usize },
    /// `Fx29` point I at the font glyph for `Vx`.
    LoadGlyph { x: usize },
    /// `Fx33` store the BCD digits of Vx at `I..I+3`.
    StoreBcd { x: usize },
    /// `Fx55` store `V0..=Vx` at `I`.
    StoreRegisters { x: usize },
    /// `Fx65` load `V0..=Vx` from `I`.
    LoadRegisters { x: usize },
}

impl Instruction {
    /// Decodes `opcode` fetched from `address`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownOpcode`] if no instruction matches.
    pub fn decode(opcode: Opcode, address: u16) -> Result<Self> {
        let (x, y, n, kk, nnn) = (opcode.x(), opcode.y(), opcode.n(), opcode.kk(), opcode.nnn());

        let instruction = match opcode.primary() {
            0x0 => match n {
                0x0 => Self::Cls,
                0xE => Self::Ret,
                _ => return Err(Error::UnknownOpcode { opcode: opcode.0, address }),
            },
            0x1 => Self::Jump(nnn),
            0x2 => Self::Call(nnn),
            0x3 => Self::SkipEqImm { x, kk },
            0x4 => Self::SkipNeImm { x, kk },
            0x5 if n == 0 => Self::SkipEqReg { x, y },
            0x6 => Self::LoadImm { x, kk },
            0x7 => Self::AddImm { x, kk },
            0x8 => match n {
                0x0 => Self::LoadReg { x, y },
                0x1 => Self::Or { x, y },
                0x2 => Self::And { x, y },
                0x3 => Self::Xor { x, y },
                0x4 => Self::AddReg { x, y },
                0x5 => Self::Sub { x, y },
                0x6 => Self::Shr { x },
                0x7 => Self::SubN { x, y },
                0xE => Self::Shl { x },
                _ => return Err(Error::UnknownOpcode { opcode: opcode.0, address }),
            },
            0x9 if n == 0 => Self::SkipNeReg { x, y },
            0xA => Self::LoadIndex(nnn),
            0xB => Self::JumpV0(nnn),
            0xC => Self::Random { x, kk },
            0xD => Self::Draw { x, y, n },
            0xE => match kk {
                0x9E => Self::SkipKeyPressed { x },
                0xA1 => Self::SkipKeyNotPressed { x },
                _ => return Err(Error::UnknownOpcode { opcode: opcode.0, address }),
            },
            0xF => match kk {
                0x07 => Self::LoadDelay { x },
                0x0A => Self::WaitKey { x },
                0x15 => Self::SetDelay { x },
                0x18 => Self::SetSound { x },
                0x1E => Self::AddIndex { x },
                0x29 => Self::LoadGlyph { x },
                0x33 => Self::StoreBcd { x },
                0x55 => Self::StoreRegisters { x },
                0x65 => Self::LoadRegisters { x },
                _ => return Err(Error::UnknownOpcode { opcode: opcode.0, address }),
            },
            _ => return Err(Error::UnknownOpcode { opcode: opcode.0, address }),
        };
        Ok(instruction)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Cls => write!(f, "CLS"),
            Self::Ret => write!(f, "RET"),
            Self::Jump(nnn) => write!(f, "JP {nnn:#05X}"),
            Self::Call(nnn) => write!(f, "CALL {nnn:#05X}"),
            Self::SkipEqImm { x, kk } => write!(f, "SE V{x:X}, {kk:#04X}"),
            Self::SkipNeImm { x, kk } => write!(f, "SNE V{x:X}, {kk:#04X}"),
            Self::SkipEqReg { x, y } => write!(f, "SE V{x:X}, V{y:X}"),
            Self::LoadImm { x, kk } => write!(f, "LD V{x:X}, {kk:#04X}"),
            Self::AddImm { x, kk } => write!(f, "ADD V{x:X}, {kk:#04X}"),
            Self::LoadReg { x, y } => write!(f, "LD V{x:X}, V{y:X}"),
            Self::Or { x, y } => write!(f, "OR V{x:X}, V{y:X}"),
            Self::And { x, y } => write!(f, "AND V{x:X}, V{y:X}"),
            Self::Xor { x, y } => write!(f, "XOR V{x:X}, V{y:X}"),
            Self::AddReg { x, y } => write!(f, "ADD V{x:X}, V{y:X}"),
            Self::Sub { x, y } => write!(f, "SUB V{x:X}, V{y:X}"),
            Self::Shr { x } => write!(f, "SHR V{x:X}"),
            Self::SubN { x, y } => write!(f, "SUBN V{x:X}, V{y:X}"),
            Self::Shl { x } => write!(f, "SHL V{x:X}"),
            Self::SkipNeReg { x, y } => write!(f, "SNE V{x:X}, V{y:X}"),
            Self::LoadIndex(nnn) => write!(f, "LD I, {nnn:#05X}"),
            Self::JumpV0(nnn) => write!(f, "JP V0, {nnn:#05X}"),
            Self::Random { x, kk } => write!(f, "RND V{x:X}, {kk:#04X}"),
            Self::Draw { x, y, n } => write!(f, "DRW V{x:X}, V{y:X}, {n}"),
            Self::SkipKeyPressed { x } => write!(f, "SKP V{x:X}"),
            Self::SkipKeyNotPressed { x } => write!(f, "SKNP V{x:X}"),
            Self::LoadDelay { x } => write!(f, "LD V{x:X}, DT"),
            Self::WaitKey { x } => write!(f, "LD V{x:X}, K"),
            Self::SetDelay { x } => write!(f, "LD DT, V{x:X}"),
            Self::SetSound { x } => write!(f, "LD ST, V{x:X}"),
            Self::AddIndex { x } => write!(f, "ADD I, V{x:X}"),
            Self::LoadGlyph { x } => write!(f, "LD F, V{x:X}"),
            Self::StoreBcd { x } => write!(f, "LD B, V{x:X}"),
            Self::StoreRegisters { x } => write!(f, "LD [I], V{x:X}"),
            Self::LoadRegisters { x } => write!(f, "LD V{x:X}, [I]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(word: u16) -> Result<Instruction> {
        Instruction::decode(Opcode(word), 0x200)
    }

    #[test]
    fn fields_are_extracted_from_fixed_positions() {
        let op = Opcode(0xD3A7);
        assert_eq!(op.primary(), 0xD);
        assert_eq!(op.x(), 0x3);
        assert_eq!(op.y(), 0xA);
        assert_eq!(op.n(), 0x7);
        assert_eq!(op.kk(), 0xA7);
        assert_eq!(op.nnn(), 0x3A7);
    }

    #[test]
    fn decodes_each_family() {
        assert_eq!(decode(0x00E0).unwrap(), Instruction::Cls);
        assert_eq!(decode(0x00EE).unwrap(), Instruction::Ret);
        assert_eq!(decode(0x1ABC).unwrap(), Instruction::Jump(0xABC));
        assert_eq!(decode(0x2345).unwrap(), Instruction::Call(0x345));
        assert_eq!(decode(0x5120).unwrap(), Instruction::SkipEqReg { x: 1, y: 2 });
        assert_eq!(decode(0x8AB6).unwrap(), Instruction::Shr { x: 0xA });
        assert_eq!(decode(0x8ABE).unwrap(), Instruction::Shl { x: 0xA });
        assert_eq!(decode(0x8127).unwrap(), Instruction::SubN { x: 1, y: 2 });
        assert_eq!(decode(0xD125).unwrap(), Instruction::Draw { x: 1, y: 2, n: 5 });
        assert_eq!(decode(0xE19E).unwrap(), Instruction::SkipKeyPressed { x: 1 });
        assert_eq!(decode(0xE2A1).unwrap(), Instruction::SkipKeyNotPressed { x: 2 });
        assert_eq!(decode(0xF50A).unwrap(), Instruction::WaitKey { x: 5 });
        assert_eq!(decode(0xF065).unwrap(), Instruction::LoadRegisters { x: 0 });
    }

    #[test]
    fn unknown_secondary_selectors_are_errors() {
        for word in [0x00E3, 0x5123, 0x8008, 0x800F, 0x9011, 0xE19F, 0xF000, 0xF0FF] {
            let err = decode(word).unwrap_err();
            assert!(
                matches!(err, Error::UnknownOpcode { opcode, address: 0x200 } if opcode == word),
                "{word:04X} decoded"
            );
        }
    }

    #[test]
    fn mnemonics() {
        assert_eq!(decode(0x6005).unwrap().to_string(), "LD V0, 0x05");
        assert_eq!(decode(0xA210).unwrap().to_string(), "LD I, 0x210");
        assert_eq!(decode(0xDAB3).unwrap().to_string(), "DRW VA, VB, 3");
        assert_eq!(decode(0xF355).unwrap().to_string(), "LD [I], V3");
        assert_eq!(Opcode(0xE0).to_string(), "00E0");
    }
}
