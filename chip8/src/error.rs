//! Errors surfaced by the Chip8 core. Every variant is detected at an
//! instruction boundary or at an external entry point, and handed back to
//! the caller of [`super::Chip8::step`] or the loader.

/// Errors that can occur while loading or running a Chip8 program.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The instruction word has no handler for its primary or secondary selector.
    #[error("Unknown opcode {opcode:#06X} at address {address:#05X}")]
    UnknownOpcode { opcode: u16, address: u16 },

    /// The program does not fit into the program/data region.
    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    RomTooLarge { size: usize, max: usize },

    /// A `CALL` was executed with all stack frames in use.
    #[error("Stack overflow: CALL at {address:#05X} exceeds 16 nested calls")]
    StackOverflow { address: u16 },

    /// A `RET` was executed with an empty call stack.
    #[error("Stack underflow: RET at {address:#05X} without a matching CALL")]
    StackUnderflow { address: u16 },

    /// The input source reported a key outside `0x0..=0xF`.
    #[error("Invalid key index {0:#X}, expected 0x0 to 0xF")]
    InvalidKey(u8),

    /// The random source used by `RND` failed.
    #[error("Failed to read random byte: {0}")]
    Entropy(#[from] getrandom::Error),

    /// A tick was requested after a fatal error stopped the interpreter.
    #[error("Interpreter halted at address {address:#05X}")]
    Halted { address: u16 },
}

impl Error {
    /// Whether this error stops the interpreter from advancing any further.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnknownOpcode { .. }
                | Self::StackOverflow { .. }
                | Self::StackUnderflow { .. }
                | Self::Entropy(_)
                | Self::Halted { .. }
        )
    }
}

/// A [`std::result::Result`] with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
