use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Chip8Error>;

/// Everything that can stop a cycle, a ROM load or a disassembly pass.
/// None of these leave the machine half-updated.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("can't decode at {pc:#05X}: buffer is only {len} bytes long")]
    DecodeOutOfBounds { pc: u16, len: usize },

    #[error("unimplemented instruction {word:#06X} (class {class:#05X})")]
    UnknownOpcode { class: u16, word: u16 },

    #[error("stack overflow: call at {pc:#05X} with 16 frames already in use")]
    StackOverflow { pc: u16 },

    #[error("stack underflow: return at {pc:#05X} with an empty call stack")]
    StackUnderflow { pc: u16 },

    #[error("memory access out of bounds at {address:#06X}")]
    MemoryOutOfBounds { address: usize },

    #[error("failed to load ROM {}: {source}", .path.display())]
    RomLoadFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    RomTooLarge { size: usize, max: usize },
}
