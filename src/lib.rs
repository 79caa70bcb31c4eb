//! A CHIP-8 interpreter core plus a disassembler over the same decoder.
//!
//! The core never sleeps, draws or plays sound. Whoever drives it feeds in
//! ROM bytes and keypad state, counts the timers down at 60Hz, and reads the
//! pixel buffer back out when [`Chip8::draw_flag`] says it changed.
//!
//! ```
//! use chip8::{Chip8, Cycle, Opcode, rng::FixedByte};
//!
//! let mut chip8 = Chip8::with_rng(FixedByte(0));
//! chip8.load_program(&[0x00, 0xE0, 0x12, 0x02]).unwrap(); // CLS; JP 202
//! assert_eq!(chip8.emulate_cycle().unwrap(), Cycle::Executed(Opcode::Cls));
//! assert!(chip8.draw_flag());
//! ```

pub mod chip8;
pub mod disassembler;
pub mod error;
pub mod rng;

pub use crate::chip8::{Chip8, Cycle, Instruction, Opcode};
pub use crate::error::{Chip8Error, Result};
