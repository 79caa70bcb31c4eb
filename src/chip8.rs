use std::fmt;
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;

use rand::rngs::ThreadRng;
use tracing::{debug, trace};

use crate::error::{Chip8Error, Result};
use crate::rng::RandomSource;

mod execute;
pub mod instruction;

pub use instruction::{decode, Instruction, Opcode};

pub const MEM_SIZE: usize = 4096;
/// programs start at 0x200
pub const PROG_START: usize = 0x200;
pub const PROG_SIZE: usize = MEM_SIZE - PROG_START;
pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;
pub const STACK_DEPTH: usize = 16;
pub const KEY_COUNT: usize = 16;
/// bytes per font glyph
pub const GLYPH_SIZE: u16 = 5;

pub const FONTSET: [u8; 80] = [
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

/// What a single call to [`Chip8::emulate_cycle`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    Executed(Opcode),
    /// FX0A found no key down; PC is unchanged and the same instruction runs
    /// again next cycle
    WaitingForKey,
}

pub struct Chip8<R = ThreadRng> {
    // CHIP-8 VM
    memory: [u8; MEM_SIZE],                    // system memory
    v: [u8; 16],                               // registers V0-VE (VF is flag for some instructions)
    i: u16,                                    // address register
    pc: u16,                                   // program counter
    gfx: [u8; SCREEN_WIDTH * SCREEN_HEIGHT],   // pixels state
    delay_timer: u8,
    sound_timer: u8, // timers count down at 60Hz, driven from outside
    stack: [u16; STACK_DEPTH],
    sp: u16,                // stack pointer
    key: [bool; KEY_COUNT], // hex keypad state

    // emulator resources
    draw_flag: bool,
    rng: R,
}

impl Chip8 {
    pub fn new() -> Self {
        Self::with_rng(rand::thread_rng())
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RandomSource> Chip8<R> {
    pub fn with_rng(rng: R) -> Self {
        let mut memory = [0; MEM_SIZE];

        // CHIP-8 systems had the interpreter in the first 512 bytes of memory
        // since we're emulating that we can just store the fontset there
        memory[..FONTSET.len()].copy_from_slice(&FONTSET);

        Self {
            memory,
            v: [0; 16],
            i: 0,
            pc: PROG_START as u16,
            gfx: [0; SCREEN_WIDTH * SCREEN_HEIGHT],
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_DEPTH],
            sp: 0,
            key: [false; KEY_COUNT],

            draw_flag: false,
            rng,
        }
    }

    /// Read a whole ROM file and copy it to 0x200. Nothing is written unless
    /// the read succeeded and the ROM fits.
    pub fn load_rom<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let failure = |source| Chip8Error::RomLoadFailure {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(failure)?;
        let mut rom = Vec::new();
        file.read_to_end(&mut rom).map_err(failure)?;

        debug!(path = %path.display(), size = rom.len(), "read ROM");
        self.load_program(&rom)
    }

    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        if program.len() > PROG_SIZE {
            return Err(Chip8Error::RomTooLarge {
                size: program.len(),
                max: PROG_SIZE,
            });
        }
        self.memory[PROG_START..PROG_START + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Fetch, decode and execute the instruction at PC.
    ///
    /// Jumps, calls and returns set PC outright. Everything else moves on by
    /// one instruction, or two when a skip is taken. On error nothing about the
    /// machine has changed except the draw flag being cleared.
    pub fn emulate_cycle(&mut self) -> Result<Cycle> {
        self.draw_flag = false;

        let instruction = decode(&self.memory, self.pc)?;
        let opcode = Opcode::of(&instruction)?;
        trace!(pc = self.pc, word = instruction.word(), ?opcode, "execute");

        match self.execute(opcode, instruction)? {
            Flow::Next => self.pc = self.pc.wrapping_add(2),
            Flow::Skip => self.pc = self.pc.wrapping_add(4),
            Flow::Jump(addr) => self.pc = addr,
            Flow::Wait => return Ok(Cycle::WaitingForKey),
        }

        Ok(Cycle::Executed(opcode))
    }

    /// True when the last cycle touched the screen.
    pub fn draw_flag(&self) -> bool {
        self.draw_flag
    }

    /// 64x32 pixels, row-major, one byte (0 or 1) per pixel
    pub fn gfx(&self) -> &[u8] {
        &self.gfx
    }

    pub fn sound_flag(&self) -> bool {
        self.sound_timer > 0
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn set_delay_timer(&mut self, value: u8) {
        self.delay_timer = value;
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn set_sound_timer(&mut self, value: u8) {
        self.sound_timer = value;
    }

    pub fn clear_keys(&mut self) {
        self.key = [false; KEY_COUNT];
    }

    pub fn press_key(&mut self, key: usize) {
        if let Some(k) = self.key.get_mut(key) {
            *k = true;
        }
    }

    pub fn release_key(&mut self, key: usize) {
        if let Some(k) = self.key.get_mut(key) {
            *k = false;
        }
    }

    /// Replace the whole keypad in one go, between cycles.
    pub fn set_keys(&mut self, keys: [bool; KEY_COUNT]) {
        self.key = keys;
    }

    pub fn keys(&self) -> &[bool; KEY_COUNT] {
        &self.key
    }

    pub fn v(&self) -> &[u8; 16] {
        &self.v
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn sp(&self) -> u16 {
        self.sp
    }

    /// live part of the call stack, oldest frame first
    pub fn stack(&self) -> &[u16] {
        &self.stack[..self.sp as usize]
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }
}

/// How PC moves once an instruction has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Next,
    Skip,
    Jump(u16),
    Wait,
}

impl<R> fmt::Display for Chip8<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, v) in self.v.iter().enumerate() {
            writeln!(f, "V{:X}\t{:#04X}", n, v)?;
        }
        writeln!(f, "----")?;
        writeln!(f, "DT\t{}", self.delay_timer)?;
        writeln!(f, "ST\t{}", self.sound_timer)?;
        writeln!(f, "SP\t{}", self.sp)?;
        writeln!(f, "PC\t{:#05X}", self.pc)?;
        writeln!(f, "I\t{:#05X}", self.i)?;

        let keypad = self
            .key
            .iter()
            .enumerate()
            .fold(0u16, |mask, (n, &down)| if down { mask | 1 << n } else { mask });
        writeln!(f, "KEYS\t{:#018b}", keypad)?;

        for (n, addr) in self.stack[..self.sp as usize].iter().enumerate() {
            writeln!(f, "S[{}]\t{:#05X}", n, addr)?;
        }
        Ok(())
    }
}
