use std::convert::TryFrom;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::{Chip8Error, Result};

/// One decoded two-byte instruction.
///
/// `class` is the dense opcode key: the top nibble, widened with whichever
/// other bits tell instructions of the same family apart (8XY4 -> 0x84,
/// FX33 -> 0xF33, 00E0 -> 0xE0). `operand` is what's left once those bits are
/// gone, and its layout depends on the class:
///
/// * 1/2/A/B: `NNN`
/// * 3/4/6/7/C: `XNN`
/// * D: `XYN`
/// * 5/8/9: `XY`
/// * E/F: `X`
/// * 0: nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    class: u16,
    operand: u16,
    word: u16, // raw big-endian word, kept for diagnostics and the 0NNN family
}

impl Instruction {
    pub fn class(&self) -> u16 {
        self.class
    }

    pub fn operand(&self) -> u16 {
        self.operand
    }

    pub fn word(&self) -> u16 {
        self.word
    }

    /// 12-bit address operand (1NNN, 2NNN, ANNN, BNNN)
    pub fn addr(&self) -> u16 {
        self.operand & 0xFFF
    }

    /// register + byte immediate (3XNN, 4XNN, 6XNN, 7XNN, CXNN)
    pub fn x_nn(&self) -> (usize, u8) {
        (((self.operand & 0xF00) >> 8) as usize, (self.operand & 0xFF) as u8)
    }

    /// register pair packed as 0xXY (5XY0, 8XY*, 9XY0)
    pub fn xy(&self) -> (usize, usize) {
        (((self.operand & 0xF0) >> 4) as usize, (self.operand & 0xF) as usize)
    }

    /// register pair plus sprite height (DXYN)
    pub fn xyn(&self) -> (usize, usize, usize) {
        (
            ((self.operand & 0xF00) >> 8) as usize,
            ((self.operand & 0xF0) >> 4) as usize,
            (self.operand & 0xF) as usize,
        )
    }

    /// single register (EX**, FX**)
    pub fn x(&self) -> usize {
        (self.operand & 0xF) as usize
    }
}

/// Read the two bytes at `pc` and fold them into an [`Instruction`].
pub fn decode(program: &[u8], pc: u16) -> Result<Instruction> {
    let at = pc as usize;
    let (hi, lo) = match (program.get(at), program.get(at + 1)) {
        (Some(&hi), Some(&lo)) => (u16::from(hi), u16::from(lo)),
        _ => {
            return Err(Chip8Error::DecodeOutOfBounds {
                pc,
                len: program.len(),
            })
        }
    };

    let nibble = (hi & 0xF0) >> 4;
    let (class, operand) = match nibble {
        // family told apart by the last nibble
        0x5 | 0x8 | 0x9 => ((nibble << 4) | (lo & 0xF), ((hi & 0xF) << 4) | ((lo & 0xF0) >> 4)),
        // family told apart by the whole low byte
        0xE | 0xF => ((nibble << 8) | lo, hi & 0xF),
        0x0 => (lo, 0),
        _ => (nibble, ((hi & 0xF) << 8) | lo),
    };

    Ok(Instruction {
        class,
        operand,
        word: (hi << 8) | lo,
    })
}

/// The 35 instructions, keyed by their opcode class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum Opcode {
    Sys = 0x0000,
    Cls = 0x00E0,
    Ret = 0x00EE,
    Jump = 0x1,
    Call = 0x2,
    SkipEqImm = 0x3,
    SkipNeImm = 0x4,
    SkipEqReg = 0x50,
    LoadImm = 0x6,
    AddImm = 0x7,
    Move = 0x80,
    Or = 0x81,
    And = 0x82,
    Xor = 0x83,
    AddReg = 0x84,
    Sub = 0x85,
    ShiftRight = 0x86,
    SubNeg = 0x87,
    ShiftLeft = 0x8E,
    SkipNeReg = 0x90,
    LoadIndex = 0xA,
    JumpOffset = 0xB,
    Random = 0xC,
    Draw = 0xD,
    SkipKey = 0xE9E,
    SkipNoKey = 0xEA1,
    LoadDelay = 0xF07,
    WaitKey = 0xF0A,
    SetDelay = 0xF15,
    SetSound = 0xF18,
    AddIndex = 0xF1E,
    LoadFont = 0xF29,
    StoreBcd = 0xF33,
    StoreRegs = 0xF55,
    LoadRegs = 0xF65,
}

impl Opcode {
    /// Look up the instruction an [`Instruction`] refers to.
    ///
    /// 0NNN words put their low byte in the class, which can land on keys
    /// owned by other families (0050 has class 0x50, same as 5XY0). The raw
    /// word settles those: anything in the 0 family other than 00E0/00EE is
    /// a machine-code call, executed as a no-op.
    pub fn of(instruction: &Instruction) -> Result<Self> {
        if instruction.word() & 0xF000 == 0 {
            return Ok(match instruction.class() {
                0xE0 => Opcode::Cls,
                0xEE => Opcode::Ret,
                _ => Opcode::Sys,
            });
        }

        Opcode::try_from(instruction.class()).map_err(|_| Chip8Error::UnknownOpcode {
            class: instruction.class(),
            word: instruction.word(),
        })
    }
}
