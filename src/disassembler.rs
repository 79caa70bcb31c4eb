//! Turns CHIP-8 bytecode back into assembly text.
//!
//! The same decoder the interpreter uses feeds a formatter per opcode, so
//! anything the interpreter can run shows up here under one mnemonic.
//! Register numbers print in decimal, immediates and addresses in hex.

use std::fmt::{self, Write};

use crate::chip8::{decode, Instruction, Opcode, PROG_START};

/// Assembly text for one decoded instruction.
pub fn mnemonic(opcode: Opcode, ins: &Instruction) -> String {
    use Opcode::*;

    match opcode {
        Sys if ins.word() == 0 => "NOP".to_string(),
        Sys => format!("SYS\t${:X}", ins.word() & 0xFFF),
        Cls => "CLS".to_string(),
        Ret => "RET".to_string(),
        Jump => format!("JMP\t${:X}", ins.addr()),
        Call => format!("CALL\t${:X}", ins.addr()),
        SkipEqImm => reg_imm("SE", ins),
        SkipNeImm => reg_imm("SNE", ins),
        SkipEqReg => reg_reg("SE", ins),
        LoadImm => reg_imm("MOV", ins),
        AddImm => reg_imm("ADD", ins),
        Move => reg_reg("MOV", ins),
        Or => reg_reg("OR", ins),
        And => reg_reg("AND", ins),
        Xor => reg_reg("XOR", ins),
        AddReg => reg_reg("ADD", ins),
        Sub => reg_reg("SUB", ins),
        ShiftRight => format!("SHR\tV{}", ins.xy().0),
        SubNeg => reg_reg("SUBN", ins),
        ShiftLeft => format!("SHL\tV{}", ins.xy().0),
        SkipNeReg => reg_reg("SNE", ins),
        LoadIndex => format!("MVI\tI ${:X}", ins.addr()),
        JumpOffset => format!("JMP\tV0, ${:X}", ins.addr()),
        Random => reg_imm("RND", ins),
        Draw => {
            let (x, y, n) = ins.xyn();
            format!("DRW\tV{}, V{}, ${:X}", x, y, n)
        }
        SkipKey => format!("SKP\tV{}", ins.x()),
        SkipNoKey => format!("SKNP\tV{}", ins.x()),
        LoadDelay => format!("LD\tV{}, DT", ins.x()),
        WaitKey => format!("LD\tV{}, K", ins.x()),
        SetDelay => format!("LD\tDT, V{}", ins.x()),
        SetSound => format!("LD\tST, V{}", ins.x()),
        AddIndex => format!("ADD\tI, V{}", ins.x()),
        LoadFont => format!("LD\tF, V{}", ins.x()),
        StoreBcd => format!("LD\tB, V{}", ins.x()),
        StoreRegs => format!("LD\t[I], V{}", ins.x()),
        LoadRegs => format!("LD\tV{}, [I]", ins.x()),
    }
}

fn reg_imm(name: &str, ins: &Instruction) -> String {
    let (x, nn) = ins.x_nn();
    format!("{}\tV{}, ${:X}", name, x, nn)
}

fn reg_reg(name: &str, ins: &Instruction) -> String {
    let (x, y) = ins.xy();
    format!("{}\tV{}, V{}", name, x, y)
}

/// Walk `program` two bytes at a time from offset 0, yielding the offset and
/// the text for each word. Words with no matching instruction come out as
/// `DW` data; a dangling last byte comes out as `DB`.
pub fn lines(program: &[u8]) -> impl Iterator<Item = (usize, String)> + '_ {
    (0..program.len()).step_by(2).map(move |offset| {
        let text = match decode(&program[offset..], 0) {
            Ok(ins) => match Opcode::of(&ins) {
                Ok(opcode) => mnemonic(opcode, &ins),
                Err(_) => format!("DW\t${:04X}", ins.word()),
            },
            Err(_) => format!("DB\t${:02X}", program[offset]),
        };
        (offset, text)
    })
}

/// Write a full listing: a header, then one `ADDR  text` line per word, with
/// addresses as they'd be once loaded at 0x200.
pub fn disassemble<W: Write>(program: &[u8], out: &mut W) -> fmt::Result {
    writeln!(out, "ADDR  Assembly")?;
    writeln!(out, "----  --------")?;
    for (offset, text) in lines(program) {
        writeln!(out, "{:04X}  {}", PROG_START + offset, text)?;
    }
    Ok(())
}

pub fn listing(program: &[u8]) -> String {
    let mut out = String::new();
    // writing into a String can't fail
    let _ = disassemble(program, &mut out);
    out
}
