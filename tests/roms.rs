use std::fs;

use chip8::chip8::{FONTSET, SCREEN_WIDTH, STACK_DEPTH};
use chip8::rng::FixedByte;
use chip8::{disassembler, Chip8, Chip8Error, Cycle, Opcode};
use pretty_assertions::assert_eq;
use rand::{rngs::StdRng, SeedableRng};

/// prints 254 as three font digits along the top-left corner, then spins
#[rustfmt::skip]
const BCD_ROM: [u8; 30] = [
    0xA3, 0x00, // LD I, 300
    0x60, 0xFE, // LD V0, FE
    0xF0, 0x33, // BCD V0
    0xF2, 0x65, // LD V0..V2, [I]
    0x63, 0x00, // LD V3, 0
    0x64, 0x00, // LD V4, 0
    0xF0, 0x29, // LD F, V0
    0xD3, 0x45, // DRW V3, V4, 5
    0x73, 0x05, // ADD V3, 5
    0xF1, 0x29, // LD F, V1
    0xD3, 0x45,
    0x73, 0x05,
    0xF2, 0x29, // LD F, V2
    0xD3, 0x45,
    0x12, 0x1C, // JP 21C
];

fn machine(program: &[u8]) -> Chip8<FixedByte> {
    let mut chip8 = Chip8::with_rng(FixedByte(0));
    chip8.load_program(program).unwrap();
    chip8
}

/// the four pixels of a font glyph row at (x, y), packed into a high nibble
fn glyph_row<R: chip8::rng::RandomSource>(chip8: &Chip8<R>, x: usize, y: usize) -> u8 {
    (0..4).fold(0, |row, col| row | chip8.gfx()[y * SCREEN_WIDTH + x + col] << (7 - col))
}

fn glyph(digit: usize) -> Vec<u8> {
    FONTSET[digit * 5..digit * 5 + 5].to_vec()
}

#[test]
fn draws_bcd_digits_from_the_font() {
    let mut chip8 = machine(&BCD_ROM);
    for _ in 0..14 {
        chip8.emulate_cycle().unwrap();
    }
    assert_eq!(chip8.pc(), 0x21C);
    assert_eq!(&chip8.v()[..3], &[2, 5, 4]);
    assert_eq!(chip8.v()[0xF], 0);

    for (n, digit) in [2, 5, 4].iter().enumerate() {
        let drawn: Vec<u8> = (0..5).map(|y| glyph_row(&chip8, n * 5, y)).collect();
        assert_eq!(drawn, glyph(*digit));
    }

    // the halt loop keeps jumping to itself
    assert_eq!(chip8.emulate_cycle().unwrap(), Cycle::Executed(Opcode::Jump));
    assert_eq!(chip8.pc(), 0x21C);
}

#[test]
fn nested_calls_unwind_in_reverse() {
    let mut program = vec![0; 0x22];
    program[0x00..0x06].copy_from_slice(&[0x22, 0x10, 0x61, 0x01, 0x12, 0x04]);
    program[0x10..0x14].copy_from_slice(&[0x22, 0x20, 0x00, 0xEE]);
    program[0x20..0x22].copy_from_slice(&[0x00, 0xEE]);
    let mut chip8 = machine(&program);

    chip8.emulate_cycle().unwrap();
    assert_eq!((chip8.pc(), chip8.sp()), (0x210, 1));
    chip8.emulate_cycle().unwrap();
    assert_eq!((chip8.pc(), chip8.sp()), (0x220, 2));
    assert_eq!(chip8.stack(), &[0x200, 0x210]);

    chip8.emulate_cycle().unwrap();
    assert_eq!((chip8.pc(), chip8.sp()), (0x212, 1));
    chip8.emulate_cycle().unwrap();
    assert_eq!((chip8.pc(), chip8.sp()), (0x202, 0));

    chip8.emulate_cycle().unwrap();
    assert_eq!(chip8.v()[1], 1);
    assert_eq!(chip8.pc(), 0x204);
}

#[test]
fn runaway_recursion_overflows_the_stack() {
    let mut chip8 = machine(&[0x22, 0x00]);
    for _ in 0..STACK_DEPTH {
        chip8.emulate_cycle().unwrap();
    }
    let err = chip8.emulate_cycle().unwrap_err();
    assert!(matches!(err, Chip8Error::StackOverflow { pc: 0x200 }));
    assert_eq!(chip8.sp() as usize, STACK_DEPTH);
    assert_eq!(chip8.pc(), 0x200);
}

#[test]
fn waits_for_a_key_then_tests_it() {
    #[rustfmt::skip]
    let mut chip8 = machine(&[
        0xF5, 0x0A, // LD V5, K
        0xE5, 0x9E, // SKP V5
        0x66, 0x01, // LD V6, 1
        0x67, 0x01, // LD V7, 1
        0x12, 0x08, // JP 208
    ]);

    assert_eq!(chip8.emulate_cycle().unwrap(), Cycle::WaitingForKey);
    assert_eq!(chip8.pc(), 0x200);

    let mut keys = [false; 16];
    keys[7] = true;
    chip8.set_keys(keys);

    for _ in 0..3 {
        chip8.emulate_cycle().unwrap();
    }
    assert_eq!(chip8.v()[5], 7);
    assert_eq!(chip8.v()[6], 0);
    assert_eq!(chip8.v()[7], 1);
}

#[test]
fn seeded_random_runs_repeat() {
    let program = [0xC0, 0xFF, 0xC1, 0xFF, 0xC2, 0x0F, 0x12, 0x06];
    let registers = |seed| {
        let mut chip8 = Chip8::with_rng(StdRng::seed_from_u64(seed));
        chip8.load_program(&program).unwrap();
        for _ in 0..3 {
            chip8.emulate_cycle().unwrap();
        }
        *chip8.v()
    };

    let first = registers(7);
    assert_eq!(first, registers(7));
    assert!(first[2] <= 0x0F);

    let mut fixed = Chip8::with_rng(FixedByte(0x3C));
    fixed.load_program(&program).unwrap();
    for _ in 0..3 {
        fixed.emulate_cycle().unwrap();
    }
    assert_eq!(&fixed.v()[..3], &[0x3C, 0x3C, 0x0C]);
}

#[test]
fn loads_a_rom_from_disk() {
    let path = std::env::temp_dir().join(format!("chip8-roms-{}.ch8", std::process::id()));
    fs::write(&path, &BCD_ROM).unwrap();

    let mut chip8 = Chip8::with_rng(FixedByte(0));
    let loaded = chip8.load_rom(&path);
    fs::remove_file(&path).unwrap();
    loaded.unwrap();

    assert_eq!(&chip8.memory()[0x200..0x200 + BCD_ROM.len()], &BCD_ROM[..]);
}

#[test]
fn rom_load_failures() {
    let mut chip8 = Chip8::with_rng(FixedByte(0));
    let err = chip8.load_rom("no/such/rom.ch8").unwrap_err();
    assert!(matches!(err, Chip8Error::RomLoadFailure { .. }));
    assert!(err.to_string().contains("no/such/rom.ch8"));

    let err = chip8.load_program(&[0; 0x1000]).unwrap_err();
    assert!(matches!(err, Chip8Error::RomTooLarge { size: 0x1000, max: 0xE00 }));
}

#[test]
fn listing_of_a_real_program() {
    let listing = disassembler::listing(&BCD_ROM);
    let lines: Vec<&str> = listing.lines().collect();

    assert_eq!(lines.len(), 2 + BCD_ROM.len() / 2);
    assert_eq!(lines[2], "0200  MVI\tI $300");
    assert_eq!(lines[4], "0204  LD\tB, V0");
    assert_eq!(lines[9], "020E  DRW\tV3, V4, $5");
    assert_eq!(lines[16], "021C  JMP\t$21C");
    assert_eq!(listing, disassembler::listing(&BCD_ROM));
}
