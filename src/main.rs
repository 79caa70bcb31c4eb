use std::fs;
use std::path::{Path, PathBuf};
use std::process::exit;

use chip8::chip8::{Chip8, KEY_COUNT, SCREEN_WIDTH};
use chip8::rng::RandomSource;
use chip8::{disassembler, Chip8Error, Cycle};
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a ROM without a window and print the screen it ends on
    Run {
        rom: PathBuf,

        /// how many instructions to execute
        #[arg(long, default_value_t = 1000)]
        cycles: u64,

        /// instructions per 60Hz timer tick
        #[arg(long, default_value_t = 10)]
        cycles_per_frame: u64,

        /// seed for CXNN, for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// keys (0-F) held down for the whole run
        #[arg(long, value_parser = parse_key, num_args = 1..)]
        keys: Vec<usize>,
    },
    /// Print an assembly listing of a ROM
    Disasm { rom: PathBuf },
}

struct RunConfig {
    cycles: u64,
    cycles_per_frame: u64,
    keys: [bool; KEY_COUNT],
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let result = match args.command {
        Command::Run {
            rom,
            cycles,
            cycles_per_frame,
            seed,
            keys,
        } => {
            let mut held = [false; KEY_COUNT];
            for key in keys {
                held[key] = true;
            }
            let config = RunConfig {
                cycles,
                cycles_per_frame: cycles_per_frame.max(1),
                keys: held,
            };

            match seed {
                Some(seed) => run(Chip8::with_rng(StdRng::seed_from_u64(seed)), &rom, &config),
                None => run(Chip8::new(), &rom, &config),
            }
        }
        Command::Disasm { rom } => disasm(&rom),
    };

    if let Err(e) = result {
        eprintln!("chip8: {}", e);
        exit(1);
    }
}

fn run<R: RandomSource>(
    mut emu: Chip8<R>,
    rom: &Path,
    config: &RunConfig,
) -> Result<(), Chip8Error> {
    emu.load_rom(rom)?;
    emu.set_keys(config.keys);

    let mut frames = 0;
    for cycle in 1..=config.cycles {
        match emu.emulate_cycle() {
            Ok(Cycle::WaitingForKey) => debug!(cycle, "stalled on key wait"),
            Ok(Cycle::Executed(_)) => {}
            Err(e) => {
                warn!(cycle, pc = emu.pc(), "halting");
                print_screen(&emu);
                return Err(e);
            }
        }

        if emu.draw_flag() {
            frames += 1;
        }

        // stand-in for the 60Hz timer driver
        if cycle % config.cycles_per_frame == 0 {
            emu.set_delay_timer(emu.delay_timer().saturating_sub(1));
            emu.set_sound_timer(emu.sound_timer().saturating_sub(1));
        }
    }
    info!(cycles = config.cycles, frames, "run finished");

    print_screen(&emu);
    println!("{}", emu);
    Ok(())
}

fn print_screen<R: RandomSource>(emu: &Chip8<R>) {
    for row in emu.gfx().chunks(SCREEN_WIDTH) {
        let line: String = row.iter().map(|&p| if p == 1 { '#' } else { '.' }).collect();
        println!("{}", line);
    }
}

fn disasm(rom: &Path) -> Result<(), Chip8Error> {
    let program = fs::read(rom).map_err(|source| Chip8Error::RomLoadFailure {
        path: rom.to_path_buf(),
        source,
    })?;
    print!("{}", disassembler::listing(&program));
    Ok(())
}

fn parse_key(s: &str) -> Result<usize, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    match usize::from_str_radix(digits, 16) {
        Ok(key) if key < KEY_COUNT => Ok(key),
        _ => Err(format!("'{}' is not a key between 0 and F", s)),
    }
}
