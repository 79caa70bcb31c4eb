use std::ops::Range;

use tracing::debug;

use super::{Chip8, Flow, Instruction, Opcode};
use super::{GLYPH_SIZE, KEY_COUNT, MEM_SIZE, SCREEN_HEIGHT, SCREEN_WIDTH, STACK_DEPTH};
use crate::error::{Chip8Error, Result};
use crate::rng::RandomSource;

impl<R: RandomSource> Chip8<R> {
    /// Apply one instruction. Every check that can fail runs before the
    /// first write, so an `Err` means the machine is untouched.
    pub(super) fn execute(&mut self, opcode: Opcode, ins: Instruction) -> Result<Flow> {
        use Opcode::*;

        Ok(match opcode {
            Sys => Flow::Next,
            Cls => self.cls(),
            Ret => self.ret()?,
            Jump => Flow::Jump(ins.addr()),
            Call => self.call(ins)?,
            SkipEqImm => {
                // 3XNN
                let (x, nn) = ins.x_nn();
                skip_if(self.v[x] == nn)
            }
            SkipNeImm => {
                // 4XNN
                let (x, nn) = ins.x_nn();
                skip_if(self.v[x] != nn)
            }
            SkipEqReg => {
                // 5XY0
                let (x, y) = ins.xy();
                skip_if(self.v[x] == self.v[y])
            }
            LoadImm => {
                // 6XNN
                let (x, nn) = ins.x_nn();
                self.v[x] = nn;
                Flow::Next
            }
            AddImm => {
                // 7XNN, carry flag untouched
                let (x, nn) = ins.x_nn();
                self.v[x] = self.v[x].wrapping_add(nn);
                Flow::Next
            }
            // 8XY0
            Move => self.alu(ins, |_, vy| (vy, None)),
            // 8XY1
            Or => self.alu(ins, |vx, vy| (vx | vy, None)),
            // 8XY2
            And => self.alu(ins, |vx, vy| (vx & vy, None)),
            // 8XY3
            Xor => self.alu(ins, |vx, vy| (vx ^ vy, None)),
            // 8XY4
            AddReg => self.alu(ins, |vx, vy| {
                let (sum, carry) = vx.overflowing_add(vy);
                (sum, Some(carry as u8))
            }),
            // 8XY5
            Sub => self.alu(ins, |vx, vy| (vx.wrapping_sub(vy), Some((vx > vy) as u8))),
            // 8XY6
            ShiftRight => self.alu(ins, |vx, _| (vx >> 1, Some(vx & 0x1))),
            // 8XY7
            SubNeg => self.alu(ins, |vx, vy| (vy.wrapping_sub(vx), Some((vy > vx) as u8))),
            // 8XYE
            ShiftLeft => self.alu(ins, |vx, _| (vx << 1, Some((vx & 0x80 != 0) as u8))),
            SkipNeReg => {
                // 9XY0
                let (x, y) = ins.xy();
                skip_if(self.v[x] != self.v[y])
            }
            LoadIndex => {
                // ANNN
                self.i = ins.addr();
                Flow::Next
            }
            JumpOffset => {
                // BNNN
                Flow::Jump(ins.addr() + u16::from(self.v[0]))
            }
            Random => {
                // CXNN
                let (x, nn) = ins.x_nn();
                self.v[x] = nn & self.rng.next_byte();
                Flow::Next
            }
            Draw => self.draw(ins)?,
            SkipKey => {
                // EX9E
                skip_if(self.pressed(self.v[ins.x()]))
            }
            SkipNoKey => {
                // EXA1
                skip_if(!self.pressed(self.v[ins.x()]))
            }
            WaitKey => self.wait_key(ins),
            LoadDelay => {
                // FX07
                self.v[ins.x()] = self.delay_timer;
                Flow::Next
            }
            SetDelay => {
                // FX15
                self.delay_timer = self.v[ins.x()];
                Flow::Next
            }
            SetSound => {
                // FX18
                self.sound_timer = self.v[ins.x()];
                Flow::Next
            }
            AddIndex => {
                // FX1E, VF untouched
                self.i = self.i.wrapping_add(u16::from(self.v[ins.x()]));
                Flow::Next
            }
            LoadFont => {
                // FX29
                // we're storing fontset in the first 80 bytes, 5 bytes per sprite
                self.i = u16::from(self.v[ins.x()]) * GLYPH_SIZE;
                Flow::Next
            }
            StoreBcd => self.bcd(ins)?,
            StoreRegs => {
                // FX55
                // store V0 to VX (inclusive) in memory at I, I stays put
                let x = ins.x();
                let span = self.mem_span(self.i, x + 1)?;
                self.memory[span].copy_from_slice(&self.v[..=x]);
                Flow::Next
            }
            LoadRegs => {
                // FX65
                // fill V0 to VX (inclusive) from memory at I, I stays put
                let x = ins.x();
                let span = self.mem_span(self.i, x + 1)?;
                self.v[..=x].copy_from_slice(&self.memory[span]);
                Flow::Next
            }
        })
    }

    fn cls(&mut self) -> Flow {
        // 00E0
        self.gfx = [0; SCREEN_WIDTH * SCREEN_HEIGHT];
        self.draw_flag = true;
        Flow::Next
    }

    fn ret(&mut self) -> Result<Flow> {
        // 00EE
        // PC goes back to the call site and the usual advance steps over it
        if self.sp == 0 {
            return Err(Chip8Error::StackUnderflow { pc: self.pc });
        }
        self.sp -= 1;
        self.pc = self.stack[self.sp as usize];
        debug!(to = self.pc, depth = self.sp, "return");
        Ok(Flow::Next)
    }

    fn call(&mut self, ins: Instruction) -> Result<Flow> {
        // 2NNN
        if self.sp as usize == STACK_DEPTH {
            return Err(Chip8Error::StackOverflow { pc: self.pc });
        }
        self.stack[self.sp as usize] = self.pc;
        self.sp += 1;
        debug!(from = self.pc, to = ins.addr(), depth = self.sp, "call");
        Ok(Flow::Jump(ins.addr()))
    }

    /// 8XY* family: `op` maps (VX, VY) to the new VX and, for the arithmetic
    /// ones, the VF flag. The flag is written last, so with X = F it wins.
    fn alu<F>(&mut self, ins: Instruction, op: F) -> Flow
    where
        F: FnOnce(u8, u8) -> (u8, Option<u8>),
    {
        let (x, y) = ins.xy();
        let (result, flag) = op(self.v[x], self.v[y]);

        self.v[x] = result;
        if let Some(flag) = flag {
            self.v[0xF] = flag;
        }
        Flow::Next
    }

    fn draw(&mut self, ins: Instruction) -> Result<Flow> {
        // DXYN
        // draw a sprite at VX,VY with a width of 8 pixels and a height of N pixels
        // each row of 8 pixels is bit-coded in memory starting at I
        // currently drawn pixels are XORd with pixels in memory
        // VF is set to 1 if any currently drawn pixels are unset during this
        // pixels that fall off an edge wrap around to the opposite one
        let (x, y, height) = ins.xyn();
        let rows = self.mem_span(self.i, height)?;

        let vx = self.v[x] as usize;
        let vy = self.v[y] as usize;

        let mut collision = 0;
        for (row, i) in rows.enumerate() {
            let pixel = self.memory[i];
            for p in 0..8 {
                if pixel & (0x80 >> p) == 0 {
                    continue;
                }
                let gfx_offset =
                    SCREEN_WIDTH * ((vy + row) % SCREEN_HEIGHT) + (vx + p) % SCREEN_WIDTH;
                if self.gfx[gfx_offset] == 1 {
                    collision = 1;
                }
                self.gfx[gfx_offset] ^= 1;
            }
        }

        self.v[0xF] = collision;
        self.draw_flag = true;
        Ok(Flow::Next)
    }

    fn wait_key(&mut self, ins: Instruction) -> Flow {
        // FX0A
        // store next key press in VX; with nothing down PC stays put and the
        // caller runs this again next cycle
        match self.key.iter().position(|&down| down) {
            Some(key) => {
                self.v[ins.x()] = key as u8;
                Flow::Next
            }
            None => {
                debug!(pc = self.pc, "waiting for key");
                Flow::Wait
            }
        }
    }

    fn bcd(&mut self, ins: Instruction) -> Result<Flow> {
        // FX33
        // store the BCD representation of VX at I
        // so 193 becomes [1, 9, 3] in memory at I
        let span = self.mem_span(self.i, 3)?;
        let vx = self.v[ins.x()];
        self.memory[span].copy_from_slice(&[vx / 100, (vx / 10) % 10, vx % 10]);
        Ok(Flow::Next)
    }

    fn pressed(&self, key: u8) -> bool {
        (key as usize) < KEY_COUNT && self.key[key as usize]
    }

    /// `len` bytes of memory starting at `start`, or an error naming `start`
    /// when the run doesn't fit
    fn mem_span(&self, start: u16, len: usize) -> Result<Range<usize>> {
        let start = start as usize;
        if start + len > MEM_SIZE {
            return Err(Chip8Error::MemoryOutOfBounds { address: start });
        }
        Ok(start..start + len)
    }
}

fn skip_if(condition: bool) -> Flow {
    if condition {
        Flow::Skip
    } else {
        Flow::Next
    }
}
