use log::{debug, info, log_enabled, trace, warn, Level};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

mod config;
pub mod display;
mod error;
pub mod keypad;

pub use self::config::{Config, UnknownOpcode};
pub use self::display::Display;
pub use self::error::Error;
pub use self::keypad::Keypad;

pub const MEMORY_SIZE: usize = 4096;
pub const PROGRAM_START: u16 = 0x200;
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;
pub const STACK_DEPTH: usize = 16;

const ADDR_MASK: u16 = 0xFFF;
const FONT_GLYPH_SIZE: u16 = 5; // bytes per hex digit sprite

const FONTSET: [u8; 80] = [
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

type OpcodeFn = fn(&mut Chip8) -> Result<(), Error>;

pub struct Chip8 {
    // CHIP-8 VM
    opcode: u16,               // last fetched opcode
    memory: [u8; MEMORY_SIZE], // system memory
    v: [u8; 16],               // registers V0-VE (VF is flag for some instructions)
    i: u16,                    // address register
    pc: u16,                   // program counter
    display: Display,
    delay_timer: u8,
    sound_timer: u8, // timers count down at 60Hz
    stack: [u16; STACK_DEPTH],
    sp: u16, // number of frames on the stack
    keypad: Keypad,

    // emulator resources
    config: Config,
    draw_flag: bool,
    rng: StdRng,
    opcode_fns: [OpcodeFn; 16],
}

impl Chip8 {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut chip8 = Self {
            opcode: 0,
            memory: [0; MEMORY_SIZE],
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            display: Display::new(),
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_DEPTH],
            sp: 0,
            keypad: Keypad::new(),

            config,
            draw_flag: false,
            rng,
            opcode_fns: [
                Self::cls_ret, // 00E0, 00EE
                Self::jmp,     // 1NNN
                Self::call,    // 2NNN
                Self::eb,      // 3XNN
                Self::neb,     // 4XNN
                Self::er,      // 5XY0
                Self::ld,      // 6XNN
                Self::addb,    // 7XNN
                Self::alu,     // 8XY*
                Self::ner,     // 9XY0
                Self::si,      // ANNN
                Self::jmpo,    // BNNN
                Self::rng,     // CXNN
                Self::draw,    // DXYN
                Self::key,     // EX**
                Self::ex,      // FX**
            ],
        };
        chip8.reset();
        chip8.draw_flag = false;
        chip8
    }

    /// Copy a program into memory at 0x200.
    ///
    /// Nothing is touched if the program doesn't fit.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), Error> {
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(Error::ProgramTooLarge {
                size: program.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }

        let start = PROGRAM_START as usize;
        self.memory[start..start + program.len()].copy_from_slice(program);
        info!(
            "loaded {} byte program at {:#05X}",
            program.len(),
            PROGRAM_START
        );
        Ok(())
    }

    /// Put the machine back in its power-on state, keeping whatever program
    /// is already in memory.
    pub fn reset(&mut self) {
        self.opcode = 0;
        self.v = [0; 16];
        self.i = 0;
        self.pc = PROGRAM_START;
        self.display.clear();
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.stack = [0; STACK_DEPTH];
        self.sp = 0;
        self.keypad.clear();
        self.draw_flag = true;

        // CHIP-8 systems had the interpreter in the first 512 bytes of memory
        // since we're emulating that we can just store the fontset there
        self.memory[..FONTSET.len()].copy_from_slice(&FONTSET);
    }

    /// Reset and also wipe the loaded program.
    pub fn clear(&mut self) {
        self.memory = [0; MEMORY_SIZE];
        self.reset();
    }

    /// Fetch, decode and execute a single instruction.
    ///
    /// PC is advanced past the instruction before it executes, so jumps, calls
    /// and skips all work from the post-fetch value. On error the stack and
    /// registers are left as they were and PC points past the faulting
    /// instruction.
    pub fn emulate_cycle(&mut self) -> Result<(), Error> {
        let pc = self.pc;
        // two-byte opcodes
        self.opcode = (self.read_byte(pc) as u16) << 8 | self.read_byte(pc.wrapping_add(1)) as u16;
        self.pc = pc.wrapping_add(2) & ADDR_MASK;

        trace!("{:03X}: {:04X}", pc, self.opcode);

        let f = self.opcode_fns[((self.opcode & 0xF000) >> 12) as usize];
        let result = f(self);

        if log_enabled!(Level::Trace) {
            self.trace_state();
        }

        result
    }

    /// Count both timers down by one, stopping at zero. Meant to be called at
    /// 60Hz regardless of how fast cycles are run.
    pub fn tick_timers(&mut self) {
        if self.delay_timer > 0 {
            self.delay_timer -= 1;
        }
        if self.sound_timer > 0 {
            self.sound_timer -= 1;
        }
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    pub fn draw_flag(&self) -> bool {
        self.draw_flag
    }

    /// Whether the display changed since the last call
    pub fn take_draw_flag(&mut self) -> bool {
        std::mem::replace(&mut self.draw_flag, false)
    }

    pub fn sound_flag(&self) -> bool {
        self.sound_timer > 0
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub fn set_key(&mut self, key: u8, pressed: bool) {
        self.keypad.set(key, pressed);
    }

    pub fn press_key(&mut self, key: u8) {
        self.keypad.set(key, true);
    }

    pub fn release_key(&mut self, key: u8) {
        self.keypad.set(key, false);
    }

    pub fn clear_keys(&mut self) {
        self.keypad.clear();
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn sp(&self) -> usize {
        self.sp as usize
    }

    pub fn v(&self, x: usize) -> u8 {
        self.v[x & 0xF]
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.v
    }

    /// Return addresses currently pushed, oldest first
    pub fn stack(&self) -> &[u16] {
        &self.stack[..self.sp as usize]
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn opcode(&self) -> u16 {
        self.opcode
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn read_byte(&self, addr: u16) -> u8 {
        self.memory[(addr & ADDR_MASK) as usize]
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        self.memory[(addr & ADDR_MASK) as usize] = value;
    }

    fn x(&self) -> usize {
        ((self.opcode & 0xF00) >> 8) as usize
    }

    fn y(&self) -> usize {
        ((self.opcode & 0xF0) >> 4) as usize
    }

    fn n(&self) -> u8 {
        (self.opcode & 0xF) as u8
    }

    fn kk(&self) -> u8 {
        (self.opcode & 0xFF) as u8
    }

    fn nnn(&self) -> u16 {
        self.opcode & 0xFFF
    }

    // address of the instruction being executed
    fn instruction_addr(&self) -> u16 {
        self.pc.wrapping_sub(2) & ADDR_MASK
    }

    fn skip_if(&mut self, cond: bool) {
        if cond {
            self.pc = self.pc.wrapping_add(2) & ADDR_MASK;
        }
    }

    fn unknown_opcode(&mut self) -> Result<(), Error> {
        let pc = self.instruction_addr();
        match self.config.unknown_opcode {
            UnknownOpcode::Ignore => {
                debug!("ignoring unrecognized opcode {:04X} at {:03X}", self.opcode, pc);
                Ok(())
            }
            UnknownOpcode::Fail => Err(Error::UnknownOpcode {
                opcode: self.opcode,
                pc,
            }),
        }
    }

    fn trace_state(&self) {
        trace!("V: {:02X?}", self.v);
        trace!("stack: {:03X?}", self.stack());
        trace!(
            "I: {:03X} PC: {:03X} DT: {:02X} ST: {:02X}",
            self.i,
            self.pc,
            self.delay_timer,
            self.sound_timer
        );
    }

    fn cls_ret(&mut self) -> Result<(), Error> {
        match self.opcode & 0xFF {
            0xE0 => {
                // 00E0
                // clear screen
                self.display.clear();
                self.draw_flag = true;
            }
            0xEE => {
                // 00EE
                // return from subroutine
                if self.sp == 0 {
                    let pc = self.instruction_addr();
                    warn!("return with empty call stack at {:03X}", pc);
                    return Err(Error::StackUnderflow { pc });
                }
                self.sp -= 1;
                self.pc = self.stack[self.sp as usize];
            }
            _ => return self.unknown_opcode(),
        }
        Ok(())
    }

    fn jmp(&mut self) -> Result<(), Error> {
        // 1NNN
        // jump to NNN
        self.pc = self.nnn();
        Ok(())
    }

    fn call(&mut self) -> Result<(), Error> {
        // 2NNN
        // call subroutine at NNN, the pushed PC already points past this call
        if self.sp as usize >= STACK_DEPTH {
            let pc = self.instruction_addr();
            warn!("call stack overflow at {:03X}", pc);
            return Err(Error::StackOverflow { pc });
        }
        self.stack[self.sp as usize] = self.pc;
        self.sp += 1;
        self.pc = self.nnn();
        Ok(())
    }

    fn eb(&mut self) -> Result<(), Error> {
        // 3XNN
        // skip if VX == NN
        self.skip_if(self.v[self.x()] == self.kk());
        Ok(())
    }

    fn neb(&mut self) -> Result<(), Error> {
        // 4XNN
        // skip if VX != NN
        self.skip_if(self.v[self.x()] != self.kk());
        Ok(())
    }

    fn er(&mut self) -> Result<(), Error> {
        // 5XY0
        // skip if VX == VY
        if self.n() != 0 {
            return self.unknown_opcode();
        }
        self.skip_if(self.v[self.x()] == self.v[self.y()]);
        Ok(())
    }

    fn ld(&mut self) -> Result<(), Error> {
        // 6XNN
        // set VX to NN
        let x = self.x();
        self.v[x] = self.kk();
        Ok(())
    }

    fn addb(&mut self) -> Result<(), Error> {
        // 7XNN
        // add NN to VX (no carry)
        let x = self.x();
        self.v[x] = self.v[x].wrapping_add(self.kk());
        Ok(())
    }

    // flags are written after the result so that VF as a destination ends up
    // holding the flag
    fn alu(&mut self) -> Result<(), Error> {
        let x = self.x();
        let y = self.y();
        let (vx, vy) = (self.v[x], self.v[y]);
        match self.n() {
            0x0 => {
                // 8XY0
                // set VX to VY
                self.v[x] = vy;
            }
            0x1 => {
                // 8XY1
                // set VX to VX OR VY
                self.v[x] = vx | vy;
            }
            0x2 => {
                // 8XY2
                // set VX to VX AND VY
                self.v[x] = vx & vy;
            }
            0x3 => {
                // 8XY3
                // set VX to VX XOR VY
                self.v[x] = vx ^ vy;
            }
            0x4 => {
                // 8XY4
                // add VY to VX (set VF = 1 if there's a carry)
                let (sum, carry) = vx.overflowing_add(vy);
                self.v[x] = sum;
                self.v[0xF] = carry as u8;
            }
            0x5 => {
                // 8XY5
                // sub VY from VX (set VF = 0 if there's a borrow and 1 if not)
                self.v[x] = vx.wrapping_sub(vy);
                self.v[0xF] = (vx >= vy) as u8;
            }
            0x6 => {
                // 8XY6
                // store the LSB of VX in VF and shift VX one to the right
                self.v[x] = vx >> 1;
                self.v[0xF] = vx & 0x1;
            }
            0x7 => {
                // 8XY7
                // set VX to VY - VX (set VF = 0 if there's a borrow and 1 if not)
                self.v[x] = vy.wrapping_sub(vx);
                self.v[0xF] = (vy >= vx) as u8;
            }
            0xE => {
                // 8XYE
                // store the MSB of VX in VF and shift VX one to the left
                self.v[x] = vx << 1;
                self.v[0xF] = vx >> 7;
            }
            _ => return self.unknown_opcode(),
        }
        Ok(())
    }

    fn ner(&mut self) -> Result<(), Error> {
        // 9XY0
        // skip if VX != VY
        if self.n() != 0 {
            return self.unknown_opcode();
        }
        self.skip_if(self.v[self.x()] != self.v[self.y()]);
        Ok(())
    }

    fn si(&mut self) -> Result<(), Error> {
        // ANNN
        // set I to NNN
        self.i = self.nnn();
        Ok(())
    }

    fn jmpo(&mut self) -> Result<(), Error> {
        // BNNN
        // jump to NNN + V0
        self.pc = (self.nnn() + self.v[0] as u16) & ADDR_MASK;
        Ok(())
    }

    fn rng(&mut self) -> Result<(), Error> {
        // CXNN
        // set VX = RNG[0, 256) & NN
        let x = self.x();
        self.v[x] = self.rng.gen::<u8>() & self.kk();
        Ok(())
    }

    fn draw(&mut self) -> Result<(), Error> {
        // DXYN
        // draw a sprite at VX,VY with a width of 8 pixels and a height of N pixels
        // each row of 8 pixels is bit-coded in memory starting at I
        // sprite pixels are XORd onto the screen, wrapping at the edges
        // VF is set to 1 if any lit pixels are turned off during this
        let vx = self.v[self.x()] as usize;
        let vy = self.v[self.y()] as usize;
        let height = self.n() as u16;

        let mut collision = false;
        for row in 0..height {
            let pixel = self.read_byte(self.i.wrapping_add(row));
            for p in 0..8 {
                if pixel & (0x80 >> p) != 0 && self.display.flip(vx + p, vy + row as usize) {
                    collision = true;
                }
            }
        }

        self.v[0xF] = collision as u8;
        self.draw_flag = true;
        Ok(())
    }

    fn key(&mut self) -> Result<(), Error> {
        let pressed = self.keypad.is_pressed(self.v[self.x()]);
        match self.kk() {
            0x9E => {
                // EX9E
                // skip if key stored in VX is pressed
                self.skip_if(pressed);
            }
            0xA1 => {
                // EXA1
                // skip if key stored in VX isn't pressed
                self.skip_if(!pressed);
            }
            _ => return self.unknown_opcode(),
        }
        Ok(())
    }

    fn ex(&mut self) -> Result<(), Error> {
        let x = self.x();
        match self.kk() {
            0x07 => {
                // FX07
                // set VX to delay timer
                self.v[x] = self.delay_timer;
            }
            0x0A => {
                // FX0A
                // store next key press in VX, blocking instruction
                match self.keypad.first_pressed() {
                    Some(key) => self.v[x] = key,
                    // repeat this instruction if no pressed key
                    None => self.pc = self.pc.wrapping_sub(2) & ADDR_MASK,
                }
            }
            0x15 => {
                // FX15
                // set delay timer to VX
                self.delay_timer = self.v[x];
            }
            0x18 => {
                // FX18
                // set sound timer to VX
                self.sound_timer = self.v[x];
            }
            0x1E => {
                // FX1E
                // add VX to I
                self.i = self.i.wrapping_add(self.v[x] as u16) & ADDR_MASK;
            }
            0x29 => {
                // FX29
                // set I to location in memory of sprite for character in VX
                self.i = self.v[x] as u16 * FONT_GLYPH_SIZE;
            }
            0x33 => {
                // FX33
                // store the BCD representation of VX at I
                // so 193 becomes [1, 9, 3] in memory at I
                let vx = self.v[x];
                self.write_byte(self.i, vx / 100);
                self.write_byte(self.i.wrapping_add(1), (vx / 10) % 10);
                self.write_byte(self.i.wrapping_add(2), vx % 10);
            }
            0x55 => {
                // FX55
                // store V0 to VX (inclusive) in memory at I
                for offset in 0..=x {
                    self.write_byte(self.i.wrapping_add(offset as u16), self.v[offset]);
                }
            }
            0x65 => {
                // FX65
                // fill V0 to VX (inclusive) from memory at I
                for offset in 0..=x {
                    self.v[offset] = self.read_byte(self.i.wrapping_add(offset as u16));
                }
            }
            _ => return self.unknown_opcode(),
        }
        Ok(())
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}
