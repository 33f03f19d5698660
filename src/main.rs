use std::collections::HashMap;
use std::error::Error;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chip8vm::chip8::display::{Display, HEIGHT, WIDTH};
use chip8vm::{Chip8, Config, UnknownOpcode};
use clap::{Parser, ValueEnum};
use log::{error, info};
use sdl2::audio::{AudioCallback, AudioSpecDesired};
use sdl2::event::Event;
use sdl2::gfx::primitives::DrawRenderer;
use sdl2::keyboard::Keycode;
use sdl2::pixels;
use sdl2::render::Canvas;
use sdl2::video::Window;

const FRAME: Duration = Duration::from_nanos(1_000_000_000 / 60);
const TONE_HZ: f32 = 440.0;
const SAMPLE_RATE: i32 = 44_100;
const BLACK: pixels::Color = pixels::Color {
    r: 0,
    g: 0,
    b: 0,
    a: 0xFF,
};
const WHITE: pixels::Color = pixels::Color {
    r: 0xFF,
    g: 0xFF,
    b: 0xFF,
    a: 0xFF,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OpcodePolicy {
    Ignore,
    Fail,
}

impl From<OpcodePolicy> for UnknownOpcode {
    fn from(policy: OpcodePolicy) -> Self {
        match policy {
            OpcodePolicy::Ignore => UnknownOpcode::Ignore,
            OpcodePolicy::Fail => UnknownOpcode::Fail,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Run a CHIP-8 ROM")]
struct Args {
    /// Path to the ROM file
    rom: PathBuf,

    /// Window pixels per CHIP-8 pixel
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=64))]
    scale: u32,

    /// Beep volume between 0 and 1
    #[arg(long, default_value_t = 0.25, value_parser = parse_volume)]
    volume: f32,

    /// Instructions executed per 60Hz frame
    #[arg(short, long, default_value_t = 10)]
    cycles_per_frame: u32,

    /// What to do with opcodes that don't decode
    #[arg(long, value_enum, default_value_t = OpcodePolicy::Ignore)]
    unknown_opcode: OpcodePolicy,

    /// Seed for the random number instruction
    #[arg(long)]
    seed: Option<u64>,
}

fn parse_volume(s: &str) -> Result<f32, String> {
    let volume: f32 = s.parse().map_err(|e| format!("{}", e))?;
    if !(0.0..=1.0).contains(&volume) {
        return Err(format!("volume must be between 0 and 1, got {}", volume));
    }
    Ok(volume)
}

struct SquareWave {
    phase_inc: f32,
    phase: f32,
    volume: f32,
}

impl AudioCallback for SquareWave {
    type Channel = f32;

    fn callback(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = if self.phase < 0.5 {
                self.volume
            } else {
                -self.volume
            };
            self.phase = (self.phase + self.phase_inc) % 1.0;
        }
    }
}

// 1 2 3 C      1 2 3 4
// 4 5 6 D  <-  Q W E R
// 7 8 9 E      A S D F
// A 0 B F      Z X C V
fn keymap() -> HashMap<Keycode, u8> {
    HashMap::from([
        (Keycode::Num1, 0x1),
        (Keycode::Num2, 0x2),
        (Keycode::Num3, 0x3),
        (Keycode::Num4, 0xC),
        (Keycode::Q, 0x4),
        (Keycode::W, 0x5),
        (Keycode::E, 0x6),
        (Keycode::R, 0xD),
        (Keycode::A, 0x7),
        (Keycode::S, 0x8),
        (Keycode::D, 0x9),
        (Keycode::F, 0xE),
        (Keycode::Z, 0xA),
        (Keycode::X, 0x0),
        (Keycode::C, 0xB),
        (Keycode::V, 0xF),
    ])
}

fn draw(canvas: &mut Canvas<Window>, display: &Display, scale: u32) -> Result<(), String> {
    canvas.set_draw_color(BLACK);
    canvas.clear();
    let size = scale as i32;
    let coord = |v: i32| i16::try_from(v).map_err(|e| e.to_string());
    for (y, row) in display.rows().enumerate() {
        for (x, &lit) in row.iter().enumerate() {
            if !lit {
                continue;
            }
            let x = x as i32 * size;
            let y = y as i32 * size;
            canvas.box_(
                coord(x)?,
                coord(y)?,
                coord(x + size - 1)?,
                coord(y + size - 1)?,
                WHITE,
            )?;
        }
    }
    canvas.present();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = Config {
        unknown_opcode: args.unknown_opcode.into(),
        seed: args.seed,
    };
    let mut emu = Chip8::with_config(config);
    let rom = std::fs::read(&args.rom)?;
    emu.load_program(&rom)?;
    info!("running {}", args.rom.display());

    let sdl_ctx = sdl2::init()?;
    let video = sdl_ctx.video()?;
    let audio = sdl_ctx.audio()?;
    let desired = AudioSpecDesired {
        freq: Some(SAMPLE_RATE),
        channels: Some(1),
        samples: None,
    };
    let beeper = audio.open_playback(None, &desired, |spec| SquareWave {
        phase_inc: TONE_HZ / spec.freq as f32,
        phase: 0.0,
        volume: args.volume,
    })?;

    let window = video
        .window("CHIP-8", WIDTH as u32 * args.scale, HEIGHT as u32 * args.scale)
        .position_centered()
        .build()?;
    let mut canvas = window.into_canvas().build()?;
    draw(&mut canvas, emu.display(), args.scale)?;

    let mut event_pump = sdl_ctx.event_pump()?;
    let keys = keymap();
    let mut paused = false;
    let mut beeping = false;

    'main: loop {
        let frame_start = Instant::now();

        for e in event_pump.poll_iter() {
            match e {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'main,
                Event::KeyDown {
                    keycode: Some(Keycode::RightBracket),
                    ..
                } => {
                    info!("paused");
                    paused = true;
                }
                Event::KeyDown {
                    keycode: Some(Keycode::LeftBracket),
                    ..
                } => {
                    info!("resumed");
                    paused = false;
                }
                Event::KeyDown {
                    keycode: Some(Keycode::Backslash),
                    ..
                } => {
                    info!("reset");
                    emu.reset();
                    paused = false;
                }
                Event::KeyDown {
                    keycode: Some(keycode),
                    ..
                } => {
                    if let Some(&key) = keys.get(&keycode) {
                        emu.press_key(key);
                    }
                }
                Event::KeyUp {
                    keycode: Some(keycode),
                    ..
                } => {
                    if let Some(&key) = keys.get(&keycode) {
                        emu.release_key(key);
                    }
                }
                _ => {}
            }
        }

        if !paused {
            for _ in 0..args.cycles_per_frame {
                if let Err(e) = emu.emulate_cycle() {
                    error!("{}, pausing", e);
                    paused = true;
                    break;
                }
            }
            emu.tick_timers();
        }

        if emu.take_draw_flag() {
            draw(&mut canvas, emu.display(), args.scale)?;
        }

        if emu.sound_flag() != beeping {
            beeping = emu.sound_flag();
            if beeping {
                beeper.resume();
            } else {
                beeper.pause();
            }
            let title = if beeping { "CHIP-8 [beep]" } else { "CHIP-8" };
            canvas.window_mut().set_title(title)?;
        }

        if let Some(rest) = FRAME.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    Ok(())
}
