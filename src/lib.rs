//! A CHIP-8 interpreter core.
//!
//! [`Chip8`] owns the whole machine: memory, registers, call stack, timers,
//! display and keypad. Callers load a program, then drive it with
//! [`Chip8::emulate_cycle`] and [`Chip8::tick_timers`] at whatever cadence they
//! like (classically a handful of cycles per 60Hz timer tick).

pub mod chip8;

pub use crate::chip8::{Chip8, Config, Error, UnknownOpcode};
