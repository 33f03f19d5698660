/// Something the interpreter refused to do.
///
/// `pc` is always the address of the offending instruction, not the
/// post-fetch program counter.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("program is {size} bytes but only {max} bytes of program memory exist")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("call stack overflow at {pc:#05X}")]
    StackOverflow { pc: u16 },

    #[error("return with an empty call stack at {pc:#05X}")]
    StackUnderflow { pc: u16 },

    #[error("unrecognized opcode {opcode:04X} at {pc:#05X}")]
    UnknownOpcode { opcode: u16, pc: u16 },
}
