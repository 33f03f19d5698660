/// What to do with an opcode that doesn't decode to a known instruction
/// (e.g. `8XYF`, `E0FF`, or a `0NNN` machine-code call).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownOpcode {
    /// Treat it as a no-op. Plenty of ROMs in the wild rely on this.
    #[default]
    Ignore,
    /// Report [`Error::UnknownOpcode`](super::Error::UnknownOpcode) for the cycle.
    Fail,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    pub unknown_opcode: UnknownOpcode,
    /// Seed for the CXNN random source, `None` pulls one from the OS
    pub seed: Option<u64>,
}

impl Config {
    pub fn unknown_opcode(mut self, policy: UnknownOpcode) -> Self {
        self.unknown_opcode = policy;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
