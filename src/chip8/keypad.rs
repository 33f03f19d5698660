pub const NUM_KEYS: usize = 16;

/// State of the 16-key hex keypad, 0x0 through 0xF.
///
/// Key codes are masked to their low nibble, so a register holding 0x1A
/// addresses key 0xA.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; NUM_KEYS],
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: u8, pressed: bool) {
        self.keys[(key & 0xF) as usize] = pressed;
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[(key & 0xF) as usize]
    }

    /// Lowest-numbered key currently held down
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|&k| k).map(|k| k as u8)
    }

    pub fn clear(&mut self) {
        self.keys = [false; NUM_KEYS];
    }

    pub fn keys(&self) -> &[bool; NUM_KEYS] {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release() {
        let mut keypad = Keypad::new();
        keypad.set(0xB, true);
        assert!(keypad.is_pressed(0xB));
        keypad.set(0xB, false);
        assert!(!keypad.is_pressed(0xB));
    }

    #[test]
    fn first_pressed_is_lowest() {
        let mut keypad = Keypad::new();
        assert_eq!(keypad.first_pressed(), None);
        keypad.set(0xF, true);
        keypad.set(0x4, true);
        assert_eq!(keypad.first_pressed(), Some(0x4));
    }

    #[test]
    fn key_codes_masked() {
        let mut keypad = Keypad::new();
        keypad.set(0x1A, true);
        assert!(keypad.is_pressed(0xA));
        keypad.clear();
        assert_eq!(keypad.keys(), &[false; NUM_KEYS]);
    }
}
