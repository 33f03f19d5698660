pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

/// 64x32 monochrome framebuffer, row-major with (0, 0) in the top left.
///
/// Coordinates wrap around both edges, there is no clipping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    pixels: [bool; WIDTH * HEIGHT],
}

impl Display {
    pub fn new() -> Self {
        Self {
            pixels: [false; WIDTH * HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        self.pixels = [false; WIDTH * HEIGHT];
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[Self::offset(x, y)]
    }

    /// XOR a lit sprite pixel onto the screen at (x, y).
    /// Returns true if that turned a lit pixel off.
    pub fn flip(&mut self, x: usize, y: usize) -> bool {
        let offset = Self::offset(x, y);
        let was_lit = self.pixels[offset];
        self.pixels[offset] = !was_lit;
        was_lit
    }

    pub fn pixels(&self) -> &[bool] {
        &self.pixels
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.pixels.chunks(WIDTH)
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|p| **p).count()
    }

    fn offset(x: usize, y: usize) -> usize {
        WIDTH * (y % HEIGHT) + x % WIDTH
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}
