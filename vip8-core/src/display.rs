use std::io;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// Returned by a display when the user asked to close it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quit;

/// Pixel surface the interpreter draws into. Backends are initialised by
/// their constructors.
pub trait Chip8Display {
    fn clear(&mut self) -> io::Result<()>;

    /// XOR `sprite` (one byte per row, MSB leftmost) at `(x, y)`, wrapping
    /// both coordinates. Returns true if any lit pixel was switched off.
    fn draw(&mut self, x: u8, y: u8, sprite: &[u8]) -> io::Result<bool>;

    /// Show the current frame and pump backend events.
    fn present_and_poll(&mut self) -> io::Result<Option<Quit>>;
}

/// In-memory 64x32 surface. Used directly for headless runs and as the
/// backing store of rendering backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: [bool; DISPLAY_WIDTH * DISPLAY_HEIGHT],
    dirty: bool,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self {
            pixels: [false; DISPLAY_WIDTH * DISPLAY_HEIGHT],
            dirty: true,
        }
    }
}

impl Framebuffer {
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[(y % DISPLAY_HEIGHT) * DISPLAY_WIDTH + x % DISPLAY_WIDTH]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.pixels.chunks(DISPLAY_WIDTH)
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|&&lit| lit).count()
    }

    /// Whether anything changed since the last `take_dirty`.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn clear(&mut self) {
        self.pixels = [false; DISPLAY_WIDTH * DISPLAY_HEIGHT];
        self.dirty = true;
    }

    pub fn draw(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let mut pixel_cleared = false;
        for (i, &row_bits) in sprite.iter().enumerate() {
            let row = (y as usize + i) % DISPLAY_HEIGHT;
            for j in 0..8 {
                if row_bits & (0x80 >> j) == 0 {
                    continue;
                }
                let col = (x as usize + j) % DISPLAY_WIDTH;
                let pixel = &mut self.pixels[row * DISPLAY_WIDTH + col];
                pixel_cleared |= *pixel;
                *pixel = !*pixel;
            }
        }
        self.dirty |= !sprite.is_empty();
        pixel_cleared
    }
}

impl Chip8Display for Framebuffer {
    fn clear(&mut self) -> io::Result<()> {
        Framebuffer::clear(self);
        Ok(())
    }

    fn draw(&mut self, x: u8, y: u8, sprite: &[u8]) -> io::Result<bool> {
        Ok(Framebuffer::draw(self, x, y, sprite))
    }

    fn present_and_poll(&mut self) -> io::Result<Option<Quit>> {
        Ok(None)
    }
}
