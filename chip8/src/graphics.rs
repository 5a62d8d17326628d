//! This module provides a monochrome graphics buffer with a fixed resolution
//! of 64x32 pixels.

/// The height of the graphics buffer in pixels.
pub const HEIGHT: usize = 32;
/// The width of the graphics buffer in pixels.
pub const WIDTH: usize = 64;
/// The total number of pixels in the graphics buffer. This is calculated
/// as the product of [`WIDTH`] and [`HEIGHT`].
pub const PIXEL_COUNT: usize = WIDTH * HEIGHT;

/// A struct representing the graphics buffer. Pixels are either on or off;
/// colors are up to the renderer. Sprites are XORed into the buffer and wrap
/// around both edges.
#[derive(Clone, Copy)]
pub struct Buffer {
    vram: [bool; PIXEL_COUNT],
    /// Set by every mutation, cleared by [`Buffer::take_redraw`].
    redraw: bool,
}

impl Default for Buffer {
    fn default() -> Self {
        Self {
            vram: [false; PIXEL_COUNT],
            redraw: true,
        }
    }
}

impl Buffer {
    /// Creates a new [`Buffer`] with every pixel off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws a byte (8 pixels) with its top-left corner at `(x, y)`.
    /// Coordinates wrap modulo the screen size. Returns [`true`] if any
    /// pixel was switched from on to off.
    pub fn draw_byte(&mut self, x: usize, y: usize, data: u8) -> bool {
        let row = (y % HEIGHT) * WIDTH;
        let mut collision = false;

        for bit in 0..8 {
            if data & (0x80 >> bit) == 0 {
                continue;
            }
            let pixel = &mut self.vram[row + (x + bit) % WIDTH];
            collision |= *pixel;
            *pixel = !*pixel;
        }
        self.redraw = true;
        collision
    }

    /// Draws a sprite, one byte per row, starting at `(x, y)`. Returns
    /// [`true`] if any pixel was switched from on to off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, rows: impl IntoIterator<Item = u8>) -> bool {
        rows.into_iter()
            .enumerate()
            .fold(false, |collision, (i, data)| {
                self.draw_byte(x, y + i, data) | collision
            })
    }

    /// Switches every pixel off.
    #[inline]
    pub fn clear(&mut self) {
        self.vram = [false; PIXEL_COUNT];
        self.redraw = true;
    }

    /// Returns whether the pixel at `(x, y)` is on. Coordinates wrap.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.vram[(y % HEIGHT) * WIDTH + x % WIDTH]
    }

    /// Iterates over every pixel in row-major order as `(x, y, on)`.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, bool)> + '_ {
        self.vram
            .iter()
            .enumerate()
            .map(|(i, &on)| (i % WIDTH, i / WIDTH, on))
    }

    /// Returns whether the buffer changed since the last call, and clears
    /// the flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_sets_pixels_msb_first() {
        let mut buffer = Buffer::new();
        assert!(!buffer.draw_byte(0, 0, 0b1010_0000));
        assert!(buffer.pixel(0, 0));
        assert!(!buffer.pixel(1, 0));
        assert!(buffer.pixel(2, 0));
    }

    #[test]
    fn drawing_twice_restores_buffer_and_reports_collision() {
        let mut buffer = Buffer::new();
        buffer.draw_byte(5, 20, 0xFF);
        let before = buffer.vram;
        assert!(!buffer.draw_sprite(10, 3, [0xF0, 0x90, 0xF0]));
        assert!(buffer.draw_sprite(10, 3, [0xF0, 0x90, 0xF0]));
        assert_eq!(buffer.vram, before);
    }

    #[test]
    fn sprite_wraps_horizontally_on_same_row() {
        let mut buffer = Buffer::new();
        buffer.draw_byte(60, 7, 0xFF);
        for x in 60..64 {
            assert!(buffer.pixel(x, 7));
        }
        for x in 0..4 {
            assert!(buffer.pixel(x, 7));
        }
        assert!(!buffer.pixel(4, 7));
        assert!(!buffer.pixel(0, 8));
    }

    #[test]
    fn sprite_wraps_vertically() {
        let mut buffer = Buffer::new();
        buffer.draw_sprite(0, 31, [0x80, 0x80]);
        assert!(buffer.pixel(0, 31));
        assert!(buffer.pixel(0, 0));
    }

    #[test]
    fn redraw_flag_is_observed_once() {
        let mut buffer = Buffer::new();
        assert!(buffer.take_redraw());
        assert!(!buffer.take_redraw());
        buffer.clear();
        assert!(buffer.take_redraw());
        assert!(!buffer.take_redraw());
    }

    #[test]
    fn pixels_iterates_row_major() {
        let mut buffer = Buffer::new();
        buffer.draw_byte(63, 1, 0x80);
        let on: Vec<_> = buffer.pixels().filter(|p| p.2).collect();
        assert_eq!(on, vec![(63, 1, true)]);
        assert_eq!(buffer.pixels().count(), PIXEL_COUNT);
    }
}
