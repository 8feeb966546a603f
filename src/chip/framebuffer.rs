/// Multipliers applied to each channel when expanding the monochrome frame into RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelScales {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Default for ChannelScales {
    fn default() -> Self {
        ChannelScales {
            red: 255,
            green: 255,
            blue: 255,
        }
    }
}

/// Errors raised when accessing a `Framebuffer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramebufferError {
    /// The coordinate (col, row) lies outside of the grid.
    OutOfRange(usize, usize),

    /// The output buffer has the wrong length. Carries (expected, got).
    BufferSize(usize, usize),
}

/// A monochrome pixel grid. Each pixel is stored as one intensity byte, where 0 means off and
/// anything else means on. The grid is allocated once on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Framebuffer {
    /// Creates a cleared framebuffer with `width` columns and `height` rows.
    pub fn new(width: usize, height: usize) -> Self {
        Framebuffer {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The raw pixels in row-major order.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Turns every pixel off.
    pub fn clear(&mut self) {
        for pixel in self.pixels.iter_mut() {
            *pixel = 0;
        }
    }

    /// Returns the pixel at (`col`, `row`).
    pub fn get(&self, col: usize, row: usize) -> Result<u8, FramebufferError> {
        if col >= self.width || row >= self.height {
            return Err(FramebufferError::OutOfRange(col, row));
        }
        Ok(self.pixels[row * self.width + col])
    }

    /// Convenience wrapper around `get` which treats out of range pixels as off.
    pub fn is_set(&self, col: usize, row: usize) -> bool {
        self.get(col, row).map(|p| p != 0).unwrap_or(false)
    }

    /// XORs an 8 pixel wide sprite onto the grid with its top left corner at (`col`, `row`).
    /// Every byte of `sprite` is one row, where the most significant bit is the leftmost pixel.
    ///
    /// Pixels that would land beyond the right or bottom edge are clipped; nothing wraps
    /// around. Returns whether any pixel that was on has been turned off.
    pub fn composite_sprite(&mut self, col: usize, row: usize, sprite: &[u8]) -> bool {
        let mut collision = false;

        for (y_pos, sprite_byte) in sprite.iter().enumerate() {
            let current_row = row + y_pos;
            if current_row >= self.height {
                break;
            }

            for x_pos in 0..8 {
                let current_col = col + x_pos;
                if current_col >= self.width {
                    break;
                }

                if sprite_byte & (0x80 >> x_pos) == 0 {
                    continue;
                }

                let pixel = &mut self.pixels[current_row * self.width + current_col];
                if *pixel != 0 {
                    collision = true;
                    *pixel = 0;
                } else {
                    *pixel = 1;
                }
            }
        }

        collision
    }

    /// Size in bytes of the buffer expected by `to_packed_color`.
    pub fn packed_color_len(&self) -> usize {
        self.width * self.height * 3
    }

    /// Expands the grid into interleaved RGB bytes (`RGBRGB...`), multiplying each pixel with
    /// the channel's scale. `buffer` must be exactly `packed_color_len()` bytes long.
    pub fn to_packed_color(
        &self,
        buffer: &mut [u8],
        scales: ChannelScales,
    ) -> Result<(), FramebufferError> {
        if buffer.len() != self.packed_color_len() {
            return Err(FramebufferError::BufferSize(
                self.packed_color_len(),
                buffer.len(),
            ));
        }

        for (rgb, pixel) in buffer.chunks_exact_mut(3).zip(self.pixels.iter()) {
            rgb[0] = pixel.saturating_mul(scales.red);
            rgb[1] = pixel.saturating_mul(scales.green);
            rgb[2] = pixel.saturating_mul(scales.blue);
        }

        Ok(())
    }
}

impl std::fmt::Display for FramebufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FramebufferError::OutOfRange(col, row) => {
                write!(f, "Pixel ({}, {}) is out of range.", col, row)
            }
            FramebufferError::BufferSize(expected, got) => write!(
                f,
                "Output buffer has {} bytes, expected {}.",
                got, expected
            ),
        }
    }
}

impl std::error::Error for FramebufferError {}

#[cfg(test)]
mod tests {
    use super::*;

    const SPRITE: [u8; 3] = [0xF0, 0x90, 0xF0];

    #[test]
    fn test_new_is_cleared() {
        let frame = Framebuffer::new(64, 32);
        assert_eq!(frame.pixels().len(), 64 * 32);
        assert!(frame.pixels().iter().all(|p| *p == 0));
    }

    #[test]
    fn test_get_out_of_range() {
        let frame = Framebuffer::new(64, 32);
        assert_eq!(frame.get(64, 0), Err(FramebufferError::OutOfRange(64, 0)));
        assert_eq!(frame.get(0, 32), Err(FramebufferError::OutOfRange(0, 32)));
        assert_eq!(frame.get(63, 31), Ok(0));
    }

    #[test]
    fn test_composite_draws_msb_first() {
        let mut frame = Framebuffer::new(64, 32);
        let collision = frame.composite_sprite(2, 1, &[0x81]);
        assert!(!collision);
        assert_eq!(frame.get(2, 1), Ok(1));
        assert_eq!(frame.get(9, 1), Ok(1));
        for col in 3..9 {
            assert_eq!(frame.get(col, 1), Ok(0));
        }
    }

    #[test]
    fn test_composite_twice_restores_frame() {
        let mut frame = Framebuffer::new(64, 32);
        frame.composite_sprite(0, 0, &[0xAA, 0x55]);
        let before = frame.clone();

        assert!(!frame.composite_sprite(5, 3, &SPRITE));
        assert_ne!(frame, before);
        assert!(frame.composite_sprite(5, 3, &SPRITE));
        assert_eq!(frame, before);
    }

    #[test]
    fn test_composite_reports_collision_only_when_pixel_cleared() {
        let mut frame = Framebuffer::new(64, 32);
        frame.composite_sprite(0, 0, &[0x80]);
        assert!(!frame.composite_sprite(0, 0, &[0x40]));
        assert!(frame.composite_sprite(0, 0, &[0x80]));
        assert_eq!(frame.get(0, 0), Ok(0));
        assert_eq!(frame.get(1, 0), Ok(1));
    }

    #[test]
    fn test_composite_clips_at_edges() {
        let mut frame = Framebuffer::new(64, 32);
        frame.composite_sprite(60, 30, &[0xFF, 0xFF, 0xFF, 0xFF]);

        let lit: usize = frame.pixels().iter().filter(|p| **p != 0).count();
        assert_eq!(lit, 4 * 2);
        // nothing wraps to the opposite edges
        assert_eq!(frame.get(0, 30), Ok(0));
        assert_eq!(frame.get(60, 0), Ok(0));
        assert_eq!(frame.get(63, 31), Ok(1));
    }

    #[test]
    fn test_composite_fully_off_screen_draws_nothing() {
        let mut frame = Framebuffer::new(64, 32);
        assert!(!frame.composite_sprite(64, 0, &SPRITE));
        assert!(!frame.composite_sprite(0, 200, &SPRITE));
        assert!(frame.pixels().iter().all(|p| *p == 0));
    }

    #[test]
    fn test_clear() {
        let mut frame = Framebuffer::new(8, 4);
        frame.composite_sprite(0, 0, &[0xFF; 4]);
        frame.clear();
        assert!(frame.pixels().iter().all(|p| *p == 0));
    }

    #[test]
    fn test_to_packed_color() {
        let mut frame = Framebuffer::new(2, 1);
        frame.composite_sprite(1, 0, &[0x80]);
        let mut buffer = [0xAA; 6];
        frame
            .to_packed_color(
                &mut buffer,
                ChannelScales {
                    red: 10,
                    green: 20,
                    blue: 255,
                },
            )
            .unwrap();
        assert_eq!(buffer, [0, 0, 0, 10, 20, 255]);
    }

    #[test]
    fn test_to_packed_color_rejects_wrong_size() {
        let frame = Framebuffer::new(64, 32);
        let mut buffer = vec![0; 10];
        assert_eq!(
            frame.to_packed_color(&mut buffer, ChannelScales::default()),
            Err(FramebufferError::BufferSize(64 * 32 * 3, 10))
        );
    }
}
