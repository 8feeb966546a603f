use crate::chip::framebuffer::Framebuffer;

use cursive::{
    direction::Direction,
    event::{Event, EventResult},
    theme::{BaseColor, Color, ColorStyle},
    view::{CannotFocus, View},
    Printer, Vec2,
};

/// A copy of a frame that can be drawn as a cursive `View`.
pub struct Display {
    width: usize,
    height: usize,
    pixels: Vec<bool>,
}

impl Display {
    /// Creates a new display from the current content of `frame`.
    pub fn new(frame: &Framebuffer) -> Self {
        Display {
            width: frame.width(),
            height: frame.height(),
            pixels: frame.pixels().iter().map(|pixel| *pixel != 0).collect(),
        }
    }

    pub fn is_set(&self, col: usize, row: usize) -> bool {
        col < self.width && row < self.height && self.pixels[col + self.width * row]
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new(&Framebuffer::new(64, 32))
    }
}

/// Implements cursive::view::View for Display to enable drawing it
/// as a View out of the box.
impl View for Display {
    fn draw(&self, printer: &Printer) {
        printer.with_color(
            ColorStyle::new(Color::Dark(BaseColor::Black), Color::RgbLowRes(0, 0, 0)),
            |printer| {
                for y in 0..self.height {
                    for x in 0..self.width {
                        if self.pixels[x + self.width * y] {
                            printer.print((x, y), " ");
                        }
                    }
                }
            },
        );
    }

    fn take_focus(&mut self, _: Direction) -> Result<EventResult, CannotFocus> {
        Ok(EventResult::Consumed(None))
    }

    fn on_event(&mut self, _event: Event) -> EventResult {
        EventResult::Ignored
    }

    fn required_size(&mut self, _: Vec2) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_copies_frame() {
        let mut frame = Framebuffer::new(64, 32);
        frame.composite_sprite(62, 31, &[0b1100_0000]);

        let mut display = Display::new(&frame);
        assert!(display.is_set(62, 31));
        assert!(display.is_set(63, 31));
        assert!(!display.is_set(61, 31));
        assert!(!display.is_set(64, 31));
        assert_eq!(display.required_size(Vec2::zero()), Vec2::new(64, 32));
    }

    #[test]
    fn test_default_display_is_blank() {
        let display = Display::default();
        assert!((0..32).all(|row| (0..64).all(|col| !display.is_set(col, row))));
    }
}
