pub(crate) const CHIP8_MEMORY_SIZE: usize = 4096;

pub(crate) const CHIP8_PROGRAM_OFFSET: u16 = 0x200;

/// The largest program that fits between the program offset and the end of addressable memory.
pub(crate) const CHIP8_MAX_PROGRAM_SIZE: usize = 0xFFF - CHIP8_PROGRAM_OFFSET as usize; // 3583

pub(crate) const CHIP8_DISPLAY_WIDTH: usize = 64;

pub(crate) const CHIP8_DISPLAY_HEIGHT: usize = 32;

pub(crate) const CHIP8_STACK_SIZE: usize = 16;

pub(crate) const CHIP8_CHARSET_OFFSET: u16 = 0x50; // 80

pub(crate) const CHIP8_CHARSET_GLYPH_LEN: u16 = 5;

pub(crate) const CHIP8_CHARSET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
