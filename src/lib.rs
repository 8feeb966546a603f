//! An implementation of a CHIP-8 virtual machine. The implementation follows the instruction set
//! described [here](https://en.wikipedia.org/wiki/CHIP-8#Opcode_table).
//!
//! The crate is split into the interpreter itself ([`chip::chip8::Chip8`]), the monochrome
//! [`chip::framebuffer::Framebuffer`] it draws into and the [`chip::driver::Driver`] which runs
//! the interpreter at a fixed rate on a background thread. Presentation is left to the caller;
//! the `emulator_text_ui` binary renders frames with the cursive text user interface library.
pub mod chip;
