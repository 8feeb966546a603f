use std::ops::Range;

use crate::chip::{
    chip8::{constants::CHIP8_MEMORY_SIZE, Chip8},
    ExecutionError,
};

pub fn conditional_skip<T>(instruction: &T, state: &mut Chip8, f: fn(&T, &Chip8) -> bool) {
    if f(instruction, state) {
        increment_program_counter(state);
    }
}

pub fn increment_program_counter(state: &mut Chip8) {
    state.program_counter = state.program_counter.wrapping_add(2);
}

/// Returns the memory range of `len` bytes starting at `address`, or an error if the range
/// leaves the address space.
pub fn memory_range(address: u16, len: usize) -> Result<Range<usize>, ExecutionError> {
    let start = address as usize;
    if start + len > CHIP8_MEMORY_SIZE {
        return Err(ExecutionError::MemoryOutOfBounds {
            address: start,
            len,
        });
    }
    Ok(start..start + len)
}
