use log::debug;

use crate::chip::{
    chip8::{util, Chip8},
    ExecutionError,
};

/// Turns off every pixel of the display.
pub(super) fn clear(state: &mut Chip8) {
    state.frame.clear();
    util::increment_program_counter(state);
}

/// XORs the `n` byte sprite at I onto the display at (Vx, Vy). VF reports
/// whether a pixel was turned off.
pub(super) fn draw(state: &mut Chip8, x: u8, y: u8, n: u8) -> Result<(), ExecutionError> {
    let range = util::memory_range(state.index, n as usize)?;
    let col = state.registers[x as usize] as usize;
    let row = state.registers[y as usize] as usize;

    let collision = state
        .frame
        .composite_sprite(col, row, &state.memory[range]);
    state.registers[0xF] = collision as u8;

    util::increment_program_counter(state);
    Ok(())
}

/// Skips the next instruction if the key in Vx is in the `pressed` state.
/// Only the lower nibble of Vx selects the key.
pub(super) fn skip_if_key(state: &mut Chip8, x: u8, pressed: bool) {
    util::conditional_skip(&(x, pressed), state, |(x, pressed), state| {
        let key = state.registers[*x as usize] & 0xF;
        state.input_pins[key as usize] == *pressed
    });
    util::increment_program_counter(state);
}

/// Vx = delay timer
pub(super) fn read_delay_timer(state: &mut Chip8, x: u8) {
    state.registers[x as usize] = state.delay_timer;
    util::increment_program_counter(state);
}

/// delay timer = Vx
pub(super) fn set_delay_timer(state: &mut Chip8, x: u8) {
    state.delay_timer = state.registers[x as usize];
    util::increment_program_counter(state);
}

/// sound timer = Vx
pub(super) fn set_sound_timer(state: &mut Chip8, x: u8) {
    state.sound_timer = state.registers[x as usize];
    util::increment_program_counter(state);
}

/// Stores the pressed key in Vx. If no key is pressed, the program counter
/// stays put and the chip suspends until one is.
pub(super) fn wait_for_key(state: &mut Chip8, x: u8) {
    state.awaiting_key = Some(x);
    state.poll_key(x);
    if state.awaiting_key.is_some() {
        debug!("Waiting for key into V{:X}", x);
    }
}
