use crate::chip::{
    chip8::{constants::CHIP8_STACK_SIZE, util, Chip8},
    ExecutionError,
};

/// PC = address
pub(super) fn jump(state: &mut Chip8, address: u16) {
    state.program_counter = address;
}

/// PC = V0 + address
pub(super) fn jump_with_offset(state: &mut Chip8, address: u16) {
    state.program_counter = address.wrapping_add(state.registers[0] as u16);
}

/// Pushes the address of the next instruction and jumps to `address`.
pub(super) fn call(state: &mut Chip8, address: u16) -> Result<(), ExecutionError> {
    if state.stack_pointer as usize >= CHIP8_STACK_SIZE {
        return Err(ExecutionError::StackOverflow {
            address: state.program_counter,
        });
    }
    util::increment_program_counter(state);
    state.stack[state.stack_pointer as usize] = state.program_counter;
    state.stack_pointer += 1;
    state.program_counter = address;
    Ok(())
}

/// Pops the return address pushed by `call` and jumps to it.
pub(super) fn ret(state: &mut Chip8) -> Result<(), ExecutionError> {
    if state.stack_pointer == 0 {
        return Err(ExecutionError::StackUnderflow {
            address: state.program_counter,
        });
    }
    state.stack_pointer -= 1;
    state.program_counter = state.stack[state.stack_pointer as usize];
    Ok(())
}

/// if Vx == value then skip
pub(super) fn skip_if_equal(state: &mut Chip8, x: u8, value: u8) {
    util::conditional_skip(&(x, value), state, |(x, value), state| {
        state.registers[*x as usize] == *value
    });
    util::increment_program_counter(state);
}

/// if Vx != value then skip
pub(super) fn skip_if_not_equal(state: &mut Chip8, x: u8, value: u8) {
    util::conditional_skip(&(x, value), state, |(x, value), state| {
        state.registers[*x as usize] != *value
    });
    util::increment_program_counter(state);
}

/// if Vx == Vy then skip
pub(super) fn skip_if_registers_equal(state: &mut Chip8, x: u8, y: u8) {
    util::conditional_skip(&(x, y), state, |(x, y), state| {
        state.registers[*x as usize] == state.registers[*y as usize]
    });
    util::increment_program_counter(state);
}

/// if Vx != Vy then skip
pub(super) fn skip_if_registers_not_equal(state: &mut Chip8, x: u8, y: u8) {
    util::conditional_skip(&(x, y), state, |(x, y), state| {
        state.registers[*x as usize] != state.registers[*y as usize]
    });
    util::increment_program_counter(state);
}
