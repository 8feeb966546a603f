use rand::{thread_rng, Rng};

use crate::chip::{
    chip8::{
        constants::{CHIP8_CHARSET_GLYPH_LEN, CHIP8_CHARSET_OFFSET},
        util, Chip8,
    },
    ExecutionError,
};

/// VF is always written after Vx, so the flag wins when x = F.
const FLAG: usize = 0xF;

/// Vx = value
pub(super) fn load(state: &mut Chip8, x: u8, value: u8) {
    state.registers[x as usize] = value;
    util::increment_program_counter(state);
}

/// Vx += value, dropping the overflow without touching VF
pub(super) fn add(state: &mut Chip8, x: u8, value: u8) {
    state.registers[x as usize] = state.registers[x as usize].wrapping_add(value);
    util::increment_program_counter(state);
}

/// Vx = f(Vx, Vy)
pub(super) fn modify_registers(state: &mut Chip8, x: u8, y: u8, f: fn(u8, u8) -> u8) {
    state.registers[x as usize] = f(state.registers[x as usize], state.registers[y as usize]);
    util::increment_program_counter(state);
}

/// Vx += Vy; VF = carry
pub(super) fn add_registers(state: &mut Chip8, x: u8, y: u8) {
    let (result, carry) = state.registers[x as usize].overflowing_add(state.registers[y as usize]);
    state.registers[x as usize] = result;
    state.registers[FLAG] = carry as u8;
    util::increment_program_counter(state);
}

/// Vx -= Vy; VF = Vx > Vy
pub(super) fn sub(state: &mut Chip8, x: u8, y: u8) {
    let (vx, vy) = (state.registers[x as usize], state.registers[y as usize]);
    state.registers[x as usize] = vx.wrapping_sub(vy);
    state.registers[FLAG] = (vx > vy) as u8;
    util::increment_program_counter(state);
}

/// Vx = Vy - Vx; VF = Vy > Vx
pub(super) fn sub_reversed(state: &mut Chip8, x: u8, y: u8) {
    let (vx, vy) = (state.registers[x as usize], state.registers[y as usize]);
    state.registers[x as usize] = vy.wrapping_sub(vx);
    state.registers[FLAG] = (vy > vx) as u8;
    util::increment_program_counter(state);
}

/// Vx >>= 1; VF = the bit shifted out
pub(super) fn shift_right(state: &mut Chip8, x: u8) {
    let vx = state.registers[x as usize];
    state.registers[x as usize] = vx >> 1;
    state.registers[FLAG] = vx & 0x1;
    util::increment_program_counter(state);
}

/// Vx <<= 1; VF = the bit shifted out
pub(super) fn shift_left(state: &mut Chip8, x: u8) {
    let vx = state.registers[x as usize];
    state.registers[x as usize] = vx << 1;
    state.registers[FLAG] = vx >> 7;
    util::increment_program_counter(state);
}

/// I = address
pub(super) fn load_index(state: &mut Chip8, address: u16) {
    state.index = address;
    util::increment_program_counter(state);
}

/// I += Vx
pub(super) fn add_index(state: &mut Chip8, x: u8) {
    state.index = state.index.wrapping_add(state.registers[x as usize] as u16);
    util::increment_program_counter(state);
}

/// I = address of the font glyph for the digit in Vx
pub(super) fn load_glyph(state: &mut Chip8, x: u8) {
    let character = state.registers[x as usize] as u16;
    state.index = CHIP8_CHARSET_OFFSET + character * CHIP8_CHARSET_GLYPH_LEN;
    util::increment_program_counter(state);
}

/// Vx = random byte & value
pub(super) fn random(state: &mut Chip8, x: u8, value: u8) {
    let sample: u8 = thread_rng().gen();
    state.registers[x as usize] = sample & value;
    util::increment_program_counter(state);
}

/// Stores hundreds, tens and ones of Vx at I, I + 1 and I + 2.
pub(super) fn store_bcd(state: &mut Chip8, x: u8) -> Result<(), ExecutionError> {
    let range = util::memory_range(state.index, 3)?;
    let value = state.registers[x as usize];
    state.memory[range].copy_from_slice(&[value / 100, (value / 10) % 10, value % 10]);
    util::increment_program_counter(state);
    Ok(())
}

/// Stores V0 to Vx (inclusive) in memory starting at I.
pub(super) fn store_registers(state: &mut Chip8, x: u8) -> Result<(), ExecutionError> {
    let count = x as usize + 1;
    let range = util::memory_range(state.index, count)?;
    state.memory[range].copy_from_slice(&state.registers[..count]);
    util::increment_program_counter(state);
    Ok(())
}

/// Loads V0 to Vx (inclusive) from memory starting at I.
pub(super) fn load_registers(state: &mut Chip8, x: u8) -> Result<(), ExecutionError> {
    let count = x as usize + 1;
    let range = util::memory_range(state.index, count)?;
    state.registers[..count].copy_from_slice(&state.memory[range]);
    util::increment_program_counter(state);
    Ok(())
}
