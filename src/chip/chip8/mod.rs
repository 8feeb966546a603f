/// CHIP-8 constants.
mod constants;
/// Decoding of opcodes and their execution.
mod opcodes;
/// Convenience functions for modification of the CHIP-8 state.
mod util;


use log::{debug, info, trace};

use crate::chip::{
    chip8::constants::{
        CHIP8_CHARSET, CHIP8_CHARSET_OFFSET, CHIP8_DISPLAY_HEIGHT, CHIP8_DISPLAY_WIDTH,
        CHIP8_MAX_PROGRAM_SIZE, CHIP8_MEMORY_SIZE, CHIP8_PROGRAM_OFFSET, CHIP8_STACK_SIZE,
    },
    chip8::opcodes::{InstructionTable, Opcode},
    framebuffer::Framebuffer,
    Chip, CycleOutcome, ExecutionError, Keypad, LoadProgramError,
};

pub use crate::chip::chip8::opcodes::{decode, Instruction, Mnemonic};

/// Represents the state of the CHIP-8.
pub struct Chip8 {
    /// 4096 bytes of main memory
    memory: [u8; CHIP8_MEMORY_SIZE],

    /// 16 registers where each can store one byte. The last one (VF) doubles
    /// as carry, borrow and collision flag.
    registers: [u8; 16],

    /// An index register
    index: u16,

    /// A program counter
    program_counter: u16,

    /// The display. Only ever modified by the clear and draw instructions.
    frame: Framebuffer,

    /// The delay timer. Decremented once per cycle while nonzero.
    delay_timer: u8,

    /// The sound timer. Decremented once per cycle while nonzero.
    sound_timer: u8,

    /// The input pins, i.e., the pressed state of the keys 0x0 to 0xF.
    input_pins: Keypad,

    /// A stack. Note that there are no instructions allowing to modify the
    /// stack and it is only used to store return addresses for the return
    /// opcode.
    stack: [u16; CHIP8_STACK_SIZE],

    /// Points to the next free slot of the stack.
    stack_pointer: u8,

    /// Maps every possible opcode to its decoded instruction.
    instructions: InstructionTable,

    /// Whether the last cycle cleared or drew to the display.
    frame_changed: bool,

    /// Set while a wait-for-key instruction is pending. Holds the register
    /// receiving the key.
    awaiting_key: Option<u8>,
}

impl Chip for Chip8 {
    fn reset(&mut self) {
        self.memory = [0; CHIP8_MEMORY_SIZE];
        let charset_offset = CHIP8_CHARSET_OFFSET as usize;
        self.memory[charset_offset..charset_offset + CHIP8_CHARSET.len()]
            .copy_from_slice(&CHIP8_CHARSET);

        self.registers = [0; 16];
        self.index = 0;
        self.program_counter = CHIP8_PROGRAM_OFFSET;
        self.frame.clear();
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.input_pins = [false; 16];
        self.stack = [0; CHIP8_STACK_SIZE];
        self.stack_pointer = 0;
        self.instructions = InstructionTable::build();
        self.frame_changed = true;
        self.awaiting_key = None;

        debug!("CHIP-8 reset");
    }

    fn load_program(&mut self, program: &[u8]) -> Result<usize, LoadProgramError> {
        if program.is_empty() {
            return Err(LoadProgramError::EmptyProgram);
        }
        if program.len() > CHIP8_MAX_PROGRAM_SIZE {
            return Err(LoadProgramError::ProgramTooLarge(program.len()));
        }

        let offset = CHIP8_PROGRAM_OFFSET as usize;
        self.memory[offset..offset + program.len()].copy_from_slice(program);

        info!("Loaded {} byte program", program.len());
        Ok(program.len())
    }

    fn cycle(&mut self) -> Result<CycleOutcome, ExecutionError> {
        self.frame_changed = match self.awaiting_key {
            Some(reg) => {
                self.poll_key(reg);
                false
            }
            None => {
                let address = self.program_counter;
                let opcode = self.next_instruction()?;
                let instruction = self
                    .instructions
                    .get(opcode)
                    .ok_or(ExecutionError::UnknownOpcode {
                        opcode: opcode.raw(),
                        address,
                    })?;

                trace!("{:#05X}: {} {:?}", address, opcode, instruction);
                opcodes::apply(instruction, self)?;
                instruction.changes_frame()
            }
        };

        if self.delay_timer > 0 {
            self.delay_timer -= 1;
        }

        let mut sound_expired = false;
        if self.sound_timer > 0 {
            self.sound_timer -= 1;
            if self.sound_timer == 0 {
                debug!("Sound timer expired");
                sound_expired = true;
            }
        }

        Ok(CycleOutcome {
            frame_changed: self.frame_changed,
            sound_expired,
        })
    }

    fn frame(&self) -> &Framebuffer {
        &self.frame
    }

    fn input_pins_mut(&mut self) -> &mut Keypad {
        &mut self.input_pins
    }
}

impl Chip8 {
    /// Constructs a new CHIP-8 and appropriately initializes all fields so that
    /// it is ready for the first execution cycle. Essentially this means that
    /// the program counter is set to 0x200 and the default CHIP-8 charset is
    /// loaded at memory address `CHIP8_CHARSET_OFFSET`. Note that no program is
    /// loaded upon initialization.
    pub fn new() -> Self {
        let mut chip8 = Chip8 {
            memory: [0; CHIP8_MEMORY_SIZE],
            registers: [0; 16],
            index: 0,
            program_counter: CHIP8_PROGRAM_OFFSET,
            frame: Framebuffer::new(CHIP8_DISPLAY_WIDTH, CHIP8_DISPLAY_HEIGHT),
            delay_timer: 0,
            sound_timer: 0,
            input_pins: [false; 16],
            stack: [0; CHIP8_STACK_SIZE],
            stack_pointer: 0,
            instructions: InstructionTable::default(),
            frame_changed: true,
            awaiting_key: None,
        };
        chip8.reset();
        chip8
    }

    /// Fetches the big-endian opcode at `self.program_counter`.
    fn next_instruction(&self) -> Result<Opcode, ExecutionError> {
        let pc = self.program_counter as usize;
        if pc + 1 >= CHIP8_MEMORY_SIZE {
            return Err(ExecutionError::ProgramCounterOutOfBounds(
                self.program_counter,
            ));
        }
        Ok(Opcode::new(&[self.memory[pc], self.memory[pc + 1]]))
    }

    /// Completes a pending wait-for-key instruction if any key is pressed.
    /// The lowest pressed key wins.
    fn poll_key(&mut self, reg: u8) {
        if let Some(key) = self.input_pins.iter().position(|pressed| *pressed) {
            debug!("Key {:X} pressed, resuming", key);
            self.registers[reg as usize] = key as u8;
            self.awaiting_key = None;
            util::increment_program_counter(self);
        }
    }

    /// Replaces the state of all keys at once.
    pub fn set_keypad_state(&mut self, state: &Keypad) {
        self.input_pins = *state;
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.registers
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn stack_pointer(&self) -> u8 {
        self.stack_pointer
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Returns true if the last cycle cleared or drew to the display.
    pub fn frame_changed(&self) -> bool {
        self.frame_changed
    }

    /// Returns true while execution is suspended by a wait-for-key instruction.
    pub fn is_awaiting_key(&self) -> bool {
        self.awaiting_key.is_some()
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Chip8::new()
    }
}
