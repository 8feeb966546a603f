pub mod chip8;
/// Cursive display output.
pub mod cursive_display;
pub mod driver;
pub mod framebuffer;

use crate::chip::framebuffer::Framebuffer;

/// The state of the 16 keys of the hexadecimal keypad, indexed by key value.
pub type Keypad = [bool; 16];

/// A chip that can be driven cycle by cycle. The execution driver is generic over this trait, so
/// that it only relies on loading a program, cycling and exchanging frames and key states.
pub trait Chip {
    /// Brings the chip back into its power-on state. Any loaded program is discarded.
    fn reset(&mut self);

    /// Loads `program` into the chip's program memory and returns the number of bytes loaded.
    fn load_program(&mut self, program: &[u8]) -> Result<usize, LoadProgramError>;

    /// Executes a single cycle.
    fn cycle(&mut self) -> Result<CycleOutcome, ExecutionError>;

    /// The current content of the display.
    fn frame(&self) -> &Framebuffer;

    /// Mutable access to the input pins, used to pull in fresh key states.
    fn input_pins_mut(&mut self) -> &mut Keypad;
}

/// What happened during a single cycle, as far as the outside world is concerned.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    /// The executed instruction cleared or drew to the display.
    pub frame_changed: bool,

    /// The sound timer reached zero during this cycle. Making noise is up to the caller.
    pub sound_expired: bool,
}

/// Errors that occur when loading a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadProgramError {
    /// The program does not contain a single byte.
    EmptyProgram,

    /// The program does not fit into program memory. Carries the size of the program.
    ProgramTooLarge(usize),
}

/// Unrecoverable errors raised while executing a program. The chip state must not be used to
/// continue execution after one of those occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// No instruction is known for the opcode fetched at the given address.
    UnknownOpcode { opcode: u16, address: u16 },

    /// The program counter points outside of memory.
    ProgramCounterOutOfBounds(u16),

    /// An instruction accessed memory outside of the address space.
    MemoryOutOfBounds { address: usize, len: usize },

    /// A subroutine call was made with a full stack.
    StackOverflow { address: u16 },

    /// A return was made with an empty stack.
    StackUnderflow { address: u16 },
}

impl std::fmt::Display for LoadProgramError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LoadProgramError::EmptyProgram => write!(f, "The program is empty."),
            LoadProgramError::ProgramTooLarge(size) => {
                write!(f, "The program is too large ({} bytes).", size)
            }
        }
    }
}

impl std::error::Error for LoadProgramError {}

impl std::fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ExecutionError::UnknownOpcode { opcode, address } => write!(
                f,
                "Could not find an instruction for opcode {:#06X} at address {:#05X}.",
                opcode, address
            ),
            ExecutionError::ProgramCounterOutOfBounds(pc) => {
                write!(f, "Program counter {:#06X} points outside of memory.", pc)
            }
            ExecutionError::MemoryOutOfBounds { address, len } => write!(
                f,
                "Access of {} bytes at address {:#06X} exceeds memory.",
                len, address
            ),
            ExecutionError::StackOverflow { address } => {
                write!(f, "Stack overflow at address {:#05X}.", address)
            }
            ExecutionError::StackUnderflow { address } => {
                write!(f, "Stack underflow at address {:#05X}.", address)
            }
        }
    }
}

impl std::error::Error for ExecutionError {}
