mod arithmetic_and_logic;
mod program_flow;
mod system;

use crate::chip::{chip8::Chip8, ExecutionError};

/// Represents a Chip 8 opcode. A Chip 8 opcode is two bytes long and stored
/// big-endian in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Opcode(u16);

impl Opcode {
    /// Constructs a new `Opcode` given its byte representation.
    pub(crate) fn new(opcode: &[u8; 2]) -> Opcode {
        Opcode(u16::from_be_bytes(*opcode))
    }

    pub(crate) fn raw(self) -> u16 {
        self.0
    }

    /// The lowest 12 bits, interpreted as an address (`_nnn`).
    fn address(self) -> u16 {
        self.0 & 0x0FFF
    }

    /// The second nibble as register and the lowest byte as value (`_xkk`).
    fn reg_and_value(self) -> (u8, u8) {
        (self.x(), (self.0 & 0x00FF) as u8)
    }

    /// The lower three nibbles as individual operands (`_xyn`).
    fn operands(self) -> (u8, u8, u8) {
        (self.x(), ((self.0 & 0x00F0) >> 4) as u8, (self.0 & 0x000F) as u8)
    }

    fn x(self) -> u8 {
        ((self.0 & 0x0F00) >> 8) as u8
    }
}

impl From<u16> for Opcode {
    fn from(raw: u16) -> Self {
        Opcode(raw)
    }
}

/// The operations of the instruction set, without operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    Cls,
    Ret,
    Jp,
    Call,
    SeImm,
    SneImm,
    SeReg,
    SneReg,
    LdImm,
    AddImm,
    LdReg,
    Or,
    And,
    Xor,
    AddReg,
    Sub,
    Shr,
    Subn,
    Shl,
    LdI,
    JpV0,
    Rnd,
    Drw,
    Skp,
    Sknp,
    LdVxDt,
    LdVxK,
    LdDtVx,
    LdStVx,
    AddI,
    LdF,
    LdB,
    StoreRegs,
    LoadRegs,
}

/// A decoded instruction along with the operands extracted from its opcode.
/// `x` and `y` name registers, `value` is an immediate byte and `address` an
/// immediate 12 bit address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Cls,
    Ret,
    Jp { address: u16 },
    Call { address: u16 },
    SeImm { x: u8, value: u8 },
    SneImm { x: u8, value: u8 },
    SeReg { x: u8, y: u8 },
    SneReg { x: u8, y: u8 },
    LdImm { x: u8, value: u8 },
    AddImm { x: u8, value: u8 },
    LdReg { x: u8, y: u8 },
    Or { x: u8, y: u8 },
    And { x: u8, y: u8 },
    Xor { x: u8, y: u8 },
    AddReg { x: u8, y: u8 },
    Sub { x: u8, y: u8 },
    Shr { x: u8 },
    Subn { x: u8, y: u8 },
    Shl { x: u8 },
    LdI { address: u16 },
    JpV0 { address: u16 },
    Rnd { x: u8, value: u8 },
    Drw { x: u8, y: u8, n: u8 },
    Skp { x: u8 },
    Sknp { x: u8 },
    LdVxDt { x: u8 },
    LdVxK { x: u8 },
    LdDtVx { x: u8 },
    LdStVx { x: u8 },
    AddI { x: u8 },
    LdF { x: u8 },
    LdB { x: u8 },
    StoreRegs { x: u8 },
    LoadRegs { x: u8 },
}

/// An opcode belongs to a pattern iff `opcode & mask == value`.
struct Pattern {
    mask: u16,
    value: u16,
    mnemonic: Mnemonic,
}

const fn pattern(mask: u16, value: u16, mnemonic: Mnemonic) -> Pattern {
    Pattern {
        mask,
        value,
        mnemonic,
    }
}

/// The patterns are pairwise disjoint, so the order of this list does not matter.
const PATTERNS: [Pattern; 34] = [
    pattern(0xFFFF, 0x00E0, Mnemonic::Cls),
    pattern(0xFFFF, 0x00EE, Mnemonic::Ret),
    pattern(0xF000, 0x1000, Mnemonic::Jp),
    pattern(0xF000, 0x2000, Mnemonic::Call),
    pattern(0xF000, 0x3000, Mnemonic::SeImm),
    pattern(0xF000, 0x4000, Mnemonic::SneImm),
    pattern(0xF00F, 0x5000, Mnemonic::SeReg),
    pattern(0xF000, 0x6000, Mnemonic::LdImm),
    pattern(0xF000, 0x7000, Mnemonic::AddImm),
    pattern(0xF00F, 0x8000, Mnemonic::LdReg),
    pattern(0xF00F, 0x8001, Mnemonic::Or),
    pattern(0xF00F, 0x8002, Mnemonic::And),
    pattern(0xF00F, 0x8003, Mnemonic::Xor),
    pattern(0xF00F, 0x8004, Mnemonic::AddReg),
    pattern(0xF00F, 0x8005, Mnemonic::Sub),
    pattern(0xF00F, 0x8006, Mnemonic::Shr),
    pattern(0xF00F, 0x8007, Mnemonic::Subn),
    pattern(0xF00F, 0x800E, Mnemonic::Shl),
    pattern(0xF00F, 0x9000, Mnemonic::SneReg),
    pattern(0xF000, 0xA000, Mnemonic::LdI),
    pattern(0xF000, 0xB000, Mnemonic::JpV0),
    pattern(0xF000, 0xC000, Mnemonic::Rnd),
    pattern(0xF000, 0xD000, Mnemonic::Drw),
    pattern(0xF0FF, 0xE09E, Mnemonic::Skp),
    pattern(0xF0FF, 0xE0A1, Mnemonic::Sknp),
    pattern(0xF0FF, 0xF007, Mnemonic::LdVxDt),
    pattern(0xF0FF, 0xF00A, Mnemonic::LdVxK),
    pattern(0xF0FF, 0xF015, Mnemonic::LdDtVx),
    pattern(0xF0FF, 0xF018, Mnemonic::LdStVx),
    pattern(0xF0FF, 0xF01E, Mnemonic::AddI),
    pattern(0xF0FF, 0xF029, Mnemonic::LdF),
    pattern(0xF0FF, 0xF033, Mnemonic::LdB),
    pattern(0xF0FF, 0xF055, Mnemonic::StoreRegs),
    pattern(0xF0FF, 0xF065, Mnemonic::LoadRegs),
];

/// Decodes `opcode` into an instruction. Returns `None` for opcodes that are
/// not part of the instruction set (including the `0nnn` machine code calls).
pub fn decode(opcode: u16) -> Option<Instruction> {
    PATTERNS
        .iter()
        .find(|p| opcode & p.mask == p.value)
        .map(|p| Instruction::new(p.mnemonic, Opcode(opcode)))
}

impl Instruction {
    /// Binds the operands of `opcode` to the operation `mnemonic`.
    fn new(mnemonic: Mnemonic, opcode: Opcode) -> Instruction {
        let address = opcode.address();
        let (x, value) = opcode.reg_and_value();
        let (_, y, n) = opcode.operands();

        match mnemonic {
            Mnemonic::Cls => Instruction::Cls,
            Mnemonic::Ret => Instruction::Ret,
            Mnemonic::Jp => Instruction::Jp { address },
            Mnemonic::Call => Instruction::Call { address },
            Mnemonic::SeImm => Instruction::SeImm { x, value },
            Mnemonic::SneImm => Instruction::SneImm { x, value },
            Mnemonic::SeReg => Instruction::SeReg { x, y },
            Mnemonic::SneReg => Instruction::SneReg { x, y },
            Mnemonic::LdImm => Instruction::LdImm { x, value },
            Mnemonic::AddImm => Instruction::AddImm { x, value },
            Mnemonic::LdReg => Instruction::LdReg { x, y },
            Mnemonic::Or => Instruction::Or { x, y },
            Mnemonic::And => Instruction::And { x, y },
            Mnemonic::Xor => Instruction::Xor { x, y },
            Mnemonic::AddReg => Instruction::AddReg { x, y },
            Mnemonic::Sub => Instruction::Sub { x, y },
            Mnemonic::Shr => Instruction::Shr { x },
            Mnemonic::Subn => Instruction::Subn { x, y },
            Mnemonic::Shl => Instruction::Shl { x },
            Mnemonic::LdI => Instruction::LdI { address },
            Mnemonic::JpV0 => Instruction::JpV0 { address },
            Mnemonic::Rnd => Instruction::Rnd { x, value },
            Mnemonic::Drw => Instruction::Drw { x, y, n },
            Mnemonic::Skp => Instruction::Skp { x },
            Mnemonic::Sknp => Instruction::Sknp { x },
            Mnemonic::LdVxDt => Instruction::LdVxDt { x },
            Mnemonic::LdVxK => Instruction::LdVxK { x },
            Mnemonic::LdDtVx => Instruction::LdDtVx { x },
            Mnemonic::LdStVx => Instruction::LdStVx { x },
            Mnemonic::AddI => Instruction::AddI { x },
            Mnemonic::LdF => Instruction::LdF { x },
            Mnemonic::LdB => Instruction::LdB { x },
            Mnemonic::StoreRegs => Instruction::StoreRegs { x },
            Mnemonic::LoadRegs => Instruction::LoadRegs { x },
        }
    }

    pub fn mnemonic(&self) -> Mnemonic {
        match self {
            Instruction::Cls => Mnemonic::Cls,
            Instruction::Ret => Mnemonic::Ret,
            Instruction::Jp { .. } => Mnemonic::Jp,
            Instruction::Call { .. } => Mnemonic::Call,
            Instruction::SeImm { .. } => Mnemonic::SeImm,
            Instruction::SneImm { .. } => Mnemonic::SneImm,
            Instruction::SeReg { .. } => Mnemonic::SeReg,
            Instruction::SneReg { .. } => Mnemonic::SneReg,
            Instruction::LdImm { .. } => Mnemonic::LdImm,
            Instruction::AddImm { .. } => Mnemonic::AddImm,
            Instruction::LdReg { .. } => Mnemonic::LdReg,
            Instruction::Or { .. } => Mnemonic::Or,
            Instruction::And { .. } => Mnemonic::And,
            Instruction::Xor { .. } => Mnemonic::Xor,
            Instruction::AddReg { .. } => Mnemonic::AddReg,
            Instruction::Sub { .. } => Mnemonic::Sub,
            Instruction::Shr { .. } => Mnemonic::Shr,
            Instruction::Subn { .. } => Mnemonic::Subn,
            Instruction::Shl { .. } => Mnemonic::Shl,
            Instruction::LdI { .. } => Mnemonic::LdI,
            Instruction::JpV0 { .. } => Mnemonic::JpV0,
            Instruction::Rnd { .. } => Mnemonic::Rnd,
            Instruction::Drw { .. } => Mnemonic::Drw,
            Instruction::Skp { .. } => Mnemonic::Skp,
            Instruction::Sknp { .. } => Mnemonic::Sknp,
            Instruction::LdVxDt { .. } => Mnemonic::LdVxDt,
            Instruction::LdVxK { .. } => Mnemonic::LdVxK,
            Instruction::LdDtVx { .. } => Mnemonic::LdDtVx,
            Instruction::LdStVx { .. } => Mnemonic::LdStVx,
            Instruction::AddI { .. } => Mnemonic::AddI,
            Instruction::LdF { .. } => Mnemonic::LdF,
            Instruction::LdB { .. } => Mnemonic::LdB,
            Instruction::StoreRegs { .. } => Mnemonic::StoreRegs,
            Instruction::LoadRegs { .. } => Mnemonic::LoadRegs,
        }
    }

    /// Whether executing this instruction modifies the display.
    pub fn changes_frame(&self) -> bool {
        matches!(self, Instruction::Cls | Instruction::Drw { .. })
    }
}

/// Maps every 16 bit opcode to its decoded instruction, if there is one.
pub(crate) struct InstructionTable {
    entries: Box<[Option<Instruction>]>,
}

impl InstructionTable {
    /// Decodes the whole opcode space.
    pub(crate) fn build() -> Self {
        InstructionTable {
            entries: (0..=u16::MAX).map(decode).collect(),
        }
    }

    pub(crate) fn get(&self, opcode: Opcode) -> Option<Instruction> {
        self.entries.get(opcode.raw() as usize).copied().flatten()
    }
}

impl Default for InstructionTable {
    /// An empty table which does not map any opcode.
    fn default() -> Self {
        InstructionTable {
            entries: Box::new([]),
        }
    }
}

/// Executes `instruction` relative to the given state. Note that this
/// method will in-place modify the given state.
pub(crate) fn apply(instruction: Instruction, state: &mut Chip8) -> Result<(), ExecutionError> {
    match instruction {
        Instruction::Cls => system::clear(state),
        Instruction::Ret => program_flow::ret(state)?,
        Instruction::Jp { address } => program_flow::jump(state, address),
        Instruction::Call { address } => program_flow::call(state, address)?,
        Instruction::SeImm { x, value } => program_flow::skip_if_equal(state, x, value),
        Instruction::SneImm { x, value } => program_flow::skip_if_not_equal(state, x, value),
        Instruction::SeReg { x, y } => program_flow::skip_if_registers_equal(state, x, y),
        Instruction::SneReg { x, y } => program_flow::skip_if_registers_not_equal(state, x, y),
        Instruction::JpV0 { address } => program_flow::jump_with_offset(state, address),
        Instruction::LdImm { x, value } => arithmetic_and_logic::load(state, x, value),
        Instruction::AddImm { x, value } => arithmetic_and_logic::add(state, x, value),
        Instruction::LdReg { x, y } => {
            arithmetic_and_logic::modify_registers(state, x, y, |_, vy| vy)
        }
        Instruction::Or { x, y } => {
            arithmetic_and_logic::modify_registers(state, x, y, |vx, vy| vx | vy)
        }
        Instruction::And { x, y } => {
            arithmetic_and_logic::modify_registers(state, x, y, |vx, vy| vx & vy)
        }
        Instruction::Xor { x, y } => {
            arithmetic_and_logic::modify_registers(state, x, y, |vx, vy| vx ^ vy)
        }
        Instruction::AddReg { x, y } => arithmetic_and_logic::add_registers(state, x, y),
        Instruction::Sub { x, y } => arithmetic_and_logic::sub(state, x, y),
        Instruction::Shr { x } => arithmetic_and_logic::shift_right(state, x),
        Instruction::Subn { x, y } => arithmetic_and_logic::sub_reversed(state, x, y),
        Instruction::Shl { x } => arithmetic_and_logic::shift_left(state, x),
        Instruction::LdI { address } => arithmetic_and_logic::load_index(state, address),
        Instruction::Rnd { x, value } => arithmetic_and_logic::random(state, x, value),
        Instruction::AddI { x } => arithmetic_and_logic::add_index(state, x),
        Instruction::LdF { x } => arithmetic_and_logic::load_glyph(state, x),
        Instruction::LdB { x } => arithmetic_and_logic::store_bcd(state, x)?,
        Instruction::StoreRegs { x } => arithmetic_and_logic::store_registers(state, x)?,
        Instruction::LoadRegs { x } => arithmetic_and_logic::load_registers(state, x)?,
        Instruction::Drw { x, y, n } => system::draw(state, x, y, n)?,
        Instruction::Skp { x } => system::skip_if_key(state, x, true),
        Instruction::Sknp { x } => system::skip_if_key(state, x, false),
        Instruction::LdVxDt { x } => system::read_delay_timer(state, x),
        Instruction::LdVxK { x } => system::wait_for_key(state, x),
        Instruction::LdDtVx { x } => system::set_delay_timer(state, x),
        Instruction::LdStVx { x } => system::set_sound_timer(state, x),
    };
    Ok(())
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_fields() {
        let opcode = Opcode::new(&[0xAB, 0xCD]);
        assert_eq!(opcode.raw(), 0xABCD);
        assert_eq!(opcode.address(), 0x0BCD);
        assert_eq!(opcode.reg_and_value(), (0xB, 0xCD));
        assert_eq!(opcode.operands(), (0xB, 0xC, 0xD));
    }

    #[test]
    fn test_patterns_are_disjoint() {
        for opcode in 0..=u16::MAX {
            let matching: Vec<&Pattern> = PATTERNS
                .iter()
                .filter(|p| opcode & p.mask == p.value)
                .collect();

            assert!(matching.len() <= 1, "{:#06X} matches several patterns", opcode);

            match (matching.first(), decode(opcode)) {
                (Some(pattern), Some(instruction)) => {
                    assert_eq!(instruction.mnemonic(), pattern.mnemonic, "{:#06X}", opcode)
                }
                (None, None) => {}
                (expected, got) => panic!(
                    "{:#06X}: pattern {:?} but decoded {:?}",
                    opcode,
                    expected.map(|p| p.mnemonic),
                    got
                ),
            }
        }
    }

    #[test]
    fn test_decode_extracts_operands() {
        assert_eq!(decode(0x1ABC), Some(Instruction::Jp { address: 0xABC }));
        assert_eq!(
            decode(0x3A42),
            Some(Instruction::SeImm { x: 0xA, value: 0x42 })
        );
        assert_eq!(decode(0x8AB4), Some(Instruction::AddReg { x: 0xA, y: 0xB }));
        assert_eq!(
            decode(0xD125),
            Some(Instruction::Drw { x: 0x1, y: 0x2, n: 0x5 })
        );
        assert_eq!(decode(0xF733), Some(Instruction::LdB { x: 0x7 }));
    }

    #[test]
    fn test_decode_rejects_unknown_opcodes() {
        for opcode in &[0x0000, 0x0123, 0x00E1, 0x5121, 0x8008, 0x900F, 0xE0FF, 0xF0FF] {
            assert_eq!(decode(*opcode), None, "{:#06X}", opcode);
        }
    }

    #[test]
    fn test_every_family_is_decoded() {
        for family in 0x1..=0xF {
            let decoded = (0..=0x0FFF)
                .filter(|payload| decode(family << 12 | payload).is_some())
                .count();
            assert!(decoded > 0, "no opcode of family {:X} decodes", family);
        }
    }

    #[test]
    fn test_table_matches_decode() {
        let table = InstructionTable::build();
        for opcode in 0..=u16::MAX {
            assert_eq!(table.get(Opcode::from(opcode)), decode(opcode));
        }
    }

    #[test]
    fn test_only_cls_and_drw_change_frame() {
        assert!(Instruction::Cls.changes_frame());
        assert!(Instruction::Drw { x: 0, y: 0, n: 1 }.changes_frame());
        assert!(!Instruction::Jp { address: 0x200 }.changes_frame());
        assert!(!Instruction::Ret.changes_frame());
    }
}
