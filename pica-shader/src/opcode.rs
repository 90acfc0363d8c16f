use bitflags::bitflags;

bitflags! {
    /// Operand layout of an arithmetic opcode.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct Subtype: u8 {
        const HAS_DESTINATION = 1 << 0;
        const HAS_SOURCE1 = 1 << 1;
        const HAS_SOURCE2 = 1 << 2;
        const WRITES_ADDRESS_REGISTER = 1 << 3;
        const HAS_COMPARE_OPERATORS = 1 << 4;
        const SOURCES_ARE_ORDER_INVERTED = 1 << 5;
    }
}

impl Subtype {
    const ONE_ARGUMENT: Self = Self::HAS_DESTINATION.union(Self::HAS_SOURCE1);
    const TWO_ARGUMENTS: Self = Self::ONE_ARGUMENT.union(Self::HAS_SOURCE2);
    const TWO_ARGUMENTS_INVERTED: Self = Self::TWO_ARGUMENTS.union(Self::SOURCES_ARE_ORDER_INVERTED);
    const MOVA: Self = Self::WRITES_ADDRESS_REGISTER.union(Self::HAS_SOURCE1);
    const COMPARE: Self = Self::HAS_SOURCE1
        .union(Self::HAS_SOURCE2)
        .union(Self::HAS_COMPARE_OPERATORS);
}

/// Operand form of a flow control opcode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FlowControl {
    /// Condition only.
    BreakC,
    /// Target and instruction count.
    Call,
    /// Condition, target and instruction count.
    CallC,
    /// Bool uniform, target and instruction count.
    CallU,
    /// Bool uniform, target and instruction count.
    IfU,
    /// Condition, target and instruction count.
    IfC,
    /// Int uniform, target and instruction count.
    Loop,
    /// Condition and target.
    JmpC,
    /// Bool uniform and target.
    JmpU,
}

/// How an opcode's operands are laid out and rendered.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OpcodeClass {
    Arithmetic(Subtype),
    /// Flow control that carries a target offset and/or a condition.
    Conditional(FlowControl),
    /// Rendered by name only.
    Other,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct OpcodeInfo {
    pub name: &'static str,
    pub class: OpcodeClass,
}

impl OpcodeInfo {
    const fn arithmetic(name: &'static str, subtype: Subtype) -> Self {
        Self {
            name,
            class: OpcodeClass::Arithmetic(subtype),
        }
    }

    const fn conditional(name: &'static str, form: FlowControl) -> Self {
        Self {
            name,
            class: OpcodeClass::Conditional(form),
        }
    }

    const fn other(name: &'static str) -> Self {
        Self {
            name,
            class: OpcodeClass::Other,
        }
    }
}

/// Number of distinct opcode encodings (the field is 6 bits wide).
pub const OPCODE_COUNT: usize = 64;

/// Metadata for every opcode encoding, indexed by the raw opcode value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeTable {
    entries: [OpcodeInfo; OPCODE_COUNT],
}

impl OpcodeTable {
    pub fn new() -> Self {
        let mut entries = [OpcodeInfo::other("UNK"); OPCODE_COUNT];

        let arithmetic = [
            (0x00, "ADD", Subtype::TWO_ARGUMENTS),
            (0x01, "DP3", Subtype::TWO_ARGUMENTS),
            (0x02, "DP4", Subtype::TWO_ARGUMENTS),
            (0x03, "DPH", Subtype::TWO_ARGUMENTS),
            (0x04, "DST", Subtype::TWO_ARGUMENTS),
            (0x05, "EX2", Subtype::ONE_ARGUMENT),
            (0x06, "LG2", Subtype::ONE_ARGUMENT),
            (0x07, "LITP", Subtype::ONE_ARGUMENT),
            (0x08, "MUL", Subtype::TWO_ARGUMENTS),
            (0x09, "SGE", Subtype::TWO_ARGUMENTS),
            (0x0a, "SLT", Subtype::TWO_ARGUMENTS),
            (0x0b, "FLR", Subtype::ONE_ARGUMENT),
            (0x0c, "MAX", Subtype::TWO_ARGUMENTS),
            (0x0d, "MIN", Subtype::TWO_ARGUMENTS),
            (0x0e, "RCP", Subtype::ONE_ARGUMENT),
            (0x0f, "RSQ", Subtype::ONE_ARGUMENT),
            (0x12, "MOVA", Subtype::MOVA),
            (0x13, "MOV", Subtype::ONE_ARGUMENT),
            (0x18, "DPHI", Subtype::TWO_ARGUMENTS_INVERTED),
            (0x19, "DSTI", Subtype::TWO_ARGUMENTS_INVERTED),
            (0x1a, "SGEI", Subtype::TWO_ARGUMENTS_INVERTED),
            (0x1b, "SLTI", Subtype::TWO_ARGUMENTS_INVERTED),
            (0x2e, "CMP", Subtype::COMPARE),
            (0x2f, "CMP", Subtype::COMPARE),
        ];
        for (opcode, name, subtype) in arithmetic {
            entries[opcode] = OpcodeInfo::arithmetic(name, subtype);
        }

        let conditional = [
            (0x23, "BREAKC", FlowControl::BreakC),
            (0x24, "CALL", FlowControl::Call),
            (0x25, "CALLC", FlowControl::CallC),
            (0x26, "CALLU", FlowControl::CallU),
            (0x27, "IFU", FlowControl::IfU),
            (0x28, "IFC", FlowControl::IfC),
            (0x29, "LOOP", FlowControl::Loop),
            (0x2c, "JMPC", FlowControl::JmpC),
            (0x2d, "JMPU", FlowControl::JmpU),
        ];
        for (opcode, name, form) in conditional {
            entries[opcode] = OpcodeInfo::conditional(name, form);
        }

        let other = [
            (0x20, "BREAK"),
            (0x21, "NOP"),
            (0x22, "END"),
            (0x2a, "EMIT"),
            (0x2b, "SETEMIT"),
        ];
        for (opcode, name) in other {
            entries[opcode] = OpcodeInfo::other(name);
        }

        // The low bits of MADI/MAD are part of their operand encoding.
        for opcode in 0x30..0x38 {
            entries[opcode] = OpcodeInfo::other("MADI");
        }
        for opcode in 0x38..0x40 {
            entries[opcode] = OpcodeInfo::other("MAD");
        }

        Self { entries }
    }

    /// Looks up an opcode. Only the low six bits are significant, so every value resolves.
    #[inline]
    pub fn get(&self, opcode: u8) -> &OpcodeInfo {
        &self.entries[(opcode & 0x3f) as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &OpcodeInfo)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(opcode, info)| (opcode as u8, info))
    }
}

impl Default for OpcodeTable {
    fn default() -> Self {
        Self::new()
    }
}
