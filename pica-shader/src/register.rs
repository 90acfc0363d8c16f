//! Register references used by shader operands.
//!
//! Sources are encoded in 7 bits (inputs, temporaries and float uniforms share one index space)
//! while destinations use 5 bits (outputs and temporaries).

/// Register file a reference points into.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RegisterType {
    Input,
    Output,
    Temporary,
    FloatUniform,
    Address,
}

impl RegisterType {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Input => "v",
            Self::Output => "o",
            Self::Temporary => "r",
            Self::FloatUniform => "c",
            Self::Address => "a",
        }
    }
}

/// A source operand register.
///
/// # Format
///
/// `0x00..=0x0f` input, `0x10..=0x1f` temporary, `0x20..=0x7f` float uniform.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SourceRegister(u8);

impl SourceRegister {
    pub fn new(raw: u8) -> Self {
        Self(raw & 0x7f)
    }

    pub fn raw(&self) -> u8 {
        self.0
    }

    pub fn register_type(&self) -> RegisterType {
        match self.0 {
            0x00..=0x0f => RegisterType::Input,
            0x10..=0x1f => RegisterType::Temporary,
            _ => RegisterType::FloatUniform,
        }
    }

    pub fn index(&self) -> u8 {
        match self.register_type() {
            RegisterType::Input => self.0,
            RegisterType::Temporary => self.0 - 0x10,
            _ => self.0 - 0x20,
        }
    }

    pub fn name(&self) -> String {
        format!("{}{}", self.register_type().prefix(), self.index())
    }
}

/// A destination operand register.
///
/// # Format
///
/// `0x00..=0x0f` output, `0x10..=0x1f` temporary.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DestRegister(u8);

impl DestRegister {
    pub fn new(raw: u8) -> Self {
        Self(raw & 0x1f)
    }

    pub fn raw(&self) -> u8 {
        self.0
    }

    pub fn register_type(&self) -> RegisterType {
        if self.0 < 0x10 {
            RegisterType::Output
        } else {
            RegisterType::Temporary
        }
    }

    pub fn index(&self) -> u8 {
        self.0 & 0x0f
    }

    pub fn name(&self) -> String {
        format!("{}{}", self.register_type().prefix(), self.index())
    }
}

/// Address register used to offset the first source operand.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AddressRegister {
    None = 0,
    A0X = 1,
    A0Y = 2,
    LoopCounter = 3,
}

impl AddressRegister {
    pub fn from_index(index: u8) -> Self {
        match index & 0b11 {
            0 => Self::None,
            1 => Self::A0X,
            2 => Self::A0Y,
            _ => Self::LoopCounter,
        }
    }

    /// Name of the register, or `None` when the operand is addressed directly.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::A0X => Some("a0.x"),
            Self::A0Y => Some("a0.y"),
            Self::LoopCounter => Some("aL"),
        }
    }
}

/// Name of the synthetic destination written by `MOVA`.
pub const ADDRESS_REGISTER_DEST: &str = "a0";
