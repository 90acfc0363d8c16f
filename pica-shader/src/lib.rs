pub mod container;
pub mod disasm;
pub mod instruction;
pub mod opcode;
pub mod program;
pub mod register;
pub mod swizzle;

pub use container::ShaderBinary;
pub use disasm::Disassembler;
pub use instruction::Instruction;
pub use program::{ProgramInfo, ProgramModel, Row, ShaderSource};
pub use swizzle::SwizzlePattern;

/// Backing table an index was checked against.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Table {
    OperandDescriptors,
    Instructions,
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OperandDescriptors => write!(f, "operand descriptor table"),
            Self::Instructions => write!(f, "program"),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("index {index} is out of range for the {table} (length {len})")]
    OutOfRange { table: Table, index: usize, len: usize },

    #[error("no label is bound at offset {offset}")]
    UnboundLabel { offset: usize },

    #[error("malformed shader container")]
    MalformedContainer(#[from] container::Error),
}
