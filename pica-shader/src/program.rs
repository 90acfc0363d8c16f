use hashbrown::HashMap;

use crate::disasm::Disassembler;
use crate::instruction::Instruction;
use crate::swizzle::SwizzlePattern;
use crate::{Error, Table};

/// Label bound to the program entry point on every rebuild.
pub const ENTRY_POINT_LABEL: &str = "main";

/// Shader memory owned by the emulated GPU.
pub trait ShaderSource {
    /// Program words, one per instruction.
    fn shader_binary(&self) -> &[u32];
    /// Operand descriptor words.
    fn swizzle_patterns(&self) -> &[u32];
    /// Entry point, in instruction words.
    fn main_offset(&self) -> u32;
}

/// A decoded shader program: code, operand descriptors and labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramInfo {
    code: Vec<Instruction>,
    swizzle_info: Vec<SwizzlePattern>,
    labels: HashMap<usize, String>,
}

impl ProgramInfo {
    pub fn new<C, S>(code: C, swizzles: S, main_offset: u32) -> Self
    where
        C: IntoIterator<Item = u32>,
        S: IntoIterator<Item = u32>,
    {
        let mut labels = HashMap::new();
        labels.insert(main_offset as usize, String::from(ENTRY_POINT_LABEL));
        Self {
            code: code.into_iter().map(Instruction::new).collect(),
            swizzle_info: swizzles.into_iter().map(SwizzlePattern::from_raw).collect(),
            labels,
        }
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.code
    }

    pub fn descriptors(&self) -> &[SwizzlePattern] {
        &self.swizzle_info
    }

    pub fn instruction_at(&self, offset: usize) -> Result<Instruction, Error> {
        self.code.get(offset).copied().ok_or(Error::OutOfRange {
            table: Table::Instructions,
            index: offset,
            len: self.code.len(),
        })
    }

    pub fn has_label_at(&self, offset: usize) -> bool {
        self.labels.contains_key(&offset)
    }

    pub fn label_at(&self, offset: usize) -> Result<&str, Error> {
        self.labels
            .get(&offset)
            .map(String::as_str)
            .ok_or(Error::UnboundLabel { offset })
    }

    /// Binds `name` to `offset`, replacing any label already there.
    pub fn set_label(&mut self, offset: usize, name: impl Into<String>) {
        self.labels.insert(offset, name.into());
    }

    pub fn disassemble(&self, offset: usize, disasm: &Disassembler) -> Result<String, Error> {
        disasm.disassemble(self.instruction_at(offset)?, &self.swizzle_info)
    }

    /// Renders the three display columns for the instruction at `offset`.
    pub fn row(&self, offset: usize, disasm: &Disassembler) -> Result<Row, Error> {
        let instr = self.instruction_at(offset)?;
        Ok(Row {
            offset: match self.labels.get(&offset) {
                Some(name) => name.clone(),
                None => format!("{:04x}", 4 * offset),
            },
            raw: format!("{:08x}", instr.raw()),
            disassembly: disasm.disassemble(instr, &self.swizzle_info)?,
        })
    }
}

/// One displayed line of a program listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Row {
    pub offset: String,
    pub raw: String,
    pub disassembly: String,
}

impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:<8}  {}  {}", self.offset, self.raw, self.disassembly)
    }
}

/// Holds the most recently rebuilt program for a viewer.
///
/// The program is replaced wholesale on each rebuild; readers only ever see a completed
/// [`ProgramInfo`].
#[derive(Debug, Clone, Default)]
pub struct ProgramModel {
    info: ProgramInfo,
}

impl ProgramModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self) -> &ProgramInfo {
        &self.info
    }

    pub fn rebuild(&mut self, code: &[u32], swizzles: &[u32], main_offset: u32) {
        let info = ProgramInfo::new(code.iter().copied(), swizzles.iter().copied(), main_offset);
        tracing::debug!(
            instructions = info.len(),
            descriptors = info.descriptors().len(),
            main_offset,
            "rebuilt shader program"
        );
        self.info = info;
    }

    pub fn refresh<S: ShaderSource + ?Sized>(&mut self, source: &S) {
        self.rebuild(
            source.shader_binary(),
            source.swizzle_patterns(),
            source.main_offset(),
        );
    }

    pub fn count(&self) -> usize {
        self.info.len()
    }

    pub fn instruction_at(&self, offset: usize) -> Result<Instruction, Error> {
        self.info.instruction_at(offset)
    }

    pub fn has_label_at(&self, offset: usize) -> bool {
        self.info.has_label_at(offset)
    }

    pub fn label_at(&self, offset: usize) -> Result<&str, Error> {
        self.info.label_at(offset)
    }
}
