//! Disassembly of single instructions into column-aligned text.

use std::fmt::Write;

use crate::instruction::{ConditionOp, Instruction};
use crate::opcode::{FlowControl, OpcodeClass, OpcodeTable, Subtype};
use crate::register::ADDRESS_REGISTER_DEST;
use crate::swizzle::{SourceSlot, SwizzlePattern};
use crate::{Error, Table};

const NAME_WIDTH: usize = 6;
const DEST_WIDTH: usize = 6;
const SRC1_WIDTH: usize = 8;

/// Renders instructions using an opcode table built once up front.
#[derive(Debug, Clone, Default)]
pub struct Disassembler {
    opcodes: OpcodeTable,
}

impl Disassembler {
    pub fn new() -> Self {
        Self::with_table(OpcodeTable::new())
    }

    pub fn with_table(opcodes: OpcodeTable) -> Self {
        Self { opcodes }
    }

    pub fn opcodes(&self) -> &OpcodeTable {
        &self.opcodes
    }

    /// Disassembles one instruction.
    ///
    /// Arithmetic instructions look up their operand descriptor in `descriptors`; an index past
    /// the end of the table fails with [`Error::OutOfRange`]. Other classes never consult the
    /// table.
    pub fn disassemble(
        &self,
        instr: Instruction,
        descriptors: &[SwizzlePattern],
    ) -> Result<String, Error> {
        let info = self.opcodes.get(instr.opcode());
        // the name is always followed by a separator, even when it fills its column
        let mut output = format!("{:<NAME_WIDTH$} ", info.name);

        match info.class {
            OpcodeClass::Arithmetic(subtype) => {
                let index = instr.operand_desc_id();
                let pattern = descriptors.get(index).ok_or(Error::OutOfRange {
                    table: Table::OperandDescriptors,
                    index,
                    len: descriptors.len(),
                })?;
                write_arithmetic(&mut output, instr, subtype, pattern);
            }
            OpcodeClass::Conditional(form) => write_flow_control(&mut output, instr, form),
            OpcodeClass::Other => {}
        }

        output.truncate(output.trim_end().len());
        Ok(output)
    }
}

fn write_arithmetic(
    output: &mut String,
    instr: Instruction,
    subtype: Subtype,
    pattern: &SwizzlePattern,
) {
    // Must be resolved before any register field is read.
    let inverted = subtype.contains(Subtype::SOURCES_ARE_ORDER_INVERTED);

    let dest = if subtype.contains(Subtype::WRITES_ADDRESS_REGISTER) {
        format!("{}.{}", ADDRESS_REGISTER_DEST, pattern.dest_mask_string())
    } else if subtype.contains(Subtype::HAS_DESTINATION) {
        format!("{}.{}", instr.dest().name(), pattern.dest_mask_string())
    } else {
        String::new()
    };
    let _ = write!(output, "{dest:<DEST_WIDTH$}  ");

    let src1 = if subtype.contains(Subtype::HAS_SOURCE1) {
        let relative = instr
            .address_register()
            .name()
            .map(|name| format!("[{name}]"))
            .unwrap_or_default();
        format!(
            "{}{}{}.{}",
            negation(pattern, SourceSlot::Src1),
            instr.src1(inverted).name(),
            relative,
            pattern.selector_string(SourceSlot::Src1)
        )
    } else {
        String::new()
    };
    let _ = write!(output, "{src1:<SRC1_WIDTH$}  ");

    if subtype.contains(Subtype::HAS_COMPARE_OPERATORS) {
        let _ = write!(
            output,
            "{} {}  ",
            instr.compare_x().as_str(),
            instr.compare_y().as_str()
        );
    }

    if subtype.contains(Subtype::HAS_SOURCE2) {
        let _ = write!(
            output,
            "{}{}.{}",
            negation(pattern, SourceSlot::Src2),
            instr.src2(inverted).name(),
            pattern.selector_string(SourceSlot::Src2)
        );
    }
}

fn negation(pattern: &SwizzlePattern, slot: SourceSlot) -> &'static str {
    if pattern.negate(slot) {
        "-"
    } else {
        ""
    }
}

fn write_flow_control(output: &mut String, instr: Instruction, form: FlowControl) {
    let target = format!("0x{:04x}", 4 * instr.dest_offset());
    let count = instr.num_instructions();
    let _ = match form {
        FlowControl::IfC | FlowControl::CallC => {
            write!(output, "{}  {} ({})", condition(instr), target, count)
        }
        FlowControl::JmpC => write!(output, "{}  {}", condition(instr), target),
        FlowControl::BreakC => write!(output, "{}", condition(instr)),
        FlowControl::IfU | FlowControl::CallU => {
            write!(output, "b{}  {} ({})", instr.bool_uniform_id(), target, count)
        }
        FlowControl::JmpU => write!(output, "b{}  {}", instr.bool_uniform_id(), target),
        FlowControl::Loop => write!(output, "i{}  {} ({})", instr.int_uniform_id(), target, count),
        FlowControl::Call => write!(output, "{} ({})", target, count),
    };
}

fn condition(instr: Instruction) -> String {
    let x = if instr.refx() { "cc.x" } else { "!cc.x" };
    let y = if instr.refy() { "cc.y" } else { "!cc.y" };
    match instr.condition_op() {
        ConditionOp::Or => format!("{x} || {y}"),
        ConditionOp::And => format!("{x} && {y}"),
        ConditionOp::JustX => String::from(x),
        ConditionOp::JustY => String::from(y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::ArithmeticBuilder;
    use crate::register::AddressRegister;
    use crate::swizzle::Component::{W, X, Y, Z};

    const ADD: u8 = 0x00;
    const MOV: u8 = 0x13;
    const MOVA: u8 = 0x12;
    const DPHI: u8 = 0x18;
    const CMP: u8 = 0x2e;

    fn xyzw() -> SwizzlePattern {
        SwizzlePattern::new(0b1111, [X, Y, Z, W], false, [X, Y, Z, W], false)
    }

    #[test]
    fn add_with_negated_source() {
        let pattern = SwizzlePattern::new(0b1110, [X, Y, Z, X], true, [Y, Y, Z, W], false);
        let instr = ArithmeticBuilder::new(ADD)
            .dest(0x10)
            .src1(0x00)
            .src2(0x01)
            .operand_desc_id(0)
            .build();
        let text = Disassembler::new().disassemble(instr, &[pattern]).unwrap();
        assert_eq!(text, "ADD    r0.xyz  -v0.xyzx  v1.yyzw");
    }

    #[test]
    fn relative_addressing_applies_to_first_source() {
        let instr = ArithmeticBuilder::new(MOV)
            .dest(0x03)
            .src1(0x2a)
            .address_register(AddressRegister::A0X)
            .build();
        let text = Disassembler::new().disassemble(instr, &[xyzw()]).unwrap();
        assert_eq!(text, "MOV    o3.xyzw  c10[a0.x].xyzw");
    }

    #[test]
    fn mova_writes_address_register() {
        let pattern = SwizzlePattern::new(0b1100, [X, Y, Z, W], false, [X, Y, Z, W], false);
        let instr = ArithmeticBuilder::new(MOVA).dest(0x1f).src1(0x21).build();
        let text = Disassembler::new().disassemble(instr, &[pattern]).unwrap();
        assert_eq!(text, "MOVA   a0.xy   c1.xyzw");
    }

    #[test]
    fn inverted_sources_resolve_before_naming() {
        let instr = ArithmeticBuilder::new(DPHI)
            .dest(0x11)
            .src1(0x02)
            .src2(0x40)
            .inverted(true)
            .build();
        let text = Disassembler::new().disassemble(instr, &[xyzw()]).unwrap();
        assert_eq!(text, "DPHI   r1.xyzw  v2.xyzw   c32.xyzw");
    }

    #[test]
    fn compare_renders_both_operators_without_destination() {
        let raw = ArithmeticBuilder::new(CMP).src1(0x10).src2(0x11).build().raw()
            | (1 << 24)
            | (4 << 21);
        let text = Disassembler::new()
            .disassemble(Instruction::new(raw), &[xyzw()])
            .unwrap();
        assert_eq!(text, "CMP            r0.xyzw   != >  r1.xyzw");
    }

    #[test]
    fn descriptor_out_of_range() {
        let instr = ArithmeticBuilder::new(ADD).operand_desc_id(100).build();
        let table = vec![xyzw(); 16];
        let err = Disassembler::new().disassemble(instr, &table).unwrap_err();
        assert_eq!(
            err,
            Error::OutOfRange {
                table: Table::OperandDescriptors,
                index: 100,
                len: 16,
            }
        );
    }

    #[test]
    fn flow_control_never_reads_descriptors() {
        // num_instructions overlaps the descriptor id field
        let raw = (0x28 << 26) | (1 << 25) | (1 << 24) | (0x20 << 10) | 0x7f;
        let text = Disassembler::new()
            .disassemble(Instruction::new(raw), &[])
            .unwrap();
        assert_eq!(text, "IFC    cc.x || cc.y  0x0080 (127)");
    }

    #[test]
    fn other_opcodes_render_name_only() {
        let disasm = Disassembler::new();
        assert_eq!(disasm.disassemble(Instruction::new(0x22 << 26), &[]).unwrap(), "END");
        assert_eq!(disasm.disassemble(Instruction::new(0x3a << 26), &[]).unwrap(), "MAD");
        assert_eq!(disasm.disassemble(Instruction::new(0x10 << 26), &[]).unwrap(), "UNK");
    }

    #[test]
    fn loop_uses_integer_uniform() {
        let raw = (0x29 << 26) | (2 << 22) | (0x04 << 10) | 5;
        let text = Disassembler::new()
            .disassemble(Instruction::new(raw), &[])
            .unwrap();
        assert_eq!(text, "LOOP   i2  0x0010 (5)");
    }

    fn flow(opcode: u32, fields: u32) -> String {
        Disassembler::new()
            .disassemble(Instruction::new((opcode << 26) | fields), &[])
            .unwrap()
    }

    #[test]
    fn names_never_touch_operands() {
        let disasm = Disassembler::new();
        for (opcode, info) in disasm.opcodes().iter() {
            let instr = Instruction::new(u32::from(opcode) << 26);
            let text = disasm.disassemble(instr, &[xyzw()]).unwrap();
            let rest = &text[info.name.len()..];
            assert!(
                text.starts_with(info.name) && (rest.is_empty() || rest.starts_with(' ')),
                "{text:?} runs {} into its operands",
                info.name
            );
        }
        assert_eq!(flow(0x23, (3 << 22) | (1 << 24)), "BREAKC cc.y");
    }

    #[test]
    fn conditional_forms() {
        // and, y negated
        assert_eq!(
            flow(0x25, (1 << 22) | (1 << 25) | (0x10 << 10) | 4),
            "CALLC  cc.x && !cc.y  0x0040 (4)"
        );
        // just x, negated
        assert_eq!(flow(0x2c, (2 << 22) | (3 << 10)), "JMPC   !cc.x  0x000c");
        // or, both negated
        assert_eq!(flow(0x23, 0), "BREAKC !cc.x || !cc.y");
        // just y
        assert_eq!(flow(0x23, (3 << 22) | (1 << 24)), "BREAKC cc.y");
    }

    #[test]
    fn uniform_forms() {
        assert_eq!(flow(0x26, (9 << 22) | (5 << 10) | 2), "CALLU  b9  0x0014 (2)");
        assert_eq!(flow(0x27, (8 << 10) | 3), "IFU    b0  0x0020 (3)");
        assert_eq!(flow(0x2d, (15 << 22) | (0xfff << 10)), "JMPU   b15  0x3ffc");
    }

    #[test]
    fn call_renders_target_and_count() {
        assert_eq!(flow(0x24, (0x100 << 10) | 16), "CALL   0x0400 (16)");
    }
}
