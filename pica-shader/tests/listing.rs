use pica_shader::container::{self, ShaderType};
use pica_shader::instruction::ArithmeticBuilder;
use pica_shader::register::AddressRegister;
use pica_shader::swizzle::Component::{W, X, Y, Z};
use pica_shader::{Disassembler, Error, ProgramModel, SwizzlePattern, Table};

const END: u32 = 0x22 << 26;

fn program() -> (Vec<u32>, Vec<u32>) {
    let swizzles = vec![
        SwizzlePattern::new(0b1111, [X, Y, Z, W], false, [X, Y, Z, W], false).raw(),
        SwizzlePattern::new(0b1110, [X, Y, Z, X], true, [Y, Y, Z, W], false).raw(),
    ];
    let code = vec![
        // MOV o0.xyzw, v0.xyzw
        ArithmeticBuilder::new(0x13).dest(0x00).src1(0x00).build().raw(),
        // ADD r0.xyz, -v0.xyzx, v1.yyzw
        ArithmeticBuilder::new(0x00)
            .dest(0x10)
            .src1(0x00)
            .src2(0x01)
            .operand_desc_id(1)
            .build()
            .raw(),
        // DP4 o1.xyzw, c4[aL].xyzw, r0.xyzw
        ArithmeticBuilder::new(0x02)
            .dest(0x01)
            .src1(0x24)
            .address_register(AddressRegister::LoopCounter)
            .src2(0x10)
            .build()
            .raw(),
        END,
    ];
    (code, swizzles)
}

#[test]
fn container_round_trip_feeds_listing() {
    let (code, swizzles) = program();
    let bytes = container::encode(&code, &swizzles, 1).unwrap();
    let binary = container::decode(&bytes).unwrap();
    assert_eq!(binary.code, code);
    assert_eq!(binary.swizzle_patterns, swizzles);
    assert_eq!(binary.main_offset, 1);
    assert_eq!(binary.shader_type, ShaderType::Vertex);

    let mut model = ProgramModel::new();
    model.rebuild(&binary.code, &binary.swizzle_patterns, binary.main_offset);

    let disasm = Disassembler::new();
    let rows: Vec<String> = (0..model.count())
        .map(|offset| model.info().row(offset, &disasm).unwrap().to_string())
        .collect();

    assert_eq!(
        rows,
        [
            "0000      4c000000  MOV    o0.xyzw  v0.xyzw",
            "main      02000081  ADD    r0.xyz  -v0.xyzx  v1.yyzw",
            "0008      083a4800  DP4    o1.xyzw  c4[aL].xyzw  r0.xyzw",
            "000c      88000000  END",
        ]
    );
}

#[test]
fn disassembly_is_deterministic() {
    let (code, swizzles) = program();
    let patterns: Vec<SwizzlePattern> = swizzles.into_iter().map(SwizzlePattern::from).collect();
    let disasm = Disassembler::new();
    for word in code {
        let first = disasm.disassemble(word.into(), &patterns);
        let second = disasm.disassemble(word.into(), &patterns);
        assert_eq!(first, second);
    }
}

#[test]
fn descriptor_past_table_end_is_out_of_range() {
    let (code, swizzles) = program();
    let mut model = ProgramModel::new();
    // drop the descriptor the ADD refers to
    model.rebuild(&code, &swizzles[..1], 0);

    let disasm = Disassembler::new();
    assert_eq!(
        model.info().disassemble(1, &disasm),
        Err(Error::OutOfRange {
            table: Table::OperandDescriptors,
            index: 1,
            len: 1,
        })
    );
    assert!(model.info().disassemble(0, &disasm).is_ok());
    assert!(matches!(
        model.info().disassemble(4, &disasm),
        Err(Error::OutOfRange {
            table: Table::Instructions,
            ..
        })
    ));
}

#[test]
fn corrupt_containers_are_rejected() {
    let (code, swizzles) = program();
    let bytes = container::encode(&code, &swizzles, 0).unwrap();

    let mut flipped = bytes.clone();
    flipped[40] = b'X';
    assert!(matches!(
        container::decode(&flipped),
        Err(Error::MalformedContainer(_))
    ));

    assert!(matches!(
        container::decode(&bytes[..bytes.len() - 8]),
        Err(Error::MalformedContainer(_))
    ));
}
