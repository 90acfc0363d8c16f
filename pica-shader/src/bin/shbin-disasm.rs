use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Read, Write};
use std::ops::Deref;
use tracing_subscriber::filter::EnvFilter;

use pica_shader::{container, Disassembler, ProgramInfo};

/// Prints a listing of the first program in a shader container, one row per instruction:
/// offset (or label), raw word and disassembly.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input file or '-' to use stdin.
    #[arg(short, long, default_value_t = String::from("-"))]
    input: String,

    /// Output file or '-' to use stdout.
    #[arg(short, long, default_value_t = String::from("-"))]
    output: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("PICA_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let input = open_input(args.input.as_str())
        .with_context(|| format!("failed to read {}", args.input))?;
    let mut output = open_output(args.output.as_str())?;

    let binary = container::decode(&input)?;
    tracing::info!(
        instructions = binary.code.len(),
        descriptors = binary.swizzle_patterns.len(),
        main_offset = binary.main_offset,
        shader_type = ?binary.shader_type,
        "decoded shader container"
    );

    let info = ProgramInfo::new(
        binary.code.iter().copied(),
        binary.swizzle_patterns.iter().copied(),
        binary.main_offset,
    );
    let disasm = Disassembler::new();
    for offset in 0..info.len() {
        match info.row(offset, &disasm) {
            Ok(row) => writeln!(output, "{row}")?,
            Err(err) => {
                tracing::warn!(offset, error = %err, "failed to disassemble instruction");
                let raw = info.instruction_at(offset)?.raw();
                writeln!(output, "{:<8}  {raw:08x}  <{err}>", format!("{:04x}", 4 * offset))?;
            }
        }
    }
    output.flush()?;

    Ok(())
}

enum Input {
    Buffered(Vec<u8>),
    Mapped(memmap::Mmap),
}

impl Deref for Input {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Buffered(bytes) => bytes,
            Self::Mapped(map) => map,
        }
    }
}

fn open_input(input: &str) -> io::Result<Input> {
    if input == "-" {
        let mut bytes = Vec::new();
        io::stdin().lock().read_to_end(&mut bytes)?;
        return Ok(Input::Buffered(bytes));
    }
    let file = fs::File::open(input)?;
    // SAFETY: the container is only read while the map is alive and is not expected to be
    // modified concurrently.
    let map = unsafe { memmap::Mmap::map(&file)? };
    Ok(Input::Mapped(map))
}

fn open_output(output: &str) -> io::Result<Box<dyn Write>> {
    if output == "-" {
        return Ok(Box::new(io::stdout().lock()));
    }
    Ok(Box::new(io::BufWriter::new(fs::File::create(output)?)))
}
