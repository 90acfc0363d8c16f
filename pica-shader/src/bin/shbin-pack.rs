use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::EnvFilter;

use pica_shader::container::{ShaderBinary, ShaderType};

/// Packs raw program words and operand descriptors into a shader container.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File of little endian program words.
    #[arg(long)]
    code: PathBuf,

    /// File of little endian operand descriptor words.
    #[arg(long)]
    swizzles: PathBuf,

    /// Entry point, in instruction words.
    #[arg(long, default_value_t = 0)]
    main: u32,

    /// Mark the program as a geometry shader.
    #[arg(long)]
    geometry: bool,

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

    let code = read_words(&args.code)?;
    let swizzles = read_words(&args.swizzles)?;
    if args.main as usize >= code.len() {
        tracing::warn!(main = args.main, len = code.len(), "entry point lies past the program");
    }

    let mut binary = ShaderBinary::new(code, swizzles, args.main);
    if args.geometry {
        binary.shader_type = ShaderType::Geometry;
    }

    let mut output = open_output(args.output.as_str())?;
    output.write_all(&binary.to_bytes()?)?;
    output.flush()?;

    Ok(())
}

fn read_words(path: &Path) -> Result<Vec<u32>> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let chunks = bytes.chunks_exact(4);
    if !chunks.remainder().is_empty() {
        tracing::warn!(
            path = %path.display(),
            trailing = chunks.remainder().len(),
            "ignoring trailing bytes"
        );
    }
    Ok(chunks
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

fn open_output(output: &str) -> io::Result<Box<dyn Write>> {
    if output == "-" {
        return Ok(Box::new(io::stdout().lock()));
    }
    Ok(Box::new(io::BufWriter::new(fs::File::create(output)?)))
}
