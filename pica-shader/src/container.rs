//! Shader binary containers (`DVLB`/`DVLP`/`DVLE`).
//!
//! # Layout
//!
//! ```text
//! | DVLB header | DVLE offset table | DVLP header | DVLE header | code words | descriptors |
//! ```
//!
//! All fields are little endian. The DVLP header locates the code and the operand descriptor
//! table relative to its own start, while the DVLB offset table stores absolute DVLE offsets.
//! Operand descriptors are stored with an 8-byte stride: the descriptor word followed by four
//! reserved bytes.

use std::mem::size_of;

pub const DVLB_MAGIC: u32 = u32::from_le_bytes(*b"DVLB");
pub const DVLP_MAGIC: u32 = u32::from_le_bytes(*b"DVLP");
pub const DVLE_MAGIC: u32 = u32::from_le_bytes(*b"DVLE");

pub const DVLB_HEADER_SIZE: usize = 0x08;
pub const DVLP_HEADER_SIZE: usize = 0x1c;
pub const DVLE_HEADER_SIZE: usize = 0x40;
pub const DESCRIPTOR_STRIDE: usize = 8;

/// Pipeline stage a program is written for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum ShaderType {
    #[default]
    Vertex,
    Geometry,
    Unknown(u8),
}

impl ShaderType {
    fn parse(value: u8) -> Self {
        match value {
            0 => Self::Vertex,
            1 => Self::Geometry,
            n => Self::Unknown(n),
        }
    }

    fn emit(&self) -> u8 {
        match self {
            Self::Vertex => 0,
            Self::Geometry => 1,
            Self::Unknown(n) => *n,
        }
    }
}

/// A shader program as stored in a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ShaderBinary {
    pub code: Vec<u32>,
    pub swizzle_patterns: Vec<u32>,
    /// Entry point, in instruction words.
    pub main_offset: u32,
    pub shader_type: ShaderType,
}

impl ShaderBinary {
    pub fn new(code: Vec<u32>, swizzle_patterns: Vec<u32>, main_offset: u32) -> Self {
        Self {
            code,
            swizzle_patterns,
            main_offset,
            shader_type: ShaderType::Vertex,
        }
    }

    /// Parses the first program of a container.
    ///
    /// Every magic word is checked before any offset read from the headers is used, and every
    /// declared offset, size and count is bounded by `bytes.len()`.
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        region(bytes, "DVLB header", 0, DVLB_HEADER_SIZE)?;
        expect_magic(bytes, 0, Header::Dvlb, DVLB_MAGIC)?;
        let num_programs = read_le32(bytes, 4)? as usize;
        if num_programs == 0 {
            return Err(Error::NoPrograms);
        }
        let table_size = num_programs.saturating_mul(size_of::<u32>());
        region(bytes, "DVLE offset table", DVLB_HEADER_SIZE, table_size)?;

        let dvlp = DVLB_HEADER_SIZE + table_size;
        region(bytes, "DVLP header", dvlp, DVLP_HEADER_SIZE)?;
        expect_magic(bytes, dvlp, Header::Dvlp, DVLP_MAGIC)?;

        let dvle = read_le32(bytes, DVLB_HEADER_SIZE)? as usize;
        region(bytes, "DVLE header", dvle, DVLE_HEADER_SIZE)?;
        expect_magic(bytes, dvle, Header::Dvle, DVLE_MAGIC)?;

        let binary_offset = read_le32(bytes, dvlp + 0x08)? as usize;
        let binary_size_words = read_le32(bytes, dvlp + 0x0c)? as usize;
        let aux_offset = read_le32(bytes, dvlp + 0x10)? as usize;
        let aux_count = read_le32(bytes, dvlp + 0x14)? as usize;

        let shader_type = ShaderType::parse(read_u8(bytes, dvle + 0x06)?);
        let main_offset = read_le32(bytes, dvle + 0x08)?;

        let code = region(
            bytes,
            "code",
            dvlp.saturating_add(binary_offset),
            binary_size_words.saturating_mul(size_of::<u32>()),
        )?
        .chunks_exact(size_of::<u32>())
        .map(le32)
        .collect();

        let swizzle_patterns = region(
            bytes,
            "operand descriptor table",
            dvlp.saturating_add(aux_offset),
            aux_count.saturating_mul(DESCRIPTOR_STRIDE),
        )?
        .chunks_exact(DESCRIPTOR_STRIDE)
        .map(le32)
        .collect();

        Ok(Self {
            code,
            swizzle_patterns,
            main_offset,
            shader_type,
        })
    }

    /// Writes a single-program container into `buffer`.
    ///
    /// Header sizes and offsets are derived from the payload lengths. Fails without writing when
    /// a length does not fit a 32-bit header field.
    pub fn emit(&self, buffer: &mut Vec<u8>) -> Result<(), Error> {
        let layout = Layout::new(self.code.len(), self.swizzle_patterns.len())?;

        buffer.reserve(layout.total_size);

        // DVLB with a single DVLE entry
        emit_le32(buffer, DVLB_MAGIC);
        emit_le32(buffer, 1);
        emit_le32(buffer, layout.dvle_offset);

        // DVLP
        emit_le32(buffer, DVLP_MAGIC);
        emit_le32(buffer, 0); // version
        emit_le32(buffer, layout.binary_offset);
        emit_le32(buffer, layout.code_words);
        emit_le32(buffer, layout.aux_offset);
        emit_le32(buffer, layout.descriptors);
        emit_le32(buffer, 0);

        // DVLE
        emit_le32(buffer, DVLE_MAGIC);
        buffer.extend_from_slice(&[0, 0, self.shader_type.emit(), 0]);
        emit_le32(buffer, self.main_offset);
        emit_le32(buffer, layout.code_words);
        emit_le32(buffer, 0);
        emit_le32(buffer, 0);
        // constant, label, output register, uniform and symbol tables: (offset, size) pairs
        buffer.extend_from_slice(&[0u8; 10 * 4]);

        for word in &self.code {
            emit_le32(buffer, *word);
        }
        for pattern in &self.swizzle_patterns {
            emit_le32(buffer, *pattern);
            emit_le32(buffer, 0);
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut buffer = Vec::new();
        self.emit(&mut buffer)?;
        Ok(buffer)
    }
}

/// Header fields of a single-program container.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Layout {
    dvle_offset: u32,
    binary_offset: u32,
    code_words: u32,
    aux_offset: u32,
    descriptors: u32,
    total_size: usize,
}

impl Layout {
    fn new(code_words: usize, descriptors: usize) -> Result<Self, Error> {
        let too_large = |what, count| Error::TooLarge { what, count };
        let dvlp = DVLB_HEADER_SIZE + size_of::<u32>();
        let binary_offset = DVLP_HEADER_SIZE + DVLE_HEADER_SIZE;

        let aux_offset = code_words
            .checked_mul(size_of::<u32>())
            .and_then(|size| size.checked_add(binary_offset))
            .filter(|&offset| u32::try_from(offset).is_ok())
            .ok_or(too_large("code", code_words))?;
        // the descriptor table must end within reach of a 32-bit offset
        let total_size = descriptors
            .checked_mul(DESCRIPTOR_STRIDE)
            .and_then(|size| size.checked_add(aux_offset))
            .filter(|&end| u32::try_from(end).is_ok())
            .and_then(|end| end.checked_add(dvlp))
            .ok_or(too_large("operand descriptor table", descriptors))?;

        Ok(Self {
            dvle_offset: (dvlp + DVLP_HEADER_SIZE) as u32,
            binary_offset: binary_offset as u32,
            code_words: code_words as u32,
            aux_offset: aux_offset as u32,
            descriptors: descriptors as u32,
            total_size,
        })
    }
}

/// Encodes a vertex program container.
pub fn encode(
    code: &[u32],
    swizzle_patterns: &[u32],
    main_offset: u32,
) -> Result<Vec<u8>, Error> {
    ShaderBinary::new(code.to_vec(), swizzle_patterns.to_vec(), main_offset).to_bytes()
}

/// Decodes the first program of a container.
pub fn decode(bytes: &[u8]) -> Result<ShaderBinary, crate::Error> {
    ShaderBinary::parse(bytes).map_err(|err| {
        tracing::warn!(error = %err, len = bytes.len(), "rejected shader container");
        crate::Error::MalformedContainer(err)
    })
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Header {
    Dvlb,
    Dvlp,
    Dvle,
}

impl std::fmt::Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dvlb => write!(f, "DVLB"),
            Self::Dvlp => write!(f, "DVLP"),
            Self::Dvle => write!(f, "DVLE"),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("{header} header contains invalid magic {found:#010x}")]
    InvalidMagic { header: Header, found: u32 },

    #[error("{what} at {offset:#x} ({size:#x} bytes) exceeds container length {available:#x}")]
    OutOfBounds {
        what: &'static str,
        offset: usize,
        size: usize,
        available: usize,
    },

    #[error("container does not describe any programs")]
    NoPrograms,

    #[error("{what} with {count} entries does not fit a container")]
    TooLarge { what: &'static str, count: usize },
}

fn region<'b>(
    bytes: &'b [u8],
    what: &'static str,
    offset: usize,
    size: usize,
) -> Result<&'b [u8], Error> {
    offset
        .checked_add(size)
        .and_then(|end| bytes.get(offset..end))
        .ok_or(Error::OutOfBounds {
            what,
            offset,
            size,
            available: bytes.len(),
        })
}

fn expect_magic(bytes: &[u8], offset: usize, header: Header, magic: u32) -> Result<(), Error> {
    let found = read_le32(bytes, offset)?;
    if found != magic {
        return Err(Error::InvalidMagic { header, found });
    }
    Ok(())
}

macro_rules! generate_read_func {
    ($name:ident,$ty:ty) => {
        fn $name(bytes: &[u8], offset: usize) -> Result<$ty, Error> {
            let mut buffer = [0u8; size_of::<$ty>()];
            buffer.copy_from_slice(region(bytes, "field", offset, size_of::<$ty>())?);
            Ok(<$ty>::from_le_bytes(buffer))
        }
    };
}

generate_read_func!(read_u8, u8);
generate_read_func!(read_le32, u32);

/// Reads the leading word of a chunk at least four bytes long.
fn le32(chunk: &[u8]) -> u32 {
    let mut buffer = [0u8; 4];
    buffer.copy_from_slice(&chunk[..4]);
    u32::from_le_bytes(buffer)
}

fn emit_le32(buffer: &mut Vec<u8>, value: u32) {
    buffer.extend_from_slice(&value.to_le_bytes());
}
