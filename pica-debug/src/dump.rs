//! Writes shader containers and geometry to disk for offline inspection.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use pica_shader::{container, ShaderBinary};

use crate::geometry::GeometryDumper;

/// Where and whether dumps are written.
///
/// Dumping is disabled by default.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DumpConfig {
    pub directory: PathBuf,
    pub enabled: bool,
}

impl DumpConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            enabled: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to write dump to {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode shader dump")]
    Encode(#[from] container::Error),
}

/// Numbers dumps of each kind from 1 upwards.
#[derive(Debug)]
pub struct Dumper {
    config: DumpConfig,
    shader_index: u32,
    geometry_index: u32,
}

impl Dumper {
    pub fn new(config: DumpConfig) -> Self {
        Self {
            config,
            shader_index: 0,
            geometry_index: 0,
        }
    }

    pub fn config(&self) -> &DumpConfig {
        &self.config
    }

    /// Writes `shader_dump{N}.shbin`. Returns the path written, or `None` when disabled.
    pub fn dump_shader(&mut self, binary: &ShaderBinary) -> Result<Option<PathBuf>, Error> {
        if !self.config.enabled {
            return Ok(None);
        }
        let bytes = binary.to_bytes()?;
        self.shader_index += 1;
        let path = self
            .config
            .directory
            .join(format!("shader_dump{}.shbin", self.shader_index));
        write_file(&path, |out| out.write_all(&bytes))?;
        tracing::info!(path = %path.display(), "dumped shader");
        Ok(Some(path))
    }

    /// Writes `geometry_dump{N}.obj`. Returns the path written, or `None` when disabled.
    pub fn dump_geometry(&mut self, geometry: &GeometryDumper) -> Result<Option<PathBuf>, Error> {
        if !self.config.enabled {
            return Ok(None);
        }
        self.geometry_index += 1;
        let path = self
            .config
            .directory
            .join(format!("geometry_dump{}.obj", self.geometry_index));
        write_file(&path, |out| geometry.emit_obj(out))?;
        tracing::info!(path = %path.display(), "dumped geometry");
        Ok(Some(path))
    }
}

fn write_file<F>(path: &Path, contents: F) -> Result<(), Error>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let wrap = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(wrap)?);
    contents(&mut writer).map_err(wrap)?;
    writer.flush().map_err(wrap)
}
