//! Collects assembled triangles so they can be inspected as a Wavefront OBJ mesh.

use std::io::{self, Write};

/// Primitive topology as configured in the GPU registers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TriangleTopology {
    List,
    Strip,
    Fan,
    ListIndexed,
}

impl TryFrom<u32> for TriangleTopology {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::List),
            1 => Ok(Self::Strip),
            2 => Ok(Self::Fan),
            3 => Ok(Self::ListIndexed),
            n => Err(Error::UnsupportedTopology(n)),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("unsupported triangle topology: {0:#x}")]
    UnsupportedTopology(u32),
}

/// Indices into the vertex list, zero based.
pub type Face = [usize; 3];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryDumper {
    vertices: Vec<[f32; 3]>,
    faces: Vec<Face>,
}

impl GeometryDumper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn add_vertex(&mut self, pos: [f32; 3], topology: TriangleTopology) {
        self.vertices.push(pos);
        let n = self.vertices.len();

        match topology {
            TriangleTopology::List | TriangleTopology::ListIndexed => {
                if n % 3 == 0 {
                    self.faces.push([n - 3, n - 2, n - 1]);
                }
            }
            TriangleTopology::Strip => {
                if n >= 3 {
                    // odd triangles are flipped
                    if (n - 3) % 2 == 0 {
                        self.faces.push([n - 3, n - 2, n - 1]);
                    } else {
                        self.faces.push([n - 2, n - 3, n - 1]);
                    }
                }
            }
            TriangleTopology::Fan => {
                if n >= 3 {
                    self.faces.push([0, n - 2, n - 1]);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.faces.clear();
    }

    /// Writes the mesh as OBJ text. Face indices are one based.
    pub fn emit_obj<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for [x, y, z] in &self.vertices {
            writeln!(out, "v {x} {y} {z}")?;
        }
        for [a, b, c] in &self.faces {
            writeln!(out, "f {} {} {}", a + 1, b + 1, c + 1)?;
        }
        Ok(())
    }
}
