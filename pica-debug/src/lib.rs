//! Debugging aids for the PICA GPU: register write tracing, geometry capture and dump files.

pub mod dump;
pub mod geometry;
pub mod trace;

pub use dump::{DumpConfig, Dumper};
pub use geometry::{GeometryDumper, TriangleTopology};
pub use trace::{PicaTrace, RegisterWriteObserver, TraceError, TraceRecorder, Write};
