//! WebGPU rendering module
//!
//! Uses SDF (Signed Distance Fields) for all rendering in the fragment shader.
//! Shape packing is plain data and runs (and is tested) on every target.

pub mod sdf_pipeline;
pub mod shapes;

pub use sdf_pipeline::SdfRenderState;
pub use shapes::{ShapeData, pack_shapes};
