//! GPU side of the uniform-layout engine.
//!
//! Pairs a [`StructLayout`](ubo_layout::StructLayout) with a wgpu buffer of the
//! same size and keeps host writes at the layout's offsets. The matching WGSL
//! declaration comes from [`ubo_layout::emit_struct`].
//!
//! ```no_run
//! use ubo_engine::device::{GpuContext, GpuInit};
//! use ubo_engine::layout::StructSpec;
//!
//! # fn main() -> anyhow::Result<()> {
//! let gpu = GpuContext::new_blocking(GpuInit::default())?;
//! let layout = StructSpec::new()
//!     .field("resolution", "vec2<f32>")
//!     .field("time", "f32")
//!     .build()?;
//!
//! let mut uniforms = gpu.create_uniforms(layout, "frame uniforms");
//! uniforms.set_field("resolution", &[1280.0f32, 720.0])?;
//! uniforms.set_field("time", &[0.016f32])?;
//! # Ok(())
//! # }
//! ```

pub mod device;
pub mod logging;
pub mod uniform;

/// Layout types re-exported for convenience.
pub use ubo_layout as layout;

pub use uniform::{FieldWrite, StagedUpload, UniformBuffer, UniformError, UniformTransport, WgpuTransport};
