//! Uniform buffer management.
//!
//! A [`UniformBuffer`] owns one device buffer sized from a
//! [`StructLayout`](ubo_layout::StructLayout) plus a host copy of its bytes.
//! Two upload paths are available:
//! - queued: [`UniformBuffer::set_field`] writes through the device queue
//! - staged: [`UniformBuffer::begin_staged`] maps a staging region, field
//!   writes fill it, and [`StagedUpload::commit`] copies it into place
//!
//! Device access goes through [`UniformTransport`] so the write path can be
//! exercised without a GPU.

mod binding;
mod buffer;
mod encode;
mod error;
mod staged;
mod transport;

pub use buffer::{FieldWrite, UniformBuffer};
pub use error::UniformError;
pub use staged::StagedUpload;
pub use transport::{UniformTransport, WgpuTransport};
