//! Headless GPU device management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - handing out transports for uniform buffers
//! - submitting caller-recorded command buffers

mod context;
mod init;

pub use context::GpuContext;
pub use init::GpuInit;
