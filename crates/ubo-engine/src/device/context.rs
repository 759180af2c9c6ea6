use std::sync::Arc;

use anyhow::{Context, Result};
use ubo_layout::StructLayout;

use super::GpuInit;
use crate::uniform::{UniformBuffer, WgpuTransport};

/// Explicitly constructed device context.
///
/// Owns the adapter, device and queue. Callers create it once and pass it
/// to whatever builds uniform buffers and pipelines; nothing here is global.
pub struct GpuContext {
    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,
}

impl GpuContext {
    /// Acquires an adapter and device without a surface.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(init: GpuInit) -> Result<Self> {
        let GpuInit {
            backends,
            power_preference,
            force_fallback_adapter,
            required_features,
            required_limits,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("using adapter `{}` ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("ubo-engine device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        Ok(Self { adapter, device, queue })
    }

    /// Blocking variant of [`GpuContext::new`].
    pub fn new_blocking(init: GpuInit) -> Result<Self> {
        pollster::block_on(Self::new(init))
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Transport handle sharing this context's device and queue.
    pub fn transport(&self) -> WgpuTransport {
        WgpuTransport::new(self.device.clone(), self.queue.clone())
    }

    /// Allocates a uniform buffer sized to `layout`.
    pub fn create_uniforms(
        &self,
        layout: impl Into<Arc<StructLayout>>,
        label: &str,
    ) -> UniformBuffer<WgpuTransport> {
        UniformBuffer::new(self.transport(), layout, label)
    }

    /// Submits command buffers recorded by the caller.
    ///
    /// Queued uniform writes made before this call are visible to them.
    pub fn submit(&self, commands: impl IntoIterator<Item = wgpu::CommandBuffer>) {
        self.queue.submit(commands);
    }
}
