use std::future::Future;

use anyhow::{Context, Result};

/// Device operations a [`UniformBuffer`](super::UniformBuffer) needs.
///
/// Implemented for wgpu by [`WgpuTransport`]. The queued path uses
/// `create_uniform_buffer` + `queue_write`; the staged path additionally uses
/// the map/write/unmap/copy sequence, always in that order.
pub trait UniformTransport {
    /// Device-resident uniform buffer (usable as binding and copy target).
    type Buffer;

    /// Host-writable staging buffer (map-for-write + copy source).
    type Staging;

    fn create_uniform_buffer(&self, label: &str, size: u64) -> Self::Buffer;

    /// Queues a raw byte write at `offset`. Visible to later submissions.
    fn queue_write(&self, buffer: &Self::Buffer, offset: u64, bytes: &[u8]);

    fn create_staging(&self, label: &str, size: u64) -> Self::Staging;

    /// Maps the whole staging buffer for writing.
    ///
    /// Resolves once the region may be written.
    fn map_staging(&self, staging: &Self::Staging) -> impl Future<Output = Result<()>>;

    /// Writes into a mapped staging buffer.
    fn write_staging(&self, staging: &Self::Staging, offset: u64, bytes: &[u8]);

    fn unmap_staging(&self, staging: &Self::Staging);

    /// Submits a copy of `size` bytes from an unmapped staging buffer into `dst`.
    fn copy_staging(&self, staging: &Self::Staging, dst: &Self::Buffer, size: u64);
}

// ── wgpu ──────────────────────────────────────────────────────────────────

/// [`UniformTransport`] over a wgpu device/queue pair.
///
/// Both handles are reference counted by wgpu, so cloning is cheap.
#[derive(Debug, Clone)]
pub struct WgpuTransport {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl WgpuTransport {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

impl UniformTransport for WgpuTransport {
    type Buffer = wgpu::Buffer;
    type Staging = wgpu::Buffer;

    fn create_uniform_buffer(&self, label: &str, size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn queue_write(&self, buffer: &wgpu::Buffer, offset: u64, bytes: &[u8]) {
        self.queue.write_buffer(buffer, offset, bytes);
    }

    fn create_staging(&self, label: &str, size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::MAP_WRITE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        })
    }

    async fn map_staging(&self, staging: &wgpu::Buffer) -> Result<()> {
        let (tx, rx) = futures::channel::oneshot::channel();
        staging.slice(..).map_async(wgpu::MapMode::Write, move |result| {
            if tx.send(result).is_err() {
                log::error!("staging map result dropped before delivery");
            }
        });

        // Native backends only run map callbacks while the device is polled.
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .context("device poll failed while mapping staging buffer")?;

        rx.await
            .context("staging map callback was cancelled")?
            .context("failed to map staging buffer for writing")
    }

    fn write_staging(&self, staging: &wgpu::Buffer, offset: u64, bytes: &[u8]) {
        let end = offset + bytes.len() as u64;
        let mut view = staging.slice(offset..end).get_mapped_range_mut();
        view.copy_from_slice(bytes);
    }

    fn unmap_staging(&self, staging: &wgpu::Buffer) {
        staging.unmap();
    }

    fn copy_staging(&self, staging: &wgpu::Buffer, dst: &wgpu::Buffer, size: u64) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("ubo staging copy"),
            });
        encoder.copy_buffer_to_buffer(staging, 0, dst, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

// ── recording (tests) ─────────────────────────────────────────────────────
