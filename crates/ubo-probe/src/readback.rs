use anyhow::{Context, Result};
use ubo_engine::device::GpuContext;
use ubo_engine::{UniformBuffer, WgpuTransport};

use crate::shader::{OUTPUT_BINDING, UNIFORM_BINDING};

/// Compute pipeline that dumps the uniform block into a readable buffer.
pub struct Probe {
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    output: wgpu::Buffer,
    readback: wgpu::Buffer,
    size: u64,
}

impl Probe {
    pub fn new(
        gpu: &GpuContext,
        uniforms: &UniformBuffer<WgpuTransport>,
        source: &str,
        slots: usize,
    ) -> Result<Self> {
        anyhow::ensure!(slots > 0, "probe needs at least one uniform component");
        let device = gpu.device();
        let size = (slots * std::mem::size_of::<u32>()) as u64;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ubo probe shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ubo probe bgl"),
            entries: &[
                uniforms.layout_entry(UNIFORM_BINDING, wgpu::ShaderStages::COMPUTE),
                wgpu::BindGroupLayoutEntry {
                    binding: OUTPUT_BINDING,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ubo probe pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("ubo probe pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let output = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ubo probe output"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ubo probe readback"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ubo probe bind group"),
            layout: &bind_group_layout,
            entries: &[
                uniforms.bind_group_entry(UNIFORM_BINDING),
                wgpu::BindGroupEntry {
                    binding: OUTPUT_BINDING,
                    resource: output.as_entire_binding(),
                },
            ],
        });

        Ok(Self { pipeline, bind_group, output, readback, size })
    }

    /// Dispatches the probe and returns the copied component bits.
    ///
    /// Uniform writes issued before this call are visible to the dispatch.
    pub async fn run(&self, gpu: &GpuContext) -> Result<Vec<u32>> {
        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("ubo probe encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("ubo probe pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.dispatch_workgroups(1, 1, 1);
        }
        encoder.copy_buffer_to_buffer(&self.output, 0, &self.readback, 0, self.size);
        gpu.submit(std::iter::once(encoder.finish()));

        let slice = self.readback.slice(..);
        let (tx, rx) = futures::channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            if tx.send(result).is_err() {
                log::error!("probe readback result dropped before delivery");
            }
        });
        gpu.device()
            .poll(wgpu::PollType::wait_indefinitely())
            .context("device poll failed during probe readback")?;
        rx.await
            .context("probe readback callback was cancelled")?
            .context("failed to map probe readback buffer")?;

        let bits = {
            let data = slice.get_mapped_range();
            data.chunks_exact(4).map(bytemuck::pod_read_unaligned::<u32>).collect::<Vec<_>>()
        };
        self.readback.unmap();

        Ok(bits)
    }
}
