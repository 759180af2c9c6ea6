use std::num::NonZeroU64;

use super::buffer::UniformBuffer;
use super::transport::WgpuTransport;

/// Bind-group helpers for exposing the uniform block at a fixed slot.
impl UniformBuffer<WgpuTransport> {
    /// Layout entry for a uniform binding sized to the whole block.
    pub fn layout_entry(
        &self,
        binding: u32,
        visibility: wgpu::ShaderStages,
    ) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(self.total_size()),
            },
            count: None,
        }
    }

    /// Bind-group entry binding the entire buffer at `binding`.
    pub fn bind_group_entry(&self, binding: u32) -> wgpu::BindGroupEntry<'_> {
        wgpu::BindGroupEntry {
            binding,
            resource: self.buffer().as_entire_binding(),
        }
    }
}
