//! 管理动态 Uniform Buffer (Group 2)
//!
//! 职责：
//! 1. CPU 端：收集每一帧的 per-object uniforms
//! 2. GPU 端：容量不足时自动扩容并重建 BindGroup
//! 3. Binding：单个 BindGroup + dynamic offset，每个物体一个槽位

use glam::Mat4;

use crate::define_gpu_data_struct;

define_gpu_data_struct!(
    /// Per-object data bound at a dynamic offset.
    ///
    /// Padded to 256 bytes so the element stride satisfies the default
    /// `min_uniform_buffer_offset_alignment` on every backend.
    pub struct ObjectUniforms {
        pub model: Mat4,
        /// Inverse-transpose of `model`, for transforming normals.
        pub normal_matrix: Mat4,
        pub(crate) __pad: [f32; 32] = [0.0; 32],
    }
);

impl ObjectUniforms {
    /// Element stride in bytes, also the dynamic offset step.
    pub const STRIDE: u64 = std::mem::size_of::<Self>() as u64;

    #[must_use]
    pub fn new(model: Mat4) -> Self {
        Self {
            model,
            normal_matrix: model.inverse().transpose(),
            ..Default::default()
        }
    }
}

pub struct DynamicBuffer {
    label: &'static str,
    buffer: wgpu::Buffer,
    capacity: usize,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl DynamicBuffer {
    const INITIAL_CAPACITY: usize = 128;

    pub fn new(device: &wgpu::Device, label: &'static str) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(ObjectUniforms::STRIDE),
                },
                count: None,
            }],
        });

        let buffer = Self::create_buffer(device, label, Self::INITIAL_CAPACITY);
        let bind_group = Self::create_bind_group(device, label, &layout, &buffer);

        Self {
            label,
            buffer,
            capacity: Self::INITIAL_CAPACITY,
            layout,
            bind_group,
        }
    }

    /// 每一帧调用：上传数据，如果容量不足则自动扩容
    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[ObjectUniforms]) {
        if data.is_empty() {
            return;
        }

        if data.len() > self.capacity {
            let new_capacity = data.len().next_power_of_two();
            log::info!(
                "Recreating {} ({} -> {} slots)",
                self.label,
                self.capacity,
                new_capacity
            );
            self.capacity = new_capacity;
            self.buffer = Self::create_buffer(device, self.label, new_capacity);
            self.bind_group =
                Self::create_bind_group(device, self.label, &self.layout, &self.buffer);
        }

        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(data));
    }

    /// Dynamic offset of the `index`-th slot.
    #[must_use]
    pub fn offset(&self, index: usize) -> u32 {
        (index as u64 * ObjectUniforms::STRIDE) as u32
    }

    #[must_use]
    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    #[must_use]
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    fn create_buffer(device: &wgpu::Device, label: &str, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity as u64 * ObjectUniforms::STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                // 绑定单个元素大小，dynamic offset 负责选择槽位
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(ObjectUniforms::STRIDE),
                }),
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_is_offset_aligned() {
        assert_eq!(ObjectUniforms::STRIDE % 256, 0);
    }

    #[test]
    fn normal_matrix_undoes_nonuniform_scale() {
        let model = Mat4::from_scale(glam::Vec3::new(2.0, 1.0, 1.0));
        let uniforms = ObjectUniforms::new(model);
        // A normal along +X on a surface stretched in X must shrink in X.
        let n = uniforms.normal_matrix * glam::Vec4::new(1.0, 0.0, 0.0, 0.0);
        assert!((n.x - 0.5).abs() < 1e-6);
    }
}
