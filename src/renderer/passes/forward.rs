//! 前向渲染通道
//!
//! 每帧两步：`prepare` 遍历场景，做视锥剔除、排序并上传 uniforms；
//! `draw` 按命令列表录制一个 render pass。遮罩通道和基础通道复用同
//! 一个实例，遮罩帧先 prepare + draw + submit，材质恢复后再来一遍。

use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};
use uuid::Uuid;

use crate::define_gpu_data_struct;
use crate::renderer::dynamic_buffer::{DynamicBuffer, ObjectUniforms};
use crate::renderer::frustum::Frustum;
use crate::renderer::pipeline::{PipelineCache, PipelineFlags, PipelineKey};
use crate::renderer::resource_manager::ResourceManager;
use crate::scene::camera::Camera;
use crate::scene::light::LightKind;
use crate::scene::Scene;

/// Uniform slot count for point lights; extras are dropped with a warning.
pub const MAX_POINT_LIGHTS: usize = 4;

define_gpu_data_struct!(
    /// 单个点光源，布局与 WGSL 端 `PointLight` 一致。
    pub struct PointLightUniform {
        /// xyz = world position, w = range (0 disables the cutoff)
        pub position: Vec4,
        /// rgb = color, w = intensity
        pub color: Vec4,
    }
);

define_gpu_data_struct!(
    /// Frame-global uniforms bound at group 0.
    pub struct GlobalUniforms {
        pub view_projection: Mat4,
        pub camera_position: Vec4,
        /// rgb = accumulated ambient color, w unused
        pub ambient_color: Vec4,
        /// x = active point light count
        pub counts: [u32; 4],
        pub point_lights: [PointLightUniform; MAX_POINT_LIGHTS],
    }
);

/// 一次绘制调用所需的全部句柄，在 `prepare` 里收集。
struct DrawCommand {
    pipeline: Arc<wgpu::RenderPipeline>,
    material_uuid: Uuid,
    position_id: u64,
    normal_id: u64,
    uv_id: u64,
    /// (attribute id, format, count)
    index: Option<(u64, wgpu::IndexFormat, u32)>,
    vertex_count: u32,
    object_index: usize,

    // 排序键
    render_order: i32,
    transparent: bool,
    distance_sq: f32,
}

pub struct ForwardPass {
    global_layout: wgpu::BindGroupLayout,
    global_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,

    objects: DynamicBuffer,
    pipelines: PipelineCache,

    commands: Vec<DrawCommand>,
    object_data: Vec<ObjectUniforms>,
}

impl ForwardPass {
    pub fn new(
        device: &wgpu::Device,
        depth_format: wgpu::TextureFormat,
        material_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let global_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Global Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let global_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Global Uniforms"),
            size: std::mem::size_of::<GlobalUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Global BindGroup"),
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_buffer.as_entire_binding(),
            }],
        });

        let objects = DynamicBuffer::new(device, "Object Uniforms");
        let pipelines = PipelineCache::new(
            device,
            depth_format,
            &global_layout,
            material_layout,
            objects.layout(),
        );

        Self {
            global_layout,
            global_buffer,
            global_bind_group,
            objects,
            pipelines,
            commands: Vec::new(),
            object_data: Vec::new(),
        }
    }

    #[must_use]
    pub fn global_layout(&self) -> &wgpu::BindGroupLayout {
        &self.global_layout
    }

    /// Number of draw commands collected by the last `prepare`.
    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.commands.len()
    }

    /// Culls, sorts, and uploads everything the next `draw` call needs.
    ///
    /// Reads the material assignments as they are *right now*, so the mask
    /// pass simply swaps assignments before calling this.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        resources: &mut ResourceManager,
        scene: &mut Scene,
        camera: &Camera,
    ) {
        self.commands.clear();
        self.object_data.clear();

        self.upload_globals(queue, scene, camera);

        let frustum = Frustum::from_view_projection(camera.view_projection_matrix());
        let camera_position = camera.position();

        for (_, node) in &scene.nodes {
            if !node.visible {
                continue;
            }
            let Some(mesh_key) = node.mesh else {
                continue;
            };
            let Some(mesh) = scene.meshes.get(mesh_key) else {
                continue;
            };
            if !mesh.visible {
                continue;
            }
            let Some(geometry) = scene.geometries.get(mesh.geometry) else {
                continue;
            };
            let Some(material) = scene.materials.get_mut(mesh.material) else {
                continue;
            };

            let world = node.transform.world_matrix;

            if let Some(sphere) = geometry.bounding_sphere() {
                let world_sphere = sphere.transform(&world);
                if !frustum.intersects_sphere(world_sphere.center, world_sphere.radius) {
                    continue;
                }
            }

            // 三个平面属性缺一不可，管线的顶点布局是固定的
            let (Some(position), Some(normal), Some(uv)) = (
                geometry.get_attribute("position"),
                geometry.get_attribute("normal"),
                geometry.get_attribute("uv"),
            ) else {
                log::warn!("mesh {:?} is missing position/normal/uv, skipped", mesh.name);
                continue;
            };

            resources.prepare_attribute(device, queue, position, wgpu::BufferUsages::VERTEX);
            resources.prepare_attribute(device, queue, normal, wgpu::BufferUsages::VERTEX);
            resources.prepare_attribute(device, queue, uv, wgpu::BufferUsages::VERTEX);

            let index = geometry.index_attribute().map(|attr| {
                resources.prepare_attribute(device, queue, attr, wgpu::BufferUsages::INDEX);
                let format = match attr.format {
                    wgpu::VertexFormat::Uint32 => wgpu::IndexFormat::Uint32,
                    _ => wgpu::IndexFormat::Uint16,
                };
                (attr.id, format, attr.count)
            });

            resources.prepare_material(device, queue, material, &scene.textures);

            let key = PipelineKey::for_material(material);
            let pipeline = self.pipelines.get_or_create(device, key);

            let object_index = self.object_data.len();
            self.object_data
                .push(ObjectUniforms::new(Mat4::from(world)));

            let world_pos: Vec3 = world.translation.into();
            self.commands.push(DrawCommand {
                pipeline,
                material_uuid: material.uuid,
                position_id: position.id,
                normal_id: normal.id,
                uv_id: uv.id,
                index,
                vertex_count: position.count,
                object_index,
                render_order: mesh.render_order,
                transparent: key.flags.contains(PipelineFlags::TRANSPARENT),
                distance_sq: camera_position.distance_squared(world_pos),
            });
        }

        // 不透明：render_order → 由近到远 (early-z)
        // 透明：  render_order → 由远到近 (混合正确性)
        self.commands.sort_by(|a, b| {
            a.transparent
                .cmp(&b.transparent)
                .then(a.render_order.cmp(&b.render_order))
                .then_with(|| {
                    if a.transparent {
                        b.distance_sq.total_cmp(&a.distance_sq)
                    } else {
                        a.distance_sq.total_cmp(&b.distance_sq)
                    }
                })
        });

        self.objects.write(device, queue, &self.object_data);
    }

    fn upload_globals(&self, queue: &wgpu::Queue, scene: &Scene, camera: &Camera) {
        let mut globals = GlobalUniforms {
            view_projection: camera.view_projection_matrix(),
            camera_position: camera.position().extend(1.0),
            ..Default::default()
        };

        let mut ambient = Vec3::ZERO;
        let mut point_count = 0usize;

        for (light, world) in scene.iter_active_lights() {
            match &light.kind {
                LightKind::Ambient => {
                    ambient += light.color * light.intensity;
                }
                LightKind::Point(point) => {
                    if point_count >= MAX_POINT_LIGHTS {
                        log::warn!("more than {MAX_POINT_LIGHTS} point lights, extras ignored");
                        continue;
                    }
                    let position: Vec3 = world.translation.into();
                    globals.point_lights[point_count] = PointLightUniform {
                        position: position.extend(point.range),
                        color: light.color.extend(light.intensity),
                    };
                    point_count += 1;
                }
            }
        }

        globals.ambient_color = ambient.extend(0.0);
        globals.counts[0] = point_count as u32;

        queue.write_buffer(&self.global_buffer, 0, bytemuck::bytes_of(&globals));
    }

    /// Records one render pass drawing the prepared command list.
    pub fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        resources: &ResourceManager,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        clear_color: wgpu::Color,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Forward Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_bind_group(0, &self.global_bind_group, &[]);

        let mut bound_pipeline: *const wgpu::RenderPipeline = std::ptr::null();
        let mut bound_material: Option<Uuid> = None;

        for cmd in &self.commands {
            let (Some(position), Some(normal), Some(uv)) = (
                resources.attribute(cmd.position_id),
                resources.attribute(cmd.normal_id),
                resources.attribute(cmd.uv_id),
            ) else {
                continue;
            };
            let Some(material) = resources.material(cmd.material_uuid) else {
                continue;
            };

            if !std::ptr::eq(bound_pipeline, Arc::as_ptr(&cmd.pipeline)) {
                pass.set_pipeline(&cmd.pipeline);
                bound_pipeline = Arc::as_ptr(&cmd.pipeline);
            }
            if bound_material != Some(cmd.material_uuid) {
                pass.set_bind_group(1, &material.bind_group, &[]);
                bound_material = Some(cmd.material_uuid);
            }
            pass.set_bind_group(
                2,
                self.objects.bind_group(),
                &[self.objects.offset(cmd.object_index)],
            );

            pass.set_vertex_buffer(0, position.buffer.slice(..));
            pass.set_vertex_buffer(1, normal.buffer.slice(..));
            pass.set_vertex_buffer(2, uv.buffer.slice(..));

            match cmd.index {
                Some((id, format, count)) => {
                    let Some(index) = resources.attribute(id) else {
                        continue;
                    };
                    pass.set_index_buffer(index.buffer.slice(..), format);
                    pass.draw_indexed(0..count, 0, 0..1);
                }
                None => pass.draw(0..cmd.vertex_count, 0..1),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_uniforms_match_wgsl_layout() {
        // mat4 (64) + 3 × vec4 (48) + 4 点光源 × 32
        assert_eq!(std::mem::size_of::<GlobalUniforms>(), 64 + 48 + 128);
        assert_eq!(std::mem::size_of::<PointLightUniform>(), 32);
    }

    #[test]
    fn default_globals_are_dark() {
        let globals = GlobalUniforms::default();
        assert_eq!(globals.counts[0], 0);
        assert_eq!(globals.ambient_color, Vec4::ZERO);
    }
}
