use core::ops::Range;
use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Affine3A, Vec3};
use rustc_hash::FxHashMap;
use uuid::Uuid;
use wgpu::{PrimitiveTopology, VertexFormat, VertexStepMode};

/// Attribute holds CPU-side vertex data plus layout metadata.
///
/// The renderer mirrors attributes into GPU buffers keyed by `id` and
/// re-uploads when `version` changes.
#[derive(Debug, Clone)]
pub struct Attribute {
    /// Stable identity for GPU-side caching
    pub id: u64,

    /// CPU-side data shared via Arc
    pub data: Arc<Vec<u8>>,

    /// Data version for change detection
    pub version: u64,

    pub format: VertexFormat,
    pub offset: u64,
    pub count: u32,
    pub stride: u64,
    pub step_mode: VertexStepMode,
}

static NEXT_ATTR_ID: AtomicU64 = AtomicU64::new(1);

impl Attribute {
    /// 创建 Planar (非交错) 属性
    pub fn new_planar<T: bytemuck::Pod>(data: &[T], format: VertexFormat) -> Self {
        let raw_data = bytemuck::cast_slice(data).to_vec();

        Self {
            id: NEXT_ATTR_ID.fetch_add(1, Ordering::Relaxed),
            data: Arc::new(raw_data),
            version: 1,
            format,
            offset: 0,
            count: u32::try_from(data.len()).unwrap_or(u32::MAX),
            stride: std::mem::size_of::<T>() as u64,
            step_mode: VertexStepMode::Vertex,
        }
    }

    /// 原地更新数据 (保留 id，复用显存)
    /// 使用 Arc::make_mut 实现 Copy-On-Write
    pub fn update_data<T: bytemuck::Pod>(&mut self, new_data: &[T]) {
        let vec = Arc::make_mut(&mut self.data);
        let bytes: &[u8] = bytemuck::cast_slice(new_data);

        if vec.len() != bytes.len() {
            vec.resize(bytes.len(), 0);
        }
        vec.copy_from_slice(bytes);

        self.count = u32::try_from(new_data.len()).unwrap_or(u32::MAX);
        self.version = self.version.wrapping_add(1);
    }

    pub fn read_vec3(&self, i: u32) -> Option<Vec3> {
        if self.format != VertexFormat::Float32x3 {
            return None;
        }
        let stride = self.stride as usize;
        let offset = self.offset as usize + (i as usize) * stride;

        let slice = self.data.as_ref();
        if offset + 12 <= slice.len() {
            let bytes: &[u8; 12] = slice[offset..offset + 12].try_into().ok()?;
            let vals: &[f32; 3] = bytemuck::cast_ref(bytes);
            return Some(Vec3::from_array(*vals));
        }
        None
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    #[must_use]
    pub fn transform(&self, matrix: &Affine3A) -> Self {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut new_min = Vec3::splat(f32::INFINITY);
        let mut new_max = Vec3::splat(f32::NEG_INFINITY);

        for point in corners {
            let transformed = matrix.transform_point3(point);
            new_min = new_min.min(transformed);
            new_max = new_max.max(transformed);
        }

        Self {
            min: new_min,
            max: new_max,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    /// World-space sphere under an affine transform.
    /// Radius scales by the largest axis scale.
    #[must_use]
    pub fn transform(&self, matrix: &Affine3A) -> Self {
        let center = matrix.transform_point3(self.center);
        let scale = matrix.matrix3.x_axis.length().max(
            matrix
                .matrix3
                .y_axis
                .length()
                .max(matrix.matrix3.z_axis.length()),
        );
        Self {
            center,
            radius: self.radius * scale,
        }
    }
}

/// CPU-side geometry: named planar attributes plus an optional index.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub uuid: Uuid,

    // vertex layout versioning
    layout_version: u64,
    data_version: u64,

    attributes: FxHashMap<String, Attribute>,
    index_attribute: Option<Attribute>,

    pub topology: PrimitiveTopology,
    pub draw_range: Range<u32>,

    pub bounding_box: RefCell<Option<BoundingBox>>,
    pub bounding_sphere: RefCell<Option<BoundingSphere>>,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new()
    }
}

impl Geometry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            layout_version: 0,
            data_version: 0,
            attributes: FxHashMap::default(),
            index_attribute: None,
            topology: PrimitiveTopology::TriangleList,
            draw_range: 0..u32::MAX,
            bounding_box: RefCell::new(None),
            bounding_sphere: RefCell::new(None),
        }
    }

    // Version accessors
    pub fn layout_version(&self) -> u64 {
        self.layout_version
    }

    pub fn data_version(&self) -> u64 {
        self.data_version
    }

    pub fn attributes(&self) -> &FxHashMap<String, Attribute> {
        &self.attributes
    }

    pub fn index_attribute(&self) -> Option<&Attribute> {
        self.index_attribute.as_ref()
    }

    pub fn set_attribute(&mut self, name: &str, attr: Attribute) {
        let layout_changed = if let Some(old) = self.attributes.get(name) {
            old.format != attr.format || old.step_mode != attr.step_mode
        } else {
            true
        };

        self.attributes.insert(name.to_string(), attr);

        if layout_changed {
            self.layout_version = self.layout_version.wrapping_add(1);
        }
        self.data_version = self.data_version.wrapping_add(1);
    }

    pub fn get_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Number of vertices, from the position attribute.
    #[must_use]
    pub fn vertex_count(&self) -> u32 {
        self.attributes.get("position").map_or(0, |a| a.count)
    }

    pub fn set_indices(&mut self, indices: &[u16]) {
        let raw_data = bytemuck::cast_slice(indices).to_vec();

        self.index_attribute = Some(Attribute {
            id: NEXT_ATTR_ID.fetch_add(1, Ordering::Relaxed),
            data: Arc::new(raw_data),
            version: 1,
            format: VertexFormat::Uint16,
            offset: 0,
            count: u32::try_from(indices.len()).unwrap_or(u32::MAX),
            stride: 2,
            step_mode: VertexStepMode::Vertex,
        });
        self.data_version = self.data_version.wrapping_add(1);
    }

    pub fn set_indices_u32(&mut self, indices: &[u32]) {
        let raw_data = bytemuck::cast_slice(indices).to_vec();

        self.index_attribute = Some(Attribute {
            id: NEXT_ATTR_ID.fetch_add(1, Ordering::Relaxed),
            data: Arc::new(raw_data),
            version: 1,
            format: VertexFormat::Uint32,
            offset: 0,
            count: u32::try_from(indices.len()).unwrap_or(u32::MAX),
            stride: 4,
            step_mode: VertexStepMode::Vertex,
        });
        self.data_version = self.data_version.wrapping_add(1);
    }

    /// 面积加权平滑法线
    ///
    /// Writes a fresh "normal" attribute computed from positions and the
    /// index buffer (or sequential triangles when non-indexed).
    pub fn compute_vertex_normals(&mut self) {
        let Some(pos_attr) = self.attributes.get("position") else {
            return;
        };
        if pos_attr.format != VertexFormat::Float32x3 {
            return;
        }

        let pos_count = pos_attr.count as usize;
        let mut normals = vec![Vec3::ZERO; pos_count];

        {
            let get_pos = |i: usize| pos_attr.read_vec3(i as u32).unwrap_or(Vec3::ZERO);

            let mut accumulate_triangle = |i0: usize, i1: usize, i2: usize| {
                if i0 >= pos_count || i1 >= pos_count || i2 >= pos_count {
                    return;
                }

                let v0 = get_pos(i0);
                let v1 = get_pos(i1);
                let v2 = get_pos(i2);

                // 叉积的模长 = 2 * 三角形面积，天然面积加权
                let face_normal = (v1 - v0).cross(v2 - v0);

                normals[i0] += face_normal;
                normals[i1] += face_normal;
                normals[i2] += face_normal;
            };

            if let Some(index_attr) = &self.index_attribute {
                let index_bytes = index_attr.data.as_ref();
                match index_attr.format {
                    VertexFormat::Uint16 => {
                        let u16s: &[u16] = bytemuck::cast_slice(index_bytes);
                        for chunk in u16s.chunks_exact(3) {
                            accumulate_triangle(
                                chunk[0] as usize,
                                chunk[1] as usize,
                                chunk[2] as usize,
                            );
                        }
                    }
                    VertexFormat::Uint32 => {
                        let u32s: &[u32] = bytemuck::cast_slice(index_bytes);
                        for chunk in u32s.chunks_exact(3) {
                            accumulate_triangle(
                                chunk[0] as usize,
                                chunk[1] as usize,
                                chunk[2] as usize,
                            );
                        }
                    }
                    _ => {}
                }
            } else {
                for i in (0..pos_count).step_by(3) {
                    if i + 2 < pos_count {
                        accumulate_triangle(i, i + 1, i + 2);
                    }
                }
            }
        }

        for n in &mut normals {
            *n = n.normalize_or_zero();
        }

        let normal_data: Vec<[f32; 3]> = normals.iter().map(|n| n.to_array()).collect();
        self.set_attribute(
            "normal",
            Attribute::new_planar(&normal_data, VertexFormat::Float32x3),
        );
    }

    /// Computes and caches the AABB and bounding sphere from positions.
    pub fn compute_bounding_volume(&self) {
        let Some(pos_attr) = self.attributes.get("position") else {
            return;
        };
        if pos_attr.format != VertexFormat::Float32x3 {
            return;
        }

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        let mut valid = 0u32;

        for i in 0..pos_attr.count {
            if let Some(p) = pos_attr.read_vec3(i) {
                min = min.min(p);
                max = max.max(p);
                valid += 1;
            }
        }

        if valid == 0 {
            return;
        }

        let bbox = BoundingBox { min, max };
        let center = bbox.center();

        // Pass 2: 包围球半径取到最远点的距离
        let mut radius_sq: f32 = 0.0;
        for i in 0..pos_attr.count {
            if let Some(p) = pos_attr.read_vec3(i) {
                radius_sq = radius_sq.max(p.distance_squared(center));
            }
        }

        *self.bounding_box.borrow_mut() = Some(bbox);
        *self.bounding_sphere.borrow_mut() = Some(BoundingSphere {
            center,
            radius: radius_sq.sqrt(),
        });
    }

    /// Cached bounding sphere, computing it on first use.
    #[must_use]
    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        if self.bounding_sphere.borrow().is_none() {
            self.compute_bounding_volume();
        }
        *self.bounding_sphere.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_volume_from_positions() {
        let mut geo = Geometry::new();
        let positions = [[-1.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        geo.set_attribute(
            "position",
            Attribute::new_planar(&positions, VertexFormat::Float32x3),
        );

        let sphere = geo.bounding_sphere().expect("sphere should be computed");
        assert_eq!(sphere.center, Vec3::new(0.0, 1.0, 0.0));
        assert!((sphere.radius - 2.0f32.sqrt()).abs() < 1e-6);

        let bbox = (*geo.bounding_box.borrow()).expect("bbox should be computed");
        assert_eq!(bbox.min, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(bbox.max, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn computed_normals_face_outward() {
        let mut geo = Geometry::new();
        // 一个位于 XY 平面的逆时针三角形，法线应朝 +Z
        let positions = [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        geo.set_attribute(
            "position",
            Attribute::new_planar(&positions, VertexFormat::Float32x3),
        );
        geo.set_indices(&[0, 1, 2]);
        geo.compute_vertex_normals();

        let normal = geo
            .get_attribute("normal")
            .and_then(|a| a.read_vec3(0))
            .expect("normal attribute should exist");
        assert!((normal - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn set_attribute_tracks_layout_changes() {
        let mut geo = Geometry::new();
        let v0 = geo.layout_version();

        geo.set_attribute(
            "position",
            Attribute::new_planar(&[[0.0f32; 3]], VertexFormat::Float32x3),
        );
        assert_eq!(geo.layout_version(), v0 + 1, "new attribute changes layout");

        geo.set_attribute(
            "position",
            Attribute::new_planar(&[[1.0f32; 3]], VertexFormat::Float32x3),
        );
        assert_eq!(
            geo.layout_version(),
            v0 + 1,
            "same format replacement keeps layout version"
        );
    }
}
