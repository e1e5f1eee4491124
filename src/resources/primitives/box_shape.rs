use glam::Vec3;
use wgpu::VertexFormat;

use crate::resources::geometry::{Attribute, Geometry};

/// Axis-aligned box centered on the origin, 4 vertices per face.
#[must_use]
pub fn create_box(width: f32, height: f32, depth: f32) -> Geometry {
    let half = Vec3::new(width, height, depth) * 0.5;

    // 每个面由 (法线, U 轴, V 轴) 定义
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::Z, Vec3::X, Vec3::Y),     // +Z
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y), // -Z
        (Vec3::Y, Vec3::X, Vec3::NEG_Z), // +Y
        (Vec3::NEG_Y, Vec3::X, Vec3::Z), // -Y
        (Vec3::X, Vec3::NEG_Z, Vec3::Y), // +X
        (Vec3::NEG_X, Vec3::Z, Vec3::Y), // -X
    ];

    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(24);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(24);
    let mut uvs: Vec<[f32; 2]> = Vec::with_capacity(24);
    let mut indices: Vec<u16> = Vec::with_capacity(36);

    for (normal, u_axis, v_axis) in faces {
        let base = positions.len() as u16;
        let origin = normal * half;

        for (u, v) in [(-1.0f32, -1.0f32), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let p = origin + u_axis * half * u + v_axis * half * v;
            positions.push(p.to_array());
            normals.push(normal.to_array());
            uvs.push([(u + 1.0) * 0.5, 1.0 - (v + 1.0) * 0.5]);
        }

        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    let mut geo = Geometry::new();
    geo.set_attribute(
        "position",
        Attribute::new_planar(&positions, VertexFormat::Float32x3),
    );
    geo.set_attribute(
        "normal",
        Attribute::new_planar(&normals, VertexFormat::Float32x3),
    );
    geo.set_attribute("uv", Attribute::new_planar(&uvs, VertexFormat::Float32x2));
    geo.set_indices(&indices);

    geo.compute_bounding_volume();
    geo
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_bounds_match_dimensions() {
        let geo = create_box(0.5, 0.5, 0.5);
        let bbox = (*geo.bounding_box.borrow()).expect("bounds computed");
        assert_eq!(bbox.min, Vec3::splat(-0.25));
        assert_eq!(bbox.max, Vec3::splat(0.25));
    }

    #[test]
    fn box_has_24_vertices_and_36_indices() {
        let geo = create_box(1.0, 1.0, 1.0);
        assert_eq!(geo.vertex_count(), 24);
        assert_eq!(geo.index_attribute().map(|i| i.count), Some(36));
    }
}
