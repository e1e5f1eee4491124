use std::f32::consts::PI;

use wgpu::VertexFormat;

use crate::resources::geometry::{Attribute, Geometry};

pub struct SphereOptions {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl Default for SphereOptions {
    fn default() -> Self {
        Self {
            radius: 1.0,
            width_segments: 32,
            height_segments: 16,
        }
    }
}

/// UV sphere, Y-up, seam along -X.
#[must_use]
pub fn create_sphere(options: SphereOptions) -> Geometry {
    let radius = options.radius;
    let width_segments = options.width_segments.max(3);
    let height_segments = options.height_segments.max(2);

    let ring_count = width_segments + 1;
    let vertex_count = (ring_count * (height_segments + 1)) as usize;

    let mut positions = Vec::with_capacity(vertex_count);
    let mut normals = Vec::with_capacity(vertex_count);
    let mut uvs = Vec::with_capacity(vertex_count);

    for row in 0..=height_segments {
        let v = row as f32 / height_segments as f32;
        // 纬度角：0 到 PI，从南极到北极
        let theta = v * PI;

        let py = -radius * theta.cos();
        let ring_radius = radius * theta.sin();

        for col in 0..=width_segments {
            let u = col as f32 / width_segments as f32;
            let phi = u * 2.0 * PI;

            let px = -ring_radius * phi.cos();
            let pz = ring_radius * phi.sin();

            positions.push([px, py, pz]);
            normals.push([px / radius, py / radius, pz / radius]);
            uvs.push([u, 1.0 - v]);
        }
    }

    // 每个网格单元两个三角形；极点处的退化三角形由 GPU 忽略
    let mut indices = Vec::with_capacity((width_segments * height_segments * 6) as usize);
    for row in 0..height_segments {
        for col in 0..width_segments {
            let a = row * ring_count + col;
            let b = a + 1;
            let c = (row + 1) * ring_count + col;
            let d = c + 1;

            indices.push(a as u16);
            indices.push(b as u16);
            indices.push(c as u16);

            indices.push(b as u16);
            indices.push(d as u16);
            indices.push(c as u16);
        }
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
    fn sphere_bounds_match_radius() {
        let geo = create_sphere(SphereOptions {
            radius: 0.5,
            ..Default::default()
        });

        let sphere = geo.bounding_sphere().expect("bounds computed");
        assert!(sphere.center.length() < 1e-5);
        assert!((sphere.radius - 0.5).abs() < 1e-4);
    }

    #[test]
    fn sphere_has_full_vertex_layout() {
        let geo = create_sphere(SphereOptions::default());
        assert!(geo.get_attribute("position").is_some());
        assert!(geo.get_attribute("normal").is_some());
        assert!(geo.get_attribute("uv").is_some());
        assert!(geo.index_attribute().is_some());
    }
}
