//! glTF 2.0 导入
//!
//! 解析分两段：先把整个文档读进本地中间结构（几何、材质、纹理、节点
//! 树），全部成功后才写入 [`Scene`]。这样加载失败时场景不会留下半截
//! 模型，调用方可以把错误当作可恢复的展示给用户。
//!
//! 支持的子集：节点层级与命名、TRS 变换、三角形网格（缺法线时按面积
//! 加权重算，缺 UV 时补零）、PBR 金属度/粗糙度材质、base color 贴图、
//! 自发光（含 KHR_materials_emissive_strength）。

use std::path::Path;

use glam::{Affine3A, Quat, Vec3, Vec4};

use crate::errors::{HaloError, Result};
use crate::resources::geometry::{Attribute, Geometry};
use crate::resources::material::{Material, MeshStandardMaterial};
use crate::resources::mesh::Mesh;
use crate::resources::texture::{Texture, TextureSampler};
use crate::scene::{MaterialKey, Node, NodeIndex, Scene, TextureKey};

/// 单个图元解析结果
struct LoadedPrimitive {
    geometry: Geometry,
    /// Index into the document's material list, `None` for the default.
    material: Option<usize>,
}

struct LoadedMesh {
    name: Option<String>,
    primitives: Vec<LoadedPrimitive>,
}

struct LoadedMaterial {
    material: Material,
    /// glTF image index of the base color map, resolved after insertion.
    base_color_image: Option<usize>,
}

struct LoadedNode {
    name: Option<String>,
    transform: Affine3A,
    mesh: Option<usize>,
    children: Vec<usize>,
}

/// Parsed document, ready to be inserted into a scene.
struct LoadedDocument {
    meshes: Vec<LoadedMesh>,
    materials: Vec<LoadedMaterial>,
    /// RGBA8 textures by glTF image index; only referenced images decode.
    images: Vec<Option<Texture>>,
    nodes: Vec<LoadedNode>,
    roots: Vec<usize>,
}

/// Loads a glTF/GLB file and attaches it under a new root node.
///
/// Returns the root's index. On error the scene is left untouched.
///
/// # Errors
///
/// [`HaloError::AssetNotFound`] when the path does not exist,
/// [`HaloError::GltfMissingAttribute`] when a primitive has no positions,
/// [`HaloError::GltfError`] for any other parse or decode failure.
pub fn load_gltf(scene: &mut Scene, path: impl AsRef<Path>) -> Result<NodeIndex> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(HaloError::AssetNotFound(path.display().to_string()));
    }

    let document = parse_document(path)?;

    let root_name = path
        .file_stem()
        .map_or_else(|| "Model".to_string(), |s| s.to_string_lossy().into_owned());

    Ok(insert_document(scene, document, &root_name))
}

// ============================================================================
// 解析阶段：只读文件，不碰场景
// ============================================================================

fn parse_document(path: &Path) -> Result<LoadedDocument> {
    let (document, buffers, images) = gltf::import(path)?;

    let materials: Vec<LoadedMaterial> = document.materials().map(parse_material).collect();

    let mut decoded_images: Vec<Option<Texture>> = (0..images.len()).map(|_| None).collect();
    for mat in &materials {
        if let Some(image_index) = mat.base_color_image
            && decoded_images[image_index].is_none()
        {
            decoded_images[image_index] = Some(decode_image(&images[image_index])?);
        }
    }

    let meshes: Vec<LoadedMesh> = document
        .meshes()
        .map(|mesh| parse_mesh(&mesh, &buffers))
        .collect::<Result<_>>()?;

    let nodes: Vec<LoadedNode> = document
        .nodes()
        .map(|node| {
            let (translation, rotation, scale) = node.transform().decomposed();
            LoadedNode {
                name: node.name().map(str::to_owned),
                transform: Affine3A::from_scale_rotation_translation(
                    Vec3::from(scale),
                    Quat::from_array(rotation),
                    Vec3::from(translation),
                ),
                mesh: node.mesh().map(|m| m.index()),
                children: node.children().map(|c| c.index()).collect(),
            }
        })
        .collect();

    let roots: Vec<usize> = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .map(|s| s.nodes().map(|n| n.index()).collect())
        .unwrap_or_default();

    Ok(LoadedDocument {
        meshes,
        materials,
        images: decoded_images,
        nodes,
        roots,
    })
}

fn parse_material(material: gltf::Material) -> LoadedMaterial {
    let pbr = material.pbr_metallic_roughness();

    let mut standard = MeshStandardMaterial::new(Vec4::from_array(pbr.base_color_factor()));
    standard.set_metalness(pbr.metallic_factor());
    standard.set_roughness(pbr.roughness_factor());

    let emissive = Vec3::from_array(material.emissive_factor());
    if emissive != Vec3::ZERO {
        standard.set_emissive(emissive);
        standard.set_emissive_intensity(material.emissive_strength().unwrap_or(1.0));
    }

    let base_color_image = pbr
        .base_color_texture()
        .map(|info| info.texture().source().index());

    let name = material.name().map(str::to_owned);
    let mut engine_material = Material::from(standard);
    if let Some(name) = name {
        engine_material.name = Some(name.into());
    }

    LoadedMaterial {
        material: engine_material,
        base_color_image,
    }
}

fn parse_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> Result<LoadedMesh> {
    let primitives = mesh
        .primitives()
        .map(|prim| parse_primitive(&prim, buffers))
        .collect::<Result<Vec<_>>>()?;

    Ok(LoadedMesh {
        name: mesh.name().map(str::to_owned),
        primitives,
    })
}

fn parse_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
) -> Result<LoadedPrimitive> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &*data.0));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or(HaloError::GltfMissingAttribute("position"))?
        .collect();

    let mut geometry = Geometry::new();
    geometry.set_attribute(
        "position",
        Attribute::new_planar(&positions, wgpu::VertexFormat::Float32x3),
    );

    if let Some(indices) = reader.read_indices() {
        geometry.set_indices_u32(&indices.into_u32().collect::<Vec<_>>());
    }

    if let Some(normals) = reader.read_normals() {
        let normals: Vec<[f32; 3]> = normals.collect();
        geometry.set_attribute(
            "normal",
            Attribute::new_planar(&normals, wgpu::VertexFormat::Float32x3),
        );
    } else {
        geometry.compute_vertex_normals();
    }

    if let Some(uvs) = reader.read_tex_coords(0) {
        let uvs: Vec<[f32; 2]> = uvs.into_f32().collect();
        geometry.set_attribute("uv", Attribute::new_planar(&uvs, wgpu::VertexFormat::Float32x2));
    } else {
        // 无贴图坐标的模型用零 UV 采到 fallback 贴图的唯一纹素
        let zeros = vec![[0.0f32, 0.0]; positions.len()];
        geometry.set_attribute("uv", Attribute::new_planar(&zeros, wgpu::VertexFormat::Float32x2));
    }

    Ok(LoadedPrimitive {
        geometry,
        material: primitive.material().index(),
    })
}

/// glTF 图像数据统一转成紧凑 RGBA8。
fn decode_image(data: &gltf::image::Data) -> Result<Texture> {
    use gltf::image::Format;

    let pixel_count = (data.width as usize) * (data.height as usize);
    let rgba: Vec<u8> = match data.format {
        Format::R8G8B8A8 => data.pixels.clone(),
        Format::R8G8B8 => data
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8 => data.pixels.iter().flat_map(|&r| [r, r, r, 255]).collect(),
        Format::R8G8 => data
            .pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[1], 0, 255])
            .collect(),
        // 16 位通道降到 8 位
        Format::R16 | Format::R16G16 | Format::R16G16B16 | Format::R16G16B16A16 => {
            let channels = match data.format {
                Format::R16 => 1,
                Format::R16G16 => 2,
                Format::R16G16B16 => 3,
                _ => 4,
            };
            let values: Vec<u8> = data
                .pixels
                .chunks_exact(2)
                .map(|b| (u16::from_le_bytes([b[0], b[1]]) >> 8) as u8)
                .collect();
            expand_to_rgba(&values, channels)
        }
        Format::R32G32B32FLOAT | Format::R32G32B32A32FLOAT => {
            return Err(HaloError::GltfError(
                "float image formats are not supported".to_string(),
            ));
        }
    };

    if rgba.len() != pixel_count * 4 {
        return Err(HaloError::GltfError("image data size mismatch".to_string()));
    }

    let mut texture = Texture::from_rgba8(data.width, data.height, rgba, true);
    texture.sampler = TextureSampler::default();
    Ok(texture)
}

fn expand_to_rgba(values: &[u8], channels: usize) -> Vec<u8> {
    values
        .chunks_exact(channels)
        .flat_map(|p| match channels {
            1 => [p[0], p[0], p[0], 255],
            2 => [p[0], p[1], 0, 255],
            3 => [p[0], p[1], p[2], 255],
            _ => [p[0], p[1], p[2], p[3]],
        })
        .collect()
}

// ============================================================================
// 插入阶段：纯内存操作，不会失败
// ============================================================================

fn insert_document(scene: &mut Scene, document: LoadedDocument, root_name: &str) -> NodeIndex {
    // 1. 纹理
    let texture_keys: Vec<Option<TextureKey>> = document
        .images
        .into_iter()
        .map(|tex| tex.map(|t| scene.insert_texture(t)))
        .collect();

    // 2. 材质，贴图引用在这里补上
    let material_keys: Vec<MaterialKey> = document
        .materials
        .into_iter()
        .map(|loaded| {
            let mut material = loaded.material;
            if let Some(image_index) = loaded.base_color_image
                && let Some(Some(texture_key)) = texture_keys.get(image_index)
                && let crate::resources::material::MaterialData::Standard(standard) =
                    &mut material.data
            {
                standard.set_map(Some(*texture_key));
            }
            scene.insert_material(material)
        })
        .collect();

    let default_material = scene.insert_material(
        Material::from(MeshStandardMaterial::default()).with_name("glTF Default"),
    );

    // 3. 几何 + Mesh 组件（多图元的 mesh 拆成多个组件）
    struct MeshEntry {
        name: Option<String>,
        parts: Vec<crate::scene::MeshKey>,
    }
    let mesh_entries: Vec<MeshEntry> = document
        .meshes
        .into_iter()
        .map(|loaded| {
            let name = loaded.name;
            let parts = loaded
                .primitives
                .into_iter()
                .map(|prim| {
                    let geometry_key = scene.insert_geometry(prim.geometry);
                    let material_key = prim
                        .material
                        .and_then(|i| material_keys.get(i).copied())
                        .unwrap_or(default_material);
                    scene.insert_mesh(Mesh::new(
                        name.clone().unwrap_or_else(|| "Mesh".to_string()),
                        geometry_key,
                        material_key,
                    ))
                })
                .collect();
            MeshEntry { name, parts }
        })
        .collect();

    // 4. 节点树
    let mut root = Node::new();
    root.name = Some(root_name.to_string());
    let root_index = scene.add_node(root);

    let mut stack: Vec<(usize, NodeIndex)> = document
        .roots
        .iter()
        .rev()
        .map(|&i| (i, root_index))
        .collect();

    while let Some((node_index, parent)) = stack.pop() {
        let loaded = &document.nodes[node_index];

        let mut node = Node::new();
        node.name = loaded.name.clone();
        node.transform.apply_local_matrix(loaded.transform);

        let inserted = scene.add_to_parent(node, parent);

        if let Some(mesh_index) = loaded.mesh
            && let Some(entry) = mesh_entries.get(mesh_index)
        {
            match entry.parts.as_slice() {
                [single] => {
                    if let Some(n) = scene.get_node_mut(inserted) {
                        n.mesh = Some(*single);
                    }
                }
                parts => {
                    // 每个图元一个子节点，命名带序号方便按名查找
                    for (i, &mesh_key) in parts.iter().enumerate() {
                        let mut child = Node::new();
                        child.name = entry
                            .name
                            .as_ref()
                            .map(|n| format!("{n}.{i}"));
                        child.mesh = Some(mesh_key);
                        scene.add_to_parent(child, inserted);
                    }
                }
            }
        }

        for &child in loaded.children.iter().rev() {
            stack.push((child, inserted));
        }
    }

    root_index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reports_asset_not_found() {
        let mut scene = Scene::new();
        let err = load_gltf(&mut scene, "does/not/exist.glb").unwrap_err();
        assert!(matches!(err, HaloError::AssetNotFound(_)));
        // 失败加载不碰场景
        assert!(scene.nodes.is_empty());
        assert!(scene.materials.is_empty());
    }

    #[test]
    fn expand_to_rgba_pads_missing_channels() {
        assert_eq!(expand_to_rgba(&[7], 1), vec![7, 7, 7, 255]);
        assert_eq!(expand_to_rgba(&[1, 2, 3], 3), vec![1, 2, 3, 255]);
        assert_eq!(expand_to_rgba(&[1, 2, 3, 4], 4), vec![1, 2, 3, 4]);
    }
}
