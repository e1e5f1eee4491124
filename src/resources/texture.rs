use uuid::Uuid;

/// Sampler state carried next to the texture data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureSampler {
    pub address_mode_u: wgpu::AddressMode,
    pub address_mode_v: wgpu::AddressMode,
    pub mag_filter: wgpu::FilterMode,
    pub min_filter: wgpu::FilterMode,
    pub mipmap_filter: wgpu::MipmapFilterMode,
}

impl Default for TextureSampler {
    fn default() -> Self {
        Self {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
        }
    }
}

/// CPU-side texture: tightly packed RGBA8 pixels.
///
/// The renderer uploads this into a `wgpu::Texture` on first use and
/// re-uploads when `version` changes. `srgb` selects the GPU format
/// (`Rgba8UnormSrgb` for color maps, `Rgba8Unorm` for data textures).
#[derive(Debug, Clone)]
pub struct Texture {
    pub uuid: Uuid,
    pub name: Option<String>,

    pub width: u32,
    pub height: u32,
    pub srgb: bool,

    pub data: Vec<u8>,
    pub sampler: TextureSampler,

    pub version: u64,
}

impl Texture {
    /// Wraps raw RGBA8 pixels. `data.len()` must equal `width * height * 4`.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>, srgb: bool) -> Self {
        debug_assert_eq!(data.len() as u64, u64::from(width) * u64::from(height) * 4);
        Self {
            uuid: Uuid::new_v4(),
            name: None,
            width,
            height,
            srgb,
            data,
            sampler: TextureSampler::default(),
            version: 1,
        }
    }

    /// Decoded image in any layout, converted to RGBA8.
    pub fn from_image(image: &image::DynamicImage, srgb: bool) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba8(width, height, rgba.into_raw(), srgb)
    }

    /// 1x1 solid color texture, used as the fallback base map.
    #[must_use]
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self::from_rgba8(1, 1, rgba.to_vec(), true)
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the pixel data in place.
    pub fn update_data(&mut self, data: Vec<u8>) {
        self.data = data;
        self.version = self.version.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_optional_and_borrows_as_a_label() {
        // GPU 端用 `name.as_deref()` 直接作为 wgpu Label
        let unnamed = Texture::solid([255, 0, 0, 255]);
        assert_eq!(unnamed.name.as_deref(), None);

        let named = Texture::solid([255, 0, 0, 255]).with_name("base color");
        assert_eq!(named.name.as_deref(), Some("base color"));
    }
}
