//! GPU textures loaded from image files, with caching, mipmaps and neutral
//! fallbacks for missing assets.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use haunted_scene::{ColorSpace, TextureRef, TextureSlot};

use crate::blit::Blitter;

/// A GPU texture with its default view.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    /// Width and height in texels.
    pub dimensions: (u32, u32),
    pub format: wgpu::TextureFormat,
    /// Number of mip levels (1 if mipmaps were not generated).
    pub mip_level_count: u32,
}

/// Errors that can occur while creating a texture.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    /// Pixel data length doesn't match the expected size for the given dimensions and format.
    #[error(
        "texture data size ({actual}) does not match expected ({expected}) for {width}x{height} {format:?}"
    )]
    DataSizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    },

    /// Width or height is zero.
    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },

    /// The file could not be opened or decoded.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// 1×1 stand-in used when a map cannot be loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fallback {
    /// Leaves colour, AO, roughness, metalness and alpha unchanged.
    White,
    /// Tangent-space (0, 0, 1).
    FlatNormal,
    /// Zero displacement.
    Black,
}

impl Fallback {
    pub fn for_slot(slot: TextureSlot) -> Self {
        match slot {
            TextureSlot::Normal => Self::FlatNormal,
            TextureSlot::Displacement => Self::Black,
            _ => Self::White,
        }
    }

    pub fn texel(self) -> [u8; 4] {
        match self {
            Self::White => [255, 255, 255, 255],
            Self::FlatNormal => [128, 128, 255, 255],
            Self::Black => [0, 0, 0, 255],
        }
    }
}

/// Calculates the number of mip levels for the given dimensions.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Texture format for a colour space. Colour maps decode from sRGB on sampling.
pub fn format_for(color_space: ColorSpace) -> wgpu::TextureFormat {
    match color_space {
        ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
    }
}

/// Decode an image file into tightly packed RGBA8 texels.
pub fn decode_rgba(path: &Path) -> Result<image::RgbaImage, TextureError> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

/// Loads and caches textures by file and colour space.
pub struct TextureManager {
    textures: HashMap<TextureRef, Arc<GpuTexture>>,
    fallbacks: HashMap<(Fallback, ColorSpace), Arc<GpuTexture>>,
}

impl Default for TextureManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureManager {
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            fallbacks: HashMap::new(),
        }
    }

    /// Texture for `slot`: the referenced file if it loads, otherwise the
    /// slot's fallback. Failures are logged and never propagated.
    pub fn load_slot(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        blitter: &mut Blitter,
        texture: Option<&TextureRef>,
        slot: TextureSlot,
    ) -> Arc<GpuTexture> {
        let fallback = Fallback::for_slot(slot);
        let Some(texture) = texture else {
            return self.fallback(device, queue, fallback, ColorSpace::Linear);
        };
        match self.load(device, queue, blitter, texture) {
            Ok(loaded) => loaded,
            Err(err) => {
                log::warn!("{err}; using {fallback:?} fallback for {slot:?}");
                self.fallback(device, queue, fallback, texture.color_space)
            }
        }
    }

    /// Load a texture file, or return the cached copy.
    pub fn load(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        blitter: &mut Blitter,
        texture: &TextureRef,
    ) -> Result<Arc<GpuTexture>, TextureError> {
        if let Some(existing) = self.textures.get(texture) {
            return Ok(Arc::clone(existing));
        }

        let pixels = decode_rgba(&texture.path)?;
        let (width, height) = pixels.dimensions();
        let label = texture.path.to_string_lossy();
        let gpu = create_texture(
            device,
            queue,
            Some(blitter),
            &label,
            pixels.as_raw(),
            width,
            height,
            format_for(texture.color_space),
        )?;
        log::info!(
            "Loaded texture '{label}' ({width}x{height}, {} mips)",
            gpu.mip_level_count
        );

        let gpu = Arc::new(gpu);
        self.textures.insert(texture.clone(), Arc::clone(&gpu));
        Ok(gpu)
    }

    /// A cached 1×1 fallback texture.
    pub fn fallback(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        fallback: Fallback,
        color_space: ColorSpace,
    ) -> Arc<GpuTexture> {
        let key = (fallback, color_space);
        if let Some(existing) = self.fallbacks.get(&key) {
            return Arc::clone(existing);
        }
        let gpu = Arc::new(create_solid_texture(
            device,
            queue,
            fallback.texel(),
            format_for(color_space),
        ));
        self.fallbacks.insert(key, Arc::clone(&gpu));
        gpu
    }

    /// Number of file-backed textures in the cache.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// Create a 2D texture from RGBA8 texels. With a blitter, a full mip chain is
/// generated; without one the texture has a single level.
#[allow(clippy::too_many_arguments)]
pub fn create_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    blitter: Option<&mut Blitter>,
    label: &str,
    data: &[u8],
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> Result<GpuTexture, TextureError> {
    validate_dimensions(width, height)?;
    validate_data_size(data, width, height, format)?;

    let mip_levels = if blitter.is_some() {
        mip_level_count(width, height)
    } else {
        1
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: mip_levels,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: None,
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );

    if let Some(blitter) = blitter
        && mip_levels > 1
    {
        generate_mipmaps(device, queue, blitter, &texture, format, mip_levels);
    }

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    Ok(GpuTexture {
        texture,
        view,
        dimensions: (width, height),
        format,
        mip_level_count: mip_levels,
    })
}

fn create_solid_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texel: [u8; 4],
    format: wgpu::TextureFormat,
) -> GpuTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("fallback-texture"),
        size: wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &texel,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4),
            rows_per_image: None,
        },
        wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture {
        texture,
        view,
        dimensions: (1, 1),
        format,
        mip_level_count: 1,
    }
}

/// Fill mip levels 1.. by repeatedly blitting the previous level.
fn generate_mipmaps(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    blitter: &mut Blitter,
    texture: &wgpu::Texture,
    format: wgpu::TextureFormat,
    mip_count: u32,
) {
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("mipmap-encoder"),
    });

    for level in 1..mip_count {
        let src_view = texture.create_view(&wgpu::TextureViewDescriptor {
            base_mip_level: level - 1,
            mip_level_count: Some(1),
            ..Default::default()
        });
        let dst_view = texture.create_view(&wgpu::TextureViewDescriptor {
            base_mip_level: level,
            mip_level_count: Some(1),
            ..Default::default()
        });
        blitter.blit(device, &mut encoder, &src_view, &dst_view, format);
    }

    queue.submit(std::iter::once(encoder.finish()));
}

fn validate_dimensions(width: u32, height: u32) -> Result<(), TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::ZeroDimensions { width, height });
    }
    Ok(())
}

fn validate_data_size(
    data: &[u8],
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> Result<(), TextureError> {
    let expected = width as usize * height as usize * 4;
    if data.len() != expected {
        return Err(TextureError::DataSizeMismatch {
            actual: data.len(),
            expected,
            width,
            height,
            format,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_device_queue;

    #[test]
    fn test_mip_level_count() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 2), 2);
        assert_eq!(mip_level_count(1024, 1024), 11);
        assert_eq!(mip_level_count(1024, 512), 11);
        assert_eq!(mip_level_count(1000, 3), 10);
        assert_eq!(mip_level_count(0, 0), 1);
    }

    #[test]
    fn test_fallback_per_slot() {
        assert_eq!(Fallback::for_slot(TextureSlot::Color), Fallback::White);
        assert_eq!(Fallback::for_slot(TextureSlot::Alpha), Fallback::White);
        assert_eq!(Fallback::for_slot(TextureSlot::Roughness), Fallback::White);
        assert_eq!(Fallback::for_slot(TextureSlot::Normal), Fallback::FlatNormal);
        assert_eq!(Fallback::for_slot(TextureSlot::Displacement), Fallback::Black);
        assert_eq!(Fallback::FlatNormal.texel(), [128, 128, 255, 255]);
    }

    #[test]
    fn test_formats_follow_color_space() {
        assert_eq!(format_for(ColorSpace::Srgb), wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(format_for(ColorSpace::Linear), wgpu::TextureFormat::Rgba8Unorm);
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            validate_dimensions(0, 4),
            Err(TextureError::ZeroDimensions { width: 0, height: 4 })
        ));
        assert!(matches!(
            validate_data_size(&[0; 15], 2, 2, wgpu::TextureFormat::Rgba8Unorm),
            Err(TextureError::DataSizeMismatch { actual: 15, expected: 16, .. })
        ));
        assert!(validate_data_size(&[0; 16], 2, 2, wgpu::TextureFormat::Rgba8Unorm).is_ok());
    }

    #[test]
    fn test_decode_missing_file_reports_path() {
        let err = decode_rgba(Path::new("does/not/exist.webp")).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.webp"), "{err}");
    }

    #[test]
    fn test_decode_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        let mut img = image::RgbaImage::new(4, 2);
        img.put_pixel(3, 1, image::Rgba([10, 20, 30, 40]));
        img.save(&path).unwrap();

        let decoded = decode_rgba(&path).unwrap();
        assert_eq!(decoded.dimensions(), (4, 2));
        assert_eq!(decoded.get_pixel(3, 1).0, [10, 20, 30, 40]);
    }

    #[test]
    fn test_missing_file_uses_cached_fallback() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let mut blitter = Blitter::new(&device);
        let mut manager = TextureManager::new();
        let missing = TextureRef::linear("missing/normal.webp");

        let a = manager.load_slot(&device, &queue, &mut blitter, Some(&missing), TextureSlot::Normal);
        let b = manager.load_slot(&device, &queue, &mut blitter, None, TextureSlot::Normal);
        assert_eq!(a.dimensions, (1, 1));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_loaded_texture_is_cached_with_mips() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("color.png");
        image::RgbaImage::from_pixel(8, 8, image::Rgba([200, 100, 50, 255]))
            .save(&path)
            .unwrap();

        let mut blitter = Blitter::new(&device);
        let mut manager = TextureManager::new();
        let color = TextureRef::srgb(&path);
        let first = manager.load(&device, &queue, &mut blitter, &color).unwrap();
        let second = manager.load(&device, &queue, &mut blitter, &color).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.mip_level_count, 4);
        assert_eq!(first.format, wgpu::TextureFormat::Rgba8UnormSrgb);

        let data = manager
            .load(&device, &queue, &mut blitter, &TextureRef::linear(&path))
            .unwrap();
        assert_eq!(data.format, wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(manager.len(), 2);
    }
}
