//! Metallic/roughness surface description with optional texture maps.

use std::path::PathBuf;

use glam::Vec2;
use haunted_lighting::Color;

/// How a texture's texels are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    /// Color data, decoded from sRGB on sampling.
    Srgb,
    /// Non-color data (roughness, normals, heights).
    Linear,
}

/// Addressing outside `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WrapMode {
    Repeat,
    #[default]
    ClampToEdge,
}

/// An image file used by a material.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureRef {
    pub path: PathBuf,
    pub color_space: ColorSpace,
}

impl TextureRef {
    pub fn srgb(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            color_space: ColorSpace::Srgb,
        }
    }

    pub fn linear(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            color_space: ColorSpace::Linear,
        }
    }
}

/// Texture inputs of a [`StandardMaterial`], in shader binding order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    /// Base color, multiplied by the material color.
    Color,
    /// Ambient occlusion, red channel.
    AmbientOcclusion,
    /// Roughness, green channel.
    Roughness,
    /// Metalness, blue channel.
    Metalness,
    /// Tangent-space normal map.
    Normal,
    /// Opacity, green channel. Sampled without the detail repeat.
    Alpha,
    /// Height along the normal, red channel. Sampled in the vertex stage.
    Displacement,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 7] = [
        TextureSlot::Color,
        TextureSlot::AmbientOcclusion,
        TextureSlot::Roughness,
        TextureSlot::Metalness,
        TextureSlot::Normal,
        TextureSlot::Alpha,
        TextureSlot::Displacement,
    ];
}

/// A physically based surface.
///
/// Sampled roughness and metalness multiply the scalar factors, so a
/// metalness map has no effect while `metalness` is zero.
#[derive(Clone, Debug, PartialEq)]
pub struct StandardMaterial {
    pub name: String,
    pub color: Color,
    pub roughness: f32,
    pub metalness: f32,
    pub color_map: Option<TextureRef>,
    pub ao_map: Option<TextureRef>,
    pub roughness_map: Option<TextureRef>,
    pub metalness_map: Option<TextureRef>,
    pub normal_map: Option<TextureRef>,
    pub alpha_map: Option<TextureRef>,
    pub displacement_map: Option<TextureRef>,
    /// UV scale applied to every map except the alpha map.
    pub uv_repeat: Vec2,
    /// U and V addressing for every map except the alpha map.
    pub wrap: [WrapMode; 2],
    pub displacement_scale: f32,
    pub displacement_bias: f32,
    /// Blend with what is behind instead of overwriting it.
    pub transparent: bool,
}

impl StandardMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: Color::WHITE,
            roughness: 1.0,
            metalness: 0.0,
            color_map: None,
            ao_map: None,
            roughness_map: None,
            metalness_map: None,
            normal_map: None,
            alpha_map: None,
            displacement_map: None,
            uv_repeat: Vec2::ONE,
            wrap: [WrapMode::ClampToEdge; 2],
            displacement_scale: 1.0,
            displacement_bias: 0.0,
            transparent: false,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_color_map(mut self, path: impl Into<PathBuf>) -> Self {
        self.color_map = Some(TextureRef::srgb(path));
        self
    }

    /// Use one packed AO/roughness/metalness texture for all three slots.
    pub fn with_arm_map(mut self, path: impl Into<PathBuf>) -> Self {
        let arm = TextureRef::linear(path);
        self.ao_map = Some(arm.clone());
        self.roughness_map = Some(arm.clone());
        self.metalness_map = Some(arm);
        self
    }

    pub fn with_ao_map(mut self, path: impl Into<PathBuf>) -> Self {
        self.ao_map = Some(TextureRef::linear(path));
        self
    }

    pub fn with_roughness_map(mut self, path: impl Into<PathBuf>) -> Self {
        self.roughness_map = Some(TextureRef::linear(path));
        self
    }

    pub fn with_metalness_map(mut self, path: impl Into<PathBuf>) -> Self {
        self.metalness_map = Some(TextureRef::linear(path));
        self
    }

    pub fn with_normal_map(mut self, path: impl Into<PathBuf>) -> Self {
        self.normal_map = Some(TextureRef::linear(path));
        self
    }

    /// Alpha-mapped materials are drawn with blending.
    pub fn with_alpha_map(mut self, path: impl Into<PathBuf>) -> Self {
        self.alpha_map = Some(TextureRef::linear(path));
        self.transparent = true;
        self
    }

    pub fn with_displacement_map(mut self, path: impl Into<PathBuf>, scale: f32, bias: f32) -> Self {
        self.displacement_map = Some(TextureRef::linear(path));
        self.displacement_scale = scale;
        self.displacement_bias = bias;
        self
    }

    pub fn with_repeat(mut self, u: f32, v: f32, wrap_u: WrapMode, wrap_v: WrapMode) -> Self {
        self.uv_repeat = Vec2::new(u, v);
        self.wrap = [wrap_u, wrap_v];
        self
    }

    pub fn texture(&self, slot: TextureSlot) -> Option<&TextureRef> {
        match slot {
            TextureSlot::Color => self.color_map.as_ref(),
            TextureSlot::AmbientOcclusion => self.ao_map.as_ref(),
            TextureSlot::Roughness => self.roughness_map.as_ref(),
            TextureSlot::Metalness => self.metalness_map.as_ref(),
            TextureSlot::Normal => self.normal_map.as_ref(),
            TextureSlot::Alpha => self.alpha_map.as_ref(),
            TextureSlot::Displacement => self.displacement_map.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_map_fills_three_slots() {
        let material = StandardMaterial::new("walls").with_arm_map("wall/arm.webp");
        for slot in [
            TextureSlot::AmbientOcclusion,
            TextureSlot::Roughness,
            TextureSlot::Metalness,
        ] {
            let texture = material.texture(slot).unwrap();
            assert_eq!(texture.color_space, ColorSpace::Linear);
            assert_eq!(texture.path, PathBuf::from("wall/arm.webp"));
        }
        assert!(material.texture(TextureSlot::Color).is_none());
    }

    #[test]
    fn test_color_map_is_srgb() {
        let material = StandardMaterial::new("roof").with_color_map("roof/diff.webp");
        assert_eq!(
            material.texture(TextureSlot::Color).unwrap().color_space,
            ColorSpace::Srgb
        );
    }

    #[test]
    fn test_alpha_map_makes_transparent() {
        let material = StandardMaterial::new("door");
        assert!(!material.transparent);
        let material = material.with_alpha_map("door/alpha.webp");
        assert!(material.transparent);
    }

    #[test]
    fn test_defaults_are_rough_dielectric() {
        let material = StandardMaterial::new("plain");
        assert_eq!(material.roughness, 1.0);
        assert_eq!(material.metalness, 0.0);
        assert_eq!(material.uv_repeat, Vec2::ONE);
        assert_eq!(material.wrap, [WrapMode::ClampToEdge; 2]);
        assert!(TextureSlot::ALL.iter().all(|&s| material.texture(s).is_none()));
    }
}
