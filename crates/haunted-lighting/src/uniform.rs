//! GPU-side lighting uniform shared by the shading pipelines.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::{Color, DirectionalLight, PointLight, PointLightGpu, PointShadow};

/// Maximum number of point lights uploaded per frame. Extra lights are dropped.
pub const MAX_POINT_LIGHTS: usize = 8;

/// Maximum number of point lights with a cube shadow map. Later casters are unshadowed.
pub const MAX_POINT_SHADOWS: usize = 3;

/// A point light that gets a cube shadow map this frame.
#[derive(Clone, Copy, Debug)]
pub struct PointShadowCaster<'a> {
    /// Index among the uploaded point lights.
    pub light: usize,
    /// Cube map slot, below [`MAX_POINT_SHADOWS`].
    pub slot: usize,
    pub position: Vec3,
    pub shadow: &'a PointShadow,
}

/// Shadow-casting point lights among the first [`MAX_POINT_LIGHTS`], in slot order.
///
/// The renderer and [`LightingUniform::pack`] both use this, so the slot a
/// light renders into is the slot the shader samples.
pub fn point_shadow_casters<'a>(
    point_lights: impl IntoIterator<Item = (Vec3, &'a PointLight)>,
) -> impl Iterator<Item = PointShadowCaster<'a>> {
    point_lights
        .into_iter()
        .take(MAX_POINT_LIGHTS)
        .enumerate()
        .filter_map(|(light, (position, point))| {
            point.shadow.as_ref().map(|shadow| (light, position, shadow))
        })
        .take(MAX_POINT_SHADOWS)
        .enumerate()
        .map(|(slot, (light, position, shadow))| PointShadowCaster {
            light,
            slot,
            position,
            shadow,
        })
}

/// Uniform light applied equally to every surface.
#[derive(Clone, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

impl AmbientLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self { color, intensity }
    }
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self::new(Color::WHITE, 0.0)
    }
}

/// All light data for one frame, 528 bytes, std140-compatible.
///
/// Layout in WGSL:
/// ```text
/// struct Lighting {
///     ambient: vec4<f32>,              // rgb, intensity
///     sun_direction: vec4<f32>,        // xyz direction, w intensity
///     sun_color: vec4<f32>,            // rgb, w unused
///     shadow_view_proj: mat4x4<f32>,
///     shadow_params: vec4<f32>,        // x enabled, y bias, z texel size
///     point_count: vec4<u32>,
///     point_lights: array<PointLight, 8>,
/// }
/// ```
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightingUniform {
    pub ambient: [f32; 4],
    pub sun_direction: [f32; 4],
    pub sun_color: [f32; 4],
    pub shadow_view_proj: [f32; 16],
    pub shadow_params: [f32; 4],
    pub point_count: [u32; 4],
    pub point_lights: [PointLightGpu; MAX_POINT_LIGHTS],
}

impl LightingUniform {
    /// Pack ambient, directional and point lights.
    ///
    /// `shadows_enabled` lets the caller switch shadowing off even when the
    /// lights carry shadow cameras. Point lights are assigned cube map slots
    /// by [`point_shadow_casters`].
    pub fn pack<'a>(
        ambient: &AmbientLight,
        sun: &DirectionalLight,
        shadows_enabled: bool,
        point_lights: impl IntoIterator<Item = (Vec3, &'a PointLight)>,
    ) -> Self {
        let direction = sun.direction();
        let shadow = sun.shadow.as_ref().filter(|_| shadows_enabled);
        let shadow_view_proj = shadow
            .map(|s| s.view_projection(sun.position, sun.target))
            .unwrap_or(Mat4::IDENTITY);
        let shadow_params = match shadow {
            Some(s) => [1.0, s.bias, s.texel_size(), 0.0],
            None => [0.0; 4],
        };

        let point_lights: Vec<_> = point_lights.into_iter().take(MAX_POINT_LIGHTS).collect();
        let mut packed = [PointLightGpu::default(); MAX_POINT_LIGHTS];
        for (slot, (position, light)) in packed.iter_mut().zip(&point_lights) {
            *slot = light.to_gpu(*position);
        }
        if shadows_enabled {
            for caster in point_shadow_casters(point_lights.iter().copied()) {
                let gpu = &mut packed[caster.light];
                gpu.decay_shadow[1] = caster.slot as f32;
                gpu.decay_shadow[2] = caster.shadow.near;
                gpu.decay_shadow[3] = caster.shadow.far;
            }
        }
        let count = point_lights.len();

        Self {
            ambient: ambient.color.with_intensity(ambient.intensity),
            sun_direction: [direction.x, direction.y, direction.z, sun.intensity],
            sun_color: sun.color.with_intensity(0.0),
            shadow_view_proj: shadow_view_proj.to_cols_array(),
            shadow_params,
            point_count: [count as u32, 0, 0, 0],
            point_lights: packed,
        }
    }
}
