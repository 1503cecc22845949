//! Point light: a localized light with inverse-square falloff and an optional
//! hard cutoff distance.
//!
//! The light's position lives on its scene node, so [`PointLight`] only
//! describes color, falloff and the optional [`PointShadow`] cube camera.
//! [`PointLightGpu`] pairs it with a world position for upload.

use std::f32::consts::FRAC_PI_2;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::Color;

/// Smallest squared distance used in the falloff, so the light stays finite at its center.
const MIN_DISTANCE_SQUARED: f32 = 0.01;

/// CPU-side point light descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    /// Linear RGB color.
    pub color: Color,
    /// Luminous intensity in candela.
    pub intensity: f32,
    /// Distance at which the contribution reaches zero. `0.0` means unbounded.
    pub distance: f32,
    /// Falloff exponent. `2.0` is physically correct.
    pub decay: f32,
    /// Cube shadow camera, or `None` when the light casts no shadows.
    pub shadow: Option<PointShadow>,
}

impl PointLight {
    /// A light with physically-based falloff and no cutoff distance.
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            distance: 0.0,
            decay: 2.0,
            shadow: None,
        }
    }

    /// Attach a cube shadow camera.
    pub fn with_shadow(mut self, shadow: PointShadow) -> Self {
        self.shadow = Some(shadow);
        self
    }

    /// Set the cutoff distance.
    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance = distance.max(0.0);
        self
    }

    /// Attenuation factor at `distance` from this light.
    pub fn attenuation(&self, distance: f32) -> f32 {
        distance_attenuation(distance, self.distance, self.decay)
    }

    /// Pack for the GPU with the light's world position.
    ///
    /// The shadow slot is left at `-1`; the lighting uniform assigns slots.
    pub fn to_gpu(&self, position: Vec3) -> PointLightGpu {
        PointLightGpu {
            position_distance: [position.x, position.y, position.z, self.distance],
            color_intensity: self.color.with_intensity(self.intensity),
            decay_shadow: [self.decay, NO_SHADOW_SLOT, 0.0, 0.0],
        }
    }
}

/// Shadow slot of a light without a cube map.
pub const NO_SHADOW_SLOT: f32 = -1.0;

/// Right, up and forward axes of each cube face, in layer order
/// +X, -X, +Y, -Y, +Z, -Z.
///
/// The axes follow the cube sampling rules, so a face rendered with them is
/// read back unchanged through a cube view. Each basis is mirrored
/// (right × up = forward), which reverses triangle winding.
const CUBE_FACE_BASES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::NEG_Z, Vec3::Y, Vec3::X),
    (Vec3::Z, Vec3::Y, Vec3::NEG_X),
    (Vec3::X, Vec3::NEG_Z, Vec3::Y),
    (Vec3::X, Vec3::Z, Vec3::NEG_Y),
    (Vec3::X, Vec3::Y, Vec3::Z),
    (Vec3::NEG_X, Vec3::Y, Vec3::NEG_Z),
];

/// Six 90° perspective cameras around a [`PointLight`], one per cube face.
#[derive(Clone, Debug, PartialEq)]
pub struct PointShadow {
    /// Resolution of each face (width = height) in texels.
    pub map_size: u32,
    pub near: f32,
    pub far: f32,
}

impl Default for PointShadow {
    fn default() -> Self {
        Self {
            map_size: 512,
            near: 0.5,
            far: 500.0,
        }
    }
}

impl PointShadow {
    pub fn new(map_size: u32, near: f32, far: f32) -> Self {
        Self {
            map_size: map_size.max(1),
            near,
            far,
        }
    }

    /// View-projection matrix of every face for a light at `position`.
    ///
    /// Reverse-Z: depth is 1.0 at `near` and 0.0 at `far` along the face axis.
    pub fn face_view_projections(&self, position: Vec3) -> [Mat4; 6] {
        let projection = Mat4::perspective_rh(FRAC_PI_2, 1.0, self.far, self.near);
        CUBE_FACE_BASES.map(|(right, up, forward)| {
            let view = Mat4::from_cols(
                Vec4::new(right.x, up.x, -forward.x, 0.0),
                Vec4::new(right.y, up.y, -forward.y, 0.0),
                Vec4::new(right.z, up.z, -forward.z, 0.0),
                Vec4::new(-right.dot(position), -up.dot(position), forward.dot(position), 1.0),
            );
            projection * view
        })
    }

    /// Depth stored for a point at `offset` from the light by the face that sees it.
    ///
    /// Only the major axis of `offset` matters. Points at or past `far` give 0.0.
    pub fn depth(&self, offset: Vec3) -> f32 {
        let axis = offset.abs().max_element();
        if axis >= self.far {
            return 0.0;
        }
        let scale = self.near / (self.far - self.near);
        scale * (self.far - axis) / axis.max(f32::EPSILON)
    }
}

/// Attenuation at `distance` from a point light.
///
/// Falls off as `1 / d^decay`. With a positive `cutoff` the falloff is
/// multiplied by the window `clamp(1 - (d/cutoff)^4, 0, 1)^2`, which reaches
/// exactly zero at the cutoff.
pub fn distance_attenuation(distance: f32, cutoff: f32, decay: f32) -> f32 {
    let falloff = 1.0 / distance.powf(decay).max(MIN_DISTANCE_SQUARED);
    if cutoff > 0.0 {
        let ratio = distance / cutoff;
        let window = (1.0 - ratio.powi(4)).clamp(0.0, 1.0);
        falloff * window * window
    } else {
        falloff
    }
}

/// Per-light GPU data, 48 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct PointLightGpu {
    /// xyz = world position, w = cutoff distance.
    pub position_distance: [f32; 4],
    /// xyz = color (linear RGB), w = intensity.
    pub color_intensity: [f32; 4],
    /// x = decay exponent, y = shadow slot or `-1`, z = shadow near, w = shadow far.
    pub decay_shadow: [f32; 4],
}
