//! Directional light: an infinitely distant light aimed from a position at a
//! target, with an optional orthographic shadow camera.

use glam::{Mat4, Vec3};

use crate::Color;

/// CPU-side directional light description.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    /// Linear RGB color of the light (not premultiplied by intensity).
    pub color: Color,
    /// Scalar intensity multiplier.
    pub intensity: f32,
    /// Where the light shines from. Only the direction to `target` matters for
    /// shading, but the shadow camera is placed here.
    pub position: Vec3,
    /// Point the light is aimed at.
    pub target: Vec3,
    /// Shadow camera, or `None` when the light casts no shadows.
    pub shadow: Option<DirectionalShadow>,
}

impl DirectionalLight {
    /// A light at `position` aimed at the origin, without shadows.
    pub fn new(color: Color, intensity: f32, position: Vec3) -> Self {
        Self {
            color,
            intensity,
            position,
            target: Vec3::ZERO,
            shadow: None,
        }
    }

    /// Attach a shadow camera.
    pub fn with_shadow(mut self, shadow: DirectionalShadow) -> Self {
        self.shadow = Some(shadow);
        self
    }

    /// Normalized direction the light travels (from position toward target).
    ///
    /// Falls back to straight down when position and target coincide.
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Y)
    }

    /// Light-space view-projection matrix of the shadow camera, if any.
    pub fn shadow_view_projection(&self) -> Option<Mat4> {
        self.shadow
            .as_ref()
            .map(|shadow| shadow.view_projection(self.position, self.target))
    }
}

/// Orthographic shadow camera for a [`DirectionalLight`].
#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalShadow {
    /// Shadow map resolution (width = height) in texels.
    pub map_size: u32,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
    /// Depth offset added to the receiver before comparison, in NDC depth units.
    pub bias: f32,
}

impl Default for DirectionalShadow {
    fn default() -> Self {
        Self {
            map_size: 512,
            left: -5.0,
            right: 5.0,
            bottom: -5.0,
            top: 5.0,
            near: 0.5,
            far: 500.0,
            bias: 0.0005,
        }
    }
}

impl DirectionalShadow {
    /// Symmetric square frustum of half-extent `extent`.
    pub fn square(map_size: u32, extent: f32, near: f32, far: f32) -> Self {
        Self {
            map_size: map_size.max(1),
            left: -extent,
            right: extent,
            bottom: -extent,
            top: extent,
            near,
            far,
            ..Self::default()
        }
    }

    /// View-projection matrix for a camera at `eye` looking at `target`.
    ///
    /// Reverse-Z: the near plane maps to depth 1.0 and the far plane to 0.0.
    pub fn view_projection(&self, eye: Vec3, target: Vec3) -> Mat4 {
        let forward = (target - eye).try_normalize().unwrap_or(Vec3::NEG_Y);
        let up = if forward.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
        let view = Mat4::look_at_rh(eye, eye + forward, up);
        let projection = Mat4::orthographic_rh(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.far,
            self.near,
        );
        projection * view
    }

    /// Size of one shadow texel in UV space.
    pub fn texel_size(&self) -> f32 {
        1.0 / self.map_size.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_light() -> DirectionalLight {
        DirectionalLight::new(Color::from_srgb_hex(0x86cdff), 1.0, Vec3::new(3.0, 2.0, -8.0))
            .with_shadow(DirectionalShadow::square(256, 8.0, 1.0, 20.0))
    }

    #[test]
    fn test_direction_points_at_target() {
        let light = scene_light();
        let dir = light.direction();
        assert!((dir.length() - 1.0).abs() < 1e-6);
        let expected = (-Vec3::new(3.0, 2.0, -8.0)).normalize();
        assert!(dir.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_degenerate_direction_falls_back() {
        let light = DirectionalLight::new(Color::WHITE, 1.0, Vec3::ZERO);
        assert_eq!(light.direction(), Vec3::NEG_Y);
    }

    #[test]
    fn test_shadow_depth_is_reverse_z() {
        let light = scene_light();
        let vp = light.shadow_view_projection().unwrap();
        let dir = light.direction();

        let near_point = vp.project_point3(light.position + dir * 1.0);
        let far_point = vp.project_point3(light.position + dir * 20.0);
        assert!((near_point.z - 1.0).abs() < 1e-4, "near depth {}", near_point.z);
        assert!(far_point.z.abs() < 1e-4, "far depth {}", far_point.z);
    }

    #[test]
    fn test_target_projects_to_center() {
        let light = scene_light();
        let vp = light.shadow_view_projection().unwrap();
        let ndc = vp.project_point3(Vec3::ZERO);
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_frustum_edges_map_to_ndc_bounds() {
        let light = scene_light();
        let vp = light.shadow_view_projection().unwrap();
        let forward = light.direction();
        let right = forward.cross(Vec3::Y).normalize();
        let edge = vp.project_point3(light.target + right * 8.0);
        assert!((edge.x.abs() - 1.0).abs() < 1e-4, "edge x {}", edge.x);
    }

    #[test]
    fn test_no_shadow_means_no_matrix() {
        let light = DirectionalLight::new(Color::WHITE, 1.0, Vec3::Y);
        assert!(light.shadow_view_projection().is_none());
    }

    #[test]
    fn test_texel_size() {
        let shadow = DirectionalShadow::square(256, 8.0, 1.0, 20.0);
        assert_eq!(shadow.texel_size(), 1.0 / 256.0);
    }
}
