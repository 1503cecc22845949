//! Perspective camera producing reverse-Z view and projection matrices.

use glam::{Mat3, Mat4, Quat, Vec3};

/// A perspective camera.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Position in world space.
    pub position: Vec3,
    /// Rotation as a unit quaternion. Identity looks down -Z with +Y up.
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    /// Near clip plane distance (always positive).
    pub near: f32,
    /// Far clip plane distance (always positive, > near).
    pub far: f32,
}

impl Camera {
    /// Create a camera at `position` with the given projection, looking down -Z.
    pub fn perspective(position: Vec3, fov_y: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            fov_y,
            aspect_ratio,
            near,
            far,
        }
    }

    /// Rotate the camera so it faces `target`, keeping +Y as up.
    ///
    /// Looking straight up or down uses +Z as the reference up vector.
    /// A target at the camera position leaves the rotation unchanged.
    pub fn look_at(&mut self, target: Vec3) {
        let Some(forward) = (target - self.position).try_normalize() else {
            return;
        };
        let reference_up = if forward.cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let right = forward.cross(reference_up).normalize();
        let up = right.cross(forward);
        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, up, -forward)).normalize();
    }

    /// Compute the view matrix (inverse of camera transform).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    /// Compute the projection matrix with reverse-Z: near maps to depth 1, far to 0.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.far, self.near)
    }

    /// Compute the combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// The forward direction vector (-Z in camera space).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// The up direction vector (+Y in camera space).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// The right direction vector (+X in camera space).
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Update the aspect ratio. Zero-sized dimensions are ignored.
    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect_ratio = width / height;
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(
            Vec3::ZERO,
            75f32.to_radians(),
            16.0 / 9.0,
            0.1,
            100.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_camera_looks_down_neg_z() {
        let camera = Camera::default();
        assert!(camera.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!(camera.up().abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn test_aspect_ratio_updates() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(1920.0, 1080.0);
        assert!((camera.aspect_ratio - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_height_keeps_aspect_ratio() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(800.0, 600.0);
        camera.set_aspect_ratio(800.0, 0.0);
        assert!((camera.aspect_ratio - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_look_at_faces_target() {
        let mut camera = Camera {
            position: Vec3::new(4.0, 2.0, 5.0),
            ..Camera::default()
        };
        camera.look_at(Vec3::ZERO);
        let expected = (-camera.position).normalize();
        assert!(camera.forward().abs_diff_eq(expected, 1e-5));
        // Right vector stays horizontal.
        assert!(camera.right().y.abs() < 1e-5);
        assert!(camera.up().y > 0.0);
    }

    #[test]
    fn test_look_at_straight_down_is_stable() {
        let mut camera = Camera {
            position: Vec3::new(0.0, 10.0, 0.0),
            ..Camera::default()
        };
        camera.look_at(Vec3::ZERO);
        assert!(camera.forward().abs_diff_eq(Vec3::NEG_Y, 1e-5));
        assert!(camera.rotation.is_finite());
    }

    #[test]
    fn test_look_at_own_position_is_noop() {
        let mut camera = Camera::default();
        let before = camera.rotation;
        camera.look_at(camera.position);
        assert_eq!(camera.rotation, before);
    }

    #[test]
    fn test_view_matrix_inverse_is_camera_transform() {
        let camera = Camera {
            position: Vec3::new(10.0, 20.0, 30.0),
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            ..Camera::default()
        };
        let reconstructed = camera.view_matrix().inverse().col(3).truncate();
        assert!((reconstructed - camera.position).length() < 1e-4);
    }

    #[test]
    fn test_reverse_z_depth_range() {
        let camera = Camera::default();
        let vp = camera.view_projection_matrix();
        let near = vp.project_point3(Vec3::new(0.0, 0.0, -camera.near));
        let far = vp.project_point3(Vec3::new(0.0, 0.0, -camera.far));
        assert!((near.z - 1.0).abs() < 1e-4, "near depth {}", near.z);
        assert!(far.z.abs() < 1e-4, "far depth {}", far.z);
    }
}
