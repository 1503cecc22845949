//! Orbit camera controls: rotate around a target, dolly with the wheel, and
//! pan in screen space, with optional inertial damping.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use haunted_scene::{Camera, CameraControls};
use tracing::trace;
use winit::event::MouseButton;

use crate::mouse::MouseState;

/// Keeps the polar angle off the poles, where the view direction is degenerate.
const POLAR_EPSILON: f32 = 1e-6;

/// Dolly factor per wheel line at unit zoom speed.
const ZOOM_BASE: f32 = 0.95;

/// Spherical coordinates around +Y: `theta` is the azimuth from +Z toward +X,
/// `phi` the polar angle from +Y.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Spherical {
    radius: f32,
    theta: f32,
    phi: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let ring = self.phi.sin() * self.radius;
        Vec3::new(
            ring * self.theta.sin(),
            self.phi.cos() * self.radius,
            ring * self.theta.cos(),
        )
    }
}

/// Camera controls that orbit a target point.
///
/// Left-drag rotates, the wheel dollies, and right-drag pans. Input only
/// queues motion; [`CameraControls::update`] applies it once per tick.
#[derive(Clone, Debug)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    /// Height of the render target in pixels, which scales drag input.
    viewport_height: f32,
    /// Pending (theta, phi) rotation.
    rotate_delta: (f32, f32),
    pan_offset: Vec3,
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            viewport_height: 1.0,
            rotate_delta: (0.0, 0.0),
            pan_offset: Vec3::ZERO,
            scale: 1.0,
        }
    }

    /// Damping factors outside `(0, 1]` disable damping.
    pub fn with_damping(mut self, enabled: bool, factor: f32) -> Self {
        let usable = factor > 0.0 && factor <= 1.0;
        self.enable_damping = enabled && usable;
        if usable {
            self.damping_factor = factor;
        }
        self
    }

    pub fn with_distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min.max(0.0);
        self.max_distance = max.max(self.min_distance);
        self
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height.max(1) as f32;
    }

    /// Queue rotation to the left by `angle` radians.
    pub fn rotate_left(&mut self, angle: f32) {
        self.rotate_delta.0 -= angle;
    }

    /// Queue rotation upward by `angle` radians.
    pub fn rotate_up(&mut self, angle: f32) {
        self.rotate_delta.1 -= angle;
    }

    /// Queue a move toward the target by `factor` (< 1 moves closer).
    pub fn dolly(&mut self, factor: f32) {
        if factor > 0.0 {
            self.scale *= factor;
        }
    }

    /// Queue a screen-space pan of `(dx, dy)` pixels.
    pub fn pan(&mut self, dx: f32, dy: f32, camera: &Camera) {
        let distance = (camera.position - self.target).length() * (camera.fov_y / 2.0).tan();
        let per_pixel = 2.0 * distance / self.viewport_height * self.pan_speed;
        self.pan_offset += camera.right() * (-dx * per_pixel) + camera.up() * (dy * per_pixel);
    }

    /// Translate this frame's mouse input into queued motion.
    pub fn handle_input(&mut self, mouse: &MouseState, camera: &Camera) {
        let delta = mouse.delta();
        if delta != glam::Vec2::ZERO {
            if mouse.is_button_pressed(MouseButton::Left) {
                let per_pixel = TAU * self.rotate_speed / self.viewport_height;
                self.rotate_left(delta.x * per_pixel);
                self.rotate_up(delta.y * per_pixel);
            } else if mouse.is_button_pressed(MouseButton::Right) {
                self.pan(delta.x, delta.y, camera);
            }
        }

        let scroll = mouse.scroll();
        if scroll != 0.0 {
            let step = ZOOM_BASE.powf(self.zoom_speed * scroll.abs());
            // Scrolling up moves in.
            self.dolly(if scroll > 0.0 { step } else { 1.0 / step });
        }
    }

    /// Distance from the camera to the target.
    pub fn distance(&self, camera: &Camera) -> f32 {
        (camera.position - self.target).length()
    }
}

impl CameraControls for OrbitControls {
    fn update(&mut self, camera: &mut Camera) {
        let mut spherical = Spherical::from_offset(camera.position - self.target);
        let (d_theta, d_phi) = self.rotate_delta;

        if self.enable_damping {
            spherical.theta += d_theta * self.damping_factor;
            spherical.phi += d_phi * self.damping_factor;
            self.target += self.pan_offset * self.damping_factor;
        } else {
            spherical.theta += d_theta;
            spherical.phi += d_phi;
            self.target += self.pan_offset;
        }

        spherical.phi = spherical
            .phi
            .max(self.min_polar_angle)
            .min(self.max_polar_angle)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        spherical.radius = (spherical.radius * self.scale)
            .max(self.min_distance)
            .min(self.max_distance);

        camera.position = self.target + spherical.to_offset();
        camera.look_at(self.target);

        if self.enable_damping {
            let keep = 1.0 - self.damping_factor;
            self.rotate_delta.0 *= keep;
            self.rotate_delta.1 *= keep;
            self.pan_offset *= keep;
        } else {
            self.rotate_delta = (0.0, 0.0);
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        trace!(
            radius = spherical.radius,
            theta = spherical.theta,
            phi = spherical.phi,
            "orbit update"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use winit::event::{ElementState, MouseScrollDelta};

    fn camera() -> Camera {
        let mut camera = Camera::perspective(
            Vec3::new(4.0, 2.0, 5.0),
            75f32.to_radians(),
            16.0 / 9.0,
            0.1,
            100.0,
        );
        camera.look_at(Vec3::ZERO);
        camera
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_spherical_roundtrip() {
        let offset = Vec3::new(4.0, 2.0, 5.0);
        let back = Spherical::from_offset(offset).to_offset();
        assert!(approx(offset, back), "{back:?}");
    }

    #[test]
    fn test_idle_update_keeps_camera() {
        let mut camera = camera();
        let before = camera.position;
        let mut controls = OrbitControls::default().with_damping(true, 0.05);
        for _ in 0..10 {
            controls.update(&mut camera);
        }
        assert!(approx(camera.position, before));
        assert!(camera.forward().dot((-before).normalize()) > 0.9999);
    }

    #[test]
    fn test_undamped_rotation_applies_at_once() {
        let mut camera = Camera::perspective(Vec3::new(0.0, 0.0, 5.0), 1.0, 1.0, 0.1, 100.0);
        let mut controls = OrbitControls::default();
        controls.rotate_left(-std::f32::consts::FRAC_PI_2);
        controls.update(&mut camera);
        assert!(approx(camera.position, Vec3::new(5.0, 0.0, 0.0)), "{:?}", camera.position);
        // Nothing left to apply.
        controls.update(&mut camera);
        assert!(approx(camera.position, Vec3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn test_damped_rotation_converges() {
        let mut camera = Camera::perspective(Vec3::new(0.0, 0.0, 5.0), 1.0, 1.0, 0.1, 100.0);
        let mut controls = OrbitControls::default().with_damping(true, 0.05);
        controls.rotate_left(-std::f32::consts::FRAC_PI_2);

        controls.update(&mut camera);
        let first = Spherical::from_offset(camera.position).theta;
        assert!((first - 0.05 * std::f32::consts::FRAC_PI_2).abs() < 1e-4);

        for _ in 0..1000 {
            controls.update(&mut camera);
        }
        assert!(approx(camera.position, Vec3::new(5.0, 0.0, 0.0)), "{:?}", camera.position);
    }

    #[test]
    fn test_rotation_keeps_distance() {
        let mut camera = camera();
        let mut controls = OrbitControls::default().with_damping(true, 0.05);
        let distance = controls.distance(&camera);
        controls.rotate_left(1.3);
        controls.rotate_up(0.4);
        for _ in 0..200 {
            controls.update(&mut camera);
            assert!((controls.distance(&camera) - distance).abs() < 1e-3);
        }
    }

    #[test]
    fn test_polar_angle_clamped() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();
        controls.rotate_up(10.0);
        controls.update(&mut camera);
        let phi = Spherical::from_offset(camera.position).phi;
        assert!(phi >= 0.0 && phi < 1e-3, "phi {phi}");
        assert!(camera.position.is_finite());

        controls.rotate_up(-10.0);
        controls.update(&mut camera);
        let phi = Spherical::from_offset(camera.position).phi;
        assert!(phi > PI - 1e-3, "phi {phi}");
    }

    #[test]
    fn test_custom_polar_limits() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();
        controls.max_polar_angle = std::f32::consts::FRAC_PI_2;
        controls.rotate_up(-3.0);
        controls.update(&mut camera);
        assert!(camera.position.y >= -1e-4, "camera went below the ground: {:?}", camera.position);
    }

    #[test]
    fn test_wheel_dollies_in_and_out() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();
        let start = controls.distance(&camera);

        let mut mouse = MouseState::new();
        mouse.on_scroll(MouseScrollDelta::LineDelta(0.0, 1.0));
        controls.handle_input(&mouse, &camera);
        controls.update(&mut camera);
        assert!((controls.distance(&camera) - start * 0.95).abs() < 1e-4);

        mouse.clear_transients();
        mouse.on_scroll(MouseScrollDelta::LineDelta(0.0, -1.0));
        controls.handle_input(&mouse, &camera);
        controls.update(&mut camera);
        assert!((controls.distance(&camera) - start).abs() < 1e-4);
    }

    #[test]
    fn test_distance_limits() {
        let mut camera = camera();
        let mut controls = OrbitControls::default().with_distance_limits(2.0, 10.0);
        controls.dolly(0.01);
        controls.update(&mut camera);
        assert!((controls.distance(&camera) - 2.0).abs() < 1e-4);
        controls.dolly(1000.0);
        controls.update(&mut camera);
        assert!((controls.distance(&camera) - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_left_drag_rotates_right_drag_pans() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();
        controls.set_viewport_height(720);
        let mut mouse = MouseState::new();
        mouse.on_cursor_moved(100.0, 100.0);

        mouse.on_button(MouseButton::Left, ElementState::Pressed);
        mouse.on_cursor_moved(200.0, 100.0);
        controls.handle_input(&mouse, &camera);
        controls.update(&mut camera);
        assert_eq!(controls.target, Vec3::ZERO);
        mouse.clear_transients();
        mouse.on_button(MouseButton::Left, ElementState::Released);

        mouse.on_button(MouseButton::Right, ElementState::Pressed);
        mouse.on_cursor_moved(150.0, 100.0);
        controls.handle_input(&mouse, &camera);
        controls.update(&mut camera);
        assert_ne!(controls.target, Vec3::ZERO);
        // Screen-space pan moves along the camera's right axis only.
        assert!(controls.target.dot(camera.forward()).abs() < 1e-4);
    }

    #[test]
    fn test_motion_without_buttons_ignored() {
        let mut camera = camera();
        let before = camera.position;
        let mut controls = OrbitControls::default();
        let mut mouse = MouseState::new();
        mouse.on_cursor_moved(0.0, 0.0);
        mouse.on_cursor_moved(300.0, 50.0);
        controls.handle_input(&mouse, &camera);
        controls.update(&mut camera);
        assert!(approx(camera.position, before));
    }

    #[test]
    fn test_invalid_damping_factor_disables_damping() {
        let controls = OrbitControls::default().with_damping(true, 0.0);
        assert!(!controls.enable_damping);
        let controls = OrbitControls::default().with_damping(true, 0.2);
        assert!(controls.enable_damping);
        assert_eq!(controls.damping_factor, 0.2);
    }

    proptest! {
        #[test]
        fn prop_camera_always_faces_target(
            left in -10.0f32..10.0,
            up in -10.0f32..10.0,
            ticks in 1usize..60,
        ) {
            let mut camera = camera();
            let mut controls = OrbitControls::default().with_damping(true, 0.05);
            controls.rotate_left(left);
            controls.rotate_up(up);
            for _ in 0..ticks {
                controls.update(&mut camera);
            }
            let to_target = (controls.target - camera.position).normalize();
            prop_assert!(camera.forward().dot(to_target) > 0.999);
            prop_assert!(camera.position.is_finite());
            prop_assert!((controls.distance(&camera) - 45f32.sqrt()).abs() < 1e-3);
        }
    }
}
