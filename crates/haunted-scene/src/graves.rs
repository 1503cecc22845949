//! Random grave layout in a ring around the house.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;

/// Inner radius of the graveyard ring.
const INNER_RADIUS: f32 = 3.5;
/// Width of the ring.
const RING_WIDTH: f32 = 4.0;
/// Graves sink or rise by up to this much.
const MAX_HEIGHT: f32 = 0.4;
/// Full range of the tilt on each axis, centred on zero.
const TILT_RANGE: f32 = 0.4;

/// Where one grave stands and how it leans.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GravePlacement {
    pub position: Vec3,
    /// XYZ Euler angles in radians.
    pub rotation: Vec3,
}

/// Scatter `count` graves with six draws each, in the order angle, radius,
/// height, then the three tilt angles.
pub fn scatter_graves<R: Rng + ?Sized>(count: u32, rng: &mut R) -> Vec<GravePlacement> {
    (0..count)
        .map(|_| {
            let angle = rng.random::<f32>() * TAU;
            let radius = INNER_RADIUS + rng.random::<f32>() * RING_WIDTH;
            let position = Vec3::new(
                angle.sin() * radius,
                rng.random::<f32>() * MAX_HEIGHT,
                angle.cos() * radius,
            );
            let mut tilt = || (rng.random::<f32>() - 0.5) * TILT_RANGE;
            let rotation = Vec3::new(tilt(), tilt(), tilt());
            GravePlacement { position, rotation }
        })
        .collect()
}
