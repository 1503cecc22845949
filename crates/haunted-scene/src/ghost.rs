//! Ghost orbits: circular paths around the house with a per-ghost vertical wobble.

use glam::Vec3;

/// Circular path of one ghost light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GhostOrbit {
    /// Radians per second. Negative values orbit clockwise seen from above.
    pub angular_speed: f64,
    /// Horizontal distance from the origin.
    pub radius: f64,
    /// Frequencies of the sines multiplied together for the height.
    pub wobble: &'static [f64],
}

/// The three ghosts, innermost first.
pub const GHOST_ORBITS: [GhostOrbit; 3] = [
    GhostOrbit {
        angular_speed: 0.5,
        radius: 4.0,
        wobble: &[1.0, 2.4, 0.8],
    },
    GhostOrbit {
        angular_speed: -0.32,
        radius: 5.0,
        wobble: &[1.5, 1.5],
    },
    GhostOrbit {
        angular_speed: -0.18,
        radius: 6.0,
        wobble: &[0.5, 2.0],
    },
];

impl GhostOrbit {
    /// Position at elapsed time `t` seconds.
    pub fn position(&self, t: f64) -> Vec3 {
        let angle = self.angular_speed * t;
        let height: f64 = self.wobble.iter().map(|frequency| (frequency * t).sin()).product();
        Vec3::new(
            (angle.cos() * self.radius) as f32,
            height as f32,
            (angle.sin() * self.radius) as f32,
        )
    }
}

/// Positions of all three ghosts at time `t`.
pub fn ghost_positions(t: f64) -> [Vec3; 3] {
    GHOST_ORBITS.map(|orbit| orbit.position(t))
}
