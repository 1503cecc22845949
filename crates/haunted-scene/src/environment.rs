//! Scene-wide environment: exponential fog and the Preetham scattering sky.

use glam::Vec3;
use haunted_lighting::Color;

/// Exponential-squared distance fog.
#[derive(Clone, Debug, PartialEq)]
pub struct FogExp2 {
    pub color: Color,
    pub density: f32,
}

impl FogExp2 {
    pub fn new(color: Color, density: f32) -> Self {
        Self {
            color,
            density: density.max(0.0),
        }
    }

    /// Blend weight toward the fog color at view-space `depth`.
    pub fn factor(&self, depth: f32) -> f32 {
        let d = self.density * depth;
        (1.0 - (-d * d).exp()).clamp(0.0, 1.0)
    }
}

/// Rayleigh scattering coefficients at sea level for the primaries (per meter).
const TOTAL_RAYLEIGH: Vec3 = Vec3::new(5.804_542_996_261_093e-6, 1.356_291_141_984_563_5e-5, 3.026_590_246_882_487_6e-5);
/// Mie scattering constant per primary, folded with the wavelength terms.
const MIE_CONST: Vec3 = Vec3::new(1.839_991_851_443_397_8e14, 2.779_802_391_966_052_8e14, 4.079_047_954_386_109_4e14);
/// Zenith angle past which the sun stops lighting the sky (about 92.3 degrees).
const SUN_CUTOFF_ANGLE: f32 = 1.611_073_155_687_073_4;
const SUN_STEEPNESS: f32 = 1.5;
const SUN_MAX_INTENSITY: f32 = 1000.0;

/// Parameters of the analytic daylight sky.
#[derive(Clone, Debug, PartialEq)]
pub struct Sky {
    /// Haziness of the atmosphere. Higher values scatter more.
    pub turbidity: f32,
    /// Strength of Rayleigh scattering.
    pub rayleigh: f32,
    /// Strength of Mie scattering.
    pub mie_coefficient: f32,
    /// Henyey-Greenstein asymmetry of Mie scattering around the sun.
    pub mie_directional_g: f32,
    /// Sun position; only its direction and height matter.
    pub sun_position: Vec3,
    pub up: Vec3,
}

impl Default for Sky {
    fn default() -> Self {
        Self {
            turbidity: 2.0,
            rayleigh: 1.0,
            mie_coefficient: 0.005,
            mie_directional_g: 0.8,
            sun_position: Vec3::new(0.0, 1.0, 0.0),
            up: Vec3::Y,
        }
    }
}

/// Sun-dependent sky terms, computed once per sky change instead of per pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkyScattering {
    pub sun_direction: Vec3,
    pub sun_intensity: f32,
    pub sun_fade: f32,
    pub beta_rayleigh: Vec3,
    pub beta_mie: Vec3,
}

impl Sky {
    /// Derive the scattering terms for the current sun position.
    pub fn scattering(&self) -> SkyScattering {
        let sun_direction = self.sun_position.try_normalize().unwrap_or(self.up);
        let sun_intensity = sun_intensity(sun_direction.dot(self.up));
        let sun_fade = 1.0 - (1.0 - (self.sun_position.y / 450_000.0).exp()).clamp(0.0, 1.0);
        let rayleigh_coefficient = self.rayleigh - (1.0 - sun_fade);

        SkyScattering {
            sun_direction,
            sun_intensity,
            sun_fade,
            beta_rayleigh: TOTAL_RAYLEIGH * rayleigh_coefficient,
            beta_mie: total_mie(self.turbidity) * self.mie_coefficient,
        }
    }
}

/// Sun brightness for the cosine of its zenith angle.
fn sun_intensity(zenith_angle_cos: f32) -> f32 {
    let zenith_angle = zenith_angle_cos.clamp(-1.0, 1.0).acos();
    SUN_MAX_INTENSITY * (1.0 - (-((SUN_CUTOFF_ANGLE - zenith_angle) / SUN_STEEPNESS)).exp()).max(0.0)
}

/// Total Mie scattering for the given turbidity.
fn total_mie(turbidity: f32) -> Vec3 {
    let concentration = 0.2 * turbidity * 1.0e-17;
    MIE_CONST * (0.434 * concentration)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn haunted_sky() -> Sky {
        Sky {
            turbidity: 10.0,
            rayleigh: 3.0,
            mie_coefficient: 0.1,
            mie_directional_g: 0.95,
            sun_position: Vec3::new(0.3, -0.038, -0.95),
            up: Vec3::Y,
        }
    }

    #[test]
    fn test_fog_factor_at_reference_points() {
        let fog = FogExp2::new(Color::from_srgb_hex(0x02343f), 0.1);
        assert_eq!(fog.factor(0.0), 0.0);
        let expected = 1.0 - (-1.0f32).exp();
        assert!((fog.factor(10.0) - expected).abs() < 1e-6);
        assert!(fog.factor(100.0) > 0.9999);
    }

    #[test]
    fn test_zero_density_never_fogs() {
        let fog = FogExp2::new(Color::BLACK, 0.0);
        assert_eq!(fog.factor(1.0e6), 0.0);
    }

    #[test]
    fn test_negative_density_clamped() {
        assert_eq!(FogExp2::new(Color::BLACK, -1.0).density, 0.0);
    }

    #[test]
    fn test_overhead_sun_intensity() {
        let expected = 1000.0 * (1.0 - (-(SUN_CUTOFF_ANGLE / 1.5)).exp());
        assert!((sun_intensity(1.0) - expected).abs() < 1e-2);
    }

    #[test]
    fn test_sun_below_cutoff_is_dark() {
        assert_eq!(sun_intensity(-0.5), 0.0);
        assert_eq!(sun_intensity(-1.0), 0.0);
    }

    #[test]
    fn test_sun_intensity_rises_with_elevation() {
        let low = sun_intensity(0.0);
        let high = sun_intensity(0.7);
        assert!(low > 0.0 && high > low);
    }

    #[test]
    fn test_haunted_sky_sun_just_below_horizon() {
        let s = haunted_sky().scattering();
        assert!((s.sun_direction.length() - 1.0).abs() < 1e-6);
        assert!(s.sun_direction.y < 0.0);
        // Still inside the cutoff, so a faint glow remains.
        assert!(s.sun_intensity > 0.0 && s.sun_intensity < 10.0, "{}", s.sun_intensity);
    }

    #[test]
    fn test_rayleigh_scales_with_coefficient() {
        let s = haunted_sky().scattering();
        // Sun fade is ~1 for a sun near the horizon, so the coefficient is ~3.
        assert!((s.sun_fade - 1.0).abs() < 1e-4);
        let ratio = s.beta_rayleigh.z / TOTAL_RAYLEIGH.z;
        assert!((ratio - 3.0).abs() < 1e-3, "ratio {ratio}");
        // Blue scatters more than red.
        assert!(s.beta_rayleigh.z > s.beta_rayleigh.x);
    }

    #[test]
    fn test_mie_scales_with_turbidity() {
        let a = total_mie(2.0);
        let b = total_mie(10.0);
        assert!((b.x / a.x - 5.0).abs() < 1e-3);
    }
}
