//! sRGB hex colors converted to linear RGB.

use glam::Vec3;

/// Linear RGB color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color(pub Vec3);

impl Color {
    pub const WHITE: Self = Self(Vec3::ONE);
    pub const BLACK: Self = Self(Vec3::ZERO);

    /// Build a linear color from a `0xRRGGBB` sRGB value.
    pub fn from_srgb_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xff) as f32 / 255.0;
        let g = ((hex >> 8) & 0xff) as f32 / 255.0;
        let b = (hex & 0xff) as f32 / 255.0;
        Self(Vec3::new(
            srgb_to_linear(r),
            srgb_to_linear(g),
            srgb_to_linear(b),
        ))
    }

    /// Linear RGB components.
    pub fn linear(self) -> Vec3 {
        self.0
    }

    /// Linear RGB with `intensity` carried in `w` for the shader to apply.
    pub fn with_intensity(self, intensity: f32) -> [f32; 4] {
        [self.0.x, self.0.y, self.0.z, intensity]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Convert one sRGB-encoded channel in `[0, 1]` to linear.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_unchanged() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_mid_grey_is_darker_in_linear() {
        let linear = srgb_to_linear(0.5);
        assert!((linear - 0.2140).abs() < 1e-3, "got {linear}");
    }

    #[test]
    fn test_hex_channels_extracted() {
        let c = Color::from_srgb_hex(0xff0000);
        assert_eq!(c.linear(), Vec3::new(1.0, 0.0, 0.0));
        let c = Color::from_srgb_hex(0x00ffff);
        assert_eq!(c.linear(), Vec3::new(0.0, 1.0, 1.0));
    }
}
