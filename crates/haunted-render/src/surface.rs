//! Window surface sizing with a capped pixel ratio.
//!
//! The window reports its size in physical pixels. The scene renders at the
//! logical size times `min(scale_factor, max_pixel_ratio)`, so very dense
//! displays do not multiply the fragment cost without bound.

/// Minimum surface dimension (prevents zero-size panics).
pub const MIN_SURFACE_DIMENSION: u32 = 1;

/// Pixel dimensions of a surface or render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicalSize {
    pub width: u32,
    pub height: u32,
}

impl PhysicalSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(MIN_SURFACE_DIMENSION),
            height: height.max(MIN_SURFACE_DIMENSION),
        }
    }

    /// Width over height.
    pub fn aspect_ratio(self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Event produced when the window size or scale factor changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceResizeEvent {
    /// Window size in physical pixels.
    pub physical: PhysicalSize,
    /// Size the scene renders at.
    pub render: PhysicalSize,
    /// Current scale factor.
    pub scale_factor: f64,
}

/// Tracks the window's physical size and scale factor and derives the
/// render size from them.
#[derive(Clone, Debug)]
pub struct SurfaceWrapper {
    physical: PhysicalSize,
    scale_factor: f64,
    max_pixel_ratio: f64,
    /// False until the compositor reports a non-zero size.
    configured: bool,
}

impl SurfaceWrapper {
    /// Zero dimensions (common on Wayland before the first configure) are
    /// clamped to 1 and leave the wrapper unconfigured.
    pub fn new(physical_width: u32, physical_height: u32, scale_factor: f64, max_pixel_ratio: f64) -> Self {
        Self {
            physical: PhysicalSize::new(physical_width, physical_height),
            scale_factor: sanitize_scale(scale_factor),
            max_pixel_ratio: sanitize_scale(max_pixel_ratio),
            configured: physical_width > 0 && physical_height > 0,
        }
    }

    /// Handle a window resize. Returns an event only when the size changed.
    pub fn handle_resize(&mut self, physical_width: u32, physical_height: u32) -> Option<SurfaceResizeEvent> {
        let physical = PhysicalSize::new(physical_width, physical_height);
        if physical == self.physical && self.configured {
            return None;
        }
        self.physical = physical;
        self.configured = true;
        Some(self.event())
    }

    /// Handle a scale factor change. The render size depends on the scale
    /// factor, so an event is always returned.
    pub fn handle_scale_factor_changed(
        &mut self,
        scale_factor: f64,
        physical_width: u32,
        physical_height: u32,
    ) -> SurfaceResizeEvent {
        self.scale_factor = sanitize_scale(scale_factor);
        self.physical = PhysicalSize::new(physical_width, physical_height);
        self.configured = true;
        self.event()
    }

    pub fn physical_size(&self) -> PhysicalSize {
        self.physical
    }

    /// Logical width and height (physical / scale factor).
    pub fn logical_size(&self) -> (f64, f64) {
        (
            f64::from(self.physical.width) / self.scale_factor,
            f64::from(self.physical.height) / self.scale_factor,
        )
    }

    /// The scale factor after the pixel ratio cap.
    pub fn pixel_ratio(&self) -> f64 {
        self.scale_factor.min(self.max_pixel_ratio)
    }

    /// Size the scene renders at: logical size times the capped pixel ratio.
    pub fn render_size(&self) -> PhysicalSize {
        if self.pixel_ratio() >= self.scale_factor {
            return self.physical;
        }
        let (w, h) = self.logical_size();
        let ratio = self.pixel_ratio();
        PhysicalSize::new((w * ratio).round() as u32, (h * ratio).round() as u32)
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    fn event(&self) -> SurfaceResizeEvent {
        SurfaceResizeEvent {
            physical: self.physical,
            render: self.render_size(),
            scale_factor: self.scale_factor,
        }
    }
}

fn sanitize_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 { scale } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_size_matches_physical_below_cap() {
        let surface = SurfaceWrapper::new(2560, 1440, 2.0, 2.0);
        assert_eq!(surface.render_size(), PhysicalSize::new(2560, 1440));
        assert_eq!(surface.logical_size(), (1280.0, 720.0));
    }

    #[test]
    fn test_render_size_capped_on_dense_displays() {
        let surface = SurfaceWrapper::new(3840, 2160, 3.0, 2.0);
        assert_eq!(surface.pixel_ratio(), 2.0);
        assert_eq!(surface.render_size(), PhysicalSize::new(2560, 1440));
    }

    #[test]
    fn test_zero_size_clamped_and_unconfigured() {
        let surface = SurfaceWrapper::new(0, 0, 1.0, 2.0);
        assert_eq!(surface.physical_size(), PhysicalSize::new(1, 1));
        assert!(!surface.is_configured());
    }

    #[test]
    fn test_resize_reports_only_changes() {
        let mut surface = SurfaceWrapper::new(800, 600, 1.0, 2.0);
        assert!(surface.handle_resize(800, 600).is_none());
        let event = surface.handle_resize(1024, 768).unwrap();
        assert_eq!(event.physical, PhysicalSize::new(1024, 768));
        assert_eq!(event.render, PhysicalSize::new(1024, 768));
    }

    #[test]
    fn test_first_real_size_configures() {
        let mut surface = SurfaceWrapper::new(0, 0, 1.0, 2.0);
        let event = surface.handle_resize(640, 480);
        assert!(event.is_some());
        assert!(surface.is_configured());
    }

    #[test]
    fn test_scale_change_updates_render_size() {
        let mut surface = SurfaceWrapper::new(1280, 720, 1.0, 2.0);
        let event = surface.handle_scale_factor_changed(4.0, 5120, 2880);
        assert_eq!(event.render, PhysicalSize::new(2560, 1440));
        assert_eq!(event.scale_factor, 4.0);
    }

    #[test]
    fn test_invalid_scale_falls_back_to_one() {
        let surface = SurfaceWrapper::new(100, 100, 0.0, f64::NAN);
        assert_eq!(surface.scale_factor(), 1.0);
        assert_eq!(surface.pixel_ratio(), 1.0);
    }

    #[test]
    fn test_aspect_ratio() {
        assert!((PhysicalSize::new(1600, 900).aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);
    }
}
