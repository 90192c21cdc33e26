use haunted_scene::PerspectiveCamera;

/// Upper bound on the pixel ratio the renderer draws at, regardless of how
/// dense the display is.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Size of the drawing buffer in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

/// Logical window size plus the display's device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    width: u32,
    height: u32,
    device_pixel_ratio: f64,
}

impl Viewport {
    /// Zero dimensions (a minimised window) clamp to one pixel so the
    /// aspect ratio stays finite.
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            device_pixel_ratio: sanitize_ratio(device_pixel_ratio),
        }
    }

    /// Build from a physical window size and the platform scale factor.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let ratio = sanitize_ratio(scale_factor);
        Self::new(
            (width as f64 / ratio).round() as u32,
            (height as f64 / ratio).round() as u32,
            ratio,
        )
    }

    /// Logical size, as the renderer reports it.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    /// The ratio actually rendered at: `min(device_pixel_ratio, 2)`.
    pub fn pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio.min(MAX_PIXEL_RATIO)
    }

    pub fn surface_size(&self) -> SurfaceSize {
        let ratio = self.pixel_ratio();
        SurfaceSize {
            width: ((self.width as f64 * ratio).round() as u32).max(1),
            height: ((self.height as f64 * ratio).round() as u32).max(1),
        }
    }

    /// Apply a resize: store the new size, then update the camera aspect,
    /// then recompute its projection. The returned drawing-buffer size must
    /// be applied to the renderer before the next frame.
    pub fn resize(
        &mut self,
        width: u32,
        height: u32,
        device_pixel_ratio: f64,
        camera: &mut PerspectiveCamera,
    ) -> SurfaceSize {
        *self = Self::new(width, height, device_pixel_ratio);
        camera.aspect = self.aspect();
        camera.update_projection_matrix();
        let surface = self.surface_size();
        tracing::debug!(
            "viewport resized to {}x{} @{:.2} (surface {}x{})",
            self.width,
            self.height,
            self.pixel_ratio(),
            surface.width,
            surface.height
        );
        surface
    }
}

fn sanitize_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.0 { ratio } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    #[test]
    fn resize_updates_aspect_and_size() {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0);
        let mut viewport = Viewport::new(800, 600, 1.0);
        for (w, h) in [(1920, 1080), (640, 480), (300, 900), (1, 1)] {
            viewport.resize(w, h, 1.0, &mut camera);
            assert_eq!(camera.aspect, w as f32 / h as f32);
            assert_eq!(viewport.size(), (w, h));
        }
    }

    #[test]
    fn resize_refreshes_projection() {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0);
        let mut viewport = Viewport::new(100, 100, 1.0);
        viewport.resize(200, 100, 1.0, &mut camera);
        let expected = Mat4::perspective_rh(75f32.to_radians(), 2.0, 0.1, 100.0);
        assert_eq!(camera.projection_matrix(), expected);
    }

    #[test]
    fn pixel_ratio_is_capped_at_two() {
        assert_eq!(Viewport::new(10, 10, 3.0).pixel_ratio(), 2.0);
        assert_eq!(Viewport::new(10, 10, 2.0).pixel_ratio(), 2.0);
        assert_eq!(Viewport::new(10, 10, 1.5).pixel_ratio(), 1.5);
        assert_eq!(Viewport::new(10, 10, 1.0).pixel_ratio(), 1.0);
    }

    #[test]
    fn surface_size_uses_capped_ratio() {
        let mut camera = PerspectiveCamera::default();
        let mut viewport = Viewport::new(1, 1, 1.0);
        let surface = viewport.resize(1280, 720, 3.0, &mut camera);
        assert_eq!(surface, SurfaceSize { width: 2560, height: 1440 });
        assert_eq!(viewport.size(), (1280, 720));
    }

    #[test]
    fn zero_size_and_bad_ratio_are_clamped() {
        let viewport = Viewport::new(0, 0, f64::NAN);
        assert_eq!(viewport.size(), (1, 1));
        assert_eq!(viewport.pixel_ratio(), 1.0);
        assert!(viewport.aspect().is_finite());
    }

    #[test]
    fn from_physical_divides_scale_factor() {
        let viewport = Viewport::from_physical(3840, 2160, 3.0);
        assert_eq!(viewport.size(), (1280, 720));
        assert_eq!(viewport.device_pixel_ratio(), 3.0);
        assert_eq!(
            viewport.surface_size(),
            SurfaceSize {
                width: 2560,
                height: 1440
            }
        );
    }
}
