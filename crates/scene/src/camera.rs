use glam::Mat4;
use serde::{Deserialize, Serialize};

/// Perspective projection parameters with a cached projection matrix.
///
/// Changing `fov`, `aspect`, `near` or `far` has no visible effect until
/// [`update_projection_matrix`](Self::update_projection_matrix) is called.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far);
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(75.0, 16.0 / 9.0, 0.1, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_is_cached_until_updated() {
        let mut cam = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0);
        let before = cam.projection_matrix();
        cam.aspect = 2.0;
        assert_eq!(cam.projection_matrix(), before);
        cam.update_projection_matrix();
        assert_ne!(cam.projection_matrix(), before);
    }

    #[test]
    fn aspect_scales_horizontal_focal_length() {
        let mut cam = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0);
        let square = cam.projection_matrix().col(0).x;
        cam.aspect = 2.0;
        cam.update_projection_matrix();
        let wide = cam.projection_matrix().col(0).x;
        assert!((square / wide - 2.0).abs() < 1e-5);
        assert!(!cam.projection_matrix().col(1).y.is_nan());
    }
}
