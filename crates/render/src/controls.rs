use glam::{Vec2, Vec3};
use haunted_common::Transform;
use haunted_scene::PerspectiveCamera;
use std::f32::consts::TAU;

const EPS: f32 = 1e-6;

/// What a pointer drag currently does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Rotate,
    Pan,
    /// Vertical motion dollies: down moves away, up moves closer.
    Dolly,
}

/// Damped orbit camera controller.
///
/// Pointer input accumulates spherical deltas and a pan offset; [`update`]
/// applies them to the camera transform around `target`. With damping on,
/// only a fraction of the accumulated motion is applied per update and the
/// remainder decays, so the camera keeps gliding after the pointer is
/// released.
///
/// [`update`]: OrbitControls::update
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Polar angle limits, radians from +Y.
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    delta_theta: f32,
    delta_phi: f32,
    pan_offset: Vec3,
    scale: f32,
    drag: Option<(DragMode, Vec2)>,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: std::f32::consts::PI,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
            drag: None,
        }
    }
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn with_damping(mut self) -> Self {
        self.enable_damping = true;
        self
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn pointer_down(&mut self, mode: DragMode, position: Vec2) {
        self.drag = Some((mode, position));
    }

    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    /// Feed a pointer position while dragging. `viewport_height` is the
    /// logical height of the canvas the pointer moves over.
    pub fn pointer_move(
        &mut self,
        position: Vec2,
        viewport_height: f32,
        camera: &PerspectiveCamera,
        transform: &Transform,
    ) {
        let Some((mode, last)) = self.drag else {
            return;
        };
        let delta = position - last;
        self.drag = Some((mode, position));
        let height = viewport_height.max(1.0);
        match mode {
            DragMode::Rotate => {
                let delta = delta * self.rotate_speed;
                self.rotate_left(TAU * delta.x / height);
                self.rotate_up(TAU * delta.y / height);
            }
            DragMode::Pan => {
                self.pan(delta * self.pan_speed, height, camera, transform);
            }
            DragMode::Dolly => self.wheel(delta.y),
        }
    }

    /// Mouse wheel: negative `delta_y` (scrolling up) moves closer.
    pub fn wheel(&mut self, delta_y: f32) {
        let zoom = 0.95_f32.powf(self.zoom_speed);
        if delta_y < 0.0 {
            self.scale *= zoom;
        } else if delta_y > 0.0 {
            self.scale /= zoom;
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Screen-space pan: a drag across the full viewport height moves the
    /// target by the visible height at the target's distance.
    pub fn pan(
        &mut self,
        delta: Vec2,
        viewport_height: f32,
        camera: &PerspectiveCamera,
        transform: &Transform,
    ) {
        let distance = (transform.position - self.target).length()
            * (camera.fov.to_radians() / 2.0).tan();
        let right = transform.rotation * Vec3::X;
        let up = transform.rotation * Vec3::Y;
        self.pan_offset -= right * (2.0 * delta.x * distance / viewport_height);
        self.pan_offset += up * (2.0 * delta.y * distance / viewport_height);
    }

    /// Apply accumulated input to the camera transform and decay it.
    /// Returns whether the camera moved. Call once per frame.
    pub fn update(&mut self, transform: &mut Transform) -> bool {
        let offset = transform.position - self.target;
        let mut radius = offset.length();
        let (mut theta, mut phi) = if radius < EPS {
            (0.0, 0.0)
        } else {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        };

        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        theta += self.delta_theta * step;
        phi += self.delta_phi * step;
        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, std::f32::consts::PI - EPS);

        self.target += self.pan_offset * step;
        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        let new_offset = Vec3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        let previous = *transform;
        transform.position = self.target + new_offset;
        transform.look_at(self.target);

        if self.enable_damping {
            let keep = 1.0 - self.damping_factor;
            self.delta_theta *= keep;
            self.delta_phi *= keep;
            self.pan_offset *= keep;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        previous.position.distance_squared(transform.position) > EPS
            || previous.rotation.dot(transform.rotation).abs() < 1.0 - EPS
    }
}
