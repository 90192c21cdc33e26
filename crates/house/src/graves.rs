use glam::Vec3;
use haunted_common::SplitMix64;
use std::f32::consts::TAU;

/// Procedural grave scattering, off unless requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraveOptions {
    pub count: usize,
    pub seed: u64,
}

impl Default for GraveOptions {
    fn default() -> Self {
        Self { count: 50, seed: 42 }
    }
}

/// Where one grave goes and how it leans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravePlacement {
    pub position: Vec3,
    /// Lean around Y, radians.
    pub rotation_y: f32,
    /// Lean around Z, radians.
    pub rotation_z: f32,
}

/// Scatter graves in a ring around the house: uniform angle in `[0, 2π)`,
/// uniform radius in `[3, 9)`, and a lean of up to ±0.2 rad on Y and Z.
pub fn place_graves(options: GraveOptions) -> Vec<GravePlacement> {
    let mut rng = SplitMix64::new(options.seed);
    (0..options.count)
        .map(|_| {
            let angle = rng.next_f32() * TAU;
            let radius = 3.0 + rng.next_f32() * 6.0;
            let position = Vec3::new(angle.sin() * radius, 0.4, angle.cos() * radius);
            let rotation_y = (rng.next_f32() - 0.5) * 0.4;
            let rotation_z = (rng.next_f32() - 0.5) * 0.4;
            GravePlacement {
                position,
                rotation_y,
                rotation_z,
            }
        })
        .collect()
}
