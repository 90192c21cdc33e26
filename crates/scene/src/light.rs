use haunted_common::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightKind {
    /// Uniform light from every direction; position is ignored.
    Ambient,
    /// Parallel rays travelling from the node's position toward the origin.
    Directional,
}

/// A light emitter. Intensity is live state: the renderer re-reads it every
/// frame, so debug controls can write it directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f32,
}

impl Light {
    pub fn ambient(color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            color,
            intensity,
        }
    }

    pub fn directional(color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional,
            color,
            intensity,
        }
    }

    /// Linear color scaled by intensity.
    pub fn radiance(&self) -> [f32; 3] {
        self.color.to_linear().map(|c| c * self.intensity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radiance_scales_with_intensity() {
        let light = Light::ambient(Color::WHITE, 0.5);
        assert_eq!(light.radiance(), [0.5, 0.5, 0.5]);
        let off = Light::directional(Color::WHITE, 0.0);
        assert_eq!(off.radiance(), [0.0, 0.0, 0.0]);
    }
}
