use haunted_assets::TextureMaps;
use haunted_common::Color;
use serde::{Deserialize, Serialize};

/// Which faces of a mesh are drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Front,
    Double,
}

/// Physically-based surface description: a base color, optional texture
/// maps, and the flat roughness/metalness the maps modulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub color: Color,
    pub maps: TextureMaps,
    pub roughness: f32,
    pub metalness: f32,
    pub side: Side,
    /// Blend with what is behind instead of overwriting it. Needed for
    /// alpha maps to have any effect.
    pub transparent: bool,
}

impl Material {
    pub fn standard(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
            maps: TextureMaps::default(),
            roughness: 1.0,
            metalness: 0.0,
            side: Side::Front,
            transparent: false,
        }
    }

    pub fn with_maps(mut self, maps: TextureMaps) -> Self {
        self.maps = maps;
        self
    }

    pub fn double_sided(mut self) -> Self {
        self.side = Side::Double;
        self
    }

    pub fn transparent(mut self) -> Self {
        self.transparent = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_defaults() {
        let m = Material::standard("roof", Color::hex(0xb35f45));
        assert_eq!(m.side, Side::Front);
        assert!(!m.transparent);
        assert!(m.maps.is_empty());
        assert_eq!(m.roughness, 1.0);
    }

    #[test]
    fn builders_compose() {
        let m = Material::standard("floor", Color::hex(0xa9c388))
            .double_sided()
            .transparent();
        assert_eq!(m.side, Side::Double);
        assert!(m.transparent);
    }
}
