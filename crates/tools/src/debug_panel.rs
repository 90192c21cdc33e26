use haunted_common::NodeId;
use haunted_scene::{Scene, SceneError};

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("no control at index {0}")]
    UnknownControl(usize),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// The live scene field a slider reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundField {
    Intensity(NodeId),
    PositionX(NodeId),
    PositionY(NodeId),
    PositionZ(NodeId),
}

impl BoundField {
    pub fn node(&self) -> NodeId {
        match *self {
            Self::Intensity(id) | Self::PositionX(id) | Self::PositionY(id) | Self::PositionZ(id) => id,
        }
    }
}

/// One numeric slider bound to a scene field.
#[derive(Debug, Clone, PartialEq)]
pub struct SliderControl {
    pub label: String,
    pub min: f32,
    pub max: f32,
    /// Granularity the UI widget moves in. Programmatic writes are not
    /// snapped to it.
    pub step: f32,
    pub field: BoundField,
}

impl SliderControl {
    pub fn new(label: impl Into<String>, field: BoundField, min: f32, max: f32, step: f32) -> Self {
        Self {
            label: label.into(),
            min,
            max,
            step,
            field,
        }
    }
}

/// Ordered set of slider controls over live scene state.
#[derive(Debug, Clone, Default)]
pub struct DebugPanel {
    controls: Vec<SliderControl>,
}

impl DebugPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// The five light controls: ambient intensity, moon intensity, and the
    /// moon position on each axis.
    pub fn for_lights(ambient: NodeId, moon: NodeId) -> Self {
        let mut panel = Self::new();
        panel.add(SliderControl::new(
            "ambient intensity",
            BoundField::Intensity(ambient),
            0.0,
            1.0,
            0.001,
        ));
        panel.add(SliderControl::new(
            "moon intensity",
            BoundField::Intensity(moon),
            0.0,
            1.0,
            0.001,
        ));
        panel.add(SliderControl::new("moon x", BoundField::PositionX(moon), -5.0, 5.0, 0.001));
        panel.add(SliderControl::new("moon y", BoundField::PositionY(moon), -5.0, 5.0, 0.001));
        panel.add(SliderControl::new("moon z", BoundField::PositionZ(moon), -5.0, 5.0, 0.001));
        panel
    }

    pub fn add(&mut self, control: SliderControl) -> usize {
        self.controls.push(control);
        self.controls.len() - 1
    }

    pub fn controls(&self) -> &[SliderControl] {
        &self.controls
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Read the live value behind control `index`.
    pub fn get(&self, scene: &Scene, index: usize) -> Result<f32, PanelError> {
        let control = self.control(index)?;
        Ok(match control.field {
            BoundField::Intensity(id) => scene.light(id)?.intensity,
            BoundField::PositionX(id) => scene.transform(id)?.position.x,
            BoundField::PositionY(id) => scene.transform(id)?.position.y,
            BoundField::PositionZ(id) => scene.transform(id)?.position.z,
        })
    }

    /// Clamp `value` to the control's range and write it into the scene.
    /// Returns the value written.
    pub fn set(&self, scene: &mut Scene, index: usize, value: f32) -> Result<f32, PanelError> {
        let control = self.control(index)?;
        let value = if value.is_nan() {
            control.min
        } else {
            value.clamp(control.min, control.max)
        };
        match control.field {
            BoundField::Intensity(id) => scene.light_mut(id)?.intensity = value,
            BoundField::PositionX(id) => scene.transform_mut(id)?.position.x = value,
            BoundField::PositionY(id) => scene.transform_mut(id)?.position.y = value,
            BoundField::PositionZ(id) => scene.transform_mut(id)?.position.z = value,
        }
        tracing::debug!("{} = {value}", control.label);
        Ok(value)
    }

    fn control(&self, index: usize) -> Result<&SliderControl, PanelError> {
        self.controls
            .get(index)
            .ok_or(PanelError::UnknownControl(index))
    }
}
