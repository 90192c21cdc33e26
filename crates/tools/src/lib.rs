//! Developer tooling: live light controls and scene inspector.
//!
//! # Invariants
//! - Debug controls write straight into the scene; there is no shadow copy
//!   of light state that could drift from what the renderer reads.
//! - The inspector is read-only.

mod debug_panel;
mod inspector;

pub use debug_panel::{BoundField, DebugPanel, PanelError, SliderControl};
pub use inspector::{NodeInfo, SceneInspector, SceneSummary};

pub fn crate_info() -> &'static str {
    "haunted-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
