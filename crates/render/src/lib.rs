//! Rendering adapter: everything between the scene graph and a GPU backend
//! that can be exercised without a GPU.
//!
//! # Invariants
//! - Renderers never mutate the scene; they read a [`FrameSnapshot`].
//! - Camera aspect always equals the viewport's width / height after a
//!   resize, and the projection matrix is refreshed in the same call.
//! - Orbit controls are updated exactly once per frame, before extraction.

mod controls;
mod extract;
mod frame_loop;
mod renderer;
mod viewport;

pub use controls::{DragMode, OrbitControls};
pub use extract::{DirectionalLightData, DrawItem, FrameSnapshot};
pub use frame_loop::{FrameLoop, FrameScheduler, FrameTime, LoopState, ManualScheduler};
pub use renderer::{DebugTextRenderer, Renderer};
pub use viewport::{MAX_PIXEL_RATIO, SurfaceSize, Viewport};

pub fn crate_info() -> &'static str {
    "haunted-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
