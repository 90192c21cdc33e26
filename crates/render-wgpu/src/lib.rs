//! wgpu render backend for the haunted house.
//!
//! Draws every mesh in a [`FrameSnapshot`](haunted_render::FrameSnapshot)
//! with ambient plus directional lighting and optional texture maps.
//!
//! # Invariants
//! - Renderer never mutates scene state.
//! - The scene is rendered at the viewport's drawing-buffer size, not the
//!   window's physical size; the result is scaled onto the surface.
//! - Opaque meshes are drawn before transparent ones.

mod gpu;
mod resources;
mod shaders;
mod surface;

use haunted_common::{GeometryHandle, MaterialHandle};

pub use gpu::WgpuRenderer;
pub use surface::GpuContext;

/// Errors from the GPU backend.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("geometry {0:?} was drawn before being uploaded")]
    MissingGeometry(GeometryHandle),
    #[error("material {0:?} was drawn before being uploaded")]
    MissingMaterial(MaterialHandle),
}
