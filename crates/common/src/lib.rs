//! Shared types for the haunted house workspace: node ids, transforms,
//! colors, resource handles and the deterministic random source.

pub mod random;
pub mod types;

pub use random::SplitMix64;
pub use types::{Color, GeometryHandle, MaterialHandle, NodeId, TextureHandle, Transform};
