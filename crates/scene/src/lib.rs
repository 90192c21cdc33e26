//! Scene graph: a tree of transformable nodes composed into the renderable
//! world.
//!
//! # Invariants
//! - Every node except the root has exactly one parent.
//! - The root is owned by the [`Scene`] for its whole lifetime.
//! - Geometries and materials are immutable once registered and may be
//!   shared by any number of meshes.

pub mod camera;
pub mod geometry;
pub mod graph;
pub mod light;
pub mod material;

pub use camera::PerspectiveCamera;
pub use geometry::{Geometry, MeshData};
pub use graph::{Mesh, Node, NodeKind, Scene, SceneError};
pub use light::{Light, LightKind};
pub use material::{Material, Side};
