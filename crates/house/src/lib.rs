//! The haunted house scene.
//!
//! [`build_haunted_house`] populates a [`Scene`](haunted_scene::Scene) once
//! at startup with a fixed, hand-authored set of nodes. Every color,
//! dimension and position is a literal constant; the only inputs are the
//! viewport aspect and the optional extensions in [`HouseOptions`].
//!
//! # Invariants
//! - Root children, in order: house, graves, floor, ambient light, moon
//!   light, camera.
//! - Calling the builder twice duplicates the scene; nothing guards it.

mod builder;
mod graves;

pub use builder::{HauntedHouse, HouseOptions, build_haunted_house};
pub use graves::{GraveOptions, GravePlacement, place_graves};
