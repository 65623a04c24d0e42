//! Procedural generator for the plan of a walled medieval town.
//!
//! [`generate`] turns a handful of [`Params`] into a [`Model`]: patches with
//! their wards and building footprints, the walls and gates, and the streets
//! and roads running through them. [`TownGenerationPlugin`] wraps the same
//! pipeline as Bevy resources and events.

pub mod config;
pub mod error;
pub mod systems;

pub use error::GenerationError;
pub use systems::mesh::town::{generate, Model};
pub use systems::mesh::wards::{Ward, WardKind};
pub use systems::mesh::{ClearEvent, Params, Polygon, RegenerateEvent, Town, TownGenerationPlugin};
