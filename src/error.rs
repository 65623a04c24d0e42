//! Error types for settlement generation.

use bevy::prelude::Vec2;
use thiserror::Error;

/// Structural failures raised while assembling a settlement.
///
/// Everything except `InvalidParameters` and `AttemptsExhausted` is recovered
/// by the pipeline, which discards the attempt and tries again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    /// The citadel patch is too irregular to be walled.
    #[error("bad citadel shape: compactness {compactness:.3} is below {min:.3}")]
    BadCitadelShape {
        /// Compactness of the citadel after its wall was built.
        compactness: f32,
        /// Required minimum.
        min: f32,
    },

    /// No vertex of the walled area can hold a gate.
    #[error("bad walled area shape: {entrances} entrance candidates, {gates} gates")]
    BadWalledAreaShape {
        /// Entrance candidates found on the wall.
        entrances: usize,
        /// Gates eventually selected.
        gates: usize,
    },

    /// The pathfinder found no route from a gate into the town.
    #[error("unable to build a street from the gate at ({}, {})", gate.x, gate.y)]
    NoStreet {
        /// Position of the gate.
        gate: Vec2,
    },

    /// The subdivision produced fewer closed patches than the town needs.
    #[error("too few patches: {found} closed regions, {required} required")]
    TooFewPatches {
        /// Closed regions produced by the subdivision.
        found: usize,
        /// Inner patches plus the citadel.
        required: usize,
    },

    /// The parameters cannot describe a settlement.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Every attempt failed.
    #[error("settlement generation failed after {attempts} attempts, last error: {last}")]
    AttemptsExhausted {
        /// Number of attempts made.
        attempts: usize,
        /// The failure of the final attempt.
        last: Box<GenerationError>,
    },
}

impl GenerationError {
    /// True for failures that a fresh attempt may not hit again.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            GenerationError::BadCitadelShape { .. }
                | GenerationError::BadWalledAreaShape { .. }
                | GenerationError::NoStreet { .. }
                | GenerationError::TooFewPatches { .. }
        )
    }
}
