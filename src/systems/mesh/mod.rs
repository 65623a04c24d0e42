// this is the entry point for the town generation plugin
use bevy::prelude::*;

use crate::config::*;
use crate::error::GenerationError;

pub mod chance;
pub mod graph;
pub mod patch;
pub mod poly;
pub mod topology;
pub mod town;
pub mod wall;
pub mod wards;

use town::Model;

// my 2d polygon datatype
// plain positions, used wherever vertex identity does not matter
pub type Polygon = Vec<Vec2>;

// town generation parameters
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct Params {
    pub n_patches: usize,  // patches inside the town
    pub plaza: bool,
    pub citadel: bool,
    pub walls: bool,
    pub temple: bool,
    pub shanty: bool,
    pub capital: bool,
    pub harbour: bool,
    pub seed: u64,
    // directions the main roads arrive from, gates are placed towards them
    pub approach_bearings: Vec<Vec2>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            n_patches: DEFAULT_PATCHES,
            plaza: true,
            citadel: true,
            walls: true,
            temple: false,
            shanty: false,
            capital: false,
            harbour: false,
            seed: INITIAL_SEED,
            approach_bearings: Vec::new(),
        }
    }
}

impl Params {
    /// Default parameters sized for `population` inhabitants
    pub fn for_population(population: u32) -> Self {
        let n = ((population as f32).sqrt() / POPULATION_PATCH_DIVISOR).round() as usize;
        Self {
            n_patches: n.clamp(MIN_PATCHES, MAX_PATCHES),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if !(MIN_PATCHES..=MAX_PATCHES).contains(&self.n_patches) {
            return Err(GenerationError::InvalidParameters(format!(
                "patch count {} is outside {MIN_PATCHES}..={MAX_PATCHES}",
                self.n_patches
            )));
        }
        if let Some(bearing) = self
            .approach_bearings
            .iter()
            .find(|b| !b.is_finite() || b.length_squared() < f32::EPSILON)
        {
            return Err(GenerationError::InvalidParameters(format!(
                "approach bearing ({}, {}) has no direction",
                bearing.x, bearing.y
            )));
        }
        Ok(())
    }
}

// the last generated settlement, `None` after a clear or a failed generation
#[derive(Resource, Default)]
pub struct Town {
    pub model: Option<Model>,
}

// Event for regeneration
#[derive(Event)]
pub struct RegenerateEvent {
    pub seed: u64,
}

// Event for clearing all data
#[derive(Event)]
pub struct ClearEvent;

// main plugin for generation
pub struct TownGenerationPlugin;

impl Plugin for TownGenerationPlugin {
    fn build(&self, app: &mut App) {
        app
            .init_resource::<Params>()
            .init_resource::<Town>()

            .add_event::<RegenerateEvent>()
            .add_event::<ClearEvent>()

            // add startup town generation pipeline
            .add_systems(Startup, |params: Res<Params>, mut town: ResMut<Town>| {
                town::rebuild(&params, &mut town);
            })
            .add_systems(Update, (town::handle_regeneration, town::handle_clear));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_sets_the_patch_count() {
        assert_eq!(Params::for_population(500).n_patches, 15);
        assert_eq!(Params::for_population(1).n_patches, MIN_PATCHES);
        assert_eq!(Params::for_population(1_000_000).n_patches, MAX_PATCHES);
    }

    #[test]
    fn validation() {
        assert!(Params::default().validate().is_ok());
        let zero_bearing = Params {
            approach_bearings: vec![Vec2::ZERO],
            ..Params::default()
        };
        assert!(matches!(zero_bearing.validate(), Err(GenerationError::InvalidParameters(_))));
        let huge = Params {
            n_patches: MAX_PATCHES + 1,
            ..Params::default()
        };
        assert!(huge.validate().is_err());
    }

    #[test]
    fn plugin_generates_regenerates_and_clears() {
        let mut app = App::new();
        app.add_plugins(TownGenerationPlugin);
        app.update();
        assert!(app.world().resource::<Town>().model.is_some());

        app.world_mut().send_event(RegenerateEvent { seed: 7 });
        app.update();
        assert_eq!(app.world().resource::<Params>().seed, 7);
        let town = app.world().resource::<Town>();
        assert_eq!(town.model.as_ref().map(|m| m.params.seed), Some(7));

        app.world_mut().send_event(ClearEvent);
        app.update();
        assert!(app.world().resource::<Town>().model.is_none());
    }
}
