// Configuration file, all measurements in map units (1 unit ~ 1 meter)
// This controls the generator constants and the default parameter settings

pub const INITIAL_SEED: u64 = 1512086461918454205;
pub const DEFAULT_PATCHES: usize = 15;

// Population -> patch count mapping
pub const POPULATION_PATCH_DIVISOR: f32 = 1.5;
pub const MIN_PATCHES: usize = 6;
pub const MAX_PATCHES: usize = 60;

// Point scattering
pub const POINTS_PER_PATCH: usize = 8;
pub const SPIRAL_BASE_RADIUS: f32 = 10.0; // first ring distance from the center
pub const SPIRAL_ANGLE_STEP: f32 = 5.0;   // multiplied by sqrt(i)
pub const RELAX_STEPS: usize = 3;         // Lloyd passes over the central seeds
pub const RELAXED_CENTRAL_SEEDS: usize = 3;

// Pipeline
pub const MAX_BUILD_ATTEMPTS: usize = 32;
pub const JUNCTION_MERGE_DISTANCE: f32 = 8.0; // junctions closer than this are merged
pub const PRUNE_RADIUS_FACTOR: f32 = 3.0;     // patches beyond factor * wall radius are dropped
pub const CITADEL_MIN_COMPACTNESS: f32 = 0.75;
pub const ROAD_ORIGIN_DISTANCE: f32 = 1000.0;  // where approach roads start from
pub const ARTERY_SMOOTHING: f32 = 3.0;

// Fortification
pub const WALL_SMOOTH_BUDGET: f32 = 40.0; // smoothing factor = min(1, budget / patches)
pub const MIN_ENTRANCES_LEFT: usize = 3;

// Street widths
pub const MAIN_STREET: f32 = 2.0;
pub const REGULAR_STREET: f32 = 1.0;
pub const ALLEY: f32 = 0.6;

// District assignment
pub const GATE_WARD_CHANCE_WALLED: f64 = 0.5;
pub const GATE_WARD_CHANCE_OPEN: f64 = 0.2;
pub const FARM_CHANCE: f64 = 0.2;
pub const FARM_MIN_COMPACTNESS: f32 = 0.7;
pub const LARGE_TOWN_PATCHES: usize = 30;
pub const SMALL_TOWN_PATCHES: usize = 10;

// Subdivision control
pub const MAX_RECURSION_DEPTH: usize = 24;
pub const ORTHO_MAX_ATTEMPTS: usize = 100;
pub const EMPTY_PROB: f32 = 0.04; // default chance of a lot staying empty

// Geometry tolerances
pub const CUT_EPSILON: f32 = 1e-3; // crossings closer than this to an edge end are ignored in buffer
