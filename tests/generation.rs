use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use town_gen::{generate, GenerationError, Model, Params, WardKind};

fn positions(model: &Model) -> Vec<Vec2> {
    model.points.iter().map(|(_, p)| p).collect()
}

fn town(seed: u64) -> Params {
    Params {
        seed,
        walls: true,
        plaza: true,
        ..Params::for_population(500)
    }
}

#[test]
fn same_seed_same_town() {
    let a = generate(&town(42)).unwrap();
    let b = generate(&town(42)).unwrap();

    assert_eq!(positions(&a), positions(&b));
    assert_eq!(a.patches.len(), b.patches.len());
    assert_eq!(a.gates, b.gates);
    assert_eq!(a.arteries, b.arteries);
    for (pa, pb) in a.patches.iter().zip(&b.patches) {
        assert_eq!(pa.shape, pb.shape);
        assert_eq!(pa.ward, pb.ward);
    }
}

#[test]
fn different_seeds_differ() {
    let a = generate(&town(1)).unwrap();
    let b = generate(&town(2)).unwrap();
    assert_ne!(positions(&a), positions(&b));
}

#[test]
fn walled_town_with_plaza() {
    let model = generate(&town(42)).unwrap();

    assert_eq!(model.params.n_patches, 15);
    assert!(!model.inner.is_empty());
    assert!(model.inner.iter().all(|&p| model.patches[p].within_city));

    let plaza = model.plaza.expect("plaza requested");
    assert_eq!(model.patches[plaza].ward.as_ref().map(|w| w.kind), Some(WardKind::Market));
    assert_eq!(model.patches[plaza].ward.as_ref().map(|w| w.geometry.len()), Some(1));

    let wall = model.wall().expect("walls requested");
    assert!(!wall.gates.is_empty());
    assert!(wall.towers.iter().all(|t| !wall.gates.contains(t)));
    assert!(!model.arteries.is_empty());
    assert!(model.city_radius > 0.0);

    // every gate gets a street starting from it
    assert_eq!(model.streets.len(), model.gates.len());
    for (street, gate) in model.streets.iter().zip(&model.gates) {
        assert_eq!(street.first(), Some(gate));
    }

    assert!(model.patches.iter().all(|p| p.has_ward()));
    let buildings: usize = model
        .patches
        .iter()
        .filter_map(|p| p.ward.as_ref())
        .map(|w| w.geometry.len())
        .sum();
    assert!(buildings > 0);

    if let Some(citadel) = model.citadel {
        assert_eq!(model.patches[citadel].ward.as_ref().map(|w| w.kind), Some(WardKind::Castle));
        assert!(model.citadel_wall.as_ref().is_some_and(|w| w.is_real()));
    }

    let again = generate(&town(42)).unwrap();
    assert_eq!(again.patches.len(), model.patches.len());
    assert_eq!(again.gates.len(), model.gates.len());
}

#[test]
fn open_town_without_citadel() {
    let params = Params {
        walls: false,
        citadel: false,
        plaza: false,
        n_patches: 8,
        seed: 3,
        ..Params::default()
    };
    let model = generate(&params).unwrap();
    assert!(model.wall().is_none());
    assert!(model.border.as_ref().is_some_and(|b| !b.is_real() && b.towers.is_empty()));
    assert!(model.citadel.is_none() && model.citadel_wall.is_none());
    assert!(model.plaza.is_none());
    assert!(!model.gates.is_empty());
}

#[test]
fn bearings_steer_the_first_gate() {
    let bearing = Vec2::new(0.0, 1.0);
    let params = Params {
        approach_bearings: vec![bearing],
        ..town(9)
    };
    let model = generate(&params).unwrap();
    let gate = model.points[model.gates[0]] - model.center_position();
    // the gate lies roughly in the requested direction
    assert!(gate.normalize().dot(bearing) > 0.0);
}

#[test]
fn flags_add_their_districts() {
    let params = Params {
        temple: true,
        capital: true,
        ..town(5)
    };
    let model = generate(&params).unwrap();
    let kinds: Vec<WardKind> = model.patches.iter().filter_map(|p| p.ward.as_ref()).map(|w| w.kind).collect();
    assert!(kinds.contains(&WardKind::Cathedral));
    assert!(kinds.contains(&WardKind::Administration));
}

#[test]
fn retries_share_one_stream() {
    let params = town(77);
    let mut rng = StdRng::seed_from_u64(params.seed);
    let built = Model::build(&params, &mut rng).unwrap();
    let generated = generate(&params).unwrap();
    assert_eq!(positions(&built), positions(&generated));
}

#[test]
fn bad_parameters_fail_fast() {
    let params = Params {
        n_patches: 0,
        ..Params::default()
    };
    let err = generate(&params).unwrap_err();
    assert!(matches!(err, GenerationError::InvalidParameters(_)));
    assert!(!err.is_structural());
}
