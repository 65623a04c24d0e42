// building footprints per kind of ward

use std::f32::consts::PI;

use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::config::{ALLEY, MAIN_STREET};
use crate::systems::mesh::Polygon;
use crate::systems::mesh::chance::chance;
use crate::systems::mesh::poly::offset::shrink_eq;
use crate::systems::mesh::poly::subdivision::{
    create_alleys, create_ortho_building, radial, ring, semi_radial, AlleyParams,
};
use crate::systems::mesh::poly::utils::{circle, polygon_area, polygon_compactness, rect, rotate, translate};
use crate::systems::mesh::town::Model;
use super::block::{city_block, filter_outskirts};
use super::WardKind;

/// Buildings of the ward standing on `patch`
///
/// # Returns
/// The footprints, empty for a patch without a ward or an empty ward
pub fn create_geometry(model: &Model, patch: usize, rng: &mut StdRng) -> Vec<Polygon> {
    let Some(ward) = &model.patches[patch].ward else {
        return Vec::new();
    };

    match ward.kind {
        kind if kind.is_common() => match &ward.alleys {
            Some(alleys) => common(model, patch, alleys, rng),
            None => Vec::new(),
        },
        WardKind::Military => military(model, patch, rng),
        WardKind::Cathedral => cathedral(model, patch, rng),
        WardKind::Market => market(model, patch, rng),
        WardKind::Castle => castle(model, patch, rng),
        WardKind::Park => park(model, patch),
        WardKind::Farm => farm(model, patch, rng),
        WardKind::Harbour => {
            let Some(block) = city_block(model, patch) else {
                return Vec::new();
            };
            let min_block_sq = 60.0 + 40.0 * rng.random::<f32>();
            create_ortho_building(&block, min_block_sq, 0.7, rng)
        }
        _ => Vec::new(),
    }
}

fn common(model: &Model, patch: usize, alleys: &AlleyParams, rng: &mut StdRng) -> Vec<Polygon> {
    let Some(block) = city_block(model, patch) else {
        return Vec::new();
    };
    let buildings = create_alleys(&block, alleys, rng);
    if model.is_enclosed(patch) {
        buildings
    } else {
        filter_outskirts(model, patch, buildings, rng)
    }
}

// barracks: few large lots on a tidy grid
fn military(model: &Model, patch: usize, rng: &mut StdRng) -> Vec<Polygon> {
    let Some(block) = city_block(model, patch) else {
        return Vec::new();
    };
    let params = AlleyParams {
        min_sq: polygon_area(&block).abs().sqrt() * (1.0 + rng.random::<f32>()),
        grid_chaos: 0.1 + rng.random::<f32>() * 0.3,
        size_chaos: 0.3,
        empty_prob: 0.25,
    };
    create_alleys(&block, &params, rng)
}

fn cathedral(model: &Model, patch: usize, rng: &mut StdRng) -> Vec<Polygon> {
    let Some(block) = city_block(model, patch) else {
        return Vec::new();
    };
    if chance(rng, 0.4) {
        let thickness = 2.0 + rng.random::<f32>() * 4.0;
        ring(&block, thickness)
    } else {
        create_ortho_building(&block, 50.0, 0.8, rng)
    }
}

fn castle(model: &Model, patch: usize, rng: &mut StdRng) -> Vec<Polygon> {
    let block = shrink_eq(&model.shape_positions(patch), MAIN_STREET * 2.0);
    let min_block_sq = polygon_area(&block).abs().sqrt() * 4.0;
    create_ortho_building(&block, min_block_sq, 0.6, rng)
}

fn park(model: &Model, patch: usize) -> Vec<Polygon> {
    let Some(block) = city_block(model, patch) else {
        return Vec::new();
    };
    if polygon_compactness(&block) >= 0.7 {
        radial(&block, None, ALLEY)
    } else {
        semi_radial(&block, ALLEY)
    }
}

// a statue or a fountain, off-center towards the longest side now and then
fn market(model: &Model, patch: usize, rng: &mut StdRng) -> Vec<Polygon> {
    let outline = model.shape_positions(patch);
    let centroid = model.patches[patch].shape.centroid(&model.points);

    let statue = chance(rng, 0.6);
    let offset = statue || chance(rng, 0.3);

    let n = outline.len();
    let (mut v0, mut v1) = (centroid, centroid);
    let mut longest = -1.0;
    for i in 0..n {
        let (a, b) = (outline[i], outline[(i + 1) % n]);
        if a.distance(b) > longest {
            longest = a.distance(b);
            (v0, v1) = (a, b);
        }
    }

    let mut object = if statue {
        let mut statue = rect(1.0 + rng.random::<f32>(), 1.0 + rng.random::<f32>());
        let edge = v1 - v0;
        rotate(&mut statue, edge.y.atan2(edge.x));
        statue
    } else {
        circle(1.0 + rng.random::<f32>())
    };

    if offset {
        let gravity = v0.lerp(v1, 0.5);
        translate(&mut object, centroid.lerp(gravity, 0.2 + rng.random::<f32>() * 0.4));
    } else {
        translate(&mut object, centroid);
    }
    vec![object]
}

// one farmhouse somewhere between a corner and the middle of the field
fn farm(model: &Model, patch: usize, rng: &mut StdRng) -> Vec<Polygon> {
    let shape = &model.patches[patch].shape;
    if shape.is_empty() {
        return Vec::new();
    }
    let corner = model.points[shape.vertices()[rng.random_range(0..shape.len())]];
    let centroid = shape.centroid(&model.points);
    let position = corner.lerp(centroid, 0.3 + rng.random::<f32>() * 0.4);

    let mut housing = rect(4.0, 4.0);
    rotate(&mut housing, rng.random::<f32>() * PI);
    translate(&mut housing, position);
    create_ortho_building(&housing, 8.0, 0.5, rng)
}
