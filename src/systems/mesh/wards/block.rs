// the buildable part of a patch and the thinning of buildings towards the countryside

use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::config::{ALLEY, MAIN_STREET, REGULAR_STREET};
use crate::systems::mesh::Polygon;
use crate::systems::mesh::chance::fuzzy;
use crate::systems::mesh::poly::offset::{buffer, shrink};
use crate::systems::mesh::poly::utils::{distance_to_line, interpolate, is_convex, polygon_area, polygon_center};
use crate::systems::mesh::town::Model;

/// The patch outline pulled in by half the width of whatever runs along
/// each edge: a wall or an artery, a street inside the town, an alley outside.
/// `None` when the streets leave nothing to build on.
pub fn city_block(model: &Model, patch: usize) -> Option<Polygon> {
    let shape = &model.patches[patch].shape;
    let wall = model.wall();
    let inner_patch = wall.is_none() || model.patches[patch].within_walls;
    let plaza = model.plaza.map(|p| &model.patches[p].shape);

    let distances: Vec<f32> = shape
        .edges()
        .map(|(v0, v1)| {
            if wall.is_some_and(|w| w.borders_by(patch, v0, v1)) {
                return MAIN_STREET / 2.0;
            }
            let on_street = (inner_patch && plaza.is_some_and(|s| s.find_edge(v1, v0).is_some()))
                || model.arteries.iter().any(|a| a.contains(&v0) && a.contains(&v1));
            if on_street {
                MAIN_STREET / 2.0
            } else if inner_patch {
                REGULAR_STREET / 2.0
            } else {
                ALLEY / 2.0
            }
        })
        .collect();

    let polygon = shape.positions(&model.points);
    let block = if is_convex(&polygon) {
        shrink(&polygon, &distances)
    } else {
        buffer(&polygon, &distances)
    };
    (block.len() >= 3 && polygon_area(&block) > 0.0).then_some(block)
}

// an edge that attracts buildings, `depth` is how far into the patch the attraction reaches
struct PopulatedEdge {
    origin: Vec2,
    dir: Vec2,
    depth: f32,
}

/// Drops buildings of an open patch the farther they are from busy edges.
/// Edges along arteries or town patches attract, gates and town vertices
/// raise the density around them.
pub fn filter_outskirts(model: &Model, patch: usize, buildings: Vec<Polygon>, rng: &mut StdRng) -> Vec<Polygon> {
    let shape = &model.patches[patch].shape;
    let points = &model.points;

    let mut edges = Vec::new();
    for (v1, v2) in shape.edges() {
        let on_road = model.arteries.iter().any(|a| a.contains(&v1) && a.contains(&v2));
        let factor = if on_road {
            Some(1.0)
        } else {
            model
                .neighbour(patch, v1)
                .filter(|&n| model.patches[n].within_city)
                .map(|n| if model.is_enclosed(n) { 1.0 } else { 0.4 })
        };
        let Some(factor) = factor else { continue };

        let origin = points[v1];
        let dir = points[v2] - origin;
        let depth = shape
            .iter()
            .map(|v| {
                if v == v1 || v == v2 {
                    0.0
                } else {
                    distance_to_line(origin, dir, points[v]) * factor
                }
            })
            .fold(f32::NEG_INFINITY, f32::max);
        if depth > 0.0 {
            edges.push(PopulatedEdge { origin, dir, depth });
        }
    }

    let density: Vec<f32> = shape
        .iter()
        .map(|v| {
            if model.gates.contains(&v) {
                1.0
            } else if model.patch_by_vertex(v).iter().all(|&p| model.patches[p].within_city) {
                2.0 * rng.random::<f32>()
            } else {
                0.0
            }
        })
        .collect();

    let outline = shape.positions(points);
    buildings
        .into_iter()
        .filter(|building| {
            let mut min_dist = 1.0f32;
            for edge in &edges {
                for &v in building {
                    let dist = distance_to_line(edge.origin, edge.dir, v) / edge.depth;
                    min_dist = min_dist.min(dist);
                }
            }

            let weights = interpolate(&outline, polygon_center(building));
            let p: f32 = weights.iter().zip(&density).map(|(w, d)| w * d).sum();
            fuzzy(rng, 1.0) > min_dist / p
        })
        .collect()
}
