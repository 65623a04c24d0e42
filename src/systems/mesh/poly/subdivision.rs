use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::config::{ALLEY, MAX_RECURSION_DEPTH, ORTHO_MAX_ATTEMPTS};
use crate::systems::mesh::Polygon;
use crate::systems::mesh::chance::{chance, normal};
use super::offset::{cut, shrink};
use super::utils::{polygon_area, polygon_centroid};

/// Knobs of the recursive lot subdivision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlleyParams {
    pub min_sq: f32,     // typical lot area
    pub grid_chaos: f32, // how far cuts stray from the middle and from perpendicular
    pub size_chaos: f32, // how much lot sizes vary around min_sq
    pub empty_prob: f32, // chance of a finished lot staying empty
}

/// Recursively subdivides a city block into building lots separated by alleys
///
/// # Returns
/// A vector of polygons representing building lots
pub fn create_alleys(polygon: &Polygon, params: &AlleyParams, rng: &mut StdRng) -> Vec<Polygon> {
    subdivide_to_plots(polygon, params, true, 0, rng)
}

fn subdivide_to_plots(
    polygon: &Polygon,
    params: &AlleyParams,
    split: bool,
    depth: usize,
    rng: &mut StdRng,
) -> Vec<Polygon> {
    // find longest edge of the polygon,
    // this is where the cut will be made
    let Some((longest_idx, _, _)) = vlongest_edge(polygon) else {
        return Vec::new();
    };

    let area = polygon_area(polygon);
    let spread = 0.8 * params.grid_chaos;
    let ratio = (1.0 - spread) / 2.0 + rng.random::<f32>() * spread;

    // keep small blocks rectangular even in chaotic wards
    let angle_spread = if area < params.min_sq * 4.0 {
        0.0
    } else {
        std::f32::consts::PI / 6.0 * params.grid_chaos
    };
    let angle_offset = (rng.random::<f32>() - 0.5) * angle_spread;

    let halves = bisect(polygon, longest_idx, ratio, angle_offset, if split { ALLEY } else { 0.0 });

    // split failed or went too deep, treat as final
    if halves.len() < 2 || depth >= MAX_RECURSION_DEPTH {
        return finish_plot(polygon.clone(), params, rng).into_iter().collect();
    }

    let mut buildings = Vec::new();

    // repeat for both halves
    for half in halves {
        let half_area = polygon_area(&half);
        let size_factor = 2_f32.powf(4.0 * params.size_chaos * (rng.random::<f32>() - 0.5));

        if half_area < params.min_sq * size_factor {
            buildings.extend(finish_plot(half, params, rng));
        } else {
            let u = rng.random::<f32>() * rng.random::<f32>();
            let alley = half_area > params.min_sq / u;
            buildings.extend(subdivide_to_plots(&half, params, alley, depth + 1, rng));
        }
    }

    buildings
}

// final plot, may stay empty and triangles are never built on
fn finish_plot(plot: Polygon, params: &AlleyParams, rng: &mut StdRng) -> Option<Polygon> {
    let empty = chance(rng, params.empty_prob as f64);
    (!empty && plot.len() >= 4).then_some(plot)
}

/// Slices a polygon with cuts parallel to its longest edge or perpendicular to it,
/// whichever runs more across the edge being cut
///
/// # Returns
/// The kept lots, or the polygon itself if it is already smaller than `min_block_sq`
pub fn create_ortho_building(polygon: &Polygon, min_block_sq: f32, fill: f32, rng: &mut StdRng) -> Vec<Polygon> {
    if polygon.len() < 3 {
        return Vec::new();
    }
    if polygon_area(polygon) < min_block_sq {
        return vec![polygon.clone()];
    }
    let Some((longest_idx, _, _)) = vlongest_edge(polygon) else {
        return Vec::new();
    };

    let n = polygon.len();
    let c1 = polygon[(longest_idx + 1) % n] - polygon[longest_idx];
    let c2 = c1.perp();

    for _ in 0..ORTHO_MAX_ATTEMPTS {
        let blocks = ortho_slice(polygon, c1, c2, min_block_sq, fill, 0, rng);
        if !blocks.is_empty() {
            return blocks;
        }
    }
    Vec::new()
}

fn ortho_slice(
    polygon: &Polygon,
    c1: Vec2,
    c2: Vec2,
    min_block_sq: f32,
    fill: f32,
    depth: usize,
    rng: &mut StdRng,
) -> Vec<Polygon> {
    let Some((longest_idx, v0, _)) = vlongest_edge(polygon) else {
        return Vec::new();
    };
    let v1 = polygon[(longest_idx + 1) % polygon.len()];
    let edge = v1 - v0;
    let ratio = 0.4 + rng.random::<f32>() * 0.2;
    let p1 = v0.lerp(v1, ratio);

    let axis = if edge.dot(c1).abs() < edge.dot(c2).abs() { c1 } else { c2 };
    let halves = cut(polygon, p1, p1 + axis, 0.0);
    let unsplit = halves.len() < 2;

    let mut buildings = Vec::new();
    for half in halves {
        let threshold = min_block_sq * 2_f32.powf(normal(rng) * 2.0 - 1.0);
        if unsplit || depth >= MAX_RECURSION_DEPTH || polygon_area(&half) < threshold {
            if chance(rng, fill as f64) {
                buildings.push(half);
            }
        } else {
            buildings.extend(ortho_slice(&half, c1, c2, min_block_sq, fill, depth + 1, rng));
        }
    }
    buildings
}

/// Find vertex that starts the longest edge of the polygon
///
/// # Returns
/// (idx, vertex position, and edge length)
pub fn vlongest_edge(polygon: &Polygon) -> Option<(usize, Vec2, f32)> {
    if polygon.len() < 3 {
        return None;
    }

    let mut max_length = -1.0;
    let mut longest_idx = 0;

    for i in 0..polygon.len() {
        let next = (i + 1) % polygon.len();
        let length = polygon[i].distance(polygon[next]);

        if length > max_length {
            max_length = length;
            longest_idx = i;
        }
    }

    Some((longest_idx, polygon[longest_idx], max_length))
}

/// Bisect a polygon across the edge starting at `start_idx`,
/// `ratio` along the edge and turned by `angle_offset` from perpendicular
///
/// # Returns
/// One or two polygons, see [`cut`]
pub fn bisect(polygon: &Polygon, start_idx: usize, ratio: f32, angle_offset: f32, gap: f32) -> Vec<Polygon> {
    if polygon.len() < 3 || start_idx >= polygon.len() {
        return vec![polygon.clone()];
    }

    let start_v = polygon[start_idx];
    let next_v = polygon[(start_idx + 1) % polygon.len()];

    // calculate cutting point along the edge
    let cut_point = start_v.lerp(next_v, ratio);

    // perpendicular cutting vector w/ angle offset
    let rotated = Vec2::from_angle(angle_offset).rotate(next_v - start_v);
    cut(polygon, cut_point, cut_point + rotated.perp(), gap)
}

/// Pie slices from `center` (the centroid by default) to every edge,
/// with `gap / 2` taken off both radial sides
pub fn radial(polygon: &Polygon, center: Option<Vec2>, gap: f32) -> Vec<Polygon> {
    let center = center.unwrap_or_else(|| polygon_centroid(polygon, polygon_area(polygon)));
    let n = polygon.len();

    (0..n)
        .map(|i| {
            let sector = vec![center, polygon[i], polygon[(i + 1) % n]];
            if gap > 0.0 {
                shrink(&sector, &[gap / 2.0, 0.0, gap / 2.0])
            } else {
                sector
            }
        })
        .collect()
}

/// Like [`radial`] but fanned from the vertex closest to the centroid,
/// radial sides lying on the polygon outline are not shrunk
pub fn semi_radial(polygon: &Polygon, gap: f32) -> Vec<Polygon> {
    let n = polygon.len();
    if n < 3 {
        return Vec::new();
    }
    let centroid = polygon_centroid(polygon, polygon_area(polygon));
    let c = (0..n)
        .min_by(|&a, &b| polygon[a].distance(centroid).total_cmp(&polygon[b].distance(centroid)))
        .unwrap_or(0);
    let center = polygon[c];
    let gap = gap / 2.0;

    let mut sectors = Vec::new();
    for i in 0..n {
        let j = (i + 1) % n;
        if i == c || j == c {
            continue;
        }
        let mut sector = vec![center, polygon[i], polygon[j]];
        if gap > 0.0 {
            let first = if i == (c + 1) % n { 0.0 } else { gap };
            let last = if (j + 1) % n == c { 0.0 } else { gap };
            sector = shrink(&sector, &[first, 0.0, last]);
        }
        sectors.push(sector);
    }
    sectors
}

/// Peels strips of `thickness` off every edge, shortest edges first
///
/// # Returns
/// The strips, the remaining core is dropped
pub fn ring(polygon: &Polygon, thickness: f32) -> Vec<Polygon> {
    let n = polygon.len();
    let mut slices: Vec<(Vec2, Vec2, f32)> = (0..n)
        .map(|i| {
            let v1 = polygon[i];
            let v2 = polygon[(i + 1) % n];
            let offset = (v2 - v1).perp().normalize_or_zero() * thickness;
            (v1 + offset, v2 + offset, v1.distance(v2))
        })
        .collect();
    slices.sort_by(|a, b| a.2.total_cmp(&b.2));

    let mut peel = Vec::new();
    let mut core = polygon.clone();
    for (p1, p2, _) in slices {
        let mut halves = cut(&core, p1, p2, 0.0);
        if halves.len() == 2 {
            peel.push(halves.swap_remove(1));
        }
        core = halves.swap_remove(0);
    }
    peel
}
