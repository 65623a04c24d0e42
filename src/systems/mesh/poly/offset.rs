// polygon cutting and offsetting
// all polygons are expected counter-clockwise, so the left normal of an edge points inside

use bevy::prelude::*;

use crate::config::CUT_EPSILON;
use crate::systems::mesh::Polygon;
use super::utils::{intersect_lines, polygon_area};

/// Splits a polygon along the infinite line through `a` and `b`.
/// The line has to cross the boundary exactly twice, anything else
/// (missing the polygon, grazing a vertex) leaves the polygon whole.
/// A positive `gap` peels `gap / 2` off both halves along the cut.
///
/// # Returns
/// `[left, right]` relative to the direction `a -> b`, or the unsplit polygon alone
pub fn cut(polygon: &Polygon, a: Vec2, b: Vec2, gap: f32) -> Vec<Polygon> {
    let n = polygon.len();
    if n < 3 {
        return vec![polygon.clone()];
    }

    let dir = b - a;
    let mut crossings: Vec<(usize, f32)> = Vec::with_capacity(2);
    for i in 0..n {
        let v0 = polygon[i];
        let v1 = polygon[(i + 1) % n];
        if let Some((t, s)) = intersect_lines(a, dir, v0, v1 - v0) {
            if (0.0..=1.0).contains(&s) {
                crossings.push((i, t));
            }
        }
    }

    if crossings.len() != 2 {
        return vec![polygon.clone()];
    }

    let (edge1, ratio1) = crossings[0];
    let (edge2, ratio2) = crossings[1];
    let point1 = a + dir * ratio1;
    let point2 = a + dir * ratio2;

    let mut half1 = Vec::with_capacity(edge2 - edge1 + 2);
    half1.push(point1);
    half1.extend_from_slice(&polygon[edge1 + 1..=edge2]);
    half1.push(point2);

    let mut half2 = Vec::with_capacity(n - (edge2 - edge1) + 2);
    half2.push(point2);
    half2.extend_from_slice(&polygon[edge2 + 1..]);
    half2.extend_from_slice(&polygon[..=edge1]);
    half2.push(point1);

    if gap > 0.0 {
        // the closing edge of each half lies on the cut line
        let last1 = half1.len() - 1;
        let last2 = half2.len() - 1;
        half1 = peel(&half1, last1, gap / 2.0);
        half2 = peel(&half2, last2, gap / 2.0);
    }

    let edge_dir = polygon[(edge1 + 1) % n] - polygon[edge1];
    if dir.perp_dot(edge_dir) > 0.0 {
        vec![half1, half2]
    } else {
        vec![half2, half1]
    }
}

/// Cuts a strip of width `d` off the edge starting at `index`
pub fn peel(polygon: &Polygon, index: usize, d: f32) -> Polygon {
    let n = polygon.len();
    if n < 3 {
        return polygon.clone();
    }
    let v1 = polygon[index % n];
    let v2 = polygon[(index + 1) % n];
    let offset = (v2 - v1).perp().normalize_or_zero() * d;
    cut(polygon, v1 + offset, v2 + offset, 0.0).swap_remove(0)
}

/// Moves every edge inwards by its distance through successive half-plane cuts.
/// Only correct for convex polygons, use [`buffer`] otherwise.
pub fn shrink(polygon: &Polygon, distances: &[f32]) -> Polygon {
    let n = polygon.len();
    let mut shrunk = polygon.clone();
    for i in 0..n {
        let d = distances.get(i).copied().unwrap_or(0.0);
        if d > 0.0 {
            let v1 = polygon[i];
            let v2 = polygon[(i + 1) % n];
            let offset = (v2 - v1).perp().normalize_or_zero() * d;
            shrunk = cut(&shrunk, v1 + offset, v2 + offset, 0.0).swap_remove(0);
        }
    }
    shrunk
}

pub fn shrink_eq(polygon: &Polygon, d: f32) -> Polygon {
    shrink(polygon, &vec![d; polygon.len()])
}

// vertex of the offset outline, crossings are inserted twice under one tag
#[derive(Clone, Copy)]
struct OutlineNode {
    position: Vec2,
    tag: Option<usize>,
}

/// Offsets every edge inwards by its distance and repairs the resulting
/// self-intersections, which makes it work for concave polygons too.
///
/// # Returns
/// The loop of the repaired outline with the largest signed area,
/// empty when every loop collapsed to a non-positive area
pub fn buffer(polygon: &Polygon, distances: &[f32]) -> Polygon {
    let n = polygon.len();
    if n < 3 {
        return polygon.clone();
    }

    // offset edges, two nodes per edge
    let mut outline: Vec<OutlineNode> = Vec::with_capacity(n * 2);
    for i in 0..n {
        let v0 = polygon[i];
        let v1 = polygon[(i + 1) % n];
        let d = distances.get(i).copied().unwrap_or(0.0);
        let offset = if d == 0.0 {
            Vec2::ZERO
        } else {
            (v1 - v0).perp().normalize_or_zero() * d
        };
        outline.push(OutlineNode { position: v0 + offset, tag: None });
        outline.push(OutlineNode { position: v1 + offset, tag: None });
    }

    // split crossing edges until none are left
    let max_cuts = outline.len() * outline.len();
    let mut tags = 0;
    let mut last_edge = 0;
    loop {
        if tags >= max_cuts {
            break;
        }
        let Some((i, j, position)) = find_crossing(&outline, last_edge) else {
            break;
        };
        let node = OutlineNode { position, tag: Some(tags) };
        tags += 1;
        outline.insert(j + 1, node);
        outline.insert(i + 1, node);
        last_edge = i;
    }

    // walk the closed loops and keep the biggest one
    let len = outline.len();
    let mut visited = vec![false; len];
    let mut best: Option<Polygon> = None;
    let mut best_area = f32::NEG_INFINITY;
    for start in 0..len {
        if visited[start] {
            continue;
        }
        let mut part = Vec::new();
        let mut i = start;
        for _ in 0..len {
            part.push(outline[i].position);
            visited[i] = true;
            let next = (i + 1) % len;
            i = match outline[next].tag {
                Some(tag) => outline
                    .iter()
                    .enumerate()
                    .position(|(k, node)| k != next && node.tag == Some(tag))
                    .unwrap_or(next),
                None => next,
            };
            if i == start {
                break;
            }
        }
        let area = polygon_area(&part);
        if area > best_area {
            best_area = area;
            best = Some(part);
        }
    }

    match best {
        Some(part) if best_area > 0.0 => part,
        _ => Vec::new(),
    }
}

pub fn buffer_eq(polygon: &Polygon, d: f32) -> Polygon {
    buffer(polygon, &vec![d; polygon.len()])
}

// first pair of non-adjacent outline edges crossing strictly inside both
fn find_crossing(outline: &[OutlineNode], from: usize) -> Option<(usize, usize, Vec2)> {
    let n = outline.len();
    for i in from..n.saturating_sub(2) {
        let p11 = outline[i].position;
        let d1 = outline[i + 1].position - p11;
        let end = if i > 0 { n } else { n - 1 };
        for j in (i + 2)..end {
            let p21 = outline[j].position;
            let p22 = outline[(j + 1) % n].position;
            if let Some((t, s)) = intersect_lines(p11, d1, p21, p22 - p21) {
                let inside = CUT_EPSILON..(1.0 - CUT_EPSILON);
                if inside.contains(&t) && inside.contains(&s) {
                    return Some((i, j, p11 + d1 * t));
                }
            }
        }
    }
    None
}

/// Moves one vertex along the inward bisector of its corner so that it ends up
/// `d` away from both incident edges, never further than half the shorter edge.
pub fn inset(polygon: &Polygon, index: usize, d: f32) -> Polygon {
    let n = polygon.len();
    if n < 3 {
        return polygon.clone();
    }
    let prev = polygon[(index + n - 1) % n];
    let v = polygon[index];
    let next = polygon[(index + 1) % n];

    let n0 = (v - prev).perp().normalize_or_zero();
    let n1 = (next - v).perp().normalize_or_zero();
    let bisector = (n0 + n1).normalize_or_zero();
    let sin_half = bisector.dot(n0);
    if bisector == Vec2::ZERO || sin_half < f32::EPSILON {
        return polygon.clone();
    }

    let limit = v.distance(prev).min(v.distance(next)) * 0.5;
    let t = (d / sin_half).min(limit);

    let mut result = polygon.clone();
    result[index] = v + bisector * t;
    result
}

/// Weighted average of a vertex and its two neighbours
pub fn smooth_vertex(polygon: &Polygon, index: usize, factor: f32) -> Vec2 {
    let n = polygon.len();
    let prev = polygon[(index + n - 1) % n];
    let next = polygon[(index + 1) % n];
    (prev + polygon[index] * factor + next) / (2.0 + factor)
}

/// Smooths every vertex at once, all from the original positions
pub fn smooth_vertex_eq(polygon: &Polygon, factor: f32) -> Polygon {
    if polygon.len() < 3 {
        return polygon.clone();
    }
    (0..polygon.len())
        .map(|i| smooth_vertex(polygon, i, factor))
        .collect()
}
