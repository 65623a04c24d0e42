//! Identity-bearing polygons.
//!
//! A `Shape` is a cyclic list of [`PointId`]s. All topological questions
//! (does it contain this vertex, do two shapes share an edge) are answered by
//! comparing handles. Geometric questions resolve the handles through the
//! [`Points`] arena first.

use bevy::prelude::*;

use super::point::{PointId, Points};
use super::utils::{polygon_area, polygon_centroid, polygon_center, polygon_compactness, is_convex};
use crate::systems::mesh::Polygon;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shape {
    vertices: Vec<PointId>,
}

impl Shape {
    pub fn new(vertices: Vec<PointId>) -> Self {
        Self { vertices }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[PointId] {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> &mut Vec<PointId> {
        &mut self.vertices
    }

    pub fn iter(&self) -> impl Iterator<Item = PointId> + '_ {
        self.vertices.iter().copied()
    }

    pub fn contains(&self, v: PointId) -> bool {
        self.vertices.contains(&v)
    }

    pub fn index_of(&self, v: PointId) -> Option<usize> {
        self.vertices.iter().position(|&p| p == v)
    }

    /// Vertex following `v`, `None` if `v` is not part of the shape
    pub fn next(&self, v: PointId) -> Option<PointId> {
        let i = self.index_of(v)?;
        Some(self.vertices[(i + 1) % self.len()])
    }

    /// Vertex preceding `v`, `None` if `v` is not part of the shape
    pub fn prev(&self, v: PointId) -> Option<PointId> {
        let i = self.index_of(v)?;
        Some(self.vertices[(i + self.len() - 1) % self.len()])
    }

    /// Index of the directed edge `a -> b`
    pub fn find_edge(&self, a: PointId, b: PointId) -> Option<usize> {
        let i = self.index_of(a)?;
        (self.vertices[(i + 1) % self.len()] == b).then_some(i)
    }

    /// Directed edges `(v[i], v[i + 1])`, wrapping around
    pub fn edges(&self) -> impl Iterator<Item = (PointId, PointId)> + '_ {
        let n = self.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// True if both shapes share at least one edge, in either direction
    pub fn borders(&self, other: &Shape) -> bool {
        let n = self.len();
        let m = other.len();
        if n == 0 || m == 0 {
            return false;
        }
        for i in 0..n {
            if let Some(j) = other.index_of(self.vertices[i]) {
                let next = self.vertices[(i + 1) % n];
                if next == other.vertices[(j + 1) % m] || next == other.vertices[(j + m - 1) % m] {
                    return true;
                }
            }
        }
        false
    }

    /// Splits the shape along the chord between two of its own vertices.
    /// Both halves keep the chord ends, so they stay connected through them.
    ///
    /// # Returns
    /// The two halves, or `None` if either vertex is missing or they coincide
    pub fn split(&self, a: PointId, b: PointId) -> Option<[Shape; 2]> {
        let mut i1 = self.index_of(a)?;
        let mut i2 = self.index_of(b)?;
        if i1 == i2 {
            return None;
        }
        if i1 > i2 {
            std::mem::swap(&mut i1, &mut i2);
        }
        let first = self.vertices[i1..=i2].to_vec();
        let mut second = self.vertices[i2..].to_vec();
        second.extend_from_slice(&self.vertices[..=i1]);
        Some([Shape::new(first), Shape::new(second)])
    }

    /// Replaces every occurrence of `from` with `to`
    pub fn replace(&mut self, from: PointId, to: PointId) {
        for v in self.vertices.iter_mut() {
            if *v == from {
                *v = to;
            }
        }
    }

    /// Removes repeated handles, keeping the first occurrence of each
    pub fn dedup_vertices(&mut self) {
        let mut i = 0;
        while i < self.vertices.len() {
            let v = self.vertices[i];
            let mut j = i + 1;
            while j < self.vertices.len() {
                if self.vertices[j] == v {
                    self.vertices.remove(j);
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
    }

    /// Resolves the handles into a value polygon
    pub fn positions(&self, points: &Points) -> Polygon {
        self.vertices.iter().map(|&v| points[v]).collect()
    }

    pub fn area(&self, points: &Points) -> f32 {
        polygon_area(&self.positions(points))
    }

    pub fn compactness(&self, points: &Points) -> f32 {
        polygon_compactness(&self.positions(points))
    }

    pub fn centroid(&self, points: &Points) -> Vec2 {
        let poly = self.positions(points);
        polygon_centroid(&poly, polygon_area(&poly))
    }

    pub fn center(&self, points: &Points) -> Vec2 {
        polygon_center(&self.positions(points))
    }

    pub fn is_convex(&self, points: &Points) -> bool {
        is_convex(&self.positions(points))
    }

    /// Distance from `p` to the nearest vertex
    pub fn distance(&self, points: &Points, p: Vec2) -> f32 {
        self.vertices
            .iter()
            .map(|&v| points[v].distance(p))
            .fold(f32::INFINITY, f32::min)
    }

    /// Vertex minimizing `f`, first one wins on ties
    pub fn min_by_key(&self, mut f: impl FnMut(PointId) -> f32) -> Option<PointId> {
        let mut best = None;
        let mut best_value = f32::INFINITY;
        for &v in &self.vertices {
            let value = f(v);
            if best.is_none() || value < best_value {
                best = Some(v);
                best_value = value;
            }
        }
        best
    }

    /// Weighted average of `v` and its two neighbours, `None` if `v` is not a vertex
    pub fn smooth_vertex(&self, points: &Points, v: PointId, factor: f32) -> Option<Vec2> {
        let prev = points[self.prev(v)?];
        let next = points[self.next(v)?];
        Some((prev + points[v] * factor + next) / (2.0 + factor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // two unit squares sharing the edge x = 1
    fn two_squares() -> (Points, Shape, Shape) {
        let mut points = Points::new();
        let a = points.add(Vec2::new(0.0, 0.0));
        let b = points.add(Vec2::new(1.0, 0.0));
        let c = points.add(Vec2::new(2.0, 0.0));
        let d = points.add(Vec2::new(2.0, 1.0));
        let e = points.add(Vec2::new(1.0, 1.0));
        let f = points.add(Vec2::new(0.0, 1.0));
        let left = Shape::new(vec![a, b, e, f]);
        let right = Shape::new(vec![b, c, d, e]);
        (points, left, right)
    }

    #[test]
    fn neighbours_share_reversed_edge() {
        let (_, left, right) = two_squares();
        assert!(left.borders(&right));
        let b = left.vertices()[1];
        let e = left.vertices()[2];
        assert_eq!(left.find_edge(b, e), Some(1));
        assert_eq!(right.find_edge(e, b), Some(3));
        assert_eq!(left.find_edge(e, b), None);
    }

    #[test]
    fn coincident_but_distinct_vertices_do_not_border() {
        let (mut points, left, _) = two_squares();
        // same positions as the right square's shared edge, different handles
        let b2 = points.add(Vec2::new(1.0, 0.0));
        let e2 = points.add(Vec2::new(1.0, 1.0));
        let c = points.add(Vec2::new(2.0, 0.0));
        let d = points.add(Vec2::new(2.0, 1.0));
        let detached = Shape::new(vec![b2, c, d, e2]);
        assert!(!left.borders(&detached));
    }

    #[test]
    fn moving_a_shared_vertex_moves_both_shapes() {
        let (mut points, left, right) = two_squares();
        let before = left.area(&points) + right.area(&points);
        let e = left.vertices()[2];
        points.set(e, Vec2::new(1.5, 1.0));
        assert!(left.area(&points) > 1.0);
        assert!(right.area(&points) < 1.0);
        let after = left.area(&points) + right.area(&points);
        assert!((before - after).abs() < 1e-5);
    }

    #[test]
    fn split_keeps_chord_in_both_halves() {
        let (points, left, _) = two_squares();
        let a = left.vertices()[0];
        let e = left.vertices()[2];
        let [h1, h2] = left.split(a, e).unwrap();
        assert!(h1.contains(a) && h1.contains(e));
        assert!(h2.contains(a) && h2.contains(e));
        assert_eq!(h1.len() + h2.len(), left.len() + 2);
        let total = h1.area(&points) + h2.area(&points);
        assert!((total - left.area(&points)).abs() < 1e-5);
    }

    #[test]
    fn dedup_removes_repeated_handles() {
        let (_, mut left, _) = two_squares();
        let a = left.vertices()[0];
        let b = left.vertices()[1];
        left.replace(b, a);
        left.dedup_vertices();
        assert_eq!(left.len(), 3);
    }

    #[test]
    fn smoothing_pulls_towards_neighbours() {
        let (points, left, _) = two_squares();
        let a = left.vertices()[0];
        let smoothed = left.smooth_vertex(&points, a, 1.0).unwrap();
        assert!(smoothed.distance(Vec2::new(1.0 / 3.0, 1.0 / 3.0)) < 1e-5);
    }
}
