use std::cmp::Ordering;

use bevy::prelude::*;

use crate::systems::mesh::Polygon;
use super::utils::{calculate_circumcenter, polygon_area, polygon_centroid};

// the four frame corners occupy the first slots of `points`
const FRAME: usize = 4;

/// Delaunay triangle over indices into [`Voronoi::points`],
/// always stored counter-clockwise with its circumcircle cached
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub p1: usize,
    pub p2: usize,
    pub p3: usize,
    pub c: Vec2,
    pub r: f32,
}

impl Triangle {
    fn new(points: &[Vec2], p1: usize, p2: usize, p3: usize) -> Self {
        let (a, b, c) = (points[p1], points[p2], points[p3]);
        let (p2, p3) = if (b - a).perp_dot(c - a) >= 0.0 { (p2, p3) } else { (p3, p2) };
        let center = calculate_circumcenter(a, b, c);
        Self {
            p1,
            p2,
            p3,
            c: center,
            r: center.distance(a),
        }
    }

    /// True if the triangle has the directed edge `a -> b`
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        (self.p1 == a && self.p2 == b) || (self.p2 == a && self.p3 == b) || (self.p3 == a && self.p1 == b)
    }

    pub fn has_vertex(&self, v: usize) -> bool {
        self.p1 == v || self.p2 == v || self.p3 == v
    }

    fn edges(&self) -> [(usize, usize); 3] {
        [(self.p1, self.p2), (self.p2, self.p3), (self.p3, self.p1)]
    }
}

/// Voronoi cell of one seed, given as its incident triangles sorted by the
/// polar angle of their circumcenters around the seed
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Index into [`Voronoi::seeds`]
    pub seed: usize,
    /// Indices into [`Voronoi::triangles`]
    pub triangles: Vec<usize>,
}

impl Region {
    /// Circumcenters of the incident triangles, counter-clockwise
    pub fn polygon(&self, voronoi: &Voronoi) -> Polygon {
        self.triangles.iter().map(|&t| voronoi.triangles[t].c).collect()
    }
}

/// Incremental Bowyer-Watson triangulation inside a rectangular frame
#[derive(Debug, Clone)]
pub struct Voronoi {
    points: Vec<Vec2>,
    triangles: Vec<Triangle>,
}

impl Voronoi {
    /// Empty triangulation of the rectangle, split into two triangles
    pub fn new(min: Vec2, max: Vec2) -> Self {
        let points = vec![
            Vec2::new(min.x, min.y),
            Vec2::new(min.x, max.y),
            Vec2::new(max.x, min.y),
            Vec2::new(max.x, max.y),
        ];
        let triangles = vec![
            Triangle::new(&points, 0, 1, 2),
            Triangle::new(&points, 1, 2, 3),
        ];
        Self { points, triangles }
    }

    /// Triangulates `seeds` inside a frame a quarter of their extent larger on every side
    pub fn build(seeds: &[Vec2]) -> Self {
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for p in seeds {
            min = min.min(*p);
            max = max.max(*p);
        }
        if seeds.is_empty() {
            min = Vec2::splat(-1.0);
            max = Vec2::splat(1.0);
        }
        let margin = ((max - min) * 0.5).max(Vec2::ONE) / 2.0;

        let mut voronoi = Self::new(min - margin, max + margin);
        for p in seeds {
            voronoi.add_point(*p);
        }
        voronoi
    }

    /// Inserts a point, re-triangulating the cavity of every triangle whose
    /// circumcircle strictly contains it
    ///
    /// # Returns
    /// `false` if the point was ignored (duplicate, or no circumcircle contains it)
    pub fn add_point(&mut self, p: Vec2) -> bool {
        if self.points.iter().any(|q| q.distance_squared(p) < f32::EPSILON) {
            return false;
        }

        let to_split: Vec<usize> = self
            .triangles
            .iter()
            .enumerate()
            .filter(|(_, t)| p.distance(t.c) < t.r)
            .map(|(i, _)| i)
            .collect();
        if to_split.is_empty() {
            return false;
        }

        // cavity boundary, edges shared by two removed triangles run opposite ways
        let mut a = Vec::new();
        let mut b = Vec::new();
        for &i in &to_split {
            let t1 = self.triangles[i];
            for (e0, e1) in t1.edges() {
                let shared = to_split
                    .iter()
                    .any(|&j| j != i && self.triangles[j].has_edge(e1, e0));
                if !shared {
                    a.push(e0);
                    b.push(e1);
                }
            }
        }

        // chain the boundary into a loop around the new point
        let index = self.points.len();
        self.points.push(p);
        let mut fan = Vec::with_capacity(a.len());
        let mut k = 0;
        loop {
            fan.push(Triangle::new(&self.points, index, a[k], b[k]));
            match a.iter().position(|&v| v == b[k]) {
                Some(0) => break,
                Some(next) if fan.len() < a.len() => k = next,
                _ => {
                    // broken cavity, leave the triangulation as it was
                    self.points.pop();
                    return false;
                }
            }
        }
        if fan.len() != a.len() {
            self.points.pop();
            return false;
        }

        let mut removed = to_split;
        removed.sort_unstable();
        for i in removed.into_iter().rev() {
            self.triangles.swap_remove(i);
        }
        self.triangles.extend(fan);
        true
    }

    /// Seeds in insertion order, without the frame corners
    pub fn seeds(&self) -> &[Vec2] {
        &self.points[FRAME..]
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// A triangle is real if it does not touch the frame
    pub fn is_real(&self, triangle: &Triangle) -> bool {
        triangle.p1 >= FRAME && triangle.p2 >= FRAME && triangle.p3 >= FRAME
    }

    /// Real triangles only
    pub fn triangulation(&self) -> Vec<Triangle> {
        self.triangles.iter().filter(|t| self.is_real(t)).copied().collect()
    }

    pub fn region(&self, seed: usize) -> Region {
        let index = seed + FRAME;
        let center = self.points[index];
        let mut triangles: Vec<usize> = self
            .triangles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.has_vertex(index))
            .map(|(i, _)| i)
            .collect();
        triangles.sort_by(|&i, &j| {
            let a = self.triangles[i].c - center;
            let b = self.triangles[j].c - center;
            a.y.atan2(a.x).partial_cmp(&b.y.atan2(b.x)).unwrap_or(Ordering::Equal)
        });
        Region { seed, triangles }
    }

    /// One region per seed
    pub fn regions(&self) -> Vec<Region> {
        (0..self.seeds().len()).map(|s| self.region(s)).collect()
    }

    /// Regions made only of real triangles, in seed order
    pub fn partitioning(&self) -> Vec<Region> {
        self.regions()
            .into_iter()
            .filter(|r| !r.triangles.is_empty() && r.triangles.iter().all(|&t| self.is_real(&self.triangles[t])))
            .collect()
    }

    /// Lloyd step: every selected seed moves to the centroid of its region,
    /// then everything is rebuilt from scratch. Seeds keep their order.
    pub fn relax(&self, selected: &[usize]) -> Voronoi {
        let mut seeds = self.seeds().to_vec();
        for region in self.partitioning() {
            if selected.contains(&region.seed) {
                let poly = region.polygon(self);
                seeds[region.seed] = polygon_centroid(&poly, polygon_area(&poly));
            }
        }
        Voronoi::build(&seeds)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::prelude::*;
    use rand::rngs::StdRng;
    use spade::{DelaunayTriangulation, Point2, Triangulation};

    use super::*;
    use crate::systems::mesh::poly::point_gen::spiral;

    fn grid_jitter(seed: u64) -> Vec<Vec2> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut points = Vec::new();
        for x in 0..6 {
            for y in 0..6 {
                points.push(Vec2::new(
                    x as f32 * 10.0 + rng.random_range(-3.0..3.0),
                    y as f32 * 10.0 + rng.random_range(-3.0..3.0),
                ));
            }
        }
        points
    }

    #[test]
    fn triangles_are_counter_clockwise_with_empty_circumcircles() {
        let seeds = grid_jitter(7);
        let voronoi = Voronoi::build(&seeds);
        for t in voronoi.triangles() {
            let (a, b, c) = (voronoi.points()[t.p1], voronoi.points()[t.p2], voronoi.points()[t.p3]);
            assert!((b - a).perp_dot(c - a) > 0.0);
            for (i, p) in voronoi.points().iter().enumerate() {
                if !t.has_vertex(i) {
                    assert!(p.distance(t.c) >= t.r * (1.0 - 1e-4));
                }
            }
        }
    }

    #[test]
    fn real_triangles_agree_with_spade() {
        let mut rng = StdRng::seed_from_u64(3);
        let seeds = spiral(60, &mut rng);
        let voronoi = Voronoi::build(&seeds);

        let mut reference: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();
        for p in &seeds {
            reference.insert(Point2::new(p.x as f64, p.y as f64)).ok();
        }
        let index_of = |p: Point2<f64>| {
            seeds
                .iter()
                .position(|s| s.x as f64 == p.x && s.y as f64 == p.y)
                .unwrap_or(usize::MAX)
        };
        let faces: HashSet<[usize; 3]> = reference
            .inner_faces()
            .map(|face| {
                let mut ids = face.vertices().map(|v| index_of(v.position()));
                ids.sort_unstable();
                ids
            })
            .collect();

        let real = voronoi.triangulation();
        assert!(!real.is_empty());
        for t in real {
            let mut ids = [t.p1 - FRAME, t.p2 - FRAME, t.p3 - FRAME];
            ids.sort_unstable();
            assert!(faces.contains(&ids), "triangle {ids:?} is not delaunay");
        }
    }

    #[test]
    fn duplicate_points_are_ignored() {
        let mut voronoi = Voronoi::new(Vec2::splat(-10.0), Vec2::splat(10.0));
        assert!(voronoi.add_point(Vec2::ZERO));
        let count = voronoi.triangles().len();
        assert!(!voronoi.add_point(Vec2::ZERO));
        assert_eq!(voronoi.triangles().len(), count);
        assert_eq!(voronoi.seeds().len(), 1);
    }

    #[test]
    fn partitioning_skips_cells_touching_the_frame() {
        let seeds = grid_jitter(11);
        let voronoi = Voronoi::build(&seeds);
        let regions = voronoi.partitioning();
        assert!(!regions.is_empty());
        assert!(regions.len() < seeds.len());
        // interior seeds of the grid are always bounded
        let bounded: HashSet<usize> = regions.iter().map(|r| r.seed).collect();
        assert!(bounded.contains(&(2 * 6 + 2)));
        for pair in regions.windows(2) {
            assert!(pair[0].seed < pair[1].seed);
        }
        for region in &regions {
            let poly = region.polygon(&voronoi);
            assert!(poly.len() >= 3);
            assert!(polygon_area(&poly) > 0.0);
        }
    }

    #[test]
    fn relax_moves_only_selected_seeds() {
        let seeds = grid_jitter(5);
        let voronoi = Voronoi::build(&seeds);
        let target = 2 * 6 + 3;
        let relaxed = voronoi.relax(&[target]);
        assert_eq!(relaxed.seeds().len(), seeds.len());
        for (i, (before, after)) in seeds.iter().zip(relaxed.seeds()).enumerate() {
            if i == target {
                let region = voronoi.region(target);
                let poly = region.polygon(&voronoi);
                let centroid = polygon_centroid(&poly, polygon_area(&poly));
                assert!(after.distance(centroid) < 1e-4);
            } else {
                assert_eq!(before, after);
            }
        }
    }
}
