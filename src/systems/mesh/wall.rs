//! Fortification walls and their gates.

use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;
use tracing::debug;

use crate::config::{MIN_ENTRANCES_LEFT, WALL_SMOOTH_BUDGET};
use crate::error::GenerationError;
use crate::systems::mesh::poly::point::{PointId, Points};
use crate::systems::mesh::poly::shape::Shape;
use crate::systems::mesh::town::{find_circumference, Model};

/// A closed wall around a set of patches.
///
/// A wall that is not `real` is only the perimeter of the town: it still has
/// gates for the streets to run through, but no towers and no masonry.
#[derive(Debug, Clone)]
pub struct CurtainWall {
    pub shape: Shape,
    /// `segments[i]` is the edge from `shape[i]` to `shape[i + 1]`
    pub segments: Vec<bool>,
    pub gates: Vec<PointId>,
    pub towers: Vec<PointId>,
    /// Indices of the enclosed patches
    pub patches: Vec<usize>,
    real: bool,
}

impl CurtainWall {
    /// Builds the wall around `patches` and picks its gates.
    /// Vertices in `reserved` are neither moved nor used as gates.
    /// Each bearing asks for a gate in that direction from the town center.
    ///
    /// # Returns
    /// `BadWalledAreaShape` if no vertex can hold a gate
    pub fn new(
        real: bool,
        model: &mut Model,
        patches: Vec<usize>,
        reserved: &[PointId],
        bearings: &[Vec2],
        rng: &mut StdRng,
    ) -> Result<Self, GenerationError> {
        let shape = if patches.len() == 1 {
            model.patches[patches[0]].shape.clone()
        } else {
            let shapes: Vec<&Shape> = patches.iter().map(|&i| &model.patches[i].shape).collect();
            let shape = find_circumference(&shapes);
            if real {
                let factor = (WALL_SMOOTH_BUDGET / patches.len() as f32).min(1.0);
                smooth_wall(&mut model.points, &shape, reserved, factor);
            }
            shape
        };

        let mut wall = Self {
            segments: vec![real; shape.len()],
            shape,
            gates: Vec::new(),
            towers: Vec::new(),
            patches,
            real,
        };
        wall.build_gates(model, reserved, bearings, rng)?;
        Ok(wall)
    }

    pub fn is_real(&self) -> bool {
        self.real
    }

    fn build_gates(
        &mut self,
        model: &mut Model,
        reserved: &[PointId],
        bearings: &[Vec2],
        rng: &mut StdRng,
    ) -> Result<(), GenerationError> {
        // entrances need more than one enclosed patch so a street can reach the inside
        let mut entrances: Vec<PointId> = self
            .shape
            .iter()
            .filter(|v| !reserved.contains(v))
            .filter(|&v| {
                self.patches.len() == 1
                    || self.patches.iter().filter(|&&p| model.patches[p].shape.contains(v)).count() > 1
            })
            .collect();

        if entrances.is_empty() {
            return Err(GenerationError::BadWalledAreaShape { entrances: 0, gates: 0 });
        }
        let candidates = entrances.len();

        // requested approaches first, closest angle around the center wins
        let center = model.points[model.center];
        for bearing in bearings {
            if entrances.len() < MIN_ENTRANCES_LEFT {
                break;
            }
            let direction = bearing.normalize_or_zero();
            let index = (0..entrances.len()).max_by(|&a, &b| {
                let da = (model.points[entrances[a]] - center).normalize_or_zero().dot(direction);
                let db = (model.points[entrances[b]] - center).normalize_or_zero().dot(direction);
                da.total_cmp(&db)
            });
            if let Some(index) = index {
                self.open_gate(model, &mut entrances, index, reserved);
            }
        }

        // the rest open at random, at least one gate when no bearing produced any
        while !entrances.is_empty()
            && (self.gates.is_empty() || entrances.len() >= MIN_ENTRANCES_LEFT)
        {
            let index = rng.random_range(0..entrances.len());
            self.open_gate(model, &mut entrances, index, reserved);
        }

        if self.gates.is_empty() {
            return Err(GenerationError::BadWalledAreaShape { entrances: candidates, gates: 0 });
        }

        if self.real {
            for &gate in &self.gates {
                if let Some(smoothed) = self.shape.smooth_vertex(&model.points, gate, 1.0) {
                    model.points.set(gate, smoothed);
                }
            }
        }
        debug!(candidates, gates = self.gates.len(), real = self.real, "gates placed");

        Ok(())
    }

    // turns entrances[index] into a gate and drops it and its neighbours from the pool
    fn open_gate(&mut self, model: &mut Model, entrances: &mut Vec<PointId>, index: usize, reserved: &[PointId]) {
        let gate = entrances[index];
        self.gates.push(gate);

        if self.real {
            self.split_outer_patch(model, gate, reserved);
        }

        let len = entrances.len();
        let mut doomed = vec![index, (index + 1) % len, (index + len - 1) % len];
        doomed.sort_unstable();
        doomed.dedup();
        for i in doomed.into_iter().rev() {
            entrances.remove(i);
        }
    }

    // without a road leading out of the walls there is no room for a street,
    // so the single outer patch at the gate is split in two
    fn split_outer_patch(&self, model: &mut Model, gate: PointId, reserved: &[PointId]) {
        let outer: Vec<usize> = model
            .patch_by_vertex(gate)
            .into_iter()
            .filter(|p| !self.patches.contains(p))
            .collect();
        let [outer] = outer[..] else {
            return;
        };
        if model.patches[outer].shape.len() <= 3 {
            return;
        }
        let (Some(next), Some(prev)) = (self.shape.next(gate), self.shape.prev(gate)) else {
            return;
        };

        let points = &model.points;
        let along = points[next] - points[prev];
        let out = Vec2::new(along.y, -along.x);
        let gate_pos = points[gate];

        let mut farthest = None;
        let mut best = f32::NEG_INFINITY;
        for v in model.patches[outer].shape.iter() {
            if self.shape.contains(v) || reserved.contains(&v) {
                continue;
            }
            let dir = points[v] - gate_pos;
            let length = dir.length();
            if length < f32::EPSILON {
                continue;
            }
            let score = dir.dot(out) / length;
            if score > best {
                best = score;
                farthest = Some(v);
            }
        }

        if let Some(farthest) = farthest {
            model.split_patch(outer, gate, farthest);
        }
    }

    /// Towers on every non-gate vertex touching a real segment
    pub fn build_towers(&mut self) {
        self.towers.clear();
        if !self.real {
            return;
        }
        let len = self.shape.len();
        for (i, v) in self.shape.iter().enumerate() {
            if !self.gates.contains(&v) && (self.segments[(i + len - 1) % len] || self.segments[i]) {
                self.towers.push(v);
            }
        }
    }

    /// Distance from the origin to the farthest vertex
    pub fn radius(&self, points: &Points) -> f32 {
        self.shape.iter().map(|v| points[v].length()).fold(0.0, f32::max)
    }

    /// True if a real segment of the wall runs along an edge of the patch
    pub fn borders(&self, patch: usize, shape: &Shape) -> bool {
        let inside = self.patches.contains(&patch);
        self.shape
            .edges()
            .zip(&self.segments)
            .filter(|(_, real)| **real)
            .any(|((v0, v1), _)| {
                if inside {
                    shape.find_edge(v0, v1).is_some()
                } else {
                    shape.find_edge(v1, v0).is_some()
                }
            })
    }

    /// True if the patch edge `v0 -> v1` lies on a real segment
    pub fn borders_by(&self, patch: usize, v0: PointId, v1: PointId) -> bool {
        let index = if self.patches.contains(&patch) {
            self.shape.find_edge(v0, v1)
        } else {
            self.shape.find_edge(v1, v0)
        };
        index.is_some_and(|i| self.segments[i])
    }
}

// smooths the wall outline in place, every new position comes from the old ones
fn smooth_wall(points: &mut Points, shape: &Shape, reserved: &[PointId], factor: f32) {
    let smoothed: Vec<(PointId, Vec2)> = shape
        .iter()
        .filter(|v| !reserved.contains(v))
        .filter_map(|v| shape.smooth_vertex(points, v, factor).map(|p| (v, p)))
        .collect();
    for (v, p) in smoothed {
        points.set(v, p);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::systems::mesh::patch::Patch;

    // 3 x 3 grid of unit squares, the middle one is the town
    fn grid_model() -> Model {
        let mut points = Points::new();
        let mut ids = Vec::new();
        for y in 0..4 {
            for x in 0..4 {
                ids.push(points.add(Vec2::new(x as f32 * 10.0 - 15.0, y as f32 * 10.0 - 15.0)));
            }
        }
        let at = |x: usize, y: usize| ids[y * 4 + x];
        let mut patches = Vec::new();
        for y in 0..3 {
            for x in 0..3 {
                let shape = Shape::new(vec![at(x, y), at(x + 1, y), at(x + 1, y + 1), at(x, y + 1)]);
                patches.push(Patch::new(shape));
            }
        }
        let mut model = Model::empty(points, at(1, 1));
        model.patches = patches;
        model.inner = vec![4];
        model.patches[4].within_city = true;
        model
    }

    #[test]
    fn single_patch_wall_gets_gates() {
        let mut model = grid_model();
        let mut rng = StdRng::seed_from_u64(1);
        let wall = CurtainWall::new(false, &mut model, vec![4], &[], &[], &mut rng).unwrap();
        assert_eq!(wall.shape, model.patches[4].shape);
        assert!(!wall.gates.is_empty());
        assert!(wall.gates.iter().all(|g| wall.shape.contains(*g)));
    }

    #[test]
    fn fully_reserved_wall_has_no_entrance() {
        let mut model = grid_model();
        let reserved: Vec<PointId> = model.patches[4].shape.iter().collect();
        let mut rng = StdRng::seed_from_u64(1);
        let err = CurtainWall::new(true, &mut model, vec![4], &reserved, &[], &mut rng).unwrap_err();
        assert_eq!(err, GenerationError::BadWalledAreaShape { entrances: 0, gates: 0 });
    }

    #[test]
    fn bearings_leave_room_for_random_gates() {
        let mut points = Points::new();
        let center = points.add(Vec2::ZERO);
        let ring: Vec<PointId> = (0..12)
            .map(|k| {
                let angle = k as f32 * std::f32::consts::TAU / 12.0;
                points.add(Vec2::new(angle.cos(), angle.sin()) * 10.0)
            })
            .collect();
        let mut model = Model::empty(points, center);
        model.patches.push(Patch::new(Shape::new(ring.clone())));
        model.inner = vec![0];

        let mut rng = StdRng::seed_from_u64(5);
        let wall = CurtainWall::new(false, &mut model, vec![0], &[], &[Vec2::X], &mut rng).unwrap();
        // every gate takes itself and both neighbours out of the pool of 12
        assert_eq!(wall.gates.len(), 4);
        assert_eq!(wall.gates[0], ring[0]);
        for (i, a) in wall.gates.iter().enumerate() {
            for b in &wall.gates[i + 1..] {
                assert_ne!(wall.shape.next(*a), Some(*b));
                assert_ne!(wall.shape.prev(*a), Some(*b));
            }
        }
    }

    #[test]
    fn gate_splits_the_single_patch_outside() {
        let mut points = Points::new();
        let ids: Vec<PointId> = [
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
            (0.0, -10.0),
            (20.0, -10.0),
            (20.0, 10.0),
        ]
        .iter()
        .map(|&(x, y)| points.add(Vec2::new(x, y)))
        .collect();
        let mut model = Model::empty(points, ids[3]);
        let mut town = Patch::new(Shape::new(ids[..4].to_vec()));
        town.within_city = true;
        town.within_walls = true;
        model.patches.push(town);
        // an L around the south-east corner, the only outside patch at that corner
        model
            .patches
            .push(Patch::new(Shape::new(vec![ids[1], ids[0], ids[4], ids[5], ids[6], ids[2]])));
        model.inner = vec![0];

        let mut rng = StdRng::seed_from_u64(6);
        let wall = CurtainWall::new(true, &mut model, vec![0], &[], &[Vec2::new(1.0, -1.0)], &mut rng).unwrap();
        assert_eq!(wall.gates, vec![ids[1]]);

        // split from the gate towards the vertex straight outwards
        assert_eq!(model.patches.len(), 3);
        for half in &model.patches[1..] {
            assert!(half.shape.contains(ids[1]) && half.shape.contains(ids[5]));
            assert!(half.shape.area(&model.points) > 0.0);
            assert!(!half.within_city);
        }
        assert_eq!(model.inner, vec![0]);
    }

    #[test]
    fn bearing_picks_the_matching_vertex() {
        let mut model = grid_model();
        model.center = model.patches[4].shape.vertices()[0];
        let mut rng = StdRng::seed_from_u64(2);
        // the town square spans (-5, -5) to (5, 5), ask for the north-east corner
        let wall = CurtainWall::new(false, &mut model, vec![4], &[], &[Vec2::new(1.0, 1.0)], &mut rng).unwrap();
        assert_eq!(wall.gates.len(), 1);
        assert_eq!(model.points[wall.gates[0]], Vec2::new(5.0, 5.0));
    }

    #[test]
    fn towers_skip_gates_and_virtual_walls() {
        let mut model = grid_model();
        let mut rng = StdRng::seed_from_u64(3);
        let mut wall = CurtainWall::new(true, &mut model, vec![4], &[], &[], &mut rng).unwrap();
        wall.build_towers();
        assert_eq!(wall.towers.len() + wall.gates.len(), wall.shape.len());
        assert!(wall.towers.iter().all(|t| !wall.gates.contains(t)));
        assert!(wall.radius(&model.points) > 0.0);

        let mut open = CurtainWall::new(false, &mut grid_model(), vec![4], &[], &[], &mut rng).unwrap();
        open.build_towers();
        assert!(open.towers.is_empty());
    }

    #[test]
    fn wall_borders_neighbours_from_outside() {
        let mut model = grid_model();
        let mut rng = StdRng::seed_from_u64(4);
        let wall = CurtainWall::new(true, &mut model, vec![4], &[], &[], &mut rng).unwrap();
        // the patch south of the town shares the wall edge reversed
        let south = &model.patches[1].shape;
        assert!(wall.borders(1, south));
        assert!(wall.borders(4, &model.patches[4].shape));
        assert!(!wall.borders(0, &model.patches[0].shape));
    }
}
