// settlement assembly: patches, walls, streets, wards and their buildings

use std::collections::VecDeque;

use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;
use tracing::{debug, error, info, warn};

use crate::config::*;
use crate::error::GenerationError;
use crate::systems::mesh::chance::chance;
use crate::systems::mesh::patch::Patch;
use crate::systems::mesh::poly::offset::smooth_vertex;
use crate::systems::mesh::poly::point::{PointId, Points};
use crate::systems::mesh::poly::point_gen::{prelax, spiral};
use crate::systems::mesh::poly::shape::Shape;
use crate::systems::mesh::poly::voronoi::Voronoi;
use crate::systems::mesh::topology::Topology;
use crate::systems::mesh::wall::CurtainWall;
use crate::systems::mesh::wards::{self, district_plan, Ward, WardKind};
use crate::systems::mesh::{ClearEvent, Params, Polygon, RegenerateEvent, Town};

/// A generated settlement.
///
/// Patch indices (`inner`, `plaza`, `citadel`, wall `patches`) point into
/// `patches`, every shape vertex points into `points`.
#[derive(Debug, Clone)]
pub struct Model {
    pub params: Params,
    pub points: Points,
    pub patches: Vec<Patch>,
    /// Patches inside the town proper
    pub inner: Vec<usize>,
    pub plaza: Option<usize>,
    pub citadel: Option<usize>,
    /// The plaza vertex closest to the origin, where streets converge without a plaza
    pub center: PointId,
    /// Perimeter of the town, a real wall only when `params.walls` is set
    pub border: Option<CurtainWall>,
    pub citadel_wall: Option<CurtainWall>,
    /// Border gates followed by citadel gates
    pub gates: Vec<PointId>,
    /// Gate to plaza (or center) routes
    pub streets: Vec<Vec<PointId>>,
    /// Countryside to gate routes
    pub roads: Vec<Vec<PointId>>,
    /// Streets and roads stitched into non-overlapping polylines
    pub arteries: Vec<Vec<PointId>>,
    pub city_radius: f32,
}

/// Generates a settlement from `params`, seeding the RNG with `params.seed`
///
/// # Returns
/// The settlement, or the error that ended the last attempt
pub fn generate(params: &Params) -> Result<Model, GenerationError> {
    let mut rng = StdRng::seed_from_u64(params.seed);
    Model::build(params, &mut rng)
}

// replaces the town resource with a fresh settlement, or nothing on failure
pub fn rebuild(params: &Params, town: &mut Town) {
    match generate(params) {
        Ok(model) => town.model = Some(model),
        Err(err) => {
            error!(seed = params.seed, error = %err, "town generation failed");
            town.model = None;
        }
    }
}

pub fn handle_regeneration(
    mut events: EventReader<RegenerateEvent>,
    mut params: ResMut<Params>,
    mut town: ResMut<Town>,
) {
    for event in events.read() {
        params.seed = event.seed;
        rebuild(&params, &mut town);
    }
}

pub fn handle_clear(mut events: EventReader<ClearEvent>, mut town: ResMut<Town>) {
    for _event in events.read() {
        town.model = None;
    }
}

impl Model {
    /// A model with no patches, mostly useful to assemble fixtures by hand
    pub fn empty(points: Points, center: PointId) -> Self {
        Self {
            params: Params::default(),
            points,
            patches: Vec::new(),
            inner: Vec::new(),
            plaza: None,
            citadel: None,
            center,
            border: None,
            citadel_wall: None,
            gates: Vec::new(),
            streets: Vec::new(),
            roads: Vec::new(),
            arteries: Vec::new(),
            city_radius: 0.0,
        }
    }

    /// Runs the whole pipeline, retrying structural failures.
    /// Every attempt keeps drawing from the same `rng`.
    pub fn build(params: &Params, rng: &mut StdRng) -> Result<Self, GenerationError> {
        params.validate()?;

        let mut last = None;
        for attempt in 1..=MAX_BUILD_ATTEMPTS {
            match Self::try_build(params, rng) {
                Ok(model) => {
                    info!(
                        attempt,
                        patches = model.patches.len(),
                        inner = model.inner.len(),
                        gates = model.gates.len(),
                        arteries = model.arteries.len(),
                        "settlement built"
                    );
                    return Ok(model);
                }
                Err(err) if err.is_structural() => {
                    warn!(attempt, error = %err, "settlement attempt failed");
                    last = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(GenerationError::AttemptsExhausted {
            attempts: MAX_BUILD_ATTEMPTS,
            last: Box::new(last.unwrap_or_else(|| {
                GenerationError::InvalidParameters("no attempt was made".to_string())
            })),
        })
    }

    fn try_build(params: &Params, rng: &mut StdRng) -> Result<Self, GenerationError> {
        let mut model = Self::build_patches(params, rng)?;
        model.optimize_junctions();
        debug!(patches = model.patches.len(), "patches built");

        model.build_walls(rng)?;
        debug!(patches = model.patches.len(), gates = model.gates.len(), "walls built");

        model.build_streets()?;
        debug!(streets = model.streets.len(), roads = model.roads.len(), "streets built");

        model.create_wards(rng);
        model.build_geometry(rng);
        Ok(model)
    }

    // -- phase 1: patches --

    fn build_patches(params: &Params, rng: &mut StdRng) -> Result<Self, GenerationError> {
        let n = params.n_patches;
        let seeds = spiral(n * POINTS_PER_PATCH, rng);
        let voronoi = prelax(Voronoi::build(&seeds), n, RELAX_STEPS);

        let mut regions = voronoi.partitioning();
        let seeds = voronoi.seeds();
        regions.sort_by(|a, b| seeds[a.seed].length().total_cmp(&seeds[b.seed].length()));

        let required = n + usize::from(params.citadel);
        if regions.len() < required.max(1) {
            return Err(GenerationError::TooFewPatches { found: regions.len(), required });
        }

        // one arena vertex per triangle, shared by every region around it
        let mut points = Points::new();
        let mut ids: Vec<Option<PointId>> = vec![None; voronoi.triangles().len()];
        let mut patches = Vec::with_capacity(regions.len());
        for region in &regions {
            let mut vertices = Vec::with_capacity(region.triangles.len());
            for &t in &region.triangles {
                let id = match ids[t] {
                    Some(id) => id,
                    None => {
                        let id = points.add(voronoi.triangles()[t].c);
                        ids[t] = Some(id);
                        id
                    }
                };
                vertices.push(id);
            }
            patches.push(Patch::new(Shape::new(vertices)));
        }

        let center = patches[0]
            .shape
            .min_by_key(|v| points[v].length())
            .ok_or(GenerationError::TooFewPatches { found: 0, required })?;

        let mut model = Self::empty(points, center);
        model.params = params.clone();
        model.patches = patches;

        for (i, patch) in model.patches.iter_mut().enumerate() {
            if i == 0 && params.plaza {
                model.plaza = Some(i);
            }
            if i == n && params.citadel {
                model.citadel = Some(i);
                patch.within_city = true;
            }
            if i < n {
                patch.within_city = true;
                patch.within_walls = params.walls;
                model.inner.push(i);
            }
        }

        Ok(model)
    }

    // -- phase 2: junction cleanup --

    // merges short edges of the town patches into their midpoint
    fn optimize_junctions(&mut self) {
        let mut targets = self.inner.clone();
        targets.extend(self.citadel);

        let mut touched = Vec::new();
        for &w in &targets {
            let mut index = 0;
            while index < self.patches[w].shape.len() {
                let shape = &self.patches[w].shape;
                let len = shape.len();
                let v0 = shape.vertices()[index];
                let v1 = shape.vertices()[(index + 1) % len];

                let short = self.points[v0].distance(self.points[v1]) < JUNCTION_MERGE_DISTANCE;
                if len > 3 && v0 != v1 && short {
                    for (p, patch) in self.patches.iter_mut().enumerate() {
                        if p != w && patch.shape.contains(v1) {
                            patch.shape.replace(v1, v0);
                            touched.push(p);
                        }
                    }
                    let mid = (self.points[v0] + self.points[v1]) / 2.0;
                    self.points.set(v0, mid);
                    self.patches[w].shape.vertices_mut().retain(|&v| v != v1);
                    if self.center == v1 {
                        self.center = v0;
                    }
                }
                index += 1;
            }
        }

        touched.sort_unstable();
        touched.dedup();
        for p in touched {
            self.patches[p].shape.dedup_vertices();
        }
    }

    // -- phase 3: walls --

    fn build_walls(&mut self, rng: &mut StdRng) -> Result<(), GenerationError> {
        let reserved: Vec<PointId> = self
            .citadel
            .map(|c| self.patches[c].shape.vertices().to_vec())
            .unwrap_or_default();
        let bearings = self.params.approach_bearings.clone();
        let (real, inner) = (self.params.walls, self.inner.clone());

        let mut border = CurtainWall::new(real, self, inner, &reserved, &bearings, rng)?;
        border.build_towers();

        // drop the countryside too far away to matter
        let radius = border.radius(&self.points);
        let center = self.center_position();
        let keep: Vec<bool> = self
            .patches
            .iter()
            .map(|p| p.shape.distance(&self.points, center) < radius * PRUNE_RADIUS_FACTOR)
            .collect();
        let remap = self.retain_patches(&keep);
        border.patches = border.patches.iter().filter_map(|&i| remap[i]).collect();

        self.gates = border.gates.clone();
        self.border = Some(border);

        if let Some(citadel) = self.citadel {
            // vertices touching the countryside stay where they are
            let reserved: Vec<PointId> = self.patches[citadel]
                .shape
                .iter()
                .filter(|&v| self.patch_by_vertex(v).iter().any(|&p| !self.patches[p].within_city))
                .collect();

            let mut castle = CurtainWall::new(true, self, vec![citadel], &reserved, &[], rng)?;
            castle.build_towers();
            self.patches[citadel].ward = Some(Ward::new(WardKind::Castle, rng));

            let compactness = self.patches[citadel].shape.compactness(&self.points);
            if compactness < CITADEL_MIN_COMPACTNESS {
                return Err(GenerationError::BadCitadelShape {
                    compactness,
                    min: CITADEL_MIN_COMPACTNESS,
                });
            }

            self.gates.extend(castle.gates.iter().copied());
            self.citadel_wall = Some(castle);
        }

        Ok(())
    }

    // keeps the flagged patches and renumbers every stored index
    fn retain_patches(&mut self, keep: &[bool]) -> Vec<Option<usize>> {
        let mut remap = Vec::with_capacity(keep.len());
        let mut next = 0;
        for &k in keep {
            if k {
                remap.push(Some(next));
                next += 1;
            } else {
                remap.push(None);
            }
        }

        let mut index = 0;
        self.patches.retain(|_| {
            let k = keep[index];
            index += 1;
            k
        });
        self.inner = self.inner.iter().filter_map(|&i| remap[i]).collect();
        self.plaza = self.plaza.and_then(|i| remap[i]);
        self.citadel = self.citadel.and_then(|i| remap[i]);
        remap
    }

    // -- phase 4: streets --

    fn build_streets(&mut self) -> Result<(), GenerationError> {
        let topology = Topology::new(self);
        let border_gates: Vec<PointId> = self.border.as_ref().map(|b| b.gates.clone()).unwrap_or_default();

        let mut streets = Vec::new();
        let mut roads = Vec::new();
        for &gate in &self.gates {
            let gate_pos = self.points[gate];

            let end = self
                .plaza
                .and_then(|p| self.patches[p].shape.min_by_key(|v| self.points[v].distance(gate_pos)))
                .unwrap_or(self.center);

            let street = topology
                .build_path(gate, end, &topology.outer)
                .ok_or(GenerationError::NoStreet { gate: gate_pos })?;
            streets.push(street);

            if border_gates.contains(&gate) {
                let origin = gate_pos.normalize_or_zero() * ROAD_ORIGIN_DISTANCE;
                let road = topology
                    .nearest(self, origin)
                    .and_then(|start| topology.build_path(start, gate, &topology.inner));
                if let Some(road) = road {
                    roads.push(road);
                }
            }
        }

        self.streets = streets;
        self.roads = roads;
        self.tidy_up_roads();

        for artery in &self.arteries {
            let polyline: Polygon = artery.iter().map(|&v| self.points[v]).collect();
            let smoothed: Vec<Vec2> = (1..polyline.len().saturating_sub(1))
                .map(|i| smooth_vertex(&polyline, i, ARTERY_SMOOTHING))
                .collect();
            for (i, p) in smoothed.into_iter().enumerate() {
                self.points.set(artery[i + 1], p);
            }
        }

        Ok(())
    }

    // splits streets and roads into unique segments and chains them back together
    fn tidy_up_roads(&mut self) {
        let plaza = self.plaza.map(|p| &self.patches[p].shape);

        let mut segments: Vec<(PointId, PointId)> = Vec::new();
        for route in self.streets.iter().chain(&self.roads) {
            for pair in route.windows(2) {
                let (v0, v1) = (pair[0], pair[1]);
                if plaza.is_some_and(|s| s.contains(v0) && s.contains(v1)) {
                    continue;
                }
                if !segments.contains(&(v0, v1)) {
                    segments.push((v0, v1));
                }
            }
        }

        let mut arteries: Vec<Vec<PointId>> = Vec::new();
        while let Some((start, end)) = segments.pop() {
            let mut attached = false;
            for artery in arteries.iter_mut() {
                if artery[0] == end {
                    artery.insert(0, start);
                    attached = true;
                    break;
                } else if artery.last() == Some(&start) {
                    artery.push(end);
                    attached = true;
                    break;
                }
            }
            if !attached {
                arteries.push(vec![start, end]);
            }
        }

        self.arteries = arteries;
    }

    // -- phase 5: districts --

    fn create_wards(&mut self, rng: &mut StdRng) {
        let mut unassigned = self.inner.clone();

        if let Some(plaza) = self.plaza {
            self.patches[plaza].ward = Some(Ward::new(WardKind::Market, rng));
            unassigned.retain(|&p| p != plaza);
        }

        let border_gates: Vec<PointId> = self.border.as_ref().map(|b| b.gates.clone()).unwrap_or_default();
        let walled = self.wall().is_some();
        let gate_chance = if walled { GATE_WARD_CHANCE_WALLED } else { GATE_WARD_CHANCE_OPEN };
        for &gate in &border_gates {
            for patch in self.patch_by_vertex(gate) {
                if self.patches[patch].within_city && !self.patches[patch].has_ward() && chance(rng, gate_chance) {
                    self.patches[patch].ward = Some(Ward::new(WardKind::Gate, rng));
                    unassigned.retain(|&p| p != patch);
                }
            }
        }

        let mut plan = district_plan(&self.params);
        let len = plan.len();
        if len > 1 {
            for _ in 0..len / 10 {
                let index = rng.random_range(0..len - 1);
                plan.swap(index, index + 1);
            }
        }
        let mut plan: VecDeque<WardKind> = plan.into();

        while !unassigned.is_empty() {
            let kind = plan.pop_front().unwrap_or(WardKind::Slum);

            let chosen = if kind.has_scorer() {
                let mut best = None;
                let mut best_rate = f32::INFINITY;
                for &p in &unassigned {
                    let rate = kind.rate_location(self, p);
                    if rate < best_rate {
                        best_rate = rate;
                        best = Some(p);
                    }
                }
                best
            } else {
                Some(unassigned[rng.random_range(0..unassigned.len())])
            };

            // no acceptable location, the kind is skipped
            let Some(patch) = chosen else { continue };
            self.patches[patch].ward = Some(Ward::new(kind, rng));
            unassigned.retain(|&p| p != patch);
        }

        // suburbs grow outside some of the gates
        if walled {
            let n = self.params.n_patches;
            let stay_outside = if n > 5 { 1.0 / (n - 5) as f64 } else { 1.0 };
            for &gate in &border_gates {
                if chance(rng, stay_outside) {
                    continue;
                }
                for patch in self.patch_by_vertex(gate) {
                    if !self.patches[patch].has_ward() {
                        self.patches[patch].within_city = true;
                        self.patches[patch].ward = Some(Ward::new(WardKind::Gate, rng));
                    }
                }
            }
        }

        self.city_radius = self
            .patches
            .iter()
            .filter(|p| p.within_city)
            .flat_map(|p| p.shape.iter())
            .map(|v| self.points[v].length())
            .fold(0.0, f32::max);

        for i in 0..self.patches.len() {
            if self.patches[i].has_ward() {
                continue;
            }
            let kind = if chance(rng, FARM_CHANCE)
                && self.patches[i].shape.compactness(&self.points) >= FARM_MIN_COMPACTNESS
            {
                WardKind::Farm
            } else {
                WardKind::Empty
            };
            self.patches[i].ward = Some(Ward::new(kind, rng));
        }
    }

    // -- phase 6: buildings --

    fn build_geometry(&mut self, rng: &mut StdRng) {
        for i in 0..self.patches.len() {
            if !self.patches[i].has_ward() {
                continue;
            }
            let geometry = wards::create_geometry(self, i, rng);
            if let Some(ward) = self.patches[i].ward.as_mut() {
                ward.geometry = geometry;
            }
        }
    }

    // -- queries --

    /// The border when it is an actual wall
    pub fn wall(&self) -> Option<&CurtainWall> {
        self.border.as_ref().filter(|b| b.is_real())
    }

    pub fn center_position(&self) -> Vec2 {
        self.points[self.center]
    }

    pub fn shape_positions(&self, patch: usize) -> Polygon {
        self.patches[patch].shape.positions(&self.points)
    }

    /// Indices of every patch having `v` as a vertex
    pub fn patch_by_vertex(&self, v: PointId) -> Vec<usize> {
        self.patches
            .iter()
            .enumerate()
            .filter(|(_, p)| p.shape.contains(v))
            .map(|(i, _)| i)
            .collect()
    }

    /// The patch across the edge leaving `v` in `patch`
    pub fn neighbour(&self, patch: usize, v: PointId) -> Option<usize> {
        let next = self.patches[patch].shape.next(v)?;
        self.patches.iter().position(|p| p.shape.find_edge(next, v).is_some())
    }

    /// Patches sharing at least one edge with `patch`
    pub fn neighbours(&self, patch: usize) -> Vec<usize> {
        let shape = &self.patches[patch].shape;
        self.patches
            .iter()
            .enumerate()
            .filter(|&(i, p)| i != patch && p.shape.borders(shape))
            .map(|(i, _)| i)
            .collect()
    }

    /// A town patch that is walled in or surrounded by town on every side
    pub fn is_enclosed(&self, patch: usize) -> bool {
        let p = &self.patches[patch];
        p.within_city
            && (p.within_walls || self.neighbours(patch).iter().all(|&n| self.patches[n].within_city))
    }

    /// Splits a patch along the chord `a -> b`. The first half takes the old
    /// index, the second is appended and joins every group the old one was in.
    ///
    /// # Returns
    /// `false` if the chord is not made of two distinct vertices of the patch
    pub fn split_patch(&mut self, index: usize, a: PointId, b: PointId) -> bool {
        let Some([first, second]) = self.patches[index].shape.split(a, b) else {
            return false;
        };

        let old = &self.patches[index];
        let mut half = Patch::new(second);
        half.within_city = old.within_city;
        half.within_walls = old.within_walls;

        self.patches[index].shape = first;
        self.patches.push(half);
        let new_index = self.patches.len() - 1;

        if self.inner.contains(&index) {
            self.inner.push(new_index);
        }
        if let Some(border) = self.border.as_mut() {
            if border.patches.contains(&index) {
                border.patches.push(new_index);
            }
        }
        true
    }
}

/// Outline of the union of `shapes`, assuming they form one connected piece.
/// An edge is on the outline when no shape holds it reversed.
pub fn find_circumference(shapes: &[&Shape]) -> Shape {
    match shapes {
        [] => return Shape::default(),
        [single] => return (*single).clone(),
        _ => {}
    }

    let mut starts = Vec::new();
    let mut ends = Vec::new();
    for shape in shapes {
        for (a, b) in shape.edges() {
            if shapes.iter().all(|other| other.find_edge(b, a).is_none()) {
                starts.push(a);
                ends.push(b);
            }
        }
    }
    if starts.is_empty() {
        return Shape::default();
    }

    let mut outline = Vec::with_capacity(starts.len());
    let mut index = 0;
    loop {
        outline.push(starts[index]);
        match starts.iter().position(|&v| v == ends[index]) {
            Some(0) | None => break,
            Some(next) => index = next,
        }
        if outline.len() >= starts.len() {
            break;
        }
    }
    Shape::new(outline)
}
