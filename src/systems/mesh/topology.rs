//! Street network over the patch outlines.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::systems::mesh::graph::{Graph, NodeId};
use crate::systems::mesh::poly::point::PointId;
use crate::systems::mesh::town::Model;

/// Every distinct patch vertex becomes one graph node, consecutive vertices
/// are linked by their distance. Wall and citadel vertices other than gates
/// get a node but no links, so no street passes through them.
#[derive(Debug, Clone)]
pub struct Topology {
    graph: Graph,
    pt2node: HashMap<PointId, NodeId>,
    node2pt: Vec<PointId>,
    blocked: Vec<PointId>,
    /// Nodes inside the town, not on its border
    pub inner: Vec<NodeId>,
    /// Nodes in the countryside, not on the border
    pub outer: Vec<NodeId>,
}

impl Topology {
    pub fn new(model: &Model) -> Self {
        let mut blocked: Vec<PointId> = Vec::new();
        if let Some(citadel) = model.citadel {
            blocked.extend(model.patches[citadel].shape.iter());
        }
        if let Some(wall) = model.wall() {
            blocked.extend(wall.shape.iter());
        }
        blocked.retain(|v| !model.gates.contains(v));

        let mut topology = Self {
            graph: Graph::new(),
            pt2node: HashMap::new(),
            node2pt: Vec::new(),
            blocked,
            inner: Vec::new(),
            outer: Vec::new(),
        };

        let border = model.border.as_ref().map(|b| &b.shape);
        let on_border = |v: PointId| border.is_some_and(|s| s.contains(v));
        let mut seen_inner = Vec::new();
        let mut seen_outer = Vec::new();

        for patch in &model.patches {
            for (v0, v1) in patch.shape.edges() {
                let n0 = topology.process_point(v0);
                let n1 = topology.process_point(v1);
                for (v, n) in [(v0, n0), (v1, n1)] {
                    let Some(n) = n else { continue };
                    if on_border(v) {
                        continue;
                    }
                    // a node between the town and the countryside lands in both lists
                    let (seen, list) = if patch.within_city {
                        (&mut seen_inner, &mut topology.inner)
                    } else {
                        (&mut seen_outer, &mut topology.outer)
                    };
                    if seen.len() <= n.index() {
                        seen.resize(n.index() + 1, false);
                    }
                    if !seen[n.index()] {
                        seen[n.index()] = true;
                        list.push(n);
                    }
                }
                if let (Some(n0), Some(n1)) = (n0, n1) {
                    topology
                        .graph
                        .link(n0, n1, model.points[v0].distance(model.points[v1]));
                }
            }
        }

        topology
    }

    // node of a vertex, created on first sight, `None` for blocked vertices
    fn process_point(&mut self, v: PointId) -> Option<NodeId> {
        let node = match self.pt2node.get(&v) {
            Some(&node) => node,
            None => {
                let node = self.graph.add();
                self.pt2node.insert(v, node);
                self.node2pt.push(v);
                node
            }
        };
        (!self.blocked.contains(&v)).then_some(node)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn node(&self, v: PointId) -> Option<NodeId> {
        self.pt2node.get(&v).copied()
    }

    pub fn point(&self, node: NodeId) -> PointId {
        self.node2pt[node.index()]
    }

    /// All vertices known to the network, in discovery order
    pub fn points(&self) -> &[PointId] {
        &self.node2pt
    }

    /// Vertex of the network closest to `target`
    pub fn nearest(&self, model: &Model, target: Vec2) -> Option<PointId> {
        let mut best = None;
        let mut best_dist = f32::INFINITY;
        for &v in &self.node2pt {
            let d = model.points[v].distance(target);
            if d < best_dist {
                best_dist = d;
                best = Some(v);
            }
        }
        best
    }

    /// Shortest route between two vertices avoiding `exclude`
    ///
    /// # Returns
    /// The vertices from `from` to `to`, `None` if there is no route
    pub fn build_path(&self, from: PointId, to: PointId, exclude: &[NodeId]) -> Option<Vec<PointId>> {
        let start = self.node(from)?;
        let goal = self.node(to)?;
        let path = self.graph.a_star(start, goal, exclude)?;
        Some(path.into_iter().rev().map(|n| self.point(n)).collect())
    }
}
