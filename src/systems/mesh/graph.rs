//! Weighted graph with a uniform-cost pathfinder.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Handle to a node of a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
struct Node {
    // neighbours in the order they were linked
    links: Vec<(NodeId, f32)>,
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
}

// open set entry, the smallest cost comes out first and equal costs leave in insertion order
#[derive(Debug, Clone, Copy)]
struct Open {
    cost: f32,
    seq: usize,
    node: NodeId,
}

impl PartialEq for Open {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Open {}

impl PartialOrd for Open {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Open {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed, BinaryHeap is a max-heap
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self) -> NodeId {
        self.nodes.push(Node::default());
        NodeId(self.nodes.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Links both ways, an existing link gets its price updated
    pub fn link(&mut self, a: NodeId, b: NodeId, price: f32) {
        self.link_directed(a, b, price);
        self.link_directed(b, a, price);
    }

    pub fn link_directed(&mut self, from: NodeId, to: NodeId, price: f32) {
        let links = &mut self.nodes[from.0].links;
        match links.iter_mut().find(|(n, _)| *n == to) {
            Some(link) => link.1 = price,
            None => links.push((to, price)),
        }
    }

    pub fn unlink(&mut self, a: NodeId, b: NodeId) {
        self.nodes[a.0].links.retain(|(n, _)| *n != b);
        self.nodes[b.0].links.retain(|(n, _)| *n != a);
    }

    pub fn unlink_all(&mut self, node: NodeId) {
        let links = std::mem::take(&mut self.nodes[node.0].links);
        for (other, _) in links {
            self.nodes[other.0].links.retain(|(n, _)| *n != node);
        }
    }

    pub fn neighbours(&self, node: NodeId) -> impl Iterator<Item = (NodeId, f32)> + '_ {
        self.nodes[node.0].links.iter().copied()
    }

    pub fn price_of(&self, a: NodeId, b: NodeId) -> Option<f32> {
        self.nodes[a.0].links.iter().find(|(n, _)| *n == b).map(|(_, p)| *p)
    }

    /// Total price of walking `path`, `None` if two consecutive nodes are not linked
    pub fn price(&self, path: &[NodeId]) -> Option<f32> {
        path.windows(2).map(|w| self.price_of(w[0], w[1])).sum()
    }

    /// A* without a heuristic, nodes in `exclude` are never entered.
    /// The start itself is always expanded, even when excluded.
    ///
    /// # Returns
    /// The path from `goal` back to `start` (both included), `None` if unreachable
    pub fn a_star(&self, start: NodeId, goal: NodeId, exclude: &[NodeId]) -> Option<Vec<NodeId>> {
        if start == goal {
            return Some(vec![start]);
        }

        let n = self.nodes.len();
        let mut closed = vec![false; n];
        for node in exclude {
            closed[node.0] = true;
        }
        closed[start.0] = false;
        let mut score = vec![f32::INFINITY; n];
        let mut came_from: Vec<Option<NodeId>> = vec![None; n];

        let mut open = BinaryHeap::new();
        let mut seq = 0;
        score[start.0] = 0.0;
        open.push(Open { cost: 0.0, seq, node: start });

        while let Some(Open { cost, node: current, .. }) = open.pop() {
            if closed[current.0] || cost > score[current.0] {
                continue;
            }
            if current == goal {
                return Some(Self::build_path(&came_from, current));
            }
            closed[current.0] = true;

            for &(neighbour, price) in &self.nodes[current.0].links {
                if closed[neighbour.0] {
                    continue;
                }
                let tentative = cost + price;
                if tentative < score[neighbour.0] {
                    score[neighbour.0] = tentative;
                    came_from[neighbour.0] = Some(current);
                    seq += 1;
                    open.push(Open { cost: tentative, seq, node: neighbour });
                }
            }
        }

        None
    }

    fn build_path(came_from: &[Option<NodeId>], goal: NodeId) -> Vec<NodeId> {
        let mut path = vec![goal];
        let mut current = goal;
        while let Some(prev) = came_from[current.0] {
            path.push(prev);
            current = prev;
        }
        path
    }
}
