//! Shared vertex arena.
//!
//! Every vertex that takes part in the town topology lives here exactly once.
//! Shapes refer to vertices through `PointId`, so two shapes touching at a
//! vertex hold the same id, and moving that vertex is one write that every
//! referencing shape observes. Two ids are never equal just because their
//! positions coincide.

use std::ops::{Index, IndexMut};

use bevy::prelude::*;

/// Handle to a vertex in [`Points`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(usize);

impl PointId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Points {
    positions: Vec<Vec2>,
}

impl Points {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new vertex and returns its handle
    pub fn add(&mut self, position: Vec2) -> PointId {
        self.positions.push(position);
        PointId(self.positions.len() - 1)
    }

    pub fn get(&self, id: PointId) -> Vec2 {
        self.positions[id.0]
    }

    pub fn set(&mut self, id: PointId, position: Vec2) {
        self.positions[id.0] = position;
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PointId, Vec2)> + '_ {
        self.positions.iter().enumerate().map(|(i, p)| (PointId(i), *p))
    }
}

impl Index<PointId> for Points {
    type Output = Vec2;

    fn index(&self, id: PointId) -> &Vec2 {
        &self.positions[id.0]
    }
}

impl IndexMut<PointId> for Points {
    fn index_mut(&mut self, id: PointId) -> &mut Vec2 {
        &mut self.positions[id.0]
    }
}
