use crate::systems::mesh::poly::shape::Shape;
use crate::systems::mesh::wards::Ward;

/// One cell of the town plan
#[derive(Debug, Clone, Default)]
pub struct Patch {
    pub shape: Shape,
    pub ward: Option<Ward>,
    pub within_walls: bool,
    pub within_city: bool,
}

impl Patch {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            ..Default::default()
        }
    }

    pub fn has_ward(&self) -> bool {
        self.ward.is_some()
    }
}
