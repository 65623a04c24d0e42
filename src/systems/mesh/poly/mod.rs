// polygon kernel: vertex arena, shapes, polygon algebra and the planar subdivision

pub mod offset;
pub mod point;
pub mod point_gen;
pub mod shape;
pub mod subdivision;
pub mod utils;
pub mod voronoi;
