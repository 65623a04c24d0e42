// handles point generation logic

use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::config::{RELAXED_CENTRAL_SEEDS, SPIRAL_ANGLE_STEP, SPIRAL_BASE_RADIUS};
use super::voronoi::Voronoi;

// generates points in a spiral around (0,0)
// the first point sits on the origin, then the radius grows with a random step per point
pub fn spiral(num_points: usize, rng: &mut StdRng) -> Vec<Vec2> {
    let start_angle = rng.random::<f32>() * std::f32::consts::TAU;
    let mut points = Vec::with_capacity(num_points);

    for i in 0..num_points {
        let t = i as f32;
        let angle = start_angle + t.sqrt() * SPIRAL_ANGLE_STEP;
        let radius = if i == 0 {
            0.0
        } else {
            SPIRAL_BASE_RADIUS + t * (2.0 + rng.random::<f32>())
        };
        points.push(Vec2::new(angle.cos(), angle.sin()) * radius);
    }

    points
}

// lloyd's relaxation restricted to the central seeds
// the seeds closest to the origin plus the `extra`-th closest one are relaxed each step
pub fn prelax(voronoi: Voronoi, extra: usize, steps: usize) -> Voronoi {
    let mut voronoi = voronoi;

    for _ in 0..steps {
        let mut order: Vec<usize> = (0..voronoi.seeds().len()).collect();
        let seeds = voronoi.seeds();
        order.sort_by(|&a, &b| seeds[a].length().total_cmp(&seeds[b].length()));

        let mut selected: Vec<usize> = order.iter().take(RELAXED_CENTRAL_SEEDS).copied().collect();
        if let Some(&seed) = order.get(extra) {
            selected.push(seed);
        }
        voronoi = voronoi.relax(&selected);
    }

    voronoi
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spiral_is_deterministic_and_expanding() {
        let a = spiral(40, &mut StdRng::seed_from_u64(9));
        let b = spiral(40, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
        assert_eq!(a[0], Vec2::ZERO);
        // radius step is between 2 and 3 per point
        for (i, p) in a.iter().enumerate().skip(1) {
            let t = i as f32;
            assert!(p.length() >= SPIRAL_BASE_RADIUS + 2.0 * t - 1e-3);
            assert!(p.length() <= SPIRAL_BASE_RADIUS + 3.0 * t + 1e-3);
        }
    }

    #[test]
    fn prelax_keeps_every_seed() {
        let mut rng = StdRng::seed_from_u64(21);
        let points = spiral(80, &mut rng);
        let voronoi = Voronoi::build(&points);
        let relaxed = prelax(voronoi, 10, 3);
        assert_eq!(relaxed.seeds().len(), points.len());
        // outlying seeds are untouched
        assert_eq!(relaxed.seeds()[79], points[79]);
    }
}
