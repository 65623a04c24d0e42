// random helpers shared by the generators
// everything draws from the one StdRng threaded through the pipeline

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

/// Bell-shaped value in `[0, 1]` centered on 0.5
pub fn normal(rng: &mut StdRng) -> f32 {
    let n: f32 = rng.sample(StandardNormal);
    (0.5 + n / 6.0).clamp(0.0, 1.0)
}

/// Blend between a constant 0.5 (`f = 0`) and a full [`normal`] draw (`f = 1`)
pub fn fuzzy(rng: &mut StdRng, f: f32) -> f32 {
    (1.0 - f) / 2.0 + f * normal(rng)
}

/// True with probability `p`, out of range probabilities are clamped
pub fn chance(rng: &mut StdRng, p: f64) -> bool {
    rng.random_bool(p.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_stays_in_unit_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut sum = 0.0;
        for _ in 0..2000 {
            let v = normal(&mut rng);
            assert!((0.0..=1.0).contains(&v));
            sum += v;
        }
        let mean = sum / 2000.0;
        assert!((mean - 0.5).abs() < 0.05);
    }

    #[test]
    fn fuzzy_without_spread_is_constant() {
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(fuzzy(&mut rng, 0.0), 0.5);
    }

    #[test]
    fn chance_clamps_probability() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(chance(&mut rng, 2.0));
        assert!(!chance(&mut rng, -1.0));
    }
}
