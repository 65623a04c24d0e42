//! Districts ("wards") and the buildings they put on their patch.

mod block;
mod geometry;
mod plan;

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::config::EMPTY_PROB;
use crate::systems::mesh::Polygon;
use crate::systems::mesh::poly::subdivision::AlleyParams;

pub use block::{city_block, filter_outskirts};
pub use geometry::create_geometry;
pub use plan::district_plan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WardKind {
    Craftsmen,
    Merchant,
    Slum,
    Patriciate,
    Administration,
    Military,
    Cathedral,
    Market,
    Castle,
    Park,
    Farm,
    Gate,
    Harbour,
    Empty,
}

impl WardKind {
    pub const ALL: [WardKind; 14] = [
        WardKind::Craftsmen,
        WardKind::Merchant,
        WardKind::Slum,
        WardKind::Patriciate,
        WardKind::Administration,
        WardKind::Military,
        WardKind::Cathedral,
        WardKind::Market,
        WardKind::Castle,
        WardKind::Park,
        WardKind::Farm,
        WardKind::Gate,
        WardKind::Harbour,
        WardKind::Empty,
    ];

    /// Display name, `None` for empty land
    pub fn label(self) -> Option<&'static str> {
        let label = match self {
            WardKind::Craftsmen => "Craftsmen",
            WardKind::Merchant => "Merchant",
            WardKind::Slum => "Slum",
            WardKind::Patriciate => "Patriciate",
            WardKind::Administration => "Administration",
            WardKind::Military => "Military",
            WardKind::Cathedral => "Temple",
            WardKind::Market => "Market",
            WardKind::Castle => "Castle",
            WardKind::Park => "Park",
            WardKind::Farm => "Farm",
            WardKind::Gate => "Gate",
            WardKind::Harbour => "Harbour",
            WardKind::Empty => return None,
        };
        Some(label)
    }

    /// Kinds built as a grid of lots separated by alleys
    pub fn is_common(self) -> bool {
        matches!(
            self,
            WardKind::Craftsmen
                | WardKind::Merchant
                | WardKind::Slum
                | WardKind::Patriciate
                | WardKind::Administration
                | WardKind::Gate
        )
    }

    // lot parameters drawn once, when the ward is placed
    fn alley_params(self, rng: &mut StdRng) -> Option<AlleyParams> {
        let params = match self {
            WardKind::Craftsmen => AlleyParams {
                min_sq: 10.0 + 80.0 * rng.random::<f32>() * rng.random::<f32>(),
                grid_chaos: 0.5 + rng.random::<f32>() * 0.2,
                size_chaos: 0.6,
                empty_prob: EMPTY_PROB,
            },
            WardKind::Merchant => AlleyParams {
                min_sq: 50.0 + 60.0 * rng.random::<f32>() * rng.random::<f32>(),
                grid_chaos: 0.5 + rng.random::<f32>() * 0.3,
                size_chaos: 0.7,
                empty_prob: 0.15,
            },
            WardKind::Slum => AlleyParams {
                min_sq: 10.0 + 30.0 * rng.random::<f32>() * rng.random::<f32>(),
                grid_chaos: 0.6 + rng.random::<f32>() * 0.4,
                size_chaos: 0.8,
                empty_prob: 0.03,
            },
            WardKind::Patriciate => AlleyParams {
                min_sq: 80.0 + 30.0 * rng.random::<f32>() * rng.random::<f32>(),
                grid_chaos: 0.5 + rng.random::<f32>() * 0.3,
                size_chaos: 0.8,
                empty_prob: 0.2,
            },
            WardKind::Administration => AlleyParams {
                min_sq: 80.0 + 30.0 * rng.random::<f32>() * rng.random::<f32>(),
                grid_chaos: 0.1 + rng.random::<f32>() * 0.3,
                size_chaos: 0.3,
                empty_prob: EMPTY_PROB,
            },
            WardKind::Gate => AlleyParams {
                min_sq: 10.0 + 50.0 * rng.random::<f32>() * rng.random::<f32>(),
                grid_chaos: 0.5 + rng.random::<f32>() * 0.3,
                size_chaos: 0.7,
                empty_prob: EMPTY_PROB,
            },
            _ => return None,
        };
        Some(params)
    }
}

/// A district placed on one patch
#[derive(Debug, Clone, PartialEq)]
pub struct Ward {
    pub kind: WardKind,
    /// Building footprints, filled by the geometry phase
    pub geometry: Vec<Polygon>,
    pub alleys: Option<AlleyParams>,
}

impl Ward {
    pub fn new(kind: WardKind, rng: &mut StdRng) -> Self {
        Self {
            kind,
            geometry: Vec::new(),
            alleys: kind.alley_params(rng),
        }
    }

    pub fn label(&self) -> Option<&'static str> {
        self.kind.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(WardKind::Cathedral.label(), Some("Temple"));
        assert_eq!(WardKind::Harbour.label(), Some("Harbour"));
        assert_eq!(WardKind::Empty.label(), None);
        assert!(WardKind::ALL.iter().filter(|k| k.label().is_none()).count() == 1);
    }

    #[test]
    fn only_common_kinds_draw_alleys() {
        let mut rng = StdRng::seed_from_u64(5);
        for kind in WardKind::ALL {
            let ward = Ward::new(kind, &mut rng);
            assert_eq!(ward.alleys.is_some(), kind.is_common(), "{kind:?}");
            assert!(ward.geometry.is_empty());
        }

        let craftsmen = Ward::new(WardKind::Craftsmen, &mut rng).alleys.unwrap();
        assert!((10.0..=90.0).contains(&craftsmen.min_sq));
        assert!((0.5..=0.7).contains(&craftsmen.grid_chaos));
        assert_eq!(craftsmen.empty_prob, EMPTY_PROB);
    }
}
