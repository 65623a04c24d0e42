// which districts a town gets and where each one wants to be

use crate::config::{LARGE_TOWN_PATCHES, SMALL_TOWN_PATCHES};
use crate::systems::mesh::Params;
use crate::systems::mesh::town::Model;
use super::WardKind;

use WardKind::*;

// the classic sequence, weighted towards craftsmen
const WARDS36: [WardKind; 36] = [
    Craftsmen, Craftsmen, Merchant, Craftsmen, Craftsmen, Cathedral,
    Craftsmen, Craftsmen, Craftsmen, Craftsmen, Craftsmen, Craftsmen, Craftsmen, Craftsmen,
    Administration, Craftsmen, Slum, Craftsmen, Slum, Patriciate, Market, Slum,
    Craftsmen, Craftsmen, Craftsmen, Slum, Craftsmen, Craftsmen, Craftsmen,
    Military, Slum, Craftsmen, Park, Patriciate, Market, Merchant,
];

/// Ordered list of the districts to place, before the random swaps
pub fn district_plan(params: &Params) -> Vec<WardKind> {
    let mut plan = WARDS36.to_vec();

    // large towns keep the proportions
    if params.n_patches > LARGE_TOWN_PATCHES {
        plan.extend_from_slice(&WARDS36);
    }
    if params.temple {
        plan.insert(1, Cathedral);
    }
    if params.capital {
        plan.insert(2, Administration);
        plan.insert(3, Patriciate);
        plan.insert(4, Military);
    }
    if params.harbour {
        plan.insert(3, Harbour);
    }
    if params.shanty {
        let mut seen = 0;
        for kind in plan.iter_mut().filter(|k| **k == Craftsmen) {
            seen += 1;
            if seen % 3 == 0 {
                *kind = Slum;
            }
        }
        plan.extend([Slum, Slum]);
    }
    if params.n_patches < SMALL_TOWN_PATCHES {
        if let Some(second) = plan.iter().enumerate().filter(|(_, k)| **k == Market).nth(1).map(|(i, _)| i) {
            plan.remove(second);
        }
    }

    plan
}

impl WardKind {
    /// Craftsmen, gates and parks go anywhere, the others pick a patch by rating
    pub fn has_scorer(self) -> bool {
        !matches!(self, Craftsmen | Gate | Park)
    }

    /// How well `patch` suits this kind of ward, lower is better,
    /// `INFINITY` rules the patch out
    pub fn rate_location(self, model: &Model, patch: usize) -> f32 {
        let points = &model.points;
        let shape = &model.patches[patch].shape;
        let plaza = model.plaza.map(|p| &model.patches[p].shape);
        let focus = plaza.map_or(model.center_position(), |s| s.center(points));
        let area = shape.area(points).abs();

        match self {
            Merchant => shape.distance(points, focus),
            Slum => -shape.distance(points, focus),
            Patriciate => {
                let mut rate = 0.0;
                for other in &model.patches {
                    let Some(ward) = &other.ward else { continue };
                    if !other.shape.borders(shape) {
                        continue;
                    }
                    match ward.kind {
                        Park => rate -= 1.0,
                        Slum => rate += 1.0,
                        _ => {}
                    }
                }
                rate
            }
            Administration => match plaza {
                Some(plaza) if plaza.borders(shape) => 0.0,
                _ => shape.distance(points, focus),
            },
            Military => {
                let wall = model.wall();
                if model.citadel.is_some_and(|c| model.patches[c].shape.borders(shape)) {
                    0.0
                } else if wall.is_some_and(|w| w.borders(patch, shape)) {
                    1.0
                } else if model.citadel.is_none() && wall.is_none() {
                    0.0
                } else {
                    f32::INFINITY
                }
            }
            Cathedral => match plaza {
                Some(plaza) if plaza.borders(shape) => -1.0 / area,
                _ => shape.distance(points, focus) * area,
            },
            Market => {
                let crowded = model.inner.iter().any(|&p| {
                    model.patches[p].ward.as_ref().is_some_and(|w| w.kind == Market)
                        && model.patches[p].shape.borders(shape)
                });
                if crowded {
                    f32::INFINITY
                } else {
                    match plaza {
                        Some(plaza) => area / plaza.area(points).abs(),
                        None => shape.distance(points, model.center_position()),
                    }
                }
            }
            Harbour => match &model.border {
                Some(border) if border.shape.borders(shape) => -shape.distance(points, focus),
                _ => f32::INFINITY,
            },
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(plan: &[WardKind], kind: WardKind) -> usize {
        plan.iter().filter(|k| **k == kind).count()
    }

    #[test]
    fn base_plan() {
        let plan = district_plan(&Params::default());
        assert_eq!(plan.len(), 36);
        assert_eq!(count(&plan, Market), 2);
        assert_eq!(count(&plan, Cathedral), 1);
        assert_eq!(count(&plan, Harbour), 0);
    }

    #[test]
    fn flags_extend_the_plan() {
        let params = Params {
            temple: true,
            capital: true,
            harbour: true,
            ..Params::default()
        };
        let plan = district_plan(&params);
        assert_eq!(plan.len(), 36 + 5);
        assert_eq!(plan[1], Cathedral);
        assert_eq!(plan[3], Harbour);
        assert_eq!(count(&plan, Military), 2);
    }

    #[test]
    fn shanty_towns_trade_craftsmen_for_slums() {
        let base = district_plan(&Params::default());
        let plan = district_plan(&Params {
            shanty: true,
            ..Params::default()
        });
        let converted = count(&base, Craftsmen) / 3;
        assert_eq!(count(&plan, Craftsmen), count(&base, Craftsmen) - converted);
        assert_eq!(count(&plan, Slum), count(&base, Slum) + converted + 2);
    }

    #[test]
    fn town_size_scales_the_plan() {
        let large = district_plan(&Params {
            n_patches: 40,
            ..Params::default()
        });
        assert_eq!(large.len(), 72);

        let small = district_plan(&Params {
            n_patches: 8,
            ..Params::default()
        });
        assert_eq!(count(&small, Market), 1);
    }

    #[test]
    fn scorers() {
        assert!(!Craftsmen.has_scorer());
        assert!(!Park.has_scorer());
        assert!(Market.has_scorer());
        assert!(Harbour.has_scorer());
    }
}
