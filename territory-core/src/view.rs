//! Per-player view assembly (§4.7): full state for a viewer's own nation
//! (with a throttled density heatmap), a stripped add/sub-only view for
//! other active nations, and a minimal status-only view for defeated ones.

use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::delta::{DeltaSet, NationDelta};
use crate::matrix::nation::{Arrow, City, NationStatus};
use crate::matrix::TerritoryMatrix;
use crate::registry::NationIndex;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DensityHeatmap {
    /// `(x, y, quantized_density)`, `quantized_density` in `[1,255]`.
    pub points: Vec<(u32, u32, u8)>,
}

#[derive(Debug, Clone)]
pub struct OwnNationView {
    pub owner: String,
    pub population: f64,
    pub troop_count: f64,
    pub troop_target: f32,
    pub cities: Vec<City>,
    pub arrows: Vec<Arrow>,
    pub status: NationStatus,
    pub delta: NationDelta,
    pub heatmap: Option<DensityHeatmap>,
}

#[derive(Debug, Clone)]
pub struct ForeignNationView {
    pub owner: String,
    pub delta: NationDelta,
}

#[derive(Debug, Clone)]
pub struct DefeatedNationView {
    pub owner: String,
}

#[derive(Debug, Clone)]
pub enum NationView {
    Own(OwnNationView),
    Foreign(ForeignNationView),
    Defeated(DefeatedNationView),
}

/// Caches the last heatmap built per nation so viewers between throttle
/// boundaries reuse the same payload instead of recomputing it every tick.
#[derive(Debug, Default)]
pub struct HeatmapCache {
    last_built_tick: HashMap<NationIndex, u64>,
    cached: HashMap<NationIndex, DensityHeatmap>,
}

impl HeatmapCache {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Builds the view `viewer` (own nation `n`, or `None` for a spectator) sees
/// of nation `n`, given this tick's derived deltas.
pub fn build_nation_view(
    matrix: &TerritoryMatrix,
    n: NationIndex,
    viewer_is_self: bool,
    tick: u64,
    deltas: &DeltaSet,
    config: &EngineConfig,
    cache: &mut HeatmapCache,
    force_full_state: bool,
) -> NationView {
    let Some(record) = &matrix.nations[n as usize] else {
        let owner = matrix.registry.owner_of(n).map(str::to_string).unwrap_or_default();
        return NationView::Foreign(ForeignNationView { owner, delta: NationDelta::default() });
    };

    if record.status == NationStatus::Defeated {
        return NationView::Defeated(DefeatedNationView { owner: record.owner.clone() });
    }

    let owner = matrix.registry.owner_of(n).map(str::to_string).unwrap_or_default();
    let delta = deltas.for_nation(n).cloned().unwrap_or_default();

    if !viewer_is_self {
        return NationView::Foreign(ForeignNationView { owner, delta });
    }

    let heatmap = build_heatmap_throttled(matrix, n, tick, config, cache, force_full_state);
    NationView::Own(OwnNationView {
        owner,
        population: record.population,
        troop_count: record.troop_count,
        troop_target: record.troop_target,
        cities: record.cities.clone(),
        arrows: record.arrow_orders.attacks.clone(),
        status: record.status,
        delta,
        heatmap,
    })
}

fn build_heatmap_throttled(
    matrix: &TerritoryMatrix,
    n: NationIndex,
    tick: u64,
    config: &EngineConfig,
    cache: &mut HeatmapCache,
    force_full_state: bool,
) -> Option<DensityHeatmap> {
    let due = tick % config.heatmap_throttle_ticks.max(1) == 0;
    let has_cache = cache.cached.contains_key(&n);
    if !force_full_state && !due && has_cache {
        return cache.cached.get(&n).cloned();
    }

    let heatmap = build_heatmap(matrix, n, config);
    cache.last_built_tick.insert(n, tick);
    cache.cached.insert(n, heatmap.clone());
    Some(heatmap)
}

fn build_heatmap(matrix: &TerritoryMatrix, n: NationIndex, config: &EngineConfig) -> DensityHeatmap {
    let bbox = matrix.nation_bbox[n as usize];
    if bbox.is_empty() {
        return DensityHeatmap::default();
    }

    let mut peak = 0.0f32;
    for y in bbox.min_y..=bbox.max_y {
        for x in bbox.min_x..=bbox.max_x {
            if matrix.owner(x, y) == n {
                peak = peak.max(matrix.troop_density_at(x, y, n));
            }
        }
    }
    let denom = config.troop.max_density_per_cell.min(peak.max(1.0));

    let mut points = Vec::new();
    for y in bbox.min_y..=bbox.max_y {
        for x in bbox.min_x..=bbox.max_x {
            if matrix.owner(x, y) != n {
                continue;
            }
            let density = matrix.troop_density_at(x, y, n);
            let q = ((density / denom) * 254.0).round().clamp(0.0, 254.0) as u8 + 1;
            points.push((x, y, q));
        }
    }
    DensityHeatmap { points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::nation::NationRecord;

    fn setup() -> (TerritoryMatrix, EngineConfig) {
        let mut m = TerritoryMatrix::new(4, 4, 2);
        m.registry.allocate("A").unwrap();
        m.registry.allocate("B").unwrap();
        m.nations[0] = Some(NationRecord::new(100.0, 0.2));
        m.nations[1] = Some(NationRecord::new(100.0, 0.2));
        m.set_owner(0, 0, 0);
        m.set_owner(3, 3, 1);
        (m, EngineConfig::default())
    }

    #[test]
    fn own_view_includes_heatmap_and_full_state() {
        let (m, config) = setup();
        let deltas = crate::delta::derive_deltas(&m);
        let mut cache = HeatmapCache::new();
        let view = build_nation_view(&m, 0, true, 0, &deltas, &config, &mut cache, false);
        match view {
            NationView::Own(own) => {
                assert_eq!(own.owner, "A");
                assert!(own.heatmap.is_some());
            }
            _ => panic!("expected an own-nation view"),
        }
    }

    #[test]
    fn foreign_view_strips_sensitive_fields() {
        let (m, config) = setup();
        let deltas = crate::delta::derive_deltas(&m);
        let mut cache = HeatmapCache::new();
        let view = build_nation_view(&m, 1, false, 0, &deltas, &config, &mut cache, false);
        assert!(matches!(view, NationView::Foreign(_)));
    }

    #[test]
    fn defeated_nation_view_is_minimal() {
        let (mut m, config) = setup();
        m.remove_nation(1);
        let deltas = crate::delta::derive_deltas(&m);
        let mut cache = HeatmapCache::new();
        let view = build_nation_view(&m, 1, false, 0, &deltas, &config, &mut cache, false);
        assert!(matches!(view, NationView::Defeated(_)));
    }

    #[test]
    fn heatmap_is_reused_between_throttle_boundaries() {
        let (mut m, config) = setup();
        let deltas = crate::delta::derive_deltas(&m);
        let mut cache = HeatmapCache::new();
        build_nation_view(&m, 0, true, 0, &deltas, &config, &mut cache, false);
        m.troop_density[m.nation_idx(0, 0, 0)] = 9.0; // change after the heatmap was cached
        let view = build_nation_view(&m, 0, true, 1, &deltas, &config, &mut cache, false);
        if let NationView::Own(own) = view {
            let heatmap = own.heatmap.unwrap();
            assert!(heatmap.points.iter().all(|&(_, _, q)| q < 255), "stale cached heatmap should not reflect the post-cache density change");
        } else {
            panic!("expected an own-nation view");
        }
    }
}
