//! Population density diffusion and defense strength composition
//! (component C).

use crate::config::{PopulationConfig, RegionConfig, StructuresConfig};
use crate::matrix::nation::CityType;
use crate::matrix::TerritoryMatrix;
use std::collections::HashSet;

/// Red-black Gauss-Seidel diffusion of `population_density`, in place, over
/// every non-ocean cell, followed by per-city source injection.
pub fn diffuse_population(
    matrix: &mut TerritoryMatrix,
    config: &PopulationConfig,
    regions: Option<&RegionConfig>,
) {
    let owner_regions = regions.map(|_| owner_city_regions(matrix));

    for pass in 0..2u32 {
        for chunk_index in 0..matrix.chunks.dirty.len() {
            if matrix.chunks.can_skip(chunk_index) {
                continue;
            }
            let (cx, cy) = (
                (chunk_index as u32) % matrix.chunks.chunks_x,
                (chunk_index as u32) / matrix.chunks.chunks_x,
            );
            let x0 = cx * crate::matrix::chunks::CHUNK_SIZE;
            let y0 = cy * crate::matrix::chunks::CHUNK_SIZE;
            let x1 = (x0 + crate::matrix::chunks::CHUNK_SIZE).min(matrix.width);
            let y1 = (y0 + crate::matrix::chunks::CHUNK_SIZE).min(matrix.height);

            for y in y0..y1 {
                for x in x0..x1 {
                    if (x + y + pass) % 2 != 0 {
                        continue;
                    }
                    if matrix.is_ocean(x, y) {
                        continue;
                    }
                    step_cell(matrix, x, y, config, regions, owner_regions.as_ref());
                }
            }
        }
    }

    inject_city_sources(matrix, config);
}

fn step_cell(
    matrix: &mut TerritoryMatrix,
    x: u32,
    y: u32,
    config: &PopulationConfig,
    regions: Option<&RegionConfig>,
    owner_regions: Option<&Vec<HashSet<u16>>>,
) {
    let i = matrix.idx(x, y);
    let v = matrix.population_density[i];

    let mut sum = 0.0f32;
    let mut count = 0u32;
    for (nx, ny) in matrix.neighbors4(x, y) {
        if matrix.is_ocean(nx, ny) {
            continue;
        }
        sum += matrix.population_density[matrix.idx(nx, ny)];
        count += 1;
    }
    if count == 0 {
        return;
    }
    let avg_neighbor = sum / count as f32;

    let mut diffusion_rate = config.diffusion_rate;
    if let (Some(_region_cfg), Some(owner_regions)) = (regions, owner_regions) {
        let owner = matrix.owner(x, y);
        if owner >= 0 {
            let region = matrix.region_id[i];
            if owner_regions[owner as usize].contains(&region) {
                diffusion_rate *= config.city_density_multiplier;
            }
        }
    }

    let new_v = v + diffusion_rate * (avg_neighbor - v) - config.decay_rate * v;
    matrix.population_density[i] = new_v.clamp(0.0, config.max_population_per_cell);
}

/// For each live nation, the set of region ids containing at least one of
/// its cities.
fn owner_city_regions(matrix: &TerritoryMatrix) -> Vec<HashSet<u16>> {
    let mut out = vec![HashSet::new(); matrix.nation_capacity];
    for n in matrix.registry.live_indices() {
        let Some(record) = &matrix.nations[n as usize] else {
            continue;
        };
        for city in &record.cities {
            let region = matrix.region_id[matrix.idx(city.x, city.y)];
            out[n as usize].insert(region);
        }
    }
    out
}

fn inject_city_sources(matrix: &mut TerritoryMatrix, config: &PopulationConfig) {
    // Scans every slot ever founded, not just currently-live nations: a
    // defeated nation's cities remain on the map and must keep being
    // skipped explicitly rather than by absence from the registry.
    for n in 0..matrix.nation_capacity {
        let Some(record) = &matrix.nations[n] else {
            continue;
        };
        if record.status == crate::matrix::NationStatus::Defeated {
            continue;
        }
        for city in record.cities.clone() {
            let source = match city.kind {
                CityType::Capital => config.capital_source,
                CityType::Town | CityType::Tower => config.city_source,
            };
            let i = matrix.idx(city.x, city.y);
            matrix.population_density[i] =
                (matrix.population_density[i] + source).min(config.max_population_per_cell);
        }
    }
}

/// `defense = 1 + popDensity*densityScale + troopDensity*troopScale`, plus
/// additive structural bonuses from nearby cities with quadratic falloff,
/// plus an optional regional tiered tower bonus.
pub fn recompute_defense(
    matrix: &mut TerritoryMatrix,
    population: &PopulationConfig,
    structures: &StructuresConfig,
    regions: Option<&RegionConfig>,
) {
    let cells = matrix.cells();
    let live: Vec<_> = matrix.registry.live_indices().collect();

    let mut base = vec![1.0f32; cells];
    for i in 0..cells {
        let x = (i % matrix.width as usize) as u32;
        let y = (i / matrix.width as usize) as u32;
        if matrix.is_ocean(x, y) {
            continue;
        }
        let owner = matrix.owner(x, y);
        let troop = if owner >= 0 {
            matrix.troop_density_at(x, y, owner)
        } else {
            0.0
        };
        base[i] = 1.0
            + matrix.population_density[i] * population.density_defense_scale
            + troop * population.troop_defense_scale;
    }

    for &n in &live {
        let Some(record) = &matrix.nations[n as usize] else {
            continue;
        };
        for city in record.cities.clone() {
            let (radius, kind) = match city.kind {
                CityType::Capital => (structures.town.defense_radius.max(structures.tower.defense_radius), None),
                CityType::Town => (structures.town.defense_radius, Some(structures.town)),
                CityType::Tower => (structures.tower.defense_radius, Some(structures.tower)),
            };
            let Some(structure) = kind else { continue };
            apply_structural_bonus(matrix, &mut base, city.x, city.y, radius, structure.troop_loss_multiplier);
        }
    }

    if let Some(region_cfg) = regions {
        apply_region_tower_bonus(matrix, &mut base, region_cfg, &live);
    }

    matrix.defense_strength = base;
}

fn apply_structural_bonus(
    matrix: &TerritoryMatrix,
    base: &mut [f32],
    cx: u32,
    cy: u32,
    radius: f32,
    bonus_scale: f32,
) {
    let r = radius.ceil() as i64;
    for dy in -r..=r {
        for dx in -r..=r {
            let x = cx as i64 + dx;
            let y = cy as i64 + dy;
            if !matrix.in_bounds(x, y) {
                continue;
            }
            let d2 = (dx * dx + dy * dy) as f32;
            let r2 = radius * radius;
            if d2 > r2 {
                continue;
            }
            let falloff = 1.0 - d2 / r2;
            let i = matrix.idx(x as u32, y as u32);
            base[i] += bonus_scale * falloff;
        }
    }
}

/// A regional tiered bonus: regions containing >= 2 towers of the same
/// nation multiply that nation's defense there by `tower_defense_bonus`
/// indexed by (tower count - 1), clamped to the table's length.
fn apply_region_tower_bonus(
    matrix: &TerritoryMatrix,
    base: &mut [f32],
    region_cfg: &RegionConfig,
    live: &[crate::registry::NationIndex],
) {
    if region_cfg.tower_defense_bonus.is_empty() {
        return;
    }
    for &n in live {
        let Some(record) = &matrix.nations[n as usize] else {
            continue;
        };
        let mut tower_regions: std::collections::HashMap<u16, u32> = std::collections::HashMap::new();
        for city in &record.cities {
            if city.kind != CityType::Tower {
                continue;
            }
            let region = matrix.region_id[matrix.idx(city.x, city.y)];
            *tower_regions.entry(region).or_insert(0) += 1;
        }
        for (region, count) in tower_regions {
            if count < 2 {
                continue;
            }
            let tier = ((count as usize) - 1).min(region_cfg.tower_defense_bonus.len() - 1);
            let multiplier = region_cfg.tower_defense_bonus[tier];
            for i in 0..matrix.cells() {
                if matrix.region_id[i] == region && matrix.ownership[i] == n {
                    base[i] *= multiplier;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::nation::NationRecord;

    #[test]
    fn diffusion_moves_density_toward_neighbors() {
        let mut m = TerritoryMatrix::new(3, 1, 1);
        m.population_density[0] = 10.0;
        let cfg = PopulationConfig::default();
        diffuse_population(&mut m, &cfg, None);
        assert!(m.population_density[1] > 0.0);
    }

    #[test]
    fn capital_source_injects_up_to_cap() {
        let mut m = TerritoryMatrix::new(1, 1, 1);
        m.registry.allocate("A").unwrap();
        let mut record = NationRecord::new(100.0, 0.2);
        record.cities.push(crate::matrix::nation::City {
            x: 0,
            y: 0,
            name: "Cap".into(),
            kind: CityType::Capital,
        });
        m.nations[0] = Some(record);
        let cfg = PopulationConfig::default();
        inject_city_sources(&mut m, &cfg);
        assert!(m.population_density[0] > 0.0);
        assert!(m.population_density[0] <= cfg.max_population_per_cell);
    }

    #[test]
    fn defense_composition_includes_density_and_troop_terms() {
        let mut m = TerritoryMatrix::new(1, 1, 1);
        m.registry.allocate("A").unwrap();
        m.set_owner(0, 0, 0);
        m.population_density[0] = 2.0;
        m.troop_density[0] = 1.0;
        let pop_cfg = PopulationConfig::default();
        let structures = StructuresConfig::default();
        recompute_defense(&mut m, &pop_cfg, &structures, None);
        let expected = 1.0 + 2.0 * pop_cfg.density_defense_scale + 1.0 * pop_cfg.troop_defense_scale;
        assert!((m.defense_strength[0] - expected).abs() < 1e-5);
    }
}
