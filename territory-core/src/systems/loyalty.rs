//! Double-buffered loyalty diffusion (component D).

use crate::config::LoyaltyConfig;
use crate::matrix::nation::CityType;
use crate::matrix::TerritoryMatrix;
use crate::registry::NationIndex;

/// Reads the previous tick's `loyalty` as a fixed buffer and writes the new
/// values back into `loyalty` in one pass per nation; no kernel in this
/// engine reads the buffer it is currently writing.
pub fn diffuse_loyalty(matrix: &mut TerritoryMatrix, config: &LoyaltyConfig) {
    let cells = matrix.cells();
    let live: Vec<_> = matrix.registry.live_indices().collect();
    if live.is_empty() {
        return;
    }

    let previous = matrix.loyalty.clone();

    for &n in &live {
        let base = (n as usize) * cells;
        let Some(record) = matrix.nations[n as usize].clone() else {
            continue;
        };
        for y in 0..matrix.height {
            for x in 0..matrix.width {
                if matrix.is_ocean(x, y) {
                    continue;
                }
                let i = matrix.idx(x, y);
                let mut v = previous[base + i];

                let owner = matrix.ownership[i];
                if owner == n {
                    v += config.reinforcement_rate;
                } else if owner >= 0 {
                    v -= config.decay_rate;
                }

                let mut sum = 0.0f32;
                let mut count = 0u32;
                for (nx, ny) in matrix.neighbors4(x, y) {
                    if matrix.is_ocean(nx, ny) {
                        continue;
                    }
                    sum += previous[base + matrix.idx(nx, ny)];
                    count += 1;
                }
                if count > 0 {
                    let avg_neighbor = sum / count as f32;
                    let resistance = matrix.diffusion_resistance[i];
                    v += config.diffusion_rate * (1.0 - resistance) * (avg_neighbor - v);
                }

                for city in &record.cities {
                    let dx = city.x as f32 - x as f32;
                    let dy = city.y as f32 - y as f32;
                    let dist = (dx * dx + dy * dy).sqrt();
                    let (bonus, radius) = match city.kind {
                        CityType::Capital => (config.capital_bonus, config.capital_radius),
                        CityType::Town | CityType::Tower => (config.city_bonus, config.city_radius),
                    };
                    if dist < radius {
                        v += bonus * (1.0 - dist / radius);
                    }
                }

                matrix.loyalty[base + i] = v.clamp(0.0, 1.0);
            }
        }
    }
}

/// Adds a clamped delta to a single cell's loyalty for `n`; used by the
/// arrow pipeline to push loyalty ahead of an advancing attack.
pub fn apply_arrow_loyalty_pressure(matrix: &mut TerritoryMatrix, n: NationIndex, x: u32, y: u32, gain: f32) {
    let i = matrix.nation_idx(x, y, n);
    matrix.loyalty[i] = (matrix.loyalty[i] + gain).clamp(0.0, 1.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::nation::{City, NationRecord};

    #[test]
    fn owner_reinforces_and_enemy_decays() {
        let mut m = TerritoryMatrix::new(3, 1, 2);
        m.registry.allocate("A").unwrap();
        m.registry.allocate("B").unwrap();
        m.nations[0] = Some(NationRecord::new(100.0, 0.2));
        m.nations[1] = Some(NationRecord::new(100.0, 0.2));
        m.set_owner(0, 0, 0);
        m.set_owner(2, 0, 1);
        let cfg = LoyaltyConfig::default();
        diffuse_loyalty(&mut m, &cfg);
        assert!(m.loyalty_at(0, 0, 0) > 0.0);
        // nation 1's loyalty at cell 0 (not its own) should have decayed, not risen
        assert!(m.loyalty_at(0, 0, 1) <= 0.0);
    }

    #[test]
    fn capital_bonus_raises_nearby_loyalty() {
        let mut m = TerritoryMatrix::new(5, 1, 1);
        m.registry.allocate("A").unwrap();
        let mut record = NationRecord::new(100.0, 0.2);
        record.cities.push(City {
            x: 0,
            y: 0,
            name: "Cap".into(),
            kind: crate::matrix::nation::CityType::Capital,
        });
        m.nations[0] = Some(record);
        m.set_owner(0, 0, 0);
        let cfg = LoyaltyConfig::default();
        diffuse_loyalty(&mut m, &cfg);
        assert!(m.loyalty_at(1, 0, 0) > 0.0);
    }

    #[test]
    fn clamps_to_unit_interval() {
        let mut m = TerritoryMatrix::new(1, 1, 1);
        m.registry.allocate("A").unwrap();
        m.nations[0] = Some(NationRecord::new(100.0, 0.2));
        m.set_owner(0, 0, 0);
        m.loyalty[0] = 0.999;
        let mut cfg = LoyaltyConfig::default();
        cfg.reinforcement_rate = 10.0;
        diffuse_loyalty(&mut m, &cfg);
        assert_eq!(m.loyalty_at(0, 0, 0), 1.0);
    }
}
