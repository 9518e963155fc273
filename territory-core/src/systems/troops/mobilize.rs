//! Mobilization and density seeding (§4.5.1).

use crate::config::TroopConfig;
use crate::matrix::TerritoryMatrix;

/// Recruits toward `troop_target * population`, demobilizes past it, then
/// seeds `troop_density` for any nation whose density sum has fallen far
/// behind its `troop_count` (fresh founding, or just after deserialization).
pub fn mobilize(matrix: &mut TerritoryMatrix, config: &TroopConfig) {
    for n in matrix.registry.live_indices().collect::<Vec<_>>() {
        let Some(record) = matrix.nations[n as usize].as_mut() else {
            continue;
        };
        if record.population <= 0.0 {
            continue;
        }
        let target = record.troop_target as f64 * record.population;
        if record.troop_count < target {
            let free_worker_ratio = (1.0 - record.troop_count / record.population).clamp(0.0, 1.0);
            let recruit = record.population
                * (config.mobilization_base_rate as f64 / 10.0)
                * (1.0 + free_worker_ratio * config.mobilization_free_worker_scale as f64);
            record.troop_count = (record.troop_count + recruit).min(target);
        } else if record.troop_count > target {
            let demobilize = record.troop_count * (config.demobilization_rate as f64 / 10.0);
            record.troop_count = (record.troop_count - demobilize).max(target);
        }
        record.troop_count = record.troop_count.clamp(0.0, record.population);
    }
    seed_troop_density(matrix);
}

fn seed_troop_density(matrix: &mut TerritoryMatrix) {
    for n in matrix.registry.live_indices().collect::<Vec<_>>() {
        let Some(record) = &matrix.nations[n as usize] else {
            continue;
        };
        let troop_count = record.troop_count;
        if troop_count <= 0.0 {
            continue;
        }
        if matrix.troop_density_sum[n as usize] >= 0.1 * troop_count {
            continue;
        }
        let owned = matrix.owned_cell_count[n as usize];
        if owned <= 0 {
            continue;
        }
        let per_cell = (troop_count / owned as f64) as f32;
        let bbox = matrix.nation_bbox[n as usize];
        if bbox.is_empty() {
            continue;
        }
        let mut sum = 0.0f64;
        for y in bbox.min_y..=bbox.max_y {
            for x in bbox.min_x..=bbox.max_x {
                if matrix.owner(x, y) == n {
                    let i = matrix.nation_idx(x, y, n);
                    matrix.troop_density[i] = per_cell;
                    sum += per_cell as f64;
                }
            }
        }
        matrix.troop_density_sum[n as usize] = sum;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::nation::NationRecord;

    #[test]
    fn recruits_toward_target_and_caps_there() {
        let mut m = TerritoryMatrix::new(1, 1, 1);
        m.registry.allocate("A").unwrap();
        m.nations[0] = Some(NationRecord::new(100.0, 0.2));
        let cfg = TroopConfig::default();
        for _ in 0..200 {
            mobilize(&mut m, &cfg);
        }
        let record = m.nations[0].as_ref().unwrap();
        assert!((record.troop_count - 20.0).abs() < 1e-6);
    }

    #[test]
    fn demobilizes_back_down_to_target() {
        let mut m = TerritoryMatrix::new(1, 1, 1);
        m.registry.allocate("A").unwrap();
        let mut record = NationRecord::new(100.0, 0.1);
        record.troop_count = 50.0;
        m.nations[0] = Some(record);
        let cfg = TroopConfig::default();
        for _ in 0..500 {
            mobilize(&mut m, &cfg);
        }
        let record = m.nations[0].as_ref().unwrap();
        assert!((record.troop_count - 10.0).abs() < 1e-3);
    }

    #[test]
    fn seeds_density_uniformly_when_sum_lags_count() {
        let mut m = TerritoryMatrix::new(2, 1, 1);
        m.registry.allocate("A").unwrap();
        let mut record = NationRecord::new(100.0, 0.2);
        record.troop_count = 10.0;
        m.nations[0] = Some(record);
        m.set_owner(0, 0, 0);
        m.set_owner(1, 0, 0);
        seed_troop_density(&mut m);
        assert_eq!(m.troop_density_at(0, 0, 0), 5.0);
        assert_eq!(m.troop_density_at(1, 0, 0), 5.0);
        assert_eq!(m.troop_density_sum[0], 10.0);
    }
}
