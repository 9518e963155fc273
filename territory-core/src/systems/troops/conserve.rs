//! Per-nation conservation scaling (§4.5.3).

use crate::config::TroopConfig;
use crate::matrix::TerritoryMatrix;

/// Scales each nation's `troop_density` uniformly over its owned cells so
/// the sum matches `troop_count`, capped at `max_conservation_scale` to
/// avoid amplifying a near-zero sum without bound.
pub fn conserve_troop_density(matrix: &mut TerritoryMatrix, config: &TroopConfig) {
    for n in matrix.registry.live_indices().collect::<Vec<_>>() {
        let Some(record) = &matrix.nations[n as usize] else {
            continue;
        };
        let troop_count = record.troop_count;
        let bbox = matrix.nation_bbox[n as usize];
        if bbox.is_empty() {
            matrix.troop_density_sum[n as usize] = 0.0;
            continue;
        }

        let sum = sum_density(matrix, n, &bbox);
        if sum > 1e-9 {
            let scale = (troop_count / sum).min(config.max_conservation_scale as f64) as f32;
            for y in bbox.min_y..=bbox.max_y {
                for x in bbox.min_x..=bbox.max_x {
                    if matrix.owner(x, y) == n {
                        let i = matrix.nation_idx(x, y, n);
                        matrix.troop_density[i] *= scale;
                    }
                }
            }
        }
        matrix.troop_density_sum[n as usize] = sum_density(matrix, n, &bbox);
    }
}

fn sum_density(matrix: &TerritoryMatrix, n: crate::registry::NationIndex, bbox: &crate::matrix::BBox) -> f64 {
    let mut sum = 0.0f64;
    for y in bbox.min_y..=bbox.max_y {
        for x in bbox.min_x..=bbox.max_x {
            if matrix.owner(x, y) == n {
                sum += matrix.troop_density_at(x, y, n) as f64;
            }
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::nation::NationRecord;

    #[test]
    fn scales_density_sum_to_match_troop_count() {
        let mut m = TerritoryMatrix::new(2, 1, 1);
        m.registry.allocate("A").unwrap();
        let mut record = NationRecord::new(100.0, 0.2);
        record.troop_count = 10.0;
        m.nations[0] = Some(record);
        m.set_owner(0, 0, 0);
        m.set_owner(1, 0, 0);
        m.troop_density[m.nation_idx(0, 0, 0)] = 1.0;
        m.troop_density[m.nation_idx(1, 0, 0)] = 1.0;
        let cfg = TroopConfig::default();
        conserve_troop_density(&mut m, &cfg);
        assert!((m.troop_density_sum[0] - 10.0).abs() < 1e-6);
    }

    #[test]
    fn scale_is_capped_to_avoid_runaway_amplification() {
        let mut m = TerritoryMatrix::new(1, 1, 1);
        m.registry.allocate("A").unwrap();
        let mut record = NationRecord::new(100.0, 0.2);
        record.troop_count = 10.0;
        m.nations[0] = Some(record);
        m.set_owner(0, 0, 0);
        m.troop_density[m.nation_idx(0, 0, 0)] = 1e-6;
        let mut cfg = TroopConfig::default();
        cfg.max_conservation_scale = 3.0;
        conserve_troop_density(&mut m, &cfg);
        assert!(m.troop_density_at(0, 0, 0) <= 3e-6 + 1e-9);
    }
}
