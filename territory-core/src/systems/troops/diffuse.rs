//! In-place red-black troop density diffusion with arrow attractor corridors
//! (§4.5.2).

use crate::config::TroopConfig;
use crate::matrix::nation::Arrow;
use crate::matrix::{BBox, TerritoryMatrix};
use crate::registry::NationIndex;

/// Runs `config.diffusion_sub_steps` red-black sweep pairs over each active
/// nation's bbox (expanded by a margin and by its arrows' attractor radii).
pub fn diffuse_troop_density(matrix: &mut TerritoryMatrix, config: &TroopConfig) {
    for n in matrix.registry.live_indices().collect::<Vec<_>>() {
        let bbox = diffusion_bbox(matrix, n, config);
        if bbox.is_empty() {
            continue;
        }
        let arrows = matrix.nations[n as usize]
            .as_ref()
            .map(|r| r.arrow_orders.attacks.clone())
            .unwrap_or_default();
        let has_arrows = !arrows.is_empty();

        for sub_step in 0..config.diffusion_sub_steps.max(1) {
            let is_last_substep = sub_step + 1 == config.diffusion_sub_steps.max(1);
            for pass in 0..2u32 {
                for y in bbox.min_y..=bbox.max_y {
                    for x in bbox.min_x..=bbox.max_x {
                        if (x + y + pass) % 2 != 0 {
                            continue;
                        }
                        if matrix.is_ocean(x, y) {
                            continue;
                        }
                        step_cell(matrix, x, y, n, &arrows, has_arrows, is_last_substep, config);
                    }
                }
            }
        }
    }
}

fn step_cell(
    matrix: &mut TerritoryMatrix,
    x: u32,
    y: u32,
    n: NationIndex,
    arrows: &[Arrow],
    has_arrows: bool,
    is_last_substep: bool,
    config: &TroopConfig,
) {
    let i = matrix.idx(x, y);
    let ni = matrix.nation_idx(x, y, n);

    if matrix.owner(x, y) != n {
        if is_last_substep {
            matrix.troop_density[ni] *= config.density_decay_on_unowned;
        }
        return;
    }

    let mut sum = 0.0f32;
    let mut count = 0u32;
    let mut is_border = false;
    let mut neighbor_total = 0u32;
    for (nx, ny) in matrix.neighbors4(x, y) {
        neighbor_total += 1;
        let owned_by_n = matrix.owner(nx, ny) == n;
        if matrix.is_ocean(nx, ny) || !owned_by_n {
            is_border = true;
        }
        if owned_by_n {
            sum += matrix.troop_density[matrix.nation_idx(nx, ny, n)];
            count += 1;
        }
    }
    if neighbor_total < 4 {
        is_border = true;
    }
    let avg_neighbor = if count > 0 { sum / count as f32 } else { 0.0 };

    let attractor_bias = attractor_bias_at(x as f32, y as f32, arrows, config);
    let border_bias = if !is_border {
        0.0
    } else if has_arrows {
        if attractor_bias > 0.01 {
            config.border_concentration_bias
        } else {
            0.15 * config.border_concentration_bias
        }
    } else {
        config.border_concentration_bias
    };

    let target = avg_neighbor + border_bias + attractor_bias;
    let resistance = matrix.diffusion_resistance[i];
    let v = matrix.troop_density[ni];
    let new_v = v + (target - v) * config.diffusion_rate * (1.0 - resistance);
    matrix.troop_density[ni] = new_v.clamp(0.0, config.max_density_per_cell);
}

/// Sum of each arrow's corridor stamp at `(x,y)`: a distance falloff along
/// the arrow's forward direction times a corridor falloff perpendicular to
/// it, scaled by the arrow's commitment. Cells behind the head (more than
/// `0.3 * radius` backward) contribute nothing.
fn attractor_bias_at(x: f32, y: f32, arrows: &[Arrow], config: &TroopConfig) -> f32 {
    let mut total = 0.0f32;
    let radius = config.arrow_attractor_radius;
    for arrow in arrows {
        let (fx, fy) = arrow.forward_direction();
        let dx = x - arrow.head_x;
        let dy = y - arrow.head_y;
        let along = dx * fx + dy * fy;
        if along < -0.3 * radius || along > radius {
            continue;
        }
        let perp = (dx * -fy + dy * fx).abs();
        let corridor_half = 1.5 * arrow.corridor_half_width;
        if perp > corridor_half {
            continue;
        }
        let dist_falloff = (1.0 - along / radius).clamp(0.0, 1.0);
        let corridor_falloff = (1.0 - perp / corridor_half).clamp(0.0, 1.0);
        total += config.arrow_attractor_strength * dist_falloff * corridor_falloff * arrow.percent;
    }
    total
}

/// The nation's owned-cell bbox, expanded by `diffusion_bbox_margin` and
/// further widened to cover every active arrow's attractor radius.
fn diffusion_bbox(matrix: &TerritoryMatrix, n: NationIndex, config: &TroopConfig) -> BBox {
    let base = matrix.nation_bbox[n as usize].expanded(config.diffusion_bbox_margin as i64, matrix.width, matrix.height);
    let Some(record) = &matrix.nations[n as usize] else {
        return base;
    };
    let mut result = base;
    let r = config.arrow_attractor_radius as i64;
    for arrow in &record.arrow_orders.attacks {
        let cx = arrow.head_x as i64;
        let cy = arrow.head_y as i64;
        let arrow_box = BBox {
            min_x: (cx - r).max(0) as u32,
            min_y: (cy - r).max(0) as u32,
            max_x: ((cx + r).max(0) as u32).min(matrix.width.saturating_sub(1)),
            max_y: ((cy + r).max(0) as u32).min(matrix.height.saturating_sub(1)),
            dirty: false,
        };
        result = result.union(&arrow_box);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::nation::NationRecord;

    #[test]
    fn decays_on_unowned_cells_after_last_substep() {
        let mut m = TerritoryMatrix::new(2, 1, 1);
        m.registry.allocate("A").unwrap();
        m.nations[0] = Some(NationRecord::new(100.0, 0.2));
        m.set_owner(0, 0, 0);
        m.troop_density[m.nation_idx(1, 0, 0)] = 2.0; // stray density on an unowned cell
        let cfg = TroopConfig::default();
        diffuse_troop_density(&mut m, &cfg);
        assert!(m.troop_density_at(1, 0, 0) < 2.0);
    }

    #[test]
    fn density_stays_within_bounds() {
        let mut m = TerritoryMatrix::new(5, 5, 1);
        m.registry.allocate("A").unwrap();
        m.nations[0] = Some(NationRecord::new(100.0, 0.2));
        for y in 0..5 {
            for x in 0..5 {
                m.set_owner(x, y, 0);
            }
        }
        m.troop_density[m.nation_idx(2, 2, 0)] = 100.0; // way above max
        let cfg = TroopConfig::default();
        for _ in 0..10 {
            diffuse_troop_density(&mut m, &cfg);
        }
        for i in 0..m.cells() {
            assert!(m.troop_density[i] <= cfg.max_density_per_cell + 1e-5);
            assert!(m.troop_density[i] >= 0.0);
        }
    }
}
