//! Arrow density combat (§4.5.4) and arrow head advancement (§10).

use crate::config::{PopulationConfig, TroopConfig};
use crate::matrix::nation::Arrow;
use crate::matrix::TerritoryMatrix;
use crate::registry::{NationIndex, UNOWNED};

/// Outcome of resolving one arrow's combat this tick; used by the
/// orchestrator to build the per-tick report.
#[derive(Debug, Clone, Default)]
pub struct CombatOutcome {
    pub cells_captured: u32,
    pub cells_contested: u32,
}

/// Scans the corridor ahead of `arrow`'s head and resolves attacker/defender
/// density exchange cell by cell, writing ownership changes through the
/// centralized mutator.
pub fn resolve_density_combat(
    matrix: &mut TerritoryMatrix,
    n: NationIndex,
    arrow: &Arrow,
    troop: &TroopConfig,
    population: &PopulationConfig,
) -> CombatOutcome {
    let mut outcome = CombatOutcome::default();
    let scan_r = troop.arrow_attractor_radius;
    let (fx, fy) = arrow.forward_direction();
    let corridor_half = arrow.corridor_half_width;

    let r = scan_r.ceil() as i64;
    let hx = arrow.head_x as i64;
    let hy = arrow.head_y as i64;
    let x0 = (hx - r).max(0) as u32;
    let y0 = (hy - r).max(0) as u32;
    let x1 = ((hx + r).max(0) as u32).min(matrix.width.saturating_sub(1));
    let y1 = ((hy + r).max(0) as u32).min(matrix.height.saturating_sub(1));

    let mut candidates = Vec::new();
    for y in y0..=y1 {
        for x in x0..=x1 {
            if matrix.is_ocean(x, y) {
                continue;
            }
            let dx = x as f32 - arrow.head_x;
            let dy = y as f32 - arrow.head_y;
            let along = dx * fx + dy * fy;
            let perp = (dx * -fy + dy * fx).abs();
            if perp > corridor_half {
                continue;
            }
            if along < -2.0 || along > scan_r {
                continue;
            }
            candidates.push((x, y, perp));
        }
    }

    for (x, y, perp) in candidates {
        resolve_cell(matrix, n, x, y, perp, corridor_half, troop, population, &mut outcome);
    }
    outcome
}

fn resolve_cell(
    matrix: &mut TerritoryMatrix,
    n: NationIndex,
    x: u32,
    y: u32,
    perp: f32,
    corridor_half: f32,
    troop: &TroopConfig,
    population: &PopulationConfig,
    outcome: &mut CombatOutcome,
) {
    let attacking_neighbors: Vec<(u32, u32)> = matrix
        .neighbors4(x, y)
        .filter(|&(nx, ny)| matrix.owner(nx, ny) == n)
        .collect();
    if attacking_neighbors.is_empty() {
        return; // not adjacent to our own territory
    }
    let attacker_density = attacking_neighbors
        .iter()
        .map(|&(nx, ny)| matrix.troop_density_at(nx, ny, n))
        .sum::<f32>()
        / attacking_neighbors.len() as f32;

    let corridor_factor = (1.0 - 0.8 * perp / corridor_half).max(0.1);
    let effective_attack = attacker_density * corridor_factor;

    let owner = matrix.owner(x, y);
    if owner == UNOWNED {
        if effective_attack >= troop.combat_density_threshold {
            matrix.set_owner(x, y, n);
            let seed = attacker_density * troop.capture_seed_fraction;
            matrix.troop_density[matrix.nation_idx(x, y, n)] = seed;
            outcome.cells_captured += 1;
        }
        return;
    }

    let e = owner;
    if e == n {
        return;
    }
    let defender_density = matrix.troop_density_at(x, y, e);
    let defense = matrix.defense_strength[matrix.idx(x, y)];
    let terrain_mod = (defense - defender_density * population.troop_defense_scale).clamp(1.0, 3.0);
    let effective_defense = defender_density * troop.combat_defender_advantage * terrain_mod;

    if effective_attack < troop.combat_density_threshold && effective_defense < troop.combat_density_threshold {
        return; // idle, neither side has enough presence to fight
    }

    if effective_attack > effective_defense {
        let loss = defender_density * troop.combat_exchange_rate;
        if let Some(defender) = matrix.nations[e as usize].as_mut() {
            defender.troop_count = (defender.troop_count - loss as f64).max(0.0);
            defender.population = (defender.population - loss as f64).max(0.0);
        }
        matrix.troop_density[matrix.nation_idx(x, y, e)] = (defender_density - loss).max(0.0);

        let half_loss = loss * 0.5;
        let per_neighbor = half_loss / attacking_neighbors.len() as f32;
        for &(nx, ny) in &attacking_neighbors {
            let idx = matrix.nation_idx(nx, ny, n);
            matrix.troop_density[idx] = (matrix.troop_density[idx] - per_neighbor).max(0.0);
        }
        if let Some(attacker) = matrix.nations[n as usize].as_mut() {
            attacker.troop_count = (attacker.troop_count - half_loss as f64).max(0.0);
        }

        matrix.set_owner(x, y, n);
        let seed = attacker_density * troop.capture_seed_fraction;
        matrix.troop_density[matrix.nation_idx(x, y, n)] = seed;
        outcome.cells_captured += 1;
    } else {
        let exchange = effective_attack.min(defender_density) * troop.combat_exchange_rate * 0.2;
        matrix.troop_density[matrix.nation_idx(x, y, e)] = (defender_density - exchange).max(0.0);
        if let Some(defender) = matrix.nations[e as usize].as_mut() {
            defender.troop_count = (defender.troop_count - exchange as f64).max(0.0);
        }
        let per_neighbor = exchange / attacking_neighbors.len() as f32;
        for &(nx, ny) in &attacking_neighbors {
            let idx = matrix.nation_idx(nx, ny, n);
            matrix.troop_density[idx] = (matrix.troop_density[idx] - per_neighbor).max(0.0);
        }
        if let Some(attacker) = matrix.nations[n as usize].as_mut() {
            attacker.troop_count = (attacker.troop_count - exchange as f64).max(0.0);
        }
        outcome.cells_contested += 1;
    }
}

/// Advances `arrow.head_x/head_y` toward its next waypoint once the
/// corridor at the current head position is substantially captured,
/// modeled on a progress-accumulator rule: `advance_progress` grows by
/// `arrow_advance_rate` per tick and, once it covers the segment length,
/// the head snaps to the next waypoint and `current_index` advances.
pub fn advance_arrow_head(arrow: &mut Arrow, matrix: &TerritoryMatrix, n: NationIndex, config: &TroopConfig) {
    let Some((from, to)) = arrow.current_segment() else {
        return;
    };
    if from == to {
        return; // final waypoint already reached
    }
    if !corridor_substantially_captured(matrix, n, arrow) {
        return;
    }
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let segment_len = (dx * dx + dy * dy).sqrt();
    if segment_len < 1e-6 {
        arrow.current_index += 1;
        return;
    }
    arrow.advance_progress += config.arrow_advance_rate;
    let t = (arrow.advance_progress / segment_len).min(1.0);
    arrow.head_x = from.0 + dx * t;
    arrow.head_y = from.1 + dy * t;
    if arrow.advance_progress >= segment_len {
        arrow.advance_progress -= segment_len;
        arrow.current_index += 1;
    }
}

/// `true` once the majority of the corridor immediately around the head is
/// owned by `n`, used as the gate for advancing the arrow head.
fn corridor_substantially_captured(matrix: &TerritoryMatrix, n: NationIndex, arrow: &Arrow) -> bool {
    let r = 1i64;
    let hx = arrow.head_x as i64;
    let hy = arrow.head_y as i64;
    let mut owned = 0u32;
    let mut total = 0u32;
    for dy in -r..=r {
        for dx in -r..=r {
            let x = hx + dx;
            let y = hy + dy;
            if !matrix.in_bounds(x, y) {
                continue;
            }
            total += 1;
            if matrix.owner(x as u32, y as u32) == n {
                owned += 1;
            }
        }
    }
    total > 0 && owned * 2 >= total
}
