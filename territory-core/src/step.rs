//! The tick orchestrator (component F): a fixed, exactly-ordered pipeline
//! over one [`TerritoryMatrix`], instrumented per stage.

use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::delta::{derive_deltas, DeltaSet};
use crate::input::{apply_commands, Command, CommandOutcome};
use crate::kernels;
use crate::matrix::TerritoryMatrix;
use crate::metrics::TickMetrics;
use crate::registry::NationIndex;
use crate::systems::{self, troops};

/// Everything the caller needs from one tick: flip counts, defeats, the
/// outcome of each buffered command, the derived deltas, and elapsed time.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub tick: u64,
    pub total_flips: u32,
    pub per_nation_flips: Vec<(NationIndex, u32)>,
    pub newly_defeated: Vec<NationIndex>,
    pub command_outcomes: Vec<CommandOutcome>,
    pub deltas: DeltaSet,
    pub elapsed: Duration,
}

/// Runs exactly one tick: apply buffered commands, then the fixed kernel
/// pipeline, then delta derivation. `metrics`, if present, accumulates
/// per-stage timing across calls.
#[tracing::instrument(skip(matrix, commands, config, metrics))]
pub fn step(
    matrix: &mut TerritoryMatrix,
    tick: u64,
    commands: Vec<Command>,
    config: &EngineConfig,
    metrics: Option<&mut TickMetrics>,
) -> TickReport {
    let tick_start = Instant::now();
    let mut stage_times = StageTimes::default();

    matrix.snapshot_ownership();

    let command_outcomes = apply_commands(matrix, commands, &config.structures);

    let t = Instant::now();
    troops::mobilize(matrix, &config.troop);
    stage_times.mobilize = t.elapsed();

    let t = Instant::now();
    troops::diffuse_troop_density(matrix, &config.troop);
    troops::conserve_troop_density(matrix, &config.troop);
    stage_times.troop_diffusion = t.elapsed();

    let t = Instant::now();
    run_arrow_combat(matrix, config);
    stage_times.combat = t.elapsed();

    let t = Instant::now();
    systems::diffuse_loyalty(matrix, &config.loyalty);
    stage_times.loyalty = t.elapsed();

    let t = Instant::now();
    let flips = kernels::derive_ownership_from_loyalty(matrix, config.loyalty.ownership_threshold);
    stage_times.ownership = t.elapsed();

    let t = Instant::now();
    kernels::passive_concavity_fill(matrix, config.matrix.min_concavity_neighbors, config.matrix.max_concavity_passes);
    stage_times.concavity = t.elapsed();

    systems::advance_resource_claims(matrix, config.matrix.resource_claim_rate);

    let t = Instant::now();
    systems::diffuse_population(matrix, &config.population, config.regions.as_ref());
    stage_times.population = t.elapsed();

    let t = Instant::now();
    systems::recompute_defense(matrix, &config.population, &config.structures, config.regions.as_ref());
    stage_times.defense = t.elapsed();

    let t = Instant::now();
    let newly_defeated = run_defeat_checks(matrix);
    stage_times.connectivity = t.elapsed();

    matrix.chunks.tick_sleep();

    let t = Instant::now();
    let deltas = derive_deltas(matrix);
    stage_times.delta = t.elapsed();

    let per_nation_flips = per_nation_flip_counts(&deltas);
    let elapsed = tick_start.elapsed();

    if let Some(metrics) = metrics {
        accumulate_metrics(metrics, &stage_times, elapsed);
    }

    TickReport {
        tick,
        total_flips: flips,
        per_nation_flips,
        newly_defeated,
        command_outcomes,
        deltas,
        elapsed,
    }
}

#[derive(Default)]
struct StageTimes {
    mobilize: Duration,
    troop_diffusion: Duration,
    combat: Duration,
    loyalty: Duration,
    ownership: Duration,
    concavity: Duration,
    population: Duration,
    defense: Duration,
    connectivity: Duration,
    delta: Duration,
}

fn accumulate_metrics(metrics: &mut TickMetrics, stages: &StageTimes, elapsed: Duration) {
    metrics.total_ticks += 1;
    metrics.total_time += elapsed;
    metrics.mobilize_time += stages.mobilize;
    metrics.troop_diffusion_time += stages.troop_diffusion;
    metrics.combat_time += stages.combat;
    metrics.loyalty_time += stages.loyalty;
    metrics.ownership_time += stages.ownership;
    metrics.concavity_time += stages.concavity;
    metrics.population_time += stages.population;
    metrics.defense_time += stages.defense;
    metrics.connectivity_time += stages.connectivity;
    metrics.delta_time += stages.delta;
}

fn per_nation_flip_counts(deltas: &DeltaSet) -> Vec<(NationIndex, u32)> {
    deltas
        .per_nation
        .iter()
        .enumerate()
        .filter_map(|(i, d)| {
            let count = (d.add.len() + d.sub.len()) as u32;
            (count > 0).then_some((i as NationIndex, count))
        })
        .collect()
}

#[tracing::instrument(skip(matrix, config))]
fn run_arrow_combat(matrix: &mut TerritoryMatrix, config: &EngineConfig) {
    for n in matrix.registry.live_indices().collect::<Vec<_>>() {
        let Some(record) = &matrix.nations[n as usize] else {
            continue;
        };
        let mut arrows = record.arrow_orders.attacks.clone();
        for arrow in arrows.iter_mut() {
            troops::resolve_density_combat(matrix, n, arrow, &config.troop, &config.population);
            troops::advance_arrow_head(arrow, matrix, n, &config.troop);
        }
        if let Some(record) = matrix.nations[n as usize].as_mut() {
            record.arrow_orders.attacks = arrows;
        }
    }
}

/// Per §11.1: a nation loses (a) when its capital-owning component is
/// encircled, with (c) reaching zero owned cells as a fallback. A capital
/// cell flipping ownership this tick (combat, concavity) does not itself
/// trigger defeat — there is no capital component left to anchor the
/// encirclement/connectivity checks against, so that nation is skipped
/// until the zero-cells fallback or a future tick catches it.
fn run_defeat_checks(matrix: &mut TerritoryMatrix) -> Vec<NationIndex> {
    let mut newly_defeated = Vec::new();

    for n in matrix.registry.live_indices().collect::<Vec<_>>() {
        if matrix.owned_cell_count[n as usize] <= 0 {
            mark_defeated(matrix, n, &mut newly_defeated);
            continue;
        }
        let Some(record) = &matrix.nations[n as usize] else {
            continue;
        };
        let Some(capital) = record.capital().cloned() else {
            continue;
        };
        if matrix.owner(capital.x, capital.y) != n {
            continue;
        }
        kernels::remove_disconnected_territory(matrix, n, capital.x, capital.y);
        if matrix.owned_cell_count[n as usize] <= 0 {
            mark_defeated(matrix, n, &mut newly_defeated);
        }
    }

    for event in kernels::detect_encirclement(matrix) {
        let n = event.owner;
        if !matrix.registry.is_live(n) {
            continue;
        }
        let Some(record) = &matrix.nations[n as usize] else {
            continue;
        };
        let Some(capital) = record.capital() else {
            continue;
        };
        if matrix.owner(capital.x, capital.y) == n && event.cells.contains(&(capital.x, capital.y)) {
            mark_defeated(matrix, n, &mut newly_defeated);
        }
    }

    newly_defeated
}

fn mark_defeated(matrix: &mut TerritoryMatrix, n: NationIndex, newly_defeated: &mut Vec<NationIndex>) {
    if !matrix.registry.is_live(n) {
        return;
    }
    log::info!("nation index {n} defeated");
    matrix.remove_nation(n);
    newly_defeated.push(n);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Command;

    #[test]
    fn single_tick_founds_and_advances_a_nation() {
        let mut m = TerritoryMatrix::new(10, 10, 2);
        let config = EngineConfig::default();
        let commands = vec![Command::FoundNation {
            owner: "A".into(),
            x: 5,
            y: 5,
            population: 100.0,
            troop_target: 0.2,
        }];
        let report = step(&mut m, 0, commands, &config, None);
        assert_eq!(report.command_outcomes[0], CommandOutcome::Accepted);
        assert_eq!(m.owner(5, 5), 0);
    }

    #[test]
    fn zero_owned_cells_triggers_defeat() {
        let mut m = TerritoryMatrix::new(3, 3, 1);
        let config = EngineConfig::default();
        step(
            &mut m,
            0,
            vec![Command::FoundNation { owner: "A".into(), x: 1, y: 1, population: 10.0, troop_target: 0.1 }],
            &config,
            None,
        );
        // Simulate the nation losing its only cell outright (loyalty included,
        // unlike a passive flip) and verify the zero-cells fallback fires
        // without going through the rest of the pipeline, which would
        // otherwise let ownership derivation reclaim the cell from leftover
        // loyalty.
        m.set_owner(1, 1, crate::registry::UNOWNED);
        m.loyalty[m.nation_idx(1, 1, 0)] = 0.0;
        let newly_defeated = run_defeat_checks(&mut m);
        assert!(newly_defeated.contains(&0));
    }
}
