//! Buffered player command surface (§6). Commands are queued as they
//! arrive and applied in FIFO order at the start of the next tick, never
//! mid-tick.

use crate::config::StructuresConfig;
use crate::error::CommandError;
use crate::matrix::nation::{Arrow, ArrowId, City, CityType, NationRecord};
use crate::matrix::TerritoryMatrix;

#[derive(Debug, Clone)]
pub enum Command {
    FoundNation {
        owner: String,
        x: u32,
        y: u32,
        population: f64,
        troop_target: f32,
    },
    BuildCity {
        owner: String,
        x: u32,
        y: u32,
        name: String,
        kind: CityType,
    },
    IssueAttack {
        owner: String,
        path: Vec<(u32, u32)>,
        percent: f32,
        corridor_half_width: Option<f32>,
    },
    ReinforceArrow {
        owner: String,
        arrow_id: ArrowId,
        percent_delta: f32,
    },
    RetreatArrow {
        owner: String,
        arrow_id: ArrowId,
    },
    ClearArrow {
        owner: String,
        arrow_id: ArrowId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Accepted,
    Rejected(CommandError),
}

/// FIFO queue of commands accepted between ticks; the orchestrator drains
/// this at the start of each tick and returns a per-command outcome report.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: Vec<Command>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.pending.push(command);
    }

    pub fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Applies every queued command in order, returning one outcome per
/// command in the same order (for "report to issuer", §7).
pub fn apply_commands(
    matrix: &mut TerritoryMatrix,
    commands: Vec<Command>,
    structures: &StructuresConfig,
) -> Vec<CommandOutcome> {
    commands
        .into_iter()
        .map(|command| match execute_command(matrix, command, structures) {
            Ok(()) => CommandOutcome::Accepted,
            Err(e) => {
                log::debug!("command rejected: {e}");
                CommandOutcome::Rejected(e)
            }
        })
        .collect()
}

fn execute_command(
    matrix: &mut TerritoryMatrix,
    command: Command,
    structures: &StructuresConfig,
) -> Result<(), CommandError> {
    match command {
        Command::FoundNation {
            owner,
            x,
            y,
            population,
            troop_target,
        } => found_nation(matrix, owner, x, y, population, troop_target),
        Command::BuildCity { owner, x, y, name, kind } => build_city(matrix, owner, x, y, name, kind, structures),
        Command::IssueAttack {
            owner,
            path,
            percent,
            corridor_half_width,
        } => issue_attack(matrix, owner, path, percent, corridor_half_width),
        Command::ReinforceArrow {
            owner,
            arrow_id,
            percent_delta,
        } => reinforce_arrow(matrix, owner, arrow_id, percent_delta),
        Command::RetreatArrow { owner, arrow_id } => retreat_arrow(matrix, owner, arrow_id),
        Command::ClearArrow { owner, arrow_id } => clear_arrow(matrix, owner, arrow_id),
    }
}

fn require_in_bounds(matrix: &TerritoryMatrix, x: u32, y: u32) -> Result<(), CommandError> {
    if !matrix.in_bounds(x as i64, y as i64) {
        return Err(CommandError::OutOfBounds {
            x: x as i64,
            y: y as i64,
            width: matrix.width,
            height: matrix.height,
        });
    }
    Ok(())
}

fn owner_index(matrix: &TerritoryMatrix, owner: &str) -> Result<crate::registry::NationIndex, CommandError> {
    matrix.registry.index_of(owner).ok_or_else(|| CommandError::UnknownOwner { owner: owner.to_string() })
}

fn found_nation(
    matrix: &mut TerritoryMatrix,
    owner: String,
    x: u32,
    y: u32,
    population: f64,
    troop_target: f32,
) -> Result<(), CommandError> {
    require_in_bounds(matrix, x, y)?;
    if matrix.registry.index_of(&owner).is_some() {
        return Err(CommandError::NationAlreadyFounded { owner });
    }
    if matrix.is_ocean(x, y) {
        return Err(CommandError::OceanTarget { x, y });
    }
    let capacity = matrix.registry.capacity();
    let n = matrix
        .registry
        .allocate(&owner)
        .ok_or(CommandError::CapacityExhausted { capacity })?;

    let mut record = NationRecord::new(population, troop_target);
    record.owner = owner.clone();
    record.cities.push(City { x, y, name: format!("{owner} capital"), kind: CityType::Capital });
    matrix.nations[n as usize] = Some(record);
    matrix.set_owner(x, y, n);
    matrix.loyalty[matrix.nation_idx(x, y, n)] = 1.0;
    log::info!("nation {owner} founded at ({x},{y}) as index {n}");
    Ok(())
}

fn build_city(
    matrix: &mut TerritoryMatrix,
    owner: String,
    x: u32,
    y: u32,
    name: String,
    kind: CityType,
    structures: &StructuresConfig,
) -> Result<(), CommandError> {
    require_in_bounds(matrix, x, y)?;
    let n = owner_index(matrix, &owner)?;
    if matrix.owner(x, y) != n {
        return Err(CommandError::CellNotOwned { owner, x, y });
    }
    let Some(record) = matrix.nations[n as usize].as_mut() else {
        return Err(CommandError::UnknownOwner { owner });
    };
    let cost = match kind {
        CityType::Capital => 0.0, // capitals are only founded via found_nation
        CityType::Town => structures.town.troop_loss_multiplier as f64 * 50.0,
        CityType::Tower => structures.tower.troop_loss_multiplier as f64 * 80.0,
    };
    if kind == CityType::Capital {
        return Err(CommandError::InsufficientResources { owner, x, y });
    }
    if record.population < cost {
        return Err(CommandError::InsufficientResources { owner, x, y });
    }
    record.population -= cost;
    record.cities.push(City { x, y, name, kind });
    Ok(())
}

fn issue_attack(
    matrix: &mut TerritoryMatrix,
    owner: String,
    path: Vec<(u32, u32)>,
    percent: f32,
    corridor_half_width: Option<f32>,
) -> Result<(), CommandError> {
    if path.len() < 2 {
        return Err(CommandError::PathTooShort);
    }
    if percent <= 0.0 || percent > 1.0 {
        return Err(CommandError::InvalidPercent { percent });
    }
    for &(x, y) in &path {
        require_in_bounds(matrix, x, y)?;
    }
    let n = owner_index(matrix, &owner)?;
    let Some(record) = matrix.nations[n as usize].as_mut() else {
        return Err(CommandError::UnknownOwner { owner });
    };
    let id = record.allocate_arrow_id();
    let arrow = Arrow::new(id, path, percent, corridor_half_width.unwrap_or(4.0));
    record.arrow_orders.attacks.push(arrow);
    Ok(())
}

fn find_arrow_mut<'a>(
    record: &'a mut NationRecord,
    arrow_id: ArrowId,
) -> Option<&'a mut Arrow> {
    record.arrow_orders.attacks.iter_mut().find(|a| a.id == arrow_id)
}

fn reinforce_arrow(matrix: &mut TerritoryMatrix, owner: String, arrow_id: ArrowId, percent_delta: f32) -> Result<(), CommandError> {
    let n = owner_index(matrix, &owner)?;
    let Some(record) = matrix.nations[n as usize].as_mut() else {
        return Err(CommandError::UnknownOwner { owner });
    };
    let Some(arrow) = find_arrow_mut(record, arrow_id) else {
        return Err(CommandError::UnknownArrow { arrow_id });
    };
    arrow.percent = (arrow.percent + percent_delta).clamp(0.01, 1.0);
    Ok(())
}

fn retreat_arrow(matrix: &mut TerritoryMatrix, owner: String, arrow_id: ArrowId) -> Result<(), CommandError> {
    let n = owner_index(matrix, &owner)?;
    let Some(record) = matrix.nations[n as usize].as_mut() else {
        return Err(CommandError::UnknownOwner { owner });
    };
    let Some(arrow) = find_arrow_mut(record, arrow_id) else {
        return Err(CommandError::UnknownArrow { arrow_id });
    };
    arrow.current_index = arrow.current_index.saturating_sub(1);
    Ok(())
}

fn clear_arrow(matrix: &mut TerritoryMatrix, owner: String, arrow_id: ArrowId) -> Result<(), CommandError> {
    let n = owner_index(matrix, &owner)?;
    let Some(record) = matrix.nations[n as usize].as_mut() else {
        return Err(CommandError::UnknownOwner { owner });
    };
    let before = record.arrow_orders.attacks.len();
    record.arrow_orders.attacks.retain(|a| a.id != arrow_id);
    if record.arrow_orders.attacks.len() == before {
        return Err(CommandError::UnknownArrow { arrow_id });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn found_nation_rejects_ocean_and_duplicate() {
        let mut m = TerritoryMatrix::new(4, 4, 2);
        m.ocean_mask[0] = 1;
        let structures = StructuresConfig::default();
        let outcomes = apply_commands(
            &mut m,
            vec![
                Command::FoundNation { owner: "A".into(), x: 0, y: 0, population: 100.0, troop_target: 0.2 },
                Command::FoundNation { owner: "A".into(), x: 1, y: 1, population: 100.0, troop_target: 0.2 },
                Command::FoundNation { owner: "A".into(), x: 2, y: 2, population: 100.0, troop_target: 0.2 },
            ],
            &structures,
        );
        assert!(matches!(outcomes[0], CommandOutcome::Rejected(CommandError::OceanTarget { .. })));
        assert_eq!(outcomes[1], CommandOutcome::Accepted);
        assert!(matches!(outcomes[2], CommandOutcome::Rejected(CommandError::NationAlreadyFounded { .. })));
    }

    #[test]
    fn issue_attack_requires_known_owner_and_long_path() {
        let mut m = TerritoryMatrix::new(4, 4, 2);
        let structures = StructuresConfig::default();
        let outcomes = apply_commands(
            &mut m,
            vec![Command::IssueAttack { owner: "ghost".into(), path: vec![(0, 0)], percent: 0.5, corridor_half_width: None }],
            &structures,
        );
        assert!(matches!(outcomes[0], CommandOutcome::Rejected(_)));
    }

    #[test]
    fn clear_arrow_removes_it_from_orders() {
        let mut m = TerritoryMatrix::new(4, 4, 2);
        let structures = StructuresConfig::default();
        apply_commands(&mut m, vec![Command::FoundNation { owner: "A".into(), x: 0, y: 0, population: 100.0, troop_target: 0.2 }], &structures);
        apply_commands(
            &mut m,
            vec![Command::IssueAttack { owner: "A".into(), path: vec![(0, 0), (3, 0)], percent: 0.5, corridor_half_width: None }],
            &structures,
        );
        let n = m.registry.index_of("A").unwrap();
        let arrow_id = m.nations[n as usize].as_ref().unwrap().arrow_orders.attacks[0].id;
        let outcomes = apply_commands(&mut m, vec![Command::ClearArrow { owner: "A".into(), arrow_id }], &structures);
        assert_eq!(outcomes[0], CommandOutcome::Accepted);
        assert!(m.nations[n as usize].as_ref().unwrap().arrow_orders.attacks.is_empty());
    }
}
