//! Encirclement detection (component B.4).

use crate::matrix::TerritoryMatrix;
use crate::registry::{NationIndex, UNOWNED};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct EncirclementEvent {
    pub owner: NationIndex,
    pub encircler: NationIndex,
    pub cells: Vec<(u32, u32)>,
}

/// 4-flood-fills every non-ocean cell once, grouping by contiguous owner.
/// An owned component is reported as encircled when it touches neither the
/// map edge nor ocean, and every out-of-component neighbour shares a single
/// non-UNOWNED owner different from the component's own.
pub fn detect_encirclement(matrix: &TerritoryMatrix) -> Vec<EncirclementEvent> {
    let cells = matrix.cells();
    let mut visited = vec![false; cells];
    let mut events = Vec::new();

    for y in 0..matrix.height {
        for x in 0..matrix.width {
            let i = matrix.idx(x, y);
            if visited[i] || matrix.is_ocean(x, y) {
                continue;
            }
            let owner = matrix.owner(x, y);
            let component = flood_component(matrix, &mut visited, x, y, owner);
            if owner == UNOWNED {
                continue;
            }
            if let Some(encircler) = classify(matrix, &component, owner) {
                events.push(EncirclementEvent {
                    owner,
                    encircler,
                    cells: component,
                });
            }
        }
    }
    events
}

fn flood_component(
    matrix: &TerritoryMatrix,
    visited: &mut [bool],
    sx: u32,
    sy: u32,
    owner: NationIndex,
) -> Vec<(u32, u32)> {
    let mut component = Vec::new();
    let mut queue = VecDeque::new();
    visited[matrix.idx(sx, sy)] = true;
    queue.push_back((sx, sy));
    while let Some((x, y)) = queue.pop_front() {
        component.push((x, y));
        for (nx, ny) in matrix.neighbors4(x, y) {
            let i = matrix.idx(nx, ny);
            if !visited[i] && !matrix.is_ocean(nx, ny) && matrix.owner(nx, ny) == owner {
                visited[i] = true;
                queue.push_back((nx, ny));
            }
        }
    }
    component
}

/// Returns `Some(encircler)` if the component qualifies as encircled.
fn classify(matrix: &TerritoryMatrix, component: &[(u32, u32)], owner: NationIndex) -> Option<NationIndex> {
    let in_component = |x: u32, y: u32| component.contains(&(x, y));
    let mut encircler: Option<NationIndex> = None;

    for &(x, y) in component {
        if x == 0 || y == 0 || x == matrix.width - 1 || y == matrix.height - 1 {
            return None; // touches map edge
        }
        for (nx, ny) in matrix.neighbors4(x, y) {
            if in_component(nx, ny) {
                continue;
            }
            if matrix.is_ocean(nx, ny) {
                return None;
            }
            let nb_owner = matrix.owner(nx, ny);
            if nb_owner == UNOWNED || nb_owner == owner {
                return None;
            }
            match encircler {
                None => encircler = Some(nb_owner),
                Some(e) if e != nb_owner => return None,
                _ => {}
            }
        }
    }
    encircler
}
