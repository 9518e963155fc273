//! Passive concavity fill (component B.2).

use crate::matrix::TerritoryMatrix;
use crate::registry::{NationIndex, UNOWNED};

/// Runs up to `max_passes` cascading passes, each claiming every unowned
/// non-ocean cell whose 8-neighbourhood is dominated (`>= min_neighbors`)
/// by a single nation with no tie. Stops early once a pass claims nothing.
/// Returns the total number of cells claimed.
pub fn passive_concavity_fill(
    matrix: &mut TerritoryMatrix,
    min_neighbors: u32,
    max_passes: u32,
) -> u32 {
    let mut total = 0u32;
    for _ in 0..max_passes {
        let claims = one_pass(matrix, min_neighbors);
        if claims.is_empty() {
            break;
        }
        for (x, y, n) in &claims {
            matrix.set_owner(*x, *y, *n);
            let idx = matrix.nation_idx(*x, *y, *n);
            matrix.loyalty[idx] = 1.0;
        }
        total += claims.len() as u32;
    }
    total
}

fn one_pass(matrix: &TerritoryMatrix, min_neighbors: u32) -> Vec<(u32, u32, NationIndex)> {
    let mut claims = Vec::new();
    for y in 0..matrix.height {
        for x in 0..matrix.width {
            if matrix.is_ocean(x, y) || matrix.owner(x, y) != UNOWNED {
                continue;
            }
            let mut counts: Vec<(NationIndex, u32)> = Vec::new();
            for (nx, ny) in matrix.neighbors8(x, y) {
                let owner = matrix.owner(nx, ny);
                if owner < 0 {
                    continue;
                }
                match counts.iter_mut().find(|(n, _)| *n == owner) {
                    Some((_, c)) => *c += 1,
                    None => counts.push((owner, 1)),
                }
            }
            let Some(&(_, top_count)) = counts.iter().max_by_key(|(_, c)| *c) else {
                continue;
            };
            if top_count < min_neighbors {
                continue;
            }
            let winners: Vec<_> = counts.iter().filter(|(_, c)| *c == top_count).collect();
            if winners.len() != 1 {
                continue; // tie: leave contested
            }
            claims.push((x, y, winners[0].0));
        }
    }
    claims
}
