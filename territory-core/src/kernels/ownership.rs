//! Ownership derivation from loyalty (component B.1).

use crate::matrix::TerritoryMatrix;
use crate::registry::UNOWNED;

/// For each non-ocean cell, flips ownership to the nation with maximum
/// loyalty, provided that maximum clears `threshold`, strictly exceeds the
/// current owner's loyalty at the same cell, and the challenger differs
/// from the current owner. Never unclaims a cell. Returns the flip count.
pub fn derive_ownership_from_loyalty(matrix: &mut TerritoryMatrix, threshold: f32) -> u32 {
    let cells = matrix.cells();
    let mut flips = 0u32;
    let live: Vec<_> = matrix.registry.live_indices().collect();

    let mut pending = Vec::new();
    for i in 0..cells {
        let x = (i % matrix.width as usize) as u32;
        let y = (i / matrix.width as usize) as u32;
        if matrix.ocean_mask[i] != 0 {
            continue;
        }
        let current = matrix.ownership[i];
        let mut best: Option<(crate::registry::NationIndex, f32)> = None;
        for &n in &live {
            let l = matrix.loyalty[(n as usize) * cells + i];
            if best.is_none_or(|(_, bl)| l > bl) {
                best = Some((n, l));
            }
        }
        let Some((challenger, challenger_loyalty)) = best else {
            continue;
        };
        if challenger == current {
            continue;
        }
        if challenger_loyalty <= threshold {
            continue;
        }
        let current_loyalty = if current >= 0 {
            matrix.loyalty[(current as usize) * cells + i]
        } else {
            0.0
        };
        if challenger_loyalty > current_loyalty {
            pending.push((x, y, challenger));
        }
    }

    for (x, y, n) in pending {
        matrix.set_owner(x, y, n);
        flips += 1;
    }
    flips
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::TerritoryMatrix;

    #[test]
    fn flips_only_above_threshold_and_current_owner() {
        let mut m = TerritoryMatrix::new(3, 1, 2);
        m.registry.allocate("A").unwrap();
        m.registry.allocate("B").unwrap();
        m.set_owner(0, 0, 0);
        let cells = m.cells();
        m.loyalty[cells + 0] = 0.9; // nation 1's loyalty at cell 0
        m.loyalty[0] = 0.3; // nation 0 (current owner)'s loyalty at cell 0

        let flips = derive_ownership_from_loyalty(&mut m, 0.6);
        assert_eq!(flips, 1);
        assert_eq!(m.owner(0, 0), 1);
    }

    #[test]
    fn never_unclaims() {
        let mut m = TerritoryMatrix::new(1, 1, 1);
        m.registry.allocate("A").unwrap();
        m.set_owner(0, 0, 0);
        m.loyalty[0] = 0.0; // collapse loyalty entirely
        derive_ownership_from_loyalty(&mut m, 0.6);
        assert_eq!(m.owner(0, 0), 0);
    }

    #[test]
    fn ocean_cells_never_flip() {
        let mut m = TerritoryMatrix::new(1, 1, 1);
        m.registry.allocate("A").unwrap();
        m.ocean_mask[0] = 1;
        m.loyalty[0] = 1.0;
        let flips = derive_ownership_from_loyalty(&mut m, 0.6);
        assert_eq!(flips, 0);
        assert_eq!(m.owner(0, 0), UNOWNED);
    }
}
