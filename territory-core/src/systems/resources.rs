//! Resource node claim progress (supplemental; §10 of the component design).
//!
//! A cell carrying a resource node (`resource_type != 0`) accrues claim
//! progress while owned, resets the instant it changes hands, and once
//! progress reaches 1.0 the claim becomes permanent — a claimed node is
//! never re-contested.

use crate::matrix::TerritoryMatrix;
use crate::registry::UNOWNED;

const NO_RESOURCE: u8 = 0;

/// Runs once per tick; mirrors the simple per-cell-accumulator shape used
/// elsewhere in this engine rather than a full diffusion pass.
pub fn advance_resource_claims(matrix: &mut TerritoryMatrix, progress_per_tick: f32) {
    let cells = matrix.cells();
    for i in 0..cells {
        if matrix.resource_type[i] == NO_RESOURCE {
            continue;
        }
        if matrix.resource_claim_owner[i] >= 0 {
            continue; // already permanently claimed
        }
        let owner = matrix.ownership[i];
        if owner < 0 {
            matrix.resource_claim_progress[i] = 0.0;
            matrix.resource_claim_progress_owner[i] = UNOWNED;
            continue;
        }
        // Reset progress the instant the accruing nation changes, including a
        // direct rival-to-rival capture (owner changes without ever passing
        // through UNOWNED). `resource_claim_progress_owner` tracks whoever is
        // currently accruing; `resource_claim_owner` only ever holds the
        // finalized claimant, so it can't be used for this comparison.
        if matrix.resource_claim_progress_owner[i] != owner {
            matrix.resource_claim_progress[i] = 0.0;
            matrix.resource_claim_progress_owner[i] = owner;
        }
        matrix.resource_claim_progress[i] += progress_per_tick;
        if matrix.resource_claim_progress[i] >= 1.0 {
            matrix.resource_claim_progress[i] = 1.0;
            matrix.resource_claim_owner[i] = owner;
        }
    }
}
