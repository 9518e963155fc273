//! Frontier candidate enumeration (component B.5). A query, not a mutator:
//! the engine itself never claims a cell passively except via
//! [`super::concavity`]. Callers (bot clients, combat target selection) use
//! this to rank where `n` should push next.

use crate::matrix::TerritoryMatrix;
use crate::registry::NationIndex;

#[derive(Debug, Clone, Copy)]
pub struct FrontierCandidate {
    pub x: u32,
    pub y: u32,
    pub score: f32,
}

const HOLE_BONUS_THRESHOLD: u32 = 3;
const HOLE_BONUS_WEIGHT: f32 = 20.0;
const NEIGHBOR_WEIGHT: f32 = 1.0;
const TARGET_DISTANCE_WEIGHT: f32 = 1.0;
const ANCHOR_DISTANCE_WEIGHT: f32 = 0.25;
const PATH_PROGRESS_WEIGHT: f32 = 0.5;
const PATH_PERPENDICULAR_WEIGHT: f32 = 1.0;

/// Optional scoring and filtering inputs for [`frontier_candidates`]. All
/// fields are additive/independent; omit what the caller doesn't have.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontierQuery<'a> {
    pub target: Option<(f32, f32)>,
    pub anchor: Option<(f32, f32)>,
    pub path: Option<&'a [(u32, u32)]>,
    pub max_dist_from_path: Option<f32>,
}

/// Every unowned-or-enemy non-ocean cell 4-adjacent to `n`'s territory,
/// scored and sorted descending. A cell's owned-8-neighbour count drives a
/// "hole bonus" that spikes once at least [`HOLE_BONUS_THRESHOLD`]
/// neighbours belong to `n` (fills pockets ahead of open-field expansion).
/// When `query.path` is set, candidates farther than `max_dist_from_path`
/// from the path are dropped entirely.
pub fn frontier_candidates(matrix: &TerritoryMatrix, n: NationIndex, query: &FrontierQuery<'_>) -> Vec<FrontierCandidate> {
    let mut out = Vec::new();
    for y in 0..matrix.height {
        for x in 0..matrix.width {
            if matrix.is_ocean(x, y) || matrix.owner(x, y) == n {
                continue;
            }
            let touches_n = matrix.neighbors4(x, y).any(|(nx, ny)| matrix.owner(nx, ny) == n);
            if !touches_n {
                continue;
            }

            let owned_neighbors = matrix.neighbors8(x, y).filter(|&(nx, ny)| matrix.owner(nx, ny) == n).count() as u32;
            let mut score = owned_neighbors as f32 * NEIGHBOR_WEIGHT;
            if owned_neighbors >= HOLE_BONUS_THRESHOLD {
                score += HOLE_BONUS_WEIGHT;
            }

            if let Some((tx, ty)) = query.target {
                score -= distance(x, y, tx, ty) * TARGET_DISTANCE_WEIGHT;
            }
            if let Some((ax, ay)) = query.anchor {
                score -= distance(x, y, ax, ay) * ANCHOR_DISTANCE_WEIGHT;
            }
            if let Some(path) = query.path {
                if path.len() >= 2 {
                    let (perp, progress) = project_onto_path(path, x as f32, y as f32);
                    if let Some(max_dist) = query.max_dist_from_path {
                        if perp > max_dist {
                            continue;
                        }
                    }
                    score += progress * PATH_PROGRESS_WEIGHT - perp * PATH_PERPENDICULAR_WEIGHT;
                }
            }

            out.push(FrontierCandidate { x, y, score });
        }
    }
    out.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    out
}

fn distance(x: u32, y: u32, tx: f32, ty: f32) -> f32 {
    ((x as f32 - tx).powi(2) + (y as f32 - ty).powi(2)).sqrt()
}

/// Perpendicular distance to the nearest segment and the along-path arc
/// length ("progress") at the closest projection point.
fn project_onto_path(path: &[(u32, u32)], px: f32, py: f32) -> (f32, f32) {
    let mut best_perp = f32::MAX;
    let mut best_progress = 0.0f32;
    let mut traveled = 0.0f32;
    for pair in path.windows(2) {
        let (ax, ay) = (pair[0].0 as f32, pair[0].1 as f32);
        let (bx, by) = (pair[1].0 as f32, pair[1].1 as f32);
        let (dx, dy) = (bx - ax, by - ay);
        let seg_len = (dx * dx + dy * dy).sqrt();
        let t = if seg_len > 1e-6 { (((px - ax) * dx + (py - ay) * dy) / (seg_len * seg_len)).clamp(0.0, 1.0) } else { 0.0 };
        let (projx, projy) = (ax + t * dx, ay + t * dy);
        let perp = ((px - projx).powi(2) + (py - projy).powi(2)).sqrt();
        if perp < best_perp {
            best_perp = perp;
            best_progress = traveled + t * seg_len;
        }
        traveled += seg_len;
    }
    (best_perp, best_progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_cells_are_excluded() {
        let mut m = TerritoryMatrix::new(3, 3, 1);
        m.registry.allocate("A").unwrap();
        for y in 0..3 {
            for x in 0..3 {
                m.set_owner(x, y, 0);
            }
        }
        let candidates = frontier_candidates(&m, 0, &FrontierQuery::default());
        assert!(candidates.is_empty());
    }

    #[test]
    fn border_cells_adjacent_to_owned_territory_are_included() {
        let mut m = TerritoryMatrix::new(3, 1, 1);
        m.registry.allocate("A").unwrap();
        m.set_owner(0, 0, 0);
        let candidates = frontier_candidates(&m, 0, &FrontierQuery::default());
        assert_eq!(candidates.len(), 1);
        assert_eq!((candidates[0].x, candidates[0].y), (1, 0));
    }

    #[test]
    fn hole_pockets_outrank_open_field_candidates() {
        let mut m = TerritoryMatrix::new(5, 5, 1);
        m.registry.allocate("A").unwrap();
        for y in 0..5 {
            for x in 0..5 {
                if !(x == 2 && y == 2) {
                    m.set_owner(x, y, 0);
                }
            }
        }
        let candidates = frontier_candidates(&m, 0, &FrontierQuery::default());
        assert_eq!(candidates.len(), 1);
        assert_eq!((candidates[0].x, candidates[0].y), (2, 2));
        assert!(candidates[0].score > HOLE_BONUS_WEIGHT);
    }

    #[test]
    fn distant_candidates_are_dropped_when_outside_the_corridor() {
        let mut m = TerritoryMatrix::new(10, 10, 1);
        m.registry.allocate("A").unwrap();
        m.set_owner(0, 5, 0);
        let path: Vec<(u32, u32)> = vec![(0, 0), (9, 0)];
        let query = FrontierQuery { path: Some(&path[..]), max_dist_from_path: Some(1.0), ..Default::default() };
        let candidates = frontier_candidates(&m, 0, &query);
        assert!(candidates.is_empty(), "cell at y=5 is 5 away from the y=0 path, should be dropped");
    }

    #[test]
    fn candidates_closer_to_the_target_score_higher() {
        let mut m = TerritoryMatrix::new(10, 1, 1);
        m.registry.allocate("A").unwrap();
        m.set_owner(5, 0, 0);
        let query = FrontierQuery { target: Some((6.0, 0.0)), ..Default::default() };
        let candidates = frontier_candidates(&m, 0, &query);
        let near = candidates.iter().find(|c| c.x == 6).unwrap();
        let far = candidates.iter().find(|c| c.x == 4).unwrap();
        assert!(near.score > far.score);
    }
}
