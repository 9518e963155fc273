//! Map description input: static layers populated once from a finalized
//! 2D map, with diffusion resistance derived at load time.
//!
//! Map *generation* is out of scope (§1); this module only consumes an
//! already-finalized description.

use crate::config::MatrixConfig;
use crate::matrix::TerritoryMatrix;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResourceNode {
    pub kind: u8,
    pub level: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapCell {
    pub biome: u8,
    pub elevation: f32,
    pub moisture: f32,
    pub is_river: bool,
    pub is_ocean: bool,
    pub resource_node: Option<ResourceNode>,
    /// Externally-precomputed region partition id, if the host supplies one.
    #[serde(default)]
    pub region_id: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapDescription {
    pub width: u32,
    pub height: u32,
    /// Row-major, length `width * height`.
    pub cells: Vec<MapCell>,
}

impl MapDescription {
    pub fn validate(&self) -> Result<(), String> {
        let expected = (self.width as usize) * (self.height as usize);
        if self.cells.len() != expected {
            return Err(format!(
                "map description has {} cells, expected {}x{}={}",
                self.cells.len(),
                self.width,
                self.height,
                expected
            ));
        }
        Ok(())
    }
}

/// Deterministic hash-based value noise in `[0,1)`. Stands in for the
/// "noise" the component design calls for without pulling a full-blown
/// terrain-generation dependency into an engine whose non-goal is map
/// generation (§1) — only per-cell diffusion resistance, a single scalar,
/// is derived here.
fn hash_noise(x: u32, y: u32, frequency: f32, octaves: u32) -> f32 {
    let mut total = 0.0f32;
    let mut amplitude = 1.0f32;
    let mut norm = 0.0f32;
    for octave in 0..octaves.max(1) {
        let scale = frequency * (1u32 << octave) as f32;
        let sx = (x as f32 * scale) as i64;
        let sy = (y as f32 * scale) as i64;
        let mut h = (sx.wrapping_mul(374_761_393) ^ sy.wrapping_mul(668_265_263)) as u64;
        h = h.wrapping_mul(2_654_435_761);
        h ^= h >> 15;
        let v = (h & 0xFFFF) as f32 / 65535.0;
        total += v * amplitude;
        norm += amplitude;
        amplitude *= 0.5;
    }
    if norm > 0.0 {
        total / norm
    } else {
        0.0
    }
}

/// Builds a fresh matrix from a map description, populating every static
/// layer and `diffusion_resistance` once.
pub fn build_matrix(
    map: &MapDescription,
    nation_capacity: usize,
    config: &MatrixConfig,
) -> Result<TerritoryMatrix, String> {
    map.validate()?;
    let mut matrix = TerritoryMatrix::new(map.width, map.height, nation_capacity);
    for (i, cell) in map.cells.iter().enumerate() {
        matrix.biome_index[i] = cell.biome;
        matrix.elevation[i] = cell.elevation;
        matrix.moisture[i] = cell.moisture;
        matrix.ocean_mask[i] = cell.is_ocean as u8;
        matrix.is_river[i] = cell.is_river as u8;
        matrix.region_id[i] = cell.region_id;
        if let Some(node) = cell.resource_node {
            matrix.resource_type[i] = node.kind;
            matrix.resource_level[i] = node.level;
        }
    }

    for y in 0..matrix.height {
        for x in 0..matrix.width {
            let i = matrix.idx(x, y);
            if matrix.ocean_mask[i] != 0 {
                matrix.diffusion_resistance[i] = 1.0;
                continue;
            }
            let mut resistance = config.noise_weight * hash_noise(x, y, config.noise_frequency, config.noise_octaves);
            resistance += config.elevation_resistance_weight * matrix.elevation[i].clamp(0.0, 1.0);
            if config.biome_resistance_enabled {
                // Higher biome indices are treated as progressively harsher
                // terrain (mountains/tundra at the high end of a palette).
                resistance += 0.05 * (matrix.biome_index[i] as f32 / 255.0);
            }
            if matrix.is_river[i] != 0 {
                resistance -= config.river_resistance_bonus;
            }
            matrix.diffusion_resistance[i] = resistance.clamp(0.0, 0.99);
        }
    }

    matrix.rebuild_chunk_border_flags();
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_map(width: u32, height: u32) -> MapDescription {
        MapDescription {
            width,
            height,
            cells: vec![
                MapCell {
                    biome: 1,
                    elevation: 0.2,
                    moisture: 0.5,
                    is_river: false,
                    is_ocean: false,
                    resource_node: None,
                    region_id: 0,
                };
                (width * height) as usize
            ],
        }
    }

    #[test]
    fn ocean_cells_get_full_resistance() {
        let mut map = flat_map(4, 4);
        map.cells[0].is_ocean = true;
        let matrix = build_matrix(&map, 4, &MatrixConfig::default()).unwrap();
        assert_eq!(matrix.diffusion_resistance[0], 1.0);
        assert!(matrix.diffusion_resistance[1] < 1.0);
    }

    #[test]
    fn river_cells_get_reduced_resistance() {
        let mut map = flat_map(4, 4);
        map.cells[0].is_river = true;
        let matrix = build_matrix(&map, 4, &MatrixConfig::default()).unwrap();
        assert!(matrix.diffusion_resistance[0] < matrix.diffusion_resistance[1]);
    }

    #[test]
    fn rejects_mismatched_cell_count() {
        let mut map = flat_map(4, 4);
        map.cells.pop();
        assert!(build_matrix(&map, 4, &MatrixConfig::default()).is_err());
    }
}
