//! Map loading: a JSON [`MapDescription`] from disk, or a synthetic flat
//! map with a handful of seeded nations for `--test-mode` (CI, demos).

use std::path::Path;

use anyhow::{Context, Result};
use territory_core::map_input::{MapCell, MapDescription};
use territory_core::{build_matrix, config::MatrixConfig, Command, TerritoryMatrix};

pub fn load_map(path: &Path) -> Result<MapDescription> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading map file {}", path.display()))?;
    let map: MapDescription = serde_json::from_str(&text).with_context(|| format!("parsing map file {}", path.display()))?;
    map.validate().map_err(anyhow::Error::msg)?;
    Ok(map)
}

fn flat_map(width: u32, height: u32) -> MapDescription {
    MapDescription {
        width,
        height,
        cells: (0..width * height)
            .map(|_| MapCell {
                biome: 1,
                elevation: 0.1,
                moisture: 0.5,
                is_river: false,
                is_ocean: false,
                resource_node: None,
                region_id: 0,
            })
            .collect(),
    }
}

/// Builds a small synthetic map and the founding commands for `count`
/// nations spread along its diagonal.
pub fn mock_scenario(width: u32, height: u32, count: u32) -> Result<(TerritoryMatrix, Vec<Command>)> {
    let map = flat_map(width, height);
    let matrix = build_matrix(&map, count as usize, &MatrixConfig::default()).map_err(anyhow::Error::msg)?;
    let commands = (0..count)
        .map(|i| {
            let x = 1 + i * (width.saturating_sub(2)) / count.max(1);
            let y = 1 + i * (height.saturating_sub(2)) / count.max(1);
            Command::FoundNation {
                owner: format!("Nation{i}"),
                x,
                y,
                population: 200.0,
                troop_target: 0.2,
            }
        })
        .collect();
    Ok((matrix, commands))
}
