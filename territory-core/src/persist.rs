//! Versioned save/restore codec for the dynamic layers (component G).
//!
//! Static layers (biome, elevation, resource nodes, `region_id`, ...) come
//! back from the map description on reload and are never serialized here.
//! v1 stores `loyalty` as `f32` and the full `troop_density` layer. v2 drops
//! `troop_density` entirely (mobilization reseeds it, §4.5.1) and quantizes
//! `loyalty` to `u8`, roughly halving payload size at the cost of loyalty
//! precision a diffusion pass erases within a few ticks anyway.

use serde::{Deserialize, Serialize};

use crate::error::PersistError;
use crate::matrix::nation::NationRecord;
use crate::matrix::TerritoryMatrix;
use crate::registry::NationIndex;

pub const CURRENT_VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NationSlot {
    pub index: NationIndex,
    pub owner: String,
    pub record: NationRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRecord {
    pub version: u32,
    pub width: u32,
    pub height: u32,
    pub nation_capacity: usize,
    pub nations: Vec<NationSlot>,

    pub ownership: Vec<i8>,
    pub population_density_bytes: Vec<u8>,
    pub defense_strength_bytes: Vec<u8>,
    pub resource_claim_owner: Vec<i8>,
    pub resource_claim_progress_bytes: Vec<u8>,
    pub resource_claim_progress_owner: Vec<i8>,

    /// v1: `f32` loyalty, little-endian bytes via `bytemuck::cast_slice`.
    /// v2: one quantized `u8` per entry, `round(v*255)`.
    pub loyalty_bytes: Vec<u8>,
    /// Present in v1 only; empty in v2 (reseeded by mobilization on load).
    pub troop_density_bytes: Vec<u8>,
}

fn f32_slice_to_bytes(values: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice(values).to_vec()
}

fn bytes_to_f32_vec(bytes: &[u8], layer: &'static str) -> Result<Vec<f32>, PersistError> {
    if bytes.len() % 4 != 0 {
        return Err(PersistError::LayerSizeMismatch { layer, expected: bytes.len() / 4 * 4, found: bytes.len() });
    }
    Ok(bytemuck::cast_slice(bytes).to_vec())
}

fn quantize_loyalty(values: &[f32]) -> Vec<u8> {
    values.iter().map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8).collect()
}

fn dequantize_loyalty(bytes: &[u8]) -> Vec<f32> {
    bytes.iter().map(|&b| b as f32 / 255.0).collect()
}

/// Serializes every dynamic layer of `matrix` plus the nation registry.
pub fn save(matrix: &TerritoryMatrix, version: u32) -> Result<SaveRecord, PersistError> {
    let nations = matrix
        .registry
        .live_indices()
        .filter_map(|index| {
            let owner = matrix.registry.owner_of(index)?.to_string();
            let record = matrix.nations[index as usize].clone()?;
            Some(NationSlot { index, owner, record })
        })
        .collect();

    let (loyalty_bytes, troop_density_bytes) = match version {
        1 => (f32_slice_to_bytes(&matrix.loyalty), f32_slice_to_bytes(&matrix.troop_density)),
        2 => (quantize_loyalty(&matrix.loyalty), Vec::new()),
        _ => return Err(PersistError::UnsupportedVersion { version }),
    };

    Ok(SaveRecord {
        version,
        width: matrix.width,
        height: matrix.height,
        nation_capacity: matrix.nation_capacity,
        nations,
        ownership: matrix.ownership.clone(),
        population_density_bytes: f32_slice_to_bytes(&matrix.population_density),
        defense_strength_bytes: f32_slice_to_bytes(&matrix.defense_strength),
        resource_claim_owner: matrix.resource_claim_owner.clone(),
        resource_claim_progress_bytes: f32_slice_to_bytes(&matrix.resource_claim_progress),
        resource_claim_progress_owner: matrix.resource_claim_progress_owner.clone(),
        loyalty_bytes,
        troop_density_bytes,
    })
}

/// Restores dynamic state onto a freshly map-built `matrix` (its static
/// layers must already match the record's dimensions). Rebuilds counters
/// and chunk border flags afterward, as the component design requires.
pub fn restore(matrix: &mut TerritoryMatrix, record: &SaveRecord) -> Result<(), PersistError> {
    if record.version == 0 || record.version > CURRENT_VERSION {
        return Err(PersistError::UnsupportedVersion { version: record.version });
    }
    if record.width != matrix.width || record.height != matrix.height {
        return Err(PersistError::DimensionMismatch {
            record_w: record.width,
            record_h: record.height,
            map_w: matrix.width,
            map_h: matrix.height,
        });
    }
    if record.nation_capacity != matrix.nation_capacity {
        return Err(PersistError::NationCapacityMismatch { record_n: record.nation_capacity, matrix_n: matrix.nation_capacity });
    }

    let cells = matrix.cells();
    if record.ownership.len() != cells {
        return Err(PersistError::LayerSizeMismatch { layer: "ownership", expected: cells, found: record.ownership.len() });
    }

    matrix.ownership.copy_from_slice(&record.ownership);
    matrix.population_density = bytes_to_f32_vec(&record.population_density_bytes, "populationDensity")?;
    matrix.defense_strength = bytes_to_f32_vec(&record.defense_strength_bytes, "defenseStrength")?;
    matrix.resource_claim_owner.copy_from_slice(&record.resource_claim_owner);
    matrix.resource_claim_progress = bytes_to_f32_vec(&record.resource_claim_progress_bytes, "resourceClaimProgress")?;
    matrix.resource_claim_progress_owner.copy_from_slice(&record.resource_claim_progress_owner);

    let stride = cells * matrix.nation_capacity;
    matrix.loyalty = match record.version {
        1 => bytes_to_f32_vec(&record.loyalty_bytes, "loyalty")?,
        _ => dequantize_loyalty(&record.loyalty_bytes),
    };
    if matrix.loyalty.len() != stride {
        return Err(PersistError::LayerSizeMismatch { layer: "loyalty", expected: stride, found: matrix.loyalty.len() });
    }

    matrix.troop_density = if record.version == 1 {
        let density = bytes_to_f32_vec(&record.troop_density_bytes, "troopDensity")?;
        if density.len() != stride {
            return Err(PersistError::LayerSizeMismatch { layer: "troopDensity", expected: stride, found: density.len() });
        }
        density
    } else {
        vec![0.0; stride]
    };

    matrix.nations = vec![None; matrix.nation_capacity];
    for slot in &record.nations {
        if slot.index < 0 || slot.index as usize >= matrix.nation_capacity {
            return Err(PersistError::Corrupt { reason: format!("nation index {} out of range", slot.index) });
        }
        matrix.registry.restore_slot(slot.index, Some(slot.owner.clone()));
        matrix.nations[slot.index as usize] = Some(slot.record.clone());
    }

    matrix.rebuild_counters_from_ownership();
    matrix.rebuild_chunk_border_flags();
    Ok(())
}
