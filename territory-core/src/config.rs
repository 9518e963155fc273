//! Engine configuration.
//!
//! One `EngineConfig` aggregates the tunables enumerated in the component
//! design, grouped the way callers touch them. Every default below matches
//! the numeric default called out in the component design.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoyaltyConfig {
    pub diffusion_rate: f32,
    pub decay_rate: f32,
    pub reinforcement_rate: f32,
    pub city_bonus: f32,
    pub capital_bonus: f32,
    pub city_radius: f32,
    pub capital_radius: f32,
    /// Ownership flips only once the winning nation's loyalty clears this.
    pub ownership_threshold: f32,
}

impl Default for LoyaltyConfig {
    fn default() -> Self {
        Self {
            diffusion_rate: 0.1,
            decay_rate: 0.02,
            reinforcement_rate: 0.05,
            city_bonus: 0.3,
            capital_bonus: 0.5,
            city_radius: 6.0,
            capital_radius: 10.0,
            ownership_threshold: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopulationConfig {
    pub diffusion_rate: f32,
    pub decay_rate: f32,
    pub city_source: f32,
    pub capital_source: f32,
    pub density_defense_scale: f32,
    pub troop_defense_scale: f32,
    /// Multiplies `diffusion_rate` for cells in a region containing one of
    /// the owner's cities, when region metadata is supplied.
    pub city_density_multiplier: f32,
    pub max_population_per_cell: f32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            diffusion_rate: 0.15,
            decay_rate: 0.01,
            city_source: 0.5,
            capital_source: 1.0,
            density_defense_scale: 0.3,
            troop_defense_scale: 0.5,
            city_density_multiplier: 1.5,
            max_population_per_cell: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TroopConfig {
    pub mobilization_base_rate: f32,
    pub mobilization_free_worker_scale: f32,
    pub demobilization_rate: f32,
    pub diffusion_rate: f32,
    pub diffusion_sub_steps: u32,
    pub border_concentration_bias: f32,
    pub arrow_attractor_strength: f32,
    pub arrow_attractor_radius: f32,
    pub max_density_per_cell: f32,
    pub density_decay_on_unowned: f32,
    pub combat_exchange_rate: f32,
    pub combat_defender_advantage: f32,
    pub combat_density_threshold: f32,
    /// Fraction of `attackerDensity` seeded into a newly-claimed cell.
    pub capture_seed_fraction: f32,
    /// Cap on the per-nation uniform conservation scale factor.
    pub max_conservation_scale: f32,
    /// Margin (cells) the diffusion bbox is expanded by beyond the nation's bbox.
    pub diffusion_bbox_margin: i32,
    /// Cells/tick an arrow head advances toward its next waypoint once the
    /// corridor at its current position is substantially captured.
    pub arrow_advance_rate: f32,
}

impl Default for TroopConfig {
    fn default() -> Self {
        Self {
            mobilization_base_rate: 1.0,
            mobilization_free_worker_scale: 0.5,
            demobilization_rate: 1.0,
            diffusion_rate: 0.2,
            diffusion_sub_steps: 1,
            border_concentration_bias: 0.3,
            arrow_attractor_strength: 0.8,
            arrow_attractor_radius: 10.0,
            max_density_per_cell: 5.0,
            density_decay_on_unowned: 0.5,
            combat_exchange_rate: 0.3,
            combat_defender_advantage: 1.2,
            combat_density_threshold: 0.05,
            capture_seed_fraction: 0.3,
            max_conservation_scale: 3.0,
            diffusion_bbox_margin: 12,
            arrow_advance_rate: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatrixConfig {
    pub noise_frequency: f32,
    pub noise_octaves: u32,
    pub noise_weight: f32,
    pub elevation_resistance_weight: f32,
    pub biome_resistance_enabled: bool,
    /// Flat reduction applied to a river cell's diffusion resistance: rivers
    /// ease movement rather than obstruct it, the opposite of elevation/biome.
    pub river_resistance_bonus: f32,
    /// Passive concavity fill: minimum same-owner 8-neighbours to claim.
    pub min_concavity_neighbors: u32,
    pub max_concavity_passes: u32,
    /// Per-tick progress increment toward permanently claiming a resource
    /// node under continuous ownership (§10 supplemental claim kernel).
    pub resource_claim_rate: f32,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            noise_frequency: 0.08,
            noise_octaves: 3,
            noise_weight: 0.3,
            elevation_resistance_weight: 0.4,
            biome_resistance_enabled: true,
            river_resistance_bonus: 0.15,
            min_concavity_neighbors: 5,
            max_concavity_passes: 3,
            resource_claim_rate: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StructureConfig {
    pub defense_radius: f32,
    pub troop_loss_multiplier: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructuresConfig {
    pub town: StructureConfig,
    pub tower: StructureConfig,
}

impl Default for StructuresConfig {
    fn default() -> Self {
        Self {
            town: StructureConfig {
                defense_radius: 4.0,
                troop_loss_multiplier: 1.0,
            },
            tower: StructureConfig {
                defense_radius: 6.0,
                troop_loss_multiplier: 1.3,
            },
        }
    }
}

/// Optional, externally-supplied regional partition metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RegionConfig {
    pub city_density_multiplier: f32,
    pub tower_defense_bonus: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    pub loyalty: LoyaltyConfig,
    pub population: PopulationConfig,
    pub troop: TroopConfig,
    pub matrix: MatrixConfig,
    pub structures: StructuresConfig,
    pub regions: Option<RegionConfig>,
    /// Rebuild each viewer's density heatmap every N ticks (spec default 5).
    pub heatmap_throttle_ticks: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            loyalty: LoyaltyConfig::default(),
            population: PopulationConfig::default(),
            troop: TroopConfig::default(),
            matrix: MatrixConfig::default(),
            structures: StructuresConfig::default(),
            regions: None,
            heatmap_throttle_ticks: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_component_design() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.loyalty.ownership_threshold, 0.6);
        assert_eq!(cfg.matrix.min_concavity_neighbors, 5);
        assert_eq!(cfg.matrix.max_concavity_passes, 3);
        assert_eq!(cfg.troop.max_conservation_scale, 3.0);
        assert_eq!(cfg.troop.diffusion_bbox_margin, 12);
        assert_eq!(cfg.heatmap_throttle_ticks, 5);
    }
}
