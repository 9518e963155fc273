//! Accumulated per-stage timing for one or more ticks.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Default, Clone, Debug, Serialize, Deserialize)]
pub struct TickMetrics {
    pub total_ticks: u64,
    pub total_time: Duration,
    pub mobilize_time: Duration,
    pub troop_diffusion_time: Duration,
    pub combat_time: Duration,
    pub loyalty_time: Duration,
    pub ownership_time: Duration,
    pub concavity_time: Duration,
    pub population_time: Duration,
    pub defense_time: Duration,
    pub connectivity_time: Duration,
    pub delta_time: Duration,
}

impl TickMetrics {
    pub fn tick_avg_ms(&self) -> f64 {
        if self.total_ticks == 0 {
            0.0
        } else {
            self.total_time.as_secs_f64() * 1000.0 / self.total_ticks as f64
        }
    }
}
