//! Stateful simulation systems that operate across a full tick: population
//! and defense (C), loyalty diffusion (D), the troop density engine (E),
//! and resource claim accrual (a supplemental system, §10).

pub mod loyalty;
pub mod population;
pub mod resources;
pub mod troops;

pub use loyalty::{apply_arrow_loyalty_pressure, diffuse_loyalty};
pub use population::{diffuse_population, recompute_defense};
pub use resources::advance_resource_claims;
