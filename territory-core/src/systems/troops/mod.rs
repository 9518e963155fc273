//! Troop density engine (component E): mobilization, in-place diffusion
//! with arrow attractor corridors, conservation scaling, and arrow combat.

pub mod combat;
pub mod conserve;
pub mod diffuse;
pub mod mobilize;

pub use combat::{advance_arrow_head, resolve_density_combat, CombatOutcome};
pub use conserve::conserve_troop_density;
pub use diffuse::diffuse_troop_density;
pub use mobilize::mobilize;
