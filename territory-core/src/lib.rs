//! # territory-core
//!
//! Tick-driven territorial simulation engine for a multiplayer grid-strategy
//! game: a dense flat-array map mutated strictly in place, red-black
//! diffusion kernels, arrow-corridor combat, and a fixed per-tick pipeline.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌─────────────┐
//! │ CommandQueue │────▶│ apply_commands│────▶│   step()    │
//! │  (buffered)  │     │  (input.rs)   │     │  (step.rs)  │
//! └──────────────┘     └───────────────┘     └──────┬──────┘
//!                                                    │
//!                      ┌───────────────┐     ┌───────▼───────┐
//!                      │ ObserverRegistry│◀──│ TerritoryMatrix│
//!                      │  (side effects) │   │ (+ TickReport) │
//!                      └───────────────┘     └───────┬───────┘
//!                                                    │
//!                                            ┌───────▼───────┐
//!                                            │ build_nation_view│
//!                                            │   (view.rs)     │
//!                                            └────────────────┘
//! ```
//!
//! ## Key types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`TerritoryMatrix`] | Dense per-cell/per-nation state store |
//! | [`Command`] | Player actions (found nation, attack, reinforce, ...) |
//! | [`step`] | One tick: commands → kernels → deltas |
//! | [`TickReport`] | Everything produced by one tick |
//! | [`TickObserver`] | Side-effect hook invoked after each tick |
//! | [`build_nation_view`] | Per-player view assembly (own/foreign/defeated) |
//!
//! Map *generation* is out of scope; [`map_input`] only consumes an
//! already-finalized map description.

pub mod config;
pub mod delta;
pub mod error;
pub mod input;
pub mod kernels;
pub mod map_input;
pub mod matrix;
pub mod metrics;
pub mod observer;
pub mod persist;
pub mod registry;
pub mod step;
pub mod systems;
pub mod testing;
pub mod view;

pub use config::EngineConfig;
pub use delta::{DeltaSet, NationDelta};
pub use error::{CommandError, EngineError, PersistError};
pub use input::{Command, CommandOutcome, CommandQueue};
pub use map_input::{build_matrix, MapCell, MapDescription};
pub use matrix::{BBox, TerritoryMatrix};
pub use metrics::TickMetrics;
pub use observer::{ConsoleObserver, ObserverRegistry, TickObserver};
pub use registry::{NationIndex, NationRegistry, UNOWNED};
pub use step::{step, TickReport};
pub use view::{build_nation_view, HeatmapCache, NationView};
