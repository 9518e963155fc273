//! Error taxonomy.
//!
//! Three kinds, per the engine's error handling design: command rejection
//! (reported to the issuer, state unchanged), capacity exhaustion (reported,
//! dropped), and invariant breach on deserialization (fails the load; the
//! host decides whether to recreate from map data). Kernels never return
//! `Result` — they are total over any valid matrix state.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("owner {owner:?} already has a nation")]
    NationAlreadyFounded { owner: String },
    #[error("cell ({x},{y}) is ocean")]
    OceanTarget { x: u32, y: u32 },
    #[error("cell ({x},{y}) is out of bounds for a {width}x{height} map")]
    OutOfBounds { x: i64, y: i64, width: u32, height: u32 },
    #[error("no free nation slot (capacity {capacity} reached)")]
    CapacityExhausted { capacity: usize },
    #[error("unknown owner {owner:?}")]
    UnknownOwner { owner: String },
    #[error("cell ({x},{y}) is not owned by {owner:?}")]
    CellNotOwned { owner: String, x: u32, y: u32 },
    #[error("insufficient resources for {owner:?} to build at ({x},{y})")]
    InsufficientResources { owner: String, x: u32, y: u32 },
    #[error("unknown arrow id {arrow_id}")]
    UnknownArrow { arrow_id: u32 },
    #[error("invalid commitment percent {percent}, must be in (0,1]")]
    InvalidPercent { percent: f32 },
    #[error("path must contain at least two waypoints")]
    PathTooShort,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistError {
    #[error("unsupported record format version {version}")]
    UnsupportedVersion { version: u32 },
    #[error("dimension mismatch: record is {record_w}x{record_h}, map is {map_w}x{map_h}")]
    DimensionMismatch {
        record_w: u32,
        record_h: u32,
        map_w: u32,
        map_h: u32,
    },
    #[error("layer {layer} has {found} bytes, expected {expected}")]
    LayerSizeMismatch {
        layer: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("nation capacity mismatch: record has {record_n}, matrix has {matrix_n}")]
    NationCapacityMismatch { record_n: usize, matrix_n: usize },
    #[error("corrupt record: {reason}")]
    Corrupt { reason: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}
