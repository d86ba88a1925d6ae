use thiserror::Error;

use crate::core::types::ObjectId;

/// Errors raised by the simulation engine.
///
/// Contract violations (double-add, malformed wall grid, invalid heap
/// element, out-of-bounds insertion) indicate a logic bug upstream and are
/// surfaced loudly. Bad content data (unknown falloff, unknown aura kind) is
/// NOT represented here; it is logged and degraded to a zero effect so a
/// single malformed record cannot halt a running session.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("object {0} already present in collection")]
    DuplicateObject(ObjectId),

    #[error("attempt to add an object carrying the dead sentinel id")]
    DeadObjectId,

    #[error("out-of-bounds coordinates ({x}, {y}) for map {w}x{h}")]
    OutOfBounds { x: f32, y: f32, w: u32, h: u32 },

    #[error("map size {size:?} is not a multiple of '{spec}' unit_collision_gridsize {gridsize:?}")]
    WallGridMismatch {
        spec: String,
        size: [u32; 2],
        gridsize: [u32; 2],
    },

    #[error("heap operation on an element that is not in the heap")]
    HeapElementMissing,

    #[error("element already present in heap")]
    HeapDuplicateElement,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("game data error: {0}")]
    Data(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
