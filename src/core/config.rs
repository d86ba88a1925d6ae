//! Engine configuration with documented constants

use crate::core::error::{EngineError, Result};

/// Tuning constants for the simulation engine.
///
/// These mirror the client tuning table of the original game; hosts build
/// one explicitly instead of reaching into an ambient data registry.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Size of each voxel bucket in the spatial accelerator, in map grid
    /// cells.
    ///
    /// Smaller = more buckets, fewer objects per bucket to filter.
    /// Larger = fewer buckets, more false positives per query.
    pub map_accel_chunk: u32,

    /// Query radius above which distance queries skip the voxel grid and
    /// scan the flat team index instead.
    ///
    /// Very large radii cover most of the grid anyway, and big objects
    /// overlapping many buckets make the accelerated path do extra
    /// dedup work for no gain.
    pub map_accel_limit: f32,

    /// Master switch for the voxel accelerator. With this off, every
    /// distance query scans the team index.
    pub use_map_accel: bool,

    /// Cap on pathfinding iterations per query. Massive numbers of units
    /// re-pathing on the same tick causes performance glitches; queries
    /// that hit the cap fail (no path) rather than stall the tick.
    pub astar_iter_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            map_accel_chunk: 8,
            map_accel_limit: 100.0,
            use_map_accel: true,
            astar_iter_limit: 2048,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.map_accel_chunk == 0 {
            return Err(EngineError::Config("map_accel_chunk must be nonzero".into()));
        }
        if self.map_accel_limit <= 0.0 {
            return Err(EngineError::Config(format!(
                "map_accel_limit ({}) must be positive",
                self.map_accel_limit
            )));
        }
        if self.astar_iter_limit == 0 {
            return Err(EngineError::Config("astar_iter_limit must be nonzero".into()));
        }
        Ok(())
    }
}
