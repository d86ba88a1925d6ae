//! Sparse 2D voxel grid for accelerating combat map queries
//!
//! Buckets objects into coarse grid cells to answer "what is near this
//! point" without scanning every object. There is one space per team plus an
//! implicit ALL space. The grid is rebuilt from scratch once per simulation
//! tick; per-tick object counts are small relative to rebuild cost, so no
//! incremental maintenance is attempted.
//!
//! In this module "xy" refers to map grid coordinates and "st" to voxel
//! bucket coordinates.

use ahash::AHashMap;

use crate::core::error::{EngineError, Result};
use crate::core::types::{clamp_pos, ObjectId, TeamId, Vec2};
use crate::objects::GameObject;

#[derive(Debug, Default)]
struct Space {
    cells: AHashMap<(usize, usize), Vec<ObjectId>>,
}

/// Voxel bucket index over the playfield
#[derive(Debug)]
pub struct VoxelGrid {
    /// Map dimensions, in grid cells
    wh: [u32; 2],
    /// Bucket coarseness, in grid cells per bucket
    chunk: u32,
    /// Bucket dimensions per axis
    size: [usize; 2],
    all: Space,
    by_team: AHashMap<TeamId, Space>,
}

impl VoxelGrid {
    pub fn new(wh: [u32; 2], chunk: u32) -> Self {
        let size = [
            wh[0].div_ceil(chunk) as usize,
            wh[1].div_ceil(chunk) as usize,
        ];
        Self {
            wh,
            chunk,
            size,
            all: Space::default(),
            by_team: AHashMap::new(),
        }
    }

    /// Reset to blank state
    pub fn clear(&mut self) {
        self.all.cells.clear();
        self.by_team.clear();
    }

    pub fn bucket_size(&self) -> [usize; 2] {
        self.size
    }

    fn in_bounds(&self, xy: Vec2) -> bool {
        xy.x >= 0.0 && xy.x < self.wh[0] as f32 && xy.y >= 0.0 && xy.y < self.wh[1] as f32
    }

    /// Convert map coordinates to bucket coordinates.
    ///
    /// Out-of-bounds input on this path is a contract violation; query
    /// entry points bounds-check first and report "no results" instead.
    fn xy_to_st(&self, xy: Vec2) -> Result<(usize, usize)> {
        if !self.in_bounds(xy) {
            return Err(EngineError::OutOfBounds {
                x: xy.x,
                y: xy.y,
                w: self.wh[0],
                h: self.wh[1],
            });
        }
        Ok((
            (xy.x as u32 / self.chunk) as usize,
            (xy.y as u32 / self.chunk) as usize,
        ))
    }

    /// Bounding st ranges (end-exclusive) of all buckets touched by a
    /// circle at `loc` with radius `dist`, clamped to the map
    pub fn circle_bounds_st(&self, loc: Vec2, dist: f32) -> [[usize; 2]; 2] {
        let mut out = [[0usize; 2]; 2];
        let loc = [loc.x, loc.y];
        for axis in 0..2 {
            // upper bound is the bucket BEYOND the end of iteration, so
            // clamp to end, not end-1
            let lo = clamp_pos((loc[axis] - dist).floor(), 0.0, self.wh[axis] as f32) as u32;
            let hi = clamp_pos((loc[axis] + dist).ceil(), 0.0, self.wh[axis] as f32) as u32;
            out[axis][0] = ((lo / self.chunk) as usize).min(self.size[axis]);
            out[axis][1] = (hi.div_ceil(self.chunk) as usize).min(self.size[axis]);
        }
        out
    }

    fn add_to_space(space: &mut Space, id: ObjectId, st: (usize, usize)) {
        space.cells.entry(st).or_default().push(id);
    }

    fn add_to_space_xy(&mut self, team: Option<&TeamId>, id: ObjectId, xy: Vec2, rad: f32) -> Result<()> {
        // split borrow: compute bucket coverage before touching the spaces
        let coverage = if rad > 0.0 {
            None
        } else {
            Some(self.xy_to_st(xy)?)
        };
        let bounds = self.circle_bounds_st(xy, rad);

        let space = match team {
            None => &mut self.all,
            Some(t) => self.by_team.entry(t.clone()).or_default(),
        };
        match coverage {
            // point object: exactly one bucket
            Some(st) => Self::add_to_space(space, id, st),
            // radius object: every bucket its circle touches (conservative
            // axis-aligned bound; callers do exact distance filtering)
            None => {
                for t in bounds[1][0]..bounds[1][1] {
                    for s in bounds[0][0]..bounds[0][1] {
                        Self::add_to_space(space, id, (s, t));
                    }
                }
            }
        }
        Ok(())
    }

    /// Insert an object into the ALL space and its team's space
    pub fn add_object(&mut self, obj: &GameObject) -> Result<()> {
        let xy = obj.pos;
        let rad = obj.hit_radius();
        self.add_to_space_xy(None, obj.id, xy, rad)?;
        if let Some(team) = obj.team.clone() {
            self.add_to_space_xy(Some(&team), obj.id, xy, rad)?;
        }
        Ok(())
    }

    /// Contents of one bucket, `None` for empty/unknown
    pub fn objects_at_st(&self, st: (usize, usize), team: Option<&TeamId>) -> Option<&[ObjectId]> {
        let space = match team {
            None => &self.all,
            Some(t) => self.by_team.get(t)?,
        };
        space.cells.get(&st).map(|v| v.as_slice())
    }

    /// Objects in the bucket covering `xy`.
    ///
    /// Conservative: may include objects near, but not actually covering,
    /// the query point. Out-of-bounds queries silently return `None` since
    /// user-driven positions can legitimately be off-map.
    pub fn objects_near_xy(&self, xy: Vec2, team: Option<&TeamId>) -> Option<&[ObjectId]> {
        if !self.in_bounds(xy) {
            return None;
        }
        let st = (
            (xy.x as u32 / self.chunk) as usize,
            (xy.y as u32 / self.chunk) as usize,
        );
        self.objects_at_st(st, team)
    }

    /// O(1) test whether any object of this team was inserted
    pub fn has_any_of_team(&self, team: &TeamId) -> bool {
        self.by_team.contains_key(team)
    }
}
