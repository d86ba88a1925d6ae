//! Wall connectivity manager
//!
//! Walls of one spec type form visual segments: each live wall probes its
//! four cardinal neighbors and records per-direction whether a linked wall
//! sits there, so rendering can join linked segments and shrink exposed
//! ends. Recomputation is batched behind a dirty flag because wall churn
//! (placement, destruction) arrives in bursts.

use crate::core::error::{EngineError, Result};
use crate::core::types::ObjectId;
use crate::data::ObjectSpec;
use crate::objects::{ObjectCollection, WallNeighbor};

/// Cardinal probe offsets in wall-cell units, matching the order of
/// `GameObject::wall_neighbors`: north, east, south, west
const NEIGHBOR_OFFSETS: [[i64; 2]; 4] = [[0, -1], [1, 0], [0, 1], [-1, 0]];

/// Tracks which wall cells are occupied and keeps per-wall neighbor links
/// up to date
#[derive(Debug)]
pub struct WallManager {
    spec_name: String,
    /// Wall cell size in map grid units, from the spec's collision footprint
    gridsize: [u32; 2],
    /// Wall grid dimensions, in cells
    ncells: [usize; 2],
    /// Occupancy bitmap plus the id of the occupying wall, row-major
    cells: Vec<Option<ObjectId>>,
    dirty: bool,
}

impl WallManager {
    /// The map size must divide evenly into wall cells; a remainder means
    /// the content data and map geometry disagree.
    pub fn new(map_size: [u32; 2], spec: &ObjectSpec) -> Result<Self> {
        let gridsize = spec.unit_collision_gridsize.ok_or_else(|| {
            EngineError::Data(format!("wall spec '{}' has no collision gridsize", spec.name))
        })?;
        if gridsize[0] == 0
            || gridsize[1] == 0
            || map_size[0] % gridsize[0] != 0
            || map_size[1] % gridsize[1] != 0
        {
            return Err(EngineError::WallGridMismatch {
                spec: spec.name.clone(),
                size: map_size,
                gridsize,
            });
        }
        let ncells = [
            (map_size[0] / gridsize[0]) as usize,
            (map_size[1] / gridsize[1]) as usize,
        ];
        Ok(Self {
            spec_name: spec.name.clone(),
            gridsize,
            ncells,
            cells: vec![None; ncells[0] * ncells[1]],
            dirty: true,
        })
    }

    pub fn spec_name(&self) -> &str {
        &self.spec_name
    }

    /// Request a rebuild on the next [`refresh`] call
    ///
    /// [`refresh`]: WallManager::refresh
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn cell_of(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        let cx = (x / self.gridsize[0] as f32).floor();
        let cy = (y / self.gridsize[1] as f32).floor();
        if cx < 0.0 || cy < 0.0 {
            return None;
        }
        let (cx, cy) = (cx as usize, cy as usize);
        if cx >= self.ncells[0] || cy >= self.ncells[1] {
            return None;
        }
        Some((cx, cy))
    }

    fn occupant(&self, cx: i64, cy: i64) -> Option<ObjectId> {
        if cx < 0 || cy < 0 || cx as usize >= self.ncells[0] || cy as usize >= self.ncells[1] {
            return None;
        }
        self.cells[cy as usize * self.ncells[0] + cx as usize]
    }

    /// Rebuild the occupancy bitmap and rewrite every live wall's neighbor
    /// links. No-op unless marked dirty.
    pub fn refresh(&mut self, objects: &mut ObjectCollection) {
        if !self.dirty {
            return;
        }
        self.dirty = false;

        for cell in self.cells.iter_mut() {
            *cell = None;
        }
        // pass 1: occupancy from live, non-destroyed walls of our spec
        for obj in objects.iter() {
            if obj.spec.name != self.spec_name || obj.is_destroyed() {
                continue;
            }
            if let Some((cx, cy)) = self.cell_of(obj.pos.x, obj.pos.y) {
                self.cells[cy * self.ncells[0] + cx] = Some(obj.id);
            } else {
                tracing::warn!(id = %obj.id, "wall outside the wall grid, ignoring");
            }
        }

        // pass 2: cardinal neighbor probe for each occupied cell
        let mut links: Vec<(ObjectId, [WallNeighbor; 4])> = Vec::new();
        for cy in 0..self.ncells[1] {
            for cx in 0..self.ncells[0] {
                let Some(id) = self.cells[cy * self.ncells[0] + cx] else {
                    continue;
                };
                let mut neighbors = [WallNeighbor::Shrink; 4];
                for (i, [dx, dy]) in NEIGHBOR_OFFSETS.iter().enumerate() {
                    if self.occupant(cx as i64 + dx, cy as i64 + dy).is_some() {
                        neighbors[i] = WallNeighbor::Linked;
                    }
                }
                links.push((id, neighbors));
            }
        }
        for (id, neighbors) in links {
            if let Some(obj) = objects.get_mut(id) {
                obj.wall_neighbors = neighbors;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::core::types::{ObjectId, Vec2};
    use crate::data::{GameData, ObjectKind, ObjectSpec};
    use crate::objects::GameObject;

    fn wall_spec() -> ObjectSpec {
        ObjectSpec {
            name: "stone_wall".into(),
            kind: ObjectKind::Building,
            max_hp: 100,
            hit_radius: 0.0,
            flying: false,
            invulnerable: false,
            immune_to_splash: false,
            defense_types: vec!["wall".into()],
            unit_collision_gridsize: Some([4, 4]),
            collide_as_wall: true,
        }
    }

    fn wall_at(data: &GameData, id: i32, x: f32, y: f32) -> GameObject {
        let spec = data.spec("stone_wall").unwrap();
        GameObject::new(ObjectId(id), spec, None, Vec2::new(x, y))
    }

    #[test]
    fn test_map_size_must_divide_into_cells() {
        let spec = wall_spec();
        assert!(WallManager::new([64, 64], &spec).is_ok());
        assert!(matches!(
            WallManager::new([62, 64], &spec),
            Err(EngineError::WallGridMismatch { .. })
        ));
    }

    #[test]
    fn test_isolated_wall_shrinks_all_sides() {
        let data = GameData::from_specs([wall_spec()]);
        let mut mgr = WallManager::new([64, 64], &wall_spec()).unwrap();
        let mut objects = ObjectCollection::new();
        objects.add_object(wall_at(&data, 1, 10.0, 10.0)).unwrap();

        mgr.refresh(&mut objects);
        let obj = objects.get(ObjectId(1)).unwrap();
        assert_eq!(obj.wall_neighbors, [WallNeighbor::Shrink; 4]);
    }

    #[test]
    fn test_horizontal_row_links_east_west() {
        let data = GameData::from_specs([wall_spec()]);
        let mut mgr = WallManager::new([64, 64], &wall_spec()).unwrap();
        let mut objects = ObjectCollection::new();
        // three walls in adjacent cells along x: cells (2,2), (3,2), (4,2)
        objects.add_object(wall_at(&data, 1, 10.0, 10.0)).unwrap();
        objects.add_object(wall_at(&data, 2, 14.0, 10.0)).unwrap();
        objects.add_object(wall_at(&data, 3, 18.0, 10.0)).unwrap();

        mgr.refresh(&mut objects);
        let middle = objects.get(ObjectId(2)).unwrap();
        // north, east, south, west
        assert_eq!(
            middle.wall_neighbors,
            [
                WallNeighbor::Shrink,
                WallNeighbor::Linked,
                WallNeighbor::Shrink,
                WallNeighbor::Linked
            ]
        );
        let left = objects.get(ObjectId(1)).unwrap();
        assert_eq!(left.wall_neighbors[1], WallNeighbor::Linked);
        assert_eq!(left.wall_neighbors[3], WallNeighbor::Shrink);
    }

    #[test]
    fn test_destroyed_wall_breaks_the_link() {
        let data = GameData::from_specs([wall_spec()]);
        let mut mgr = WallManager::new([64, 64], &wall_spec()).unwrap();
        let mut objects = ObjectCollection::new();
        objects.add_object(wall_at(&data, 1, 10.0, 10.0)).unwrap();
        objects.add_object(wall_at(&data, 2, 14.0, 10.0)).unwrap();
        mgr.refresh(&mut objects);
        assert_eq!(
            objects.get(ObjectId(1)).unwrap().wall_neighbors[1],
            WallNeighbor::Linked
        );

        objects.get_mut(ObjectId(2)).unwrap().hp = 0;
        mgr.mark_dirty();
        mgr.refresh(&mut objects);
        assert_eq!(
            objects.get(ObjectId(1)).unwrap().wall_neighbors,
            [WallNeighbor::Shrink; 4]
        );
    }

    #[test]
    fn test_refresh_is_noop_unless_dirty() {
        let data = GameData::from_specs([wall_spec()]);
        let mut mgr = WallManager::new([64, 64], &wall_spec()).unwrap();
        let mut objects = ObjectCollection::new();
        mgr.refresh(&mut objects); // consumes the initial dirty flag

        objects.add_object(wall_at(&data, 1, 10.0, 10.0)).unwrap();
        objects.add_object(wall_at(&data, 2, 14.0, 10.0)).unwrap();
        mgr.refresh(&mut objects);
        // without mark_dirty the links stay stale
        assert_eq!(
            objects.get(ObjectId(1)).unwrap().wall_neighbors,
            [WallNeighbor::Shrink; 4]
        );

        mgr.mark_dirty();
        mgr.refresh(&mut objects);
        assert_eq!(
            objects.get(ObjectId(1)).unwrap().wall_neighbors[1],
            WallNeighbor::Linked
        );
    }
}
