//! Spatial acceleration structures for map queries

pub mod team;
pub mod voxel;

pub use team::TeamIndex;
pub use voxel::VoxelGrid;
