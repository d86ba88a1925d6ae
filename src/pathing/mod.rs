//! Pathfinding: frontier heap and grid A*

pub mod astar;
pub mod heap;

pub use astar::{find_path, NavCell, NavGrid};
pub use heap::ScoreHeap;
