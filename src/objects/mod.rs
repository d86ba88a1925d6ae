//! Game objects and the authoritative object collection

pub mod collection;
pub mod object;

pub use collection::{ObjectCollection, ObjectsDelta};
pub use object::{Aura, GameObject, ObjectState, WallNeighbor};
