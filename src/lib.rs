//! Rampart - deterministic client-side combat simulation engine
//!
//! Fixed-tick battle simulation with spatial query acceleration, deferred
//! damage-effect scheduling, and full replay capture/playback. All state is
//! owned explicitly by a [`world::World`]; the engine has no globals and no
//! wall-clock dependence, so identical inputs always produce identical
//! outcomes.

pub mod combat;
pub mod core;
pub mod data;
pub mod objects;
pub mod pathing;
pub mod replay;
pub mod spatial;
pub mod walls;
pub mod world;
