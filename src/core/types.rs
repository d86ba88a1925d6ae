//! Core type definitions used throughout the engine

use serde::{Deserialize, Serialize};

/// Scaling coefficient, like a damage_vs coefficient.
///
/// Assumed to be small (0..100-ish) but needs fractional precision.
pub type Coeff = f32;

/// 1D object position, in map grid units
pub type Pos = f32;

/// Stable identifier for game objects.
///
/// Ids are assigned upstream (by whatever feeds objects into the engine);
/// the engine never allocates them. A reserved sentinel marks objects that
/// have been removed so that any other holder of the id can detect
/// invalidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub i32);

impl ObjectId {
    /// Sentinel id assigned to removed objects
    pub const DEAD: ObjectId = ObjectId(-1);

    pub fn is_dead(&self) -> bool {
        *self == Self::DEAD
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team tag for an object ("player", "enemy", ...)
///
/// A filter of `None` in query APIs means the implicit "ALL" team.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamId(pub String);

impl TeamId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Simulation tick counter.
///
/// All effect scheduling is denominated in ticks, never wall-clock time.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TickCount(pub u64);

impl TickCount {
    pub fn get(&self) -> u64 {
        self.0
    }

    pub fn is_nonzero(&self) -> bool {
        self.0 != 0
    }

    pub fn next(&self) -> TickCount {
        TickCount(self.0 + 1)
    }

    /// Scale a tick count by a coefficient, rounding to nearest
    pub fn scale(&self, s: Coeff) -> TickCount {
        TickCount((s * self.0 as f32 + 0.5).floor().max(0.0) as u64)
    }
}

/// 2D position in map grid units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}

/// Clamp a 1D position to a range
pub fn clamp_pos(x: Pos, lo: Pos, hi: Pos) -> Pos {
    if x < lo {
        lo
    } else if x > hi {
        hi
    } else {
        x
    }
}
