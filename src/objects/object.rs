//! Live game object instances

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::types::{Coeff, ObjectId, TeamId, TickCount, Vec2};
use crate::data::{GameData, ObjectKind, ObjectSpec};

/// Timed status effect attached to an object.
///
/// Carries its own magnitude and duration, separate from instant damage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aura {
    pub name: String,
    pub amount: Coeff,
    /// Tick at which the aura expires
    pub ends: TickCount,
    /// Effect range for auras that themselves act over an area
    pub range: f32,
    pub source_id: Option<ObjectId>,
    pub source_team: Option<TeamId>,
}

/// Per-direction wall linkage marker, NESW order.
///
/// Unlinked directions shrink the collision/render geometry inward so an
/// isolated segment still reads as a freestanding piece.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallNeighbor {
    #[default]
    Shrink,
    Linked,
}

/// A unit, building, or inert prop living in the [`ObjectCollection`].
///
/// The engine owns indexing and scheduling metadata about objects; gameplay
/// fields (hp, position) are mutated on behalf of external game logic and
/// effect application.
///
/// [`ObjectCollection`]: crate::objects::ObjectCollection
#[derive(Debug, Clone)]
pub struct GameObject {
    pub id: ObjectId,
    pub spec: Arc<ObjectSpec>,
    pub team: Option<TeamId>,
    pub pos: Vec2,
    /// Flight altitude; anything above ground counts as flying
    pub altitude: f32,
    pub hp: i32,
    pub auras: Vec<Aura>,
    pub wall_neighbors: [WallNeighbor; 4],
}

impl GameObject {
    pub fn new(id: ObjectId, spec: Arc<ObjectSpec>, team: Option<TeamId>, pos: Vec2) -> Self {
        let hp = spec.max_hp;
        Self {
            id,
            spec,
            team,
            pos,
            altitude: 0.0,
            hp,
            auras: Vec::new(),
            wall_neighbors: [WallNeighbor::Shrink; 4],
        }
    }

    pub fn is_mobile(&self) -> bool {
        self.spec.kind == ObjectKind::Mobile
    }

    pub fn is_building(&self) -> bool {
        self.spec.kind == ObjectKind::Building
    }

    pub fn is_inert(&self) -> bool {
        self.spec.kind == ObjectKind::Inert
    }

    pub fn is_destroyed(&self) -> bool {
        self.hp <= 0 && !self.is_inert()
    }

    pub fn is_flying(&self) -> bool {
        self.spec.flying || self.altitude > 0.0
    }

    pub fn is_invul(&self) -> bool {
        self.spec.invulnerable
    }

    pub fn hit_radius(&self) -> f32 {
        self.spec.hit_radius
    }

    /// Attach an aura. Re-applying an aura of the same name from the same
    /// source refreshes its magnitude and duration instead of stacking.
    pub fn create_aura(&mut self, aura: Aura) {
        if let Some(existing) = self
            .auras
            .iter_mut()
            .find(|a| a.name == aura.name && a.source_id == aura.source_id)
        {
            *existing = aura;
        } else {
            self.auras.push(aura);
        }
    }

    /// Drop auras whose end tick has arrived
    pub fn expire_auras(&mut self, now: TickCount) {
        self.auras.retain(|a| a.ends > now);
    }

    /// Capture the full serializable state of this object
    pub fn state(&self) -> ObjectState {
        ObjectState {
            id: self.id,
            spec: self.spec.name.clone(),
            team: self.team.clone(),
            pos: [self.pos.x, self.pos.y],
            altitude: self.altitude,
            hp: self.hp,
            auras: self.auras.clone(),
        }
    }

    /// Overwrite mutable fields from a snapshot state, preserving identity.
    ///
    /// The spec name is fixed at construction; snapshots never change an
    /// object's type in place.
    pub fn apply_state(&mut self, state: &ObjectState) {
        self.team = state.team.clone();
        self.pos = Vec2::new(state.pos[0], state.pos[1]);
        self.altitude = state.altitude;
        self.hp = state.hp;
        self.auras = state.auras.clone();
    }

    /// Reconstruct an object from its serialized state
    pub fn from_state(state: &ObjectState, gamedata: &GameData) -> crate::core::Result<Self> {
        let spec = gamedata.spec(&state.spec)?;
        let mut obj = GameObject::new(
            state.id,
            spec,
            state.team.clone(),
            Vec2::new(state.pos[0], state.pos[1]),
        );
        obj.altitude = state.altitude;
        obj.hp = state.hp;
        obj.auras = state.auras.clone();
        Ok(obj)
    }
}

/// Full serialized state of one object, as stored in snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectState {
    pub id: ObjectId,
    pub spec: String,
    pub team: Option<TeamId>,
    pub pos: [f32; 2],
    #[serde(default)]
    pub altitude: f32,
    pub hp: i32,
    #[serde(default)]
    pub auras: Vec<Aura>,
}
