//! Read-only game data tables
//!
//! The engine treats unit/spell definitions as opaque lookup data supplied
//! by the game-data collaborator. It reads the handful of fields it needs
//! for indexing and damage resolution and never mutates any of it.

use std::sync::Arc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};
use crate::core::types::Coeff;

/// Broad object category, driving destruction consequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Units: removed from the world outright when destroyed
    Mobile,
    /// Buildings: stay in the world at zero hp when destroyed
    Building,
    /// Scenery/debris: never participates in combat
    Inert,
}

/// Static definition of one object type, keyed by name in [`GameData`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectSpec {
    pub name: String,
    pub kind: ObjectKind,
    pub max_hp: i32,
    /// Hit radius in map grid units; 0 for point objects
    #[serde(default)]
    pub hit_radius: f32,
    #[serde(default)]
    pub flying: bool,
    #[serde(default)]
    pub invulnerable: bool,
    /// Area effects skip objects with this set
    #[serde(default)]
    pub immune_to_splash: bool,
    /// Categories this object defends as, matched against vs-tables
    #[serde(default)]
    pub defense_types: Vec<String>,
    /// Coarse collision footprint, in map grid cells. Required for
    /// wall-linkable barriers.
    #[serde(default)]
    pub unit_collision_gridsize: Option<[u32; 2]>,
    /// Barrier objects with this set get wall-neighbor resolution
    #[serde(default)]
    pub collide_as_wall: bool,
}

/// Per-target-category damage/duration multiplier table.
///
/// Resolution order: first entry matching one of the target's
/// `defense_types`, then `"default"`, then 1.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VsTable(pub AHashMap<String, Coeff>);

impl VsTable {
    pub fn modifier(&self, spec: &ObjectSpec) -> Coeff {
        for category in &spec.defense_types {
            if let Some(coeff) = self.0.get(category) {
                return *coeff;
            }
        }
        *self.0.get("default").unwrap_or(&1.0)
    }
}

/// The full game-data table set handed to the engine at construction
#[derive(Debug, Default, Deserialize)]
pub struct GameData {
    #[serde(deserialize_with = "deserialize_specs")]
    pub specs: AHashMap<String, Arc<ObjectSpec>>,
    /// Spell definitions; the engine passes these through untouched
    #[serde(default)]
    pub spells: serde_json::Value,
}

fn deserialize_specs<'de, D>(de: D) -> std::result::Result<AHashMap<String, Arc<ObjectSpec>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: AHashMap<String, ObjectSpec> = serde::Deserialize::deserialize(de)?;
    Ok(raw.into_iter().map(|(k, v)| (k, Arc::new(v))).collect())
}

impl GameData {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Look up a spec by name; missing names are a data error
    pub fn spec(&self, name: &str) -> Result<Arc<ObjectSpec>> {
        self.specs
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::Data(format!("unknown object spec '{name}'")))
    }

    /// Build game data directly from specs, for hosts that assemble tables
    /// in code rather than loading JSON
    pub fn from_specs(specs: impl IntoIterator<Item = ObjectSpec>) -> Self {
        Self {
            specs: specs
                .into_iter()
                .map(|s| (s.name.clone(), Arc::new(s)))
                .collect(),
            spells: serde_json::Value::Null,
        }
    }
}
