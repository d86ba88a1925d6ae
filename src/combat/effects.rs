//! Damage effect types
//!
//! Every scheduled combat consequence is one closed [`DamageEffect`] value:
//! a resolution tick, an optional source, and a variant-specific payload.
//! Effects are immutable once constructed and consumed at most once by the
//! scheduler. The wire `kind` tags match the recorded replay format.

use serde::{Deserialize, Serialize};

use crate::core::types::{Coeff, ObjectId, Pos, TeamId, TickCount};
use crate::data::VsTable;

/// Originator of an effect; both fields may be absent for scripted or
/// environmental damage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectSource {
    pub source_id: Option<ObjectId>,
    pub source_team: Option<TeamId>,
}

impl EffectSource {
    pub fn from_object(id: ObjectId, team: Option<TeamId>) -> Self {
        Self { source_id: Some(id), source_team: team }
    }
}

/// How a kill is attributed, controlling death consequences upstream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathMethod {
    #[default]
    Hostile,
    Suicide,
}

/// Distance falloff policy for area effects.
///
/// Unrecognized policies deserialize to `Unknown`, which applies zero
/// effect: under-delivery is the safer failure mode for a damage effect, and
/// one malformed content record must not halt the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Falloff {
    Linear,
    Constant,
    Unknown,
}

impl Falloff {
    /// Magnitude multiplier at `dist` from the effect center
    pub fn magnitude(&self, dist: Pos, radius: Pos) -> Coeff {
        match self {
            Falloff::Linear => (1.0 - dist / radius).clamp(0.0, 1.0),
            Falloff::Constant => 1.0,
            Falloff::Unknown => {
                tracing::warn!("unhandled falloff type, applying zero effect");
                0.0
            }
        }
    }
}

impl Serialize for Falloff {
    fn serialize<S: serde::Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        let name = match self {
            Falloff::Linear => "linear",
            Falloff::Constant => "constant",
            Falloff::Unknown => "unknown",
        };
        ser.serialize_str(name)
    }
}

impl<'de> Deserialize<'de> for Falloff {
    fn deserialize<D: serde::Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(de)?;
        Ok(match raw.as_str() {
            "linear" => Falloff::Linear,
            "constant" => Falloff::Constant,
            other => {
                tracing::warn!(falloff = other, "unrecognized falloff policy in content data");
                Falloff::Unknown
            }
        })
    }
}

/// Parameters of a timed status effect granted by an aura effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuraParams {
    pub aura_name: String,
    pub aura_duration: TickCount,
    pub aura_range: Pos,
}

/// Variant payload of a [`DamageEffect`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EffectKind {
    /// Destroy a single target outright, bypassing on-death spells.
    /// Guaranteed to fire at most once even under duplicate scheduling:
    /// a target whose id has gone dead is a silent no-op.
    #[serde(rename = "KillDamageEffect")]
    Kill {
        target_id: ObjectId,
        #[serde(default)]
        death_method: DeathMethod,
    },

    /// Fixed damage to one target, modulated by the vs-table
    #[serde(rename = "TargetedDamageEffect")]
    TargetedDamage {
        target_id: ObjectId,
        amount: Coeff,
        #[serde(default)]
        vs_table: VsTable,
    },

    /// Timed aura on one target; duration modulated by its own vs-table
    #[serde(rename = "TargetedAuraEffect")]
    TargetedAura {
        target_id: ObjectId,
        amount: Coeff,
        #[serde(flatten)]
        aura: AuraParams,
        #[serde(default)]
        vs_table: VsTable,
        #[serde(default)]
        duration_vs_table: VsTable,
    },

    /// Falloff-adjusted damage to every qualifying object within a radius
    #[serde(rename = "AreaDamageEffect")]
    AreaDamage {
        target_location: [Pos; 2],
        hit_ground: bool,
        hit_air: bool,
        radius: Pos,
        falloff: Falloff,
        amount: Coeff,
        #[serde(default)]
        vs_table: VsTable,
        #[serde(default)]
        allow_ff: bool,
    },

    /// Area variant granting a timed aura instead of instant damage.
    /// `radius_rect` switches to rectangular coverage (full width/height
    /// extents centered on the target location); falloff is only
    /// well-defined for `constant` in the rectangular case.
    #[serde(rename = "AreaAuraEffect")]
    AreaAura {
        target_location: [Pos; 2],
        hit_ground: bool,
        hit_air: bool,
        radius: Pos,
        #[serde(default)]
        radius_rect: Option<[Pos; 2]>,
        falloff: Falloff,
        amount: Coeff,
        #[serde(flatten)]
        aura: AuraParams,
        #[serde(default)]
        vs_table: VsTable,
        #[serde(default)]
        duration_vs_table: VsTable,
        #[serde(default)]
        allow_ff: bool,
    },
}

/// One pending combat consequence, scheduled for a future tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageEffect {
    /// Resolution tick (simulation time, never wall-clock)
    pub tick: TickCount,
    #[serde(flatten)]
    pub source: EffectSource,
    #[serde(flatten)]
    pub kind: EffectKind,
}

impl DamageEffect {
    pub fn new(tick: TickCount, source: EffectSource, kind: EffectKind) -> Self {
        Self { tick, source, kind }
    }
}

/// Record of an item expended during combat, for replay purposes only.
/// The item payload is opaque game data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub item: serde_json::Value,
    pub target_pos: Option<[Pos; 2]>,
}

/// Miscellaneous combat event, for replay purposes only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Annotation {
    #[serde(rename = "BattleStarAnnotation")]
    BattleStar { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_falloff_math() {
        // distance 5 of radius 10 delivers half strength
        assert_eq!(Falloff::Linear.magnitude(5.0, 10.0), 0.5);
        assert_eq!(Falloff::Linear.magnitude(0.0, 10.0), 1.0);
        // beyond the radius clamps to zero, never negative
        assert_eq!(Falloff::Linear.magnitude(15.0, 10.0), 0.0);
    }

    #[test]
    fn test_constant_falloff_math() {
        assert_eq!(Falloff::Constant.magnitude(9.9, 10.0), 1.0);
    }

    #[test]
    fn test_unknown_falloff_is_zero_effect() {
        assert_eq!(Falloff::Unknown.magnitude(1.0, 10.0), 0.0);
    }

    #[test]
    fn test_unknown_falloff_string_degrades() {
        let falloff: Falloff = serde_json::from_str("\"quadratic\"").unwrap();
        assert_eq!(falloff, Falloff::Unknown);
    }

    #[test]
    fn test_effect_wire_kind_tags() {
        let effect = DamageEffect::new(
            TickCount(12),
            EffectSource::from_object(ObjectId(3), Some(TeamId::new("red"))),
            EffectKind::Kill { target_id: ObjectId(9), death_method: DeathMethod::Hostile },
        );
        let json = serde_json::to_value(&effect).unwrap();
        assert_eq!(json["kind"], "KillDamageEffect");
        assert_eq!(json["tick"], 12);
        assert_eq!(json["source_id"], 3);
        assert_eq!(json["target_id"], 9);

        let back: DamageEffect = serde_json::from_value(json).unwrap();
        assert_eq!(back, effect);
    }

    #[test]
    fn test_area_effect_round_trip() {
        let effect = DamageEffect::new(
            TickCount(4),
            EffectSource::default(),
            EffectKind::AreaDamage {
                target_location: [10.0, 20.0],
                hit_ground: true,
                hit_air: false,
                radius: 6.0,
                falloff: Falloff::Linear,
                amount: 75.0,
                vs_table: VsTable::default(),
                allow_ff: false,
            },
        );
        let text = serde_json::to_string(&effect).unwrap();
        let back: DamageEffect = serde_json::from_str(&text).unwrap();
        assert_eq!(back, effect);
    }
}
