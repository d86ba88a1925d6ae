//! Combat scheduling: effect types and the deferred-effect engine

pub mod effects;
pub mod engine;

pub use effects::{
    Annotation, AuraParams, DamageEffect, DeathMethod, EffectKind, EffectSource, Falloff,
    ItemRecord,
};
pub use engine::{CombatDelta, CombatEngine, CombatMarks, CombatSnapshot, LogMark};
