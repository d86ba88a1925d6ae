//! Deferred-effect scheduler
//!
//! Holds the queue of pending damage effects plus the item-use and
//! annotation logs that exist only for replay capture. Incremental
//! serialization works by diffing against explicit marks handed out by
//! [`CombatEngine::marks`]; the recorder owns its marks, so nothing here
//! depends on being called in a particular order.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::combat::effects::{Annotation, DamageEffect, ItemRecord};
use crate::core::error::{EngineError, Result};
use crate::core::types::TickCount;

/// Cursor into an [`EventLog`], counted in total pushes since creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMark(u64);

/// Append-only event history with explicit-cursor reads.
///
/// Entries before the oldest outstanding mark can be released with
/// [`EventLog::compact`]; reads with a stale mark clamp to what is still
/// retained.
#[derive(Debug)]
pub struct EventLog<T> {
    entries: VecDeque<T>,
    start: u64,
}

impl<T: Clone> EventLog<T> {
    pub fn new() -> Self {
        Self { entries: VecDeque::new(), start: 0 }
    }

    pub fn push(&mut self, entry: T) {
        self.entries.push_back(entry);
    }

    /// Cursor at the current end of the log
    pub fn mark(&self) -> LogMark {
        LogMark(self.start + self.entries.len() as u64)
    }

    /// Entries appended since `mark`
    pub fn since(&self, mark: LogMark) -> Vec<T> {
        let offset = mark.0.saturating_sub(self.start) as usize;
        self.entries.iter().skip(offset).cloned().collect()
    }

    /// Release history before `mark`
    pub fn compact(&mut self, mark: LogMark) {
        while self.start < mark.0 && !self.entries.is_empty() {
            self.entries.pop_front();
            self.start += 1;
        }
    }

    /// Release all retained history; existing marks stay valid
    pub fn truncate(&mut self) {
        self.start += self.entries.len() as u64;
        self.entries.clear();
    }
}

impl<T: Clone> Default for EventLog<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cursors into all three engine logs, captured together
#[derive(Debug, Clone, Copy, Default)]
pub struct CombatMarks {
    pub effects: LogMark,
    pub items: LogMark,
    pub annotations: LogMark,
}

/// Incremental combat-engine state since a set of marks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatDelta {
    /// Effects queued since the marks, in queue order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects_added: Vec<DamageEffect>,
    /// Pending-queue length after the additions; integrity check on replay
    pub queue_len: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl CombatDelta {
    pub fn is_empty(&self) -> bool {
        self.effects_added.is_empty() && self.items.is_empty() && self.annotations.is_empty()
    }
}

/// Full serialization of the scheduler's pending state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatSnapshot {
    pub cur_tick: TickCount,
    pub damage_effect_queue: Vec<DamageEffect>,
}

/// The deferred-effect scheduler
#[derive(Debug, Default)]
pub struct CombatEngine {
    pub cur_tick: TickCount,
    /// Replay playback disables live queuing so recorded effects are the
    /// only source of damage
    accept_damage_effects: bool,
    damage_effect_queue: Vec<DamageEffect>,
    effect_log: EventLog<DamageEffect>,
    item_log: EventLog<ItemRecord>,
    annotation_log: EventLog<Annotation>,
    /// Set once a reader captures marks; until then the logs self-compact
    /// on every drain so a session without a recorder stays bounded
    marks_registered: bool,
}

impl CombatEngine {
    pub fn new() -> Self {
        Self {
            cur_tick: TickCount(0),
            accept_damage_effects: true,
            damage_effect_queue: Vec::new(),
            effect_log: EventLog::new(),
            item_log: EventLog::new(),
            annotation_log: EventLog::new(),
            marks_registered: false,
        }
    }

    pub fn set_accept_damage_effects(&mut self, accept: bool) {
        self.accept_damage_effects = accept;
    }

    /// Schedule an effect for its resolution tick
    pub fn queue_damage_effect(&mut self, effect: DamageEffect) {
        if !self.accept_damage_effects {
            return;
        }
        self.effect_log.push(effect.clone());
        self.damage_effect_queue.push(effect);
    }

    /// Queue an effect during replay playback, bypassing the accept latch
    /// and the capture log
    pub fn queue_replayed_effect(&mut self, effect: DamageEffect) {
        self.damage_effect_queue.push(effect);
    }

    /// Record an item expenditure for replay capture
    pub fn log_item(&mut self, record: ItemRecord) {
        self.item_log.push(record);
    }

    /// Record a miscellaneous combat event for replay capture
    pub fn log_annotation(&mut self, annotation: Annotation) {
        self.annotation_log.push(annotation);
    }

    /// Remove and return every effect whose resolution tick has arrived,
    /// preserving queue order.
    ///
    /// Effects queued while the returned batch is being applied are not
    /// part of it; they wait for a later call. Combined with the dead-id
    /// no-op on application this guarantees at-most-once consumption.
    pub fn take_due(&mut self) -> Vec<DamageEffect> {
        let now = self.cur_tick;
        let mut due = Vec::new();
        self.damage_effect_queue.retain(|effect| {
            if effect.tick <= now {
                due.push(effect.clone());
                false
            } else {
                true
            }
        });
        if !self.marks_registered {
            self.effect_log.truncate();
            self.item_log.truncate();
            self.annotation_log.truncate();
        }
        due
    }

    pub fn has_queued_effects(&self) -> bool {
        !self.damage_effect_queue.is_empty()
    }

    pub fn queue_len(&self) -> usize {
        self.damage_effect_queue.len()
    }

    /// For replay restart: drop all pending effects
    pub fn clear_queued_effects(&mut self) {
        self.damage_effect_queue.clear();
    }

    /// Capture cursors for later [`delta_since`] calls.
    ///
    /// Registering a reader hands it ownership of log retention; from here
    /// on only its [`compact`] calls release history.
    ///
    /// [`delta_since`]: CombatEngine::delta_since
    /// [`compact`]: CombatEngine::compact
    pub fn marks(&mut self) -> CombatMarks {
        self.marks_registered = true;
        CombatMarks {
            effects: self.effect_log.mark(),
            items: self.item_log.mark(),
            annotations: self.annotation_log.mark(),
        }
    }

    /// Everything queued or logged since `marks`
    pub fn delta_since(&self, marks: &CombatMarks) -> CombatDelta {
        CombatDelta {
            effects_added: self.effect_log.since(marks.effects),
            queue_len: self.damage_effect_queue.len(),
            items: self.item_log.since(marks.items),
            annotations: self.annotation_log.since(marks.annotations),
        }
    }

    /// Release log history older than `marks`
    pub fn compact(&mut self, marks: &CombatMarks) {
        self.effect_log.compact(marks.effects);
        self.item_log.compact(marks.items);
        self.annotation_log.compact(marks.annotations);
    }

    /// Full snapshot of pending state
    pub fn serialize(&self) -> CombatSnapshot {
        CombatSnapshot {
            cur_tick: self.cur_tick,
            damage_effect_queue: self.damage_effect_queue.clone(),
        }
    }

    /// Restore pending state from a full snapshot
    pub fn apply_snapshot(&mut self, snap: &CombatSnapshot) {
        self.cur_tick = snap.cur_tick;
        self.damage_effect_queue = snap.damage_effect_queue.clone();
    }

    /// Append a recorded delta to the pending queue.
    ///
    /// The recorded queue length is an integrity check: a mismatch means
    /// the playback diverged from the recording.
    pub fn apply_delta(&mut self, delta: &CombatDelta) -> Result<()> {
        for effect in &delta.effects_added {
            self.damage_effect_queue.push(effect.clone());
        }
        if self.damage_effect_queue.len() != delta.queue_len {
            return Err(EngineError::Data(format!(
                "unexpected queue length {} vs actual {}",
                delta.queue_len,
                self.damage_effect_queue.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::effects::{DeathMethod, EffectKind, EffectSource};
    use crate::core::types::ObjectId;

    fn kill_at(tick: u64, target: i32) -> DamageEffect {
        DamageEffect::new(
            TickCount(tick),
            EffectSource::default(),
            EffectKind::Kill { target_id: ObjectId(target), death_method: DeathMethod::Hostile },
        )
    }

    #[test]
    fn test_take_due_respects_tick_and_order() {
        let mut engine = CombatEngine::new();
        engine.queue_damage_effect(kill_at(5, 1));
        engine.queue_damage_effect(kill_at(2, 2));
        engine.queue_damage_effect(kill_at(2, 3));

        engine.cur_tick = TickCount(1);
        assert!(engine.take_due().is_empty());
        assert_eq!(engine.queue_len(), 3);

        engine.cur_tick = TickCount(2);
        let due = engine.take_due();
        assert_eq!(due.len(), 2);
        // queue order preserved among due effects
        assert!(matches!(due[0].kind, EffectKind::Kill { target_id: ObjectId(2), .. }));
        assert!(matches!(due[1].kind, EffectKind::Kill { target_id: ObjectId(3), .. }));
        assert_eq!(engine.queue_len(), 1);

        engine.cur_tick = TickCount(5);
        assert_eq!(engine.take_due().len(), 1);
        assert!(!engine.has_queued_effects());
    }

    #[test]
    fn test_accept_latch_blocks_queuing() {
        let mut engine = CombatEngine::new();
        engine.set_accept_damage_effects(false);
        engine.queue_damage_effect(kill_at(1, 1));
        assert!(!engine.has_queued_effects());

        // the replay path bypasses the latch
        engine.queue_replayed_effect(kill_at(1, 1));
        assert_eq!(engine.queue_len(), 1);
    }

    #[test]
    fn test_delta_since_marks() {
        let mut engine = CombatEngine::new();
        engine.queue_damage_effect(kill_at(1, 1));
        let marks = engine.marks();

        engine.queue_damage_effect(kill_at(2, 2));
        engine.log_annotation(Annotation::BattleStar { name: "first_blood".into() });

        let delta = engine.delta_since(&marks);
        assert_eq!(delta.effects_added.len(), 1);
        assert_eq!(delta.queue_len, 2);
        assert_eq!(delta.annotations.len(), 1);

        // nothing new after re-marking
        let marks = engine.marks();
        assert!(engine.delta_since(&marks).is_empty());
    }

    #[test]
    fn test_compact_keeps_unread_history() {
        let mut engine = CombatEngine::new();
        engine.queue_damage_effect(kill_at(1, 1));
        let marks = engine.marks();
        engine.queue_damage_effect(kill_at(2, 2));
        engine.compact(&marks);

        let delta = engine.delta_since(&marks);
        assert_eq!(delta.effects_added.len(), 1);
        assert!(matches!(
            delta.effects_added[0].kind,
            EffectKind::Kill { target_id: ObjectId(2), .. }
        ));
    }

    #[test]
    fn test_logs_self_compact_without_reader() {
        let mut engine = CombatEngine::new();
        for i in 0..100 {
            engine.queue_damage_effect(kill_at(0, i));
        }
        engine.take_due();
        // no reader registered: consumed history is released on the drain
        assert!(engine.delta_since(&CombatMarks::default()).effects_added.is_empty());

        // a registered reader takes over retention
        let mut engine = CombatEngine::new();
        let marks = engine.marks();
        engine.queue_damage_effect(kill_at(0, 1));
        engine.take_due();
        assert_eq!(engine.delta_since(&marks).effects_added.len(), 1);
    }

    #[test]
    fn test_apply_delta_length_check() {
        let mut engine = CombatEngine::new();
        let delta = CombatDelta {
            effects_added: vec![kill_at(1, 1)],
            queue_len: 1,
            items: vec![],
            annotations: vec![],
        };
        engine.apply_delta(&delta).unwrap();

        let bad = CombatDelta { queue_len: 99, ..delta };
        assert!(engine.apply_delta(&bad).is_err());
    }

    #[test]
    fn test_full_snapshot_round_trip() {
        let mut engine = CombatEngine::new();
        engine.cur_tick = TickCount(7);
        engine.queue_damage_effect(kill_at(9, 4));

        let snap = engine.serialize();
        let mut other = CombatEngine::new();
        other.apply_snapshot(&snap);
        assert_eq!(other.cur_tick, TickCount(7));
        assert_eq!(other.queue_len(), 1);
    }
}
