//! Replay playback
//!
//! The player owns a private [`World`] reconstructed from the recording's
//! base state. Stepping applies one record: object state first, then the
//! recorded effect queue, then normal due-effect resolution. Live effect
//! queuing is disabled for the playback world so the recording is the sole
//! source of damage. At the end of the recording playback loops back to the
//! start, rebuilding the world from base, unless paused.

use std::sync::Arc;

use crate::core::EngineConfig;
use crate::data::GameData;
use crate::replay::{ObjectsRecord, ReplayDocument, ReplayError, SnapshotRecord, REPLAY_VERSION};
use crate::world::{CombatFxEvent, FxSink, World};

/// Steps a recorded battle through a reconstructed world
#[derive(Debug)]
pub struct ReplayPlayer {
    doc: ReplayDocument,
    world: World,
    gamedata: Arc<GameData>,
    config: EngineConfig,
    cursor: usize,
    paused: bool,
}

impl ReplayPlayer {
    /// Parse and validate a packed replay, and build the playback world.
    ///
    /// Rejects the whole document on version mismatch, an empty snapshot
    /// list, or a first record that is not a full snapshot with base state.
    pub fn load(
        packed: &str,
        gamedata: Arc<GameData>,
        config: EngineConfig,
    ) -> Result<Self, ReplayError> {
        let doc: ReplayDocument = serde_json::from_str(packed)?;
        if doc.version != REPLAY_VERSION {
            return Err(ReplayError::VersionMismatch {
                found: doc.version,
                expected: REPLAY_VERSION,
            });
        }
        let first = doc.snapshots.first().ok_or(ReplayError::Empty)?;
        if first.base.is_none() {
            return Err(ReplayError::MissingBase);
        }
        if !matches!(first.objects, ObjectsRecord::Full { .. }) {
            return Err(ReplayError::Malformed("first snapshot is not a full record".into()));
        }

        let world = Self::build_world(first, &gamedata, &config)?;
        Ok(Self { doc, world, gamedata, config, cursor: 0, paused: false })
    }

    fn build_world(
        first: &SnapshotRecord,
        gamedata: &Arc<GameData>,
        config: &EngineConfig,
    ) -> Result<World, ReplayError> {
        let base = first.base.clone().ok_or(ReplayError::MissingBase)?;
        let mut world = World::new(base, gamedata.clone(), config.clone())
            .map_err(|err| ReplayError::Malformed(err.to_string()))?;
        world.combat.set_accept_damage_effects(false);
        Ok(world)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Zero-based index of the next record to apply
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.doc.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.snapshots.is_empty()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Rebuild the world from base and point the cursor at the first record
    fn rewind(&mut self) -> Result<(), ReplayError> {
        self.world = Self::build_world(&self.doc.snapshots[0], &self.gamedata, &self.config)?;
        self.cursor = 0;
        Ok(())
    }

    /// Apply the record under the cursor and advance.
    ///
    /// Past the final record this loops back to the start (rebuilding the
    /// world from base); while paused it does nothing.
    pub fn step(&mut self, fx: &mut dyn FxSink) -> Result<(), ReplayError> {
        if self.paused {
            return Ok(());
        }
        if self.cursor >= self.doc.snapshots.len() {
            self.rewind()?;
        }
        self.apply_current(fx)?;
        self.cursor += 1;
        Ok(())
    }

    /// Jump back to the first snapshot and apply it immediately
    pub fn restart(&mut self, fx: &mut dyn FxSink) -> Result<(), ReplayError> {
        self.rewind()?;
        self.apply_current(fx)?;
        self.cursor += 1;
        Ok(())
    }

    fn apply_current(&mut self, fx: &mut dyn FxSink) -> Result<(), ReplayError> {
        let record = self.doc.snapshots[self.cursor].clone();
        self.world.combat.cur_tick = record.time;

        match &record.objects {
            ObjectsRecord::Full { objects } => self
                .world
                .objects
                .apply_full(objects, &self.gamedata)
                .map_err(|err| ReplayError::Malformed(err.to_string()))?,
            ObjectsRecord::Delta { delta } => self
                .world
                .objects
                .apply_delta(delta, &self.gamedata)
                .map_err(|err| ReplayError::Malformed(err.to_string()))?,
        }

        if let Some(combat) = &record.combat_engine {
            for effect in &combat.effects_added {
                self.world.combat.queue_replayed_effect(effect.clone());
            }
            if self.world.combat.queue_len() != combat.queue_len {
                return Err(ReplayError::QueueLengthMismatch);
            }
            // item expenditures only exist as visual feedback on playback
            for item in &combat.items {
                fx.combat_event(CombatFxEvent::ItemUsed {
                    item: item.item.clone(),
                    target_pos: item.target_pos,
                });
            }
        }

        self.world.rebuild_accel();
        for effect in self.world.combat.take_due() {
            self.world.apply_damage_effect(&effect, fx);
        }
        Ok(())
    }
}
