//! Replay capture
//!
//! The recorder rides the tick loop as a [`TickObserver`]. Each tick it
//! opens a record at `before_control` (object state relative to its own
//! explicit baseline), fills in the combat delta at `before_damage_effects`
//! (so the record holds effects as queued, before any are consumed), and
//! commits the record at `after_damage_effects`. A tick that aborts between
//! hooks leaves no half-written record behind.

use std::collections::BTreeMap;

use crate::combat::CombatMarks;
use crate::core::types::ObjectId;
use crate::objects::ObjectState;
use crate::replay::{ObjectsRecord, ReplayDocument, ReplayError, SnapshotRecord, REPLAY_VERSION};
use crate::world::{TickObserver, World};

/// Records a battle into a [`ReplayDocument`] while the simulation runs
#[derive(Debug, Default)]
pub struct ReplayRecorder {
    snapshots: Vec<SnapshotRecord>,
    /// State the next diff is taken against
    baseline: BTreeMap<ObjectId, ObjectState>,
    marks: CombatMarks,
    pending: Option<SnapshotRecord>,
    started: bool,
}

impl ReplayRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Consume the recorder and produce the finished document
    pub fn into_document(self) -> ReplayDocument {
        ReplayDocument { version: REPLAY_VERSION, snapshots: self.snapshots }
    }

    /// Serialize the recording for upload
    pub fn pack_for_upload(&self) -> Result<String, ReplayError> {
        let doc = ReplayDocument {
            version: REPLAY_VERSION,
            snapshots: self.snapshots.clone(),
        };
        Ok(serde_json::to_string(&doc)?)
    }
}

impl TickObserver for ReplayRecorder {
    fn before_control(&mut self, world: &mut World) {
        let current = world.objects.serialize();
        let objects = if !self.started {
            ObjectsRecord::Full { objects: current.clone() }
        } else {
            ObjectsRecord::Delta { delta: world.objects.diff_against(&self.baseline) }
        };
        self.pending = Some(SnapshotRecord {
            time: world.tick(),
            objects,
            base: if self.started { None } else { Some(world.base().clone()) },
            combat_engine: None,
        });
        self.baseline = current;
        self.started = true;
    }

    fn before_damage_effects(&mut self, world: &mut World) {
        let delta = world.combat.delta_since(&self.marks);
        self.marks = world.combat.marks();
        world.combat.compact(&self.marks);
        if let Some(pending) = self.pending.as_mut() {
            if !delta.is_empty() {
                pending.combat_engine = Some(delta);
            }
        }
    }

    fn after_damage_effects(&mut self, _world: &mut World) {
        if let Some(record) = self.pending.take() {
            self.snapshots.push(record);
        }
    }
}
