//! Authoritative object-id to object mapping

use std::collections::BTreeMap;

use ahash::AHashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};
use crate::core::types::ObjectId;
use crate::data::GameData;
use crate::objects::object::{GameObject, ObjectState};

/// Changes to an [`ObjectCollection`] relative to an explicit baseline
/// snapshot.
///
/// Produced by [`ObjectCollection::diff_against`]; the baseline is always an
/// argument, never hidden recorder state, so out-of-order callers cannot
/// corrupt the stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectsDelta {
    /// New or modified objects, full state each
    pub changed: BTreeMap<ObjectId, ObjectState>,
    /// Objects present in the baseline but no longer held
    pub removed: Vec<ObjectId>,
}

impl ObjectsDelta {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Owns the live objects of a simulation.
///
/// Objects arrive with their id already set (assigned upstream); the
/// collection never allocates ids. Removal stamps the removed instance's id
/// with the dead sentinel so any other holder can detect invalidity, and
/// lookups of the sentinel never match a live entry.
#[derive(Debug, Default)]
pub struct ObjectCollection {
    objects: AHashMap<ObjectId, GameObject>,
}

impl ObjectCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object. Double-add of a live id is a contract violation.
    pub fn add_object(&mut self, obj: GameObject) -> Result<()> {
        if obj.id.is_dead() {
            return Err(EngineError::DeadObjectId);
        }
        if self.objects.contains_key(&obj.id) {
            return Err(EngineError::DuplicateObject(obj.id));
        }
        self.objects.insert(obj.id, obj);
        Ok(())
    }

    /// Remove an object, stamping it with the dead sentinel.
    ///
    /// Removing an id that is not present (including an already-removed
    /// one) is a silent no-op.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<GameObject> {
        let mut obj = self.objects.remove(&id)?;
        obj.id = ObjectId::DEAD;
        Some(obj)
    }

    /// Bulk-invalidate every object, e.g. when restarting a replay
    pub fn clear(&mut self) {
        for obj in self.objects.values_mut() {
            obj.id = ObjectId::DEAD;
        }
        self.objects.clear();
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        if id.is_dead() {
            return None;
        }
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        if id.is_dead() {
            return None;
        }
        self.objects.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        !id.is_dead() && self.objects.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut GameObject> {
        self.objects.values_mut()
    }

    /// Ids of all live objects, in ascending order.
    ///
    /// Sorted so downstream consumers (shuffles, snapshots) see a
    /// reproducible order regardless of hash-map iteration.
    pub fn sorted_ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self.objects.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Full serialization of every live object
    pub fn serialize(&self) -> BTreeMap<ObjectId, ObjectState> {
        self.objects.iter().map(|(id, obj)| (*id, obj.state())).collect()
    }

    /// Diff current membership against an explicit baseline snapshot
    pub fn diff_against(&self, baseline: &BTreeMap<ObjectId, ObjectState>) -> ObjectsDelta {
        let mut delta = ObjectsDelta::default();
        for (id, obj) in &self.objects {
            let state = obj.state();
            if baseline.get(id) != Some(&state) {
                delta.changed.insert(*id, state);
            }
        }
        for id in baseline.keys() {
            if !self.objects.contains_key(id) {
                delta.removed.push(*id);
            }
        }
        delta.removed.sort();
        delta
    }

    /// Reconcile membership against a full target snapshot.
    ///
    /// Existing objects are mutated in place (preserving identity for any
    /// external id holders), missing ones are reconstructed, and objects
    /// absent from the snapshot are dropped.
    pub fn apply_full(
        &mut self,
        target: &BTreeMap<ObjectId, ObjectState>,
        gamedata: &GameData,
    ) -> Result<()> {
        let stale: Vec<ObjectId> = self
            .objects
            .keys()
            .filter(|id| !target.contains_key(id))
            .copied()
            .collect();
        for id in stale {
            self.remove_object(id);
        }
        for (id, state) in target {
            match self.objects.get_mut(id) {
                Some(obj) => obj.apply_state(state),
                None => {
                    self.objects.insert(*id, GameObject::from_state(state, gamedata)?);
                }
            }
        }
        Ok(())
    }

    /// Apply an incremental delta produced by [`diff_against`]
    ///
    /// [`diff_against`]: ObjectCollection::diff_against
    pub fn apply_delta(&mut self, delta: &ObjectsDelta, gamedata: &GameData) -> Result<()> {
        for (id, state) in &delta.changed {
            match self.objects.get_mut(id) {
                Some(obj) => obj.apply_state(state),
                None => {
                    self.objects.insert(*id, GameObject::from_state(state, gamedata)?);
                }
            }
        }
        for id in &delta.removed {
            self.remove_object(*id);
        }
        Ok(())
    }

    /// Uniformly shuffled ids of objects passing the filter.
    ///
    /// Single-pass Fisher-Yates insertion shuffle over the id-ordered
    /// object list, O(n).
    pub fn random_permutation<R, F>(&self, rng: &mut R, mut filter: F) -> Vec<ObjectId>
    where
        R: Rng,
        F: FnMut(&GameObject) -> bool,
    {
        let mut out: Vec<ObjectId> = Vec::with_capacity(self.objects.len());
        for id in self.sorted_ids() {
            if !filter(&self.objects[&id]) {
                continue;
            }
            let j = rng.gen_range(0..=out.len());
            if j == out.len() {
                out.push(id);
            } else {
                let displaced = out[j];
                out[j] = id;
                out.push(displaced);
            }
        }
        out
    }
}
