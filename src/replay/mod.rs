//! Battle replay capture and playback
//!
//! A replay is a versioned JSON document of per-tick snapshot records. The
//! first record carries the full world (base facts plus every object); later
//! records carry baseline diffs plus the combat effects queued that tick.
//! Playback reconstructs a world from the base record and re-runs the
//! recorded effect stream through the normal resolution path, so a replay is
//! bit-for-bit the same simulation, not an approximation of one.

pub mod player;
pub mod recorder;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::combat::CombatDelta;
use crate::core::types::{ObjectId, TickCount};
use crate::objects::{ObjectState, ObjectsDelta};
use crate::world::BaseState;

pub use player::ReplayPlayer;
pub use recorder::ReplayRecorder;

/// Current replay wire format version. Documents recorded under any other
/// version are rejected whole.
pub const REPLAY_VERSION: u32 = 4;

/// Object content of one snapshot record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectsRecord {
    /// Complete object map; always the first record, legal anywhere
    Full { objects: BTreeMap<ObjectId, ObjectState> },
    /// Diff against the previous record's state
    Delta {
        #[serde(flatten)]
        delta: ObjectsDelta,
    },
}

/// One tick's worth of recorded state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub time: TickCount,
    pub objects: ObjectsRecord,
    /// Present only on the first record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<BaseState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combat_engine: Option<CombatDelta>,
}

/// The full recorded document, as packed for upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayDocument {
    pub version: u32,
    pub snapshots: Vec<SnapshotRecord>,
}

/// Replay integrity failures. Any of these rejects the whole document;
/// a partially-believable replay is worse than none.
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("replay version {found} not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("replay contains no snapshots")]
    Empty,

    #[error("first snapshot is missing the base state")]
    MissingBase,

    #[error("malformed replay: {0}")]
    Malformed(String),

    #[error("combat queue length diverged from the recording")]
    QueueLengthMismatch,

    #[error("replay JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_kind_tags() {
        let rec = SnapshotRecord {
            time: TickCount(0),
            objects: ObjectsRecord::Delta { delta: ObjectsDelta::default() },
            base: None,
            combat_engine: None,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["objects"]["kind"], "delta");
        assert!(json.get("base").is_none());

        let back: SnapshotRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, rec);
    }
}

