//! Flat team-keyed object index
//!
//! Used for map queries where spatial locality doesn't matter (e.g. "does
//! team X have anything left"), and as the fallback path for very large
//! query radii. Rebuilt each tick alongside the voxel grid.

use ahash::AHashMap;

use crate::core::types::{ObjectId, TeamId};
use crate::objects::GameObject;

#[derive(Debug, Default)]
pub struct TeamIndex {
    all: Vec<ObjectId>,
    by_team: AHashMap<TeamId, Vec<ObjectId>>,
}

impl TeamIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to blank state
    pub fn clear(&mut self) {
        self.all.clear();
        self.by_team.clear();
    }

    /// Add an object to the ALL list and its team's list
    pub fn add_object(&mut self, obj: &GameObject) {
        self.all.push(obj.id);
        if let Some(team) = &obj.team {
            self.by_team.entry(team.clone()).or_default().push(obj.id);
        }
    }

    /// Objects belonging to a team (`None` = ALL), or `None` if the team
    /// has no objects
    pub fn objects_on_team(&self, team: Option<&TeamId>) -> Option<&[ObjectId]> {
        match team {
            None => (!self.all.is_empty()).then_some(self.all.as_slice()),
            Some(t) => self.by_team.get(t).map(|v| v.as_slice()),
        }
    }

    /// Quick test whether the index holds any object of this team
    pub fn has_any_of_team(&self, team: &TeamId) -> bool {
        self.by_team.contains_key(team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec2;
    use crate::data::{ObjectKind, ObjectSpec};
    use std::sync::Arc;

    fn obj(id: i32, team: &str) -> GameObject {
        let spec = Arc::new(ObjectSpec {
            name: "unit".into(),
            kind: ObjectKind::Mobile,
            max_hp: 10,
            hit_radius: 0.0,
            flying: false,
            invulnerable: false,
            immune_to_splash: false,
            defense_types: vec![],
            unit_collision_gridsize: None,
            collide_as_wall: false,
        });
        GameObject::new(ObjectId(id), spec, Some(TeamId::new(team)), Vec2::default())
    }

    #[test]
    fn test_objects_grouped_by_team() {
        let mut index = TeamIndex::new();
        index.add_object(&obj(1, "red"));
        index.add_object(&obj(2, "red"));
        index.add_object(&obj(3, "blue"));

        let red = TeamId::new("red");
        let blue = TeamId::new("blue");
        assert_eq!(index.objects_on_team(Some(&red)).unwrap(), &[ObjectId(1), ObjectId(2)]);
        assert_eq!(index.objects_on_team(Some(&blue)).unwrap(), &[ObjectId(3)]);
        assert_eq!(index.objects_on_team(None).unwrap().len(), 3);
    }

    #[test]
    fn test_unknown_team_is_empty() {
        let mut index = TeamIndex::new();
        index.add_object(&obj(1, "red"));
        assert!(index.objects_on_team(Some(&TeamId::new("blue"))).is_none());
        assert!(!index.has_any_of_team(&TeamId::new("blue")));
        assert!(index.has_any_of_team(&TeamId::new("red")));
    }

    #[test]
    fn test_clear() {
        let mut index = TeamIndex::new();
        index.add_object(&obj(1, "red"));
        index.clear();
        assert!(index.objects_on_team(None).is_none());
    }
}
