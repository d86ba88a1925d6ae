//! World aggregate: the full simulation state and the tick loop
//!
//! A [`World`] owns every piece of simulation state explicitly: the object
//! collection, the combat scheduler, both spatial indices, the optional wall
//! manager, the game-data tables, and its own seeded RNG. Nothing lives in
//! ambient globals; two worlds in one process never interfere.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::combat::{
    CombatEngine, CombatSnapshot, DamageEffect, DeathMethod, EffectKind, EffectSource, Falloff,
};
use crate::core::error::Result;
use crate::core::types::{Coeff, ObjectId, Pos, TeamId, TickCount, Vec2};
use crate::core::EngineConfig;
use crate::data::{GameData, VsTable};
use crate::objects::{Aura, ObjectCollection, ObjectState};
use crate::spatial::{TeamIndex, VoxelGrid};
use crate::walls::WallManager;

/// Static facts about a session, fixed at world construction.
///
/// Recorded verbatim into replays so playback can reconstruct an identical
/// world, RNG stream included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseState {
    /// Map dimensions in grid cells
    pub map_size: [u32; 2],
    /// Seed for the world's RNG stream
    pub seed: u64,
}

/// Filters for distance queries
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pub only_team: Option<TeamId>,
    /// Usually the querying object itself
    pub ignore_object: Option<ObjectId>,
    pub exclude_invul: bool,
    pub exclude_flying: bool,
    pub flying_only: bool,
    pub mobile_only: bool,
    /// Return only the single closest match
    pub nearest_only: bool,
}

/// One match from a distance query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub id: ObjectId,
    /// Distance from the query point to the object's hit circle edge,
    /// never negative
    pub dist: f32,
    pub pos: Vec2,
}

/// Visual feedback emitted as a side effect of combat resolution
#[derive(Debug, Clone, PartialEq)]
pub enum CombatFxEvent {
    Hurt { id: ObjectId, pos: Vec2, amount: i32 },
    Destroyed { id: ObjectId, pos: Vec2 },
    ItemUsed { item: serde_json::Value, target_pos: Option<[Pos; 2]> },
}

/// Rendering collaborator boundary.
///
/// Calls are fire-and-forget: the sink cannot fail and cannot abort effect
/// application.
pub trait FxSink {
    fn combat_event(&mut self, event: CombatFxEvent);
}

/// Sink that discards all feedback, for headless simulation
#[derive(Debug, Default)]
pub struct NullFx;

impl FxSink for NullFx {
    fn combat_event(&mut self, _event: CombatFxEvent) {}
}

/// Tick lifecycle hooks, called by [`World::run_tick`] in a fixed order.
///
/// The replay recorder is the main implementor; all hooks default to no-ops
/// so observers implement only what they need.
pub trait TickObserver {
    /// Start of the tick, before any simulation work
    fn before_control(&mut self, _world: &mut World) {}
    /// After index rebuild and aura expiry, before due effects resolve
    fn before_damage_effects(&mut self, _world: &mut World) {}
    /// After due effects resolve, before the tick counter advances
    fn after_damage_effects(&mut self, _world: &mut World) {}
}

/// Observer that does nothing, for hosts running without a recorder
#[derive(Debug, Default)]
pub struct NullObserver;

impl TickObserver for NullObserver {}

/// Full serialized world state
#[derive(Debug, Serialize, Deserialize)]
pub struct WorldState {
    pub base: BaseState,
    pub objects: BTreeMap<ObjectId, ObjectState>,
    pub combat_engine: CombatSnapshot,
}

/// The complete simulation state for one session
#[derive(Debug)]
pub struct World {
    base: BaseState,
    pub objects: ObjectCollection,
    pub combat: CombatEngine,
    voxel: VoxelGrid,
    team_index: TeamIndex,
    wall_mgr: Option<WallManager>,
    gamedata: Arc<GameData>,
    config: EngineConfig,
    rng: ChaCha8Rng,
}

impl World {
    pub fn new(
        base: BaseState,
        gamedata: Arc<GameData>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let voxel = VoxelGrid::new(base.map_size, config.map_accel_chunk);
        let rng = ChaCha8Rng::seed_from_u64(base.seed);
        Ok(Self {
            base,
            objects: ObjectCollection::new(),
            combat: CombatEngine::new(),
            voxel,
            team_index: TeamIndex::new(),
            wall_mgr: None,
            gamedata,
            config,
            rng,
        })
    }

    pub fn base(&self) -> &BaseState {
        &self.base
    }

    pub fn gamedata(&self) -> &Arc<GameData> {
        &self.gamedata
    }

    pub fn tick(&self) -> TickCount {
        self.combat.cur_tick
    }

    /// Enable wall-neighbor resolution for barriers of the named spec
    pub fn init_wall_manager(&mut self, spec_name: &str) -> Result<()> {
        let spec = self.gamedata.spec(spec_name)?;
        self.wall_mgr = Some(WallManager::new(self.base.map_size, &spec)?);
        Ok(())
    }

    pub fn mark_walls_dirty(&mut self) {
        if let Some(mgr) = self.wall_mgr.as_mut() {
            mgr.mark_dirty();
        }
    }

    /// Rebuild both spatial indices from the live objects.
    ///
    /// Insertion order follows a seeded random permutation, so bucket-level
    /// tie-breaking is fair across ticks yet fully reproducible per seed.
    pub fn rebuild_accel(&mut self) {
        self.voxel.clear();
        self.team_index.clear();
        let order = self.objects.random_permutation(&mut self.rng, |_| true);
        for id in order {
            let Some(obj) = self.objects.get(id) else { continue };
            self.team_index.add_object(obj);
            if let Err(err) = self.voxel.add_object(obj) {
                // off-map objects simply miss the accelerated path
                tracing::warn!(id = %id, %err, "object not indexed");
            }
        }
    }

    /// All live, targetable objects whose hit circle comes within `dist` of
    /// `loc`, subject to `params`.
    ///
    /// Small radii go through the voxel grid; radii at or above the
    /// acceleration limit (or with acceleration disabled) scan the team
    /// index, where huge circles would touch most buckets anyway.
    pub fn query_objects_within_distance(
        &self,
        loc: Vec2,
        dist: f32,
        params: &QueryParams,
    ) -> Vec<QueryResult> {
        let mut results = Vec::new();
        let local = self.config.use_map_accel && dist < self.config.map_accel_limit;

        if local {
            let mut seen: ahash::AHashSet<ObjectId> = ahash::AHashSet::new();
            let bounds = self.voxel.circle_bounds_st(loc, dist);
            for t in bounds[1][0]..bounds[1][1] {
                for s in bounds[0][0]..bounds[0][1] {
                    let Some(ids) = self.voxel.objects_at_st((s, t), params.only_team.as_ref())
                    else {
                        continue;
                    };
                    for &id in ids {
                        // radius objects appear in several buckets
                        if seen.insert(id) {
                            self.consider(id, loc, dist, params, &mut results);
                        }
                    }
                }
            }
        } else if let Some(ids) = self.team_index.objects_on_team(params.only_team.as_ref()) {
            for &id in ids {
                self.consider(id, loc, dist, params, &mut results);
            }
        }

        if params.nearest_only && results.len() > 1 {
            let mut nearest = results[0].clone();
            for r in &results[1..] {
                if r.dist < nearest.dist {
                    nearest = r.clone();
                }
            }
            return vec![nearest];
        }
        results
    }

    fn consider(
        &self,
        id: ObjectId,
        loc: Vec2,
        dist: f32,
        params: &QueryParams,
        out: &mut Vec<QueryResult>,
    ) {
        let Some(obj) = self.objects.get(id) else { return };
        if params.ignore_object == Some(id)
            || obj.is_inert()
            || obj.is_destroyed()
            || (params.exclude_invul && obj.is_invul())
            || (params.exclude_flying && obj.is_flying())
            || (params.flying_only && !obj.is_flying())
            || (params.mobile_only && !obj.is_mobile())
        {
            return;
        }
        if let Some(team) = &params.only_team {
            if obj.team.as_ref() != Some(team) {
                return;
            }
        }
        let d = (loc.distance(&obj.pos) - obj.hit_radius()).max(0.0);
        if d < dist {
            out.push(QueryResult { id, dist: d, pos: obj.pos });
        }
    }

    /// Apply damage to one object and handle destruction consequences.
    ///
    /// Mobiles are removed from the world outright; buildings stay at zero
    /// hp. Destroying a wall-colliding barrier dirties the wall manager.
    pub fn hurt_object(
        &mut self,
        target: ObjectId,
        amount: Coeff,
        vs_table: &VsTable,
        _source: &EffectSource,
        death_method: DeathMethod,
        fx: &mut dyn FxSink,
    ) {
        let Some(obj) = self.objects.get_mut(target) else { return };
        if obj.is_destroyed() || obj.is_invul() || obj.is_inert() {
            return;
        }
        let dmg = (amount * vs_table.modifier(&obj.spec)).round() as i32;
        if dmg == 0 {
            return;
        }
        obj.hp = (obj.hp - dmg).clamp(0, obj.spec.max_hp);
        let pos = obj.pos;
        let destroyed = obj.is_destroyed();
        let mobile = obj.is_mobile();
        let was_wall = obj.spec.collide_as_wall;
        fx.combat_event(CombatFxEvent::Hurt { id: target, pos, amount: dmg });

        if destroyed {
            if death_method == DeathMethod::Hostile {
                fx.combat_event(CombatFxEvent::Destroyed { id: target, pos });
            }
            if mobile {
                self.objects.remove_object(target);
            }
            if was_wall {
                self.mark_walls_dirty();
            }
        }
    }

    /// Resolve one due effect against the live world.
    ///
    /// Never fails: missing or already-dead targets are expected conditions
    /// (a kill can race object removal) and resolve as silent no-ops.
    pub fn apply_damage_effect(&mut self, effect: &DamageEffect, fx: &mut dyn FxSink) {
        match &effect.kind {
            EffectKind::Kill { target_id, death_method } => {
                self.apply_kill(*target_id, *death_method, fx);
            }
            EffectKind::TargetedDamage { target_id, amount, vs_table } => {
                self.hurt_object(
                    *target_id,
                    *amount,
                    vs_table,
                    &effect.source,
                    DeathMethod::Hostile,
                    fx,
                );
            }
            EffectKind::TargetedAura { target_id, amount, aura, vs_table, duration_vs_table } => {
                let now = self.combat.cur_tick;
                let Some(obj) = self.objects.get_mut(*target_id) else { return };
                if obj.is_destroyed() || obj.is_inert() {
                    return;
                }
                let duration = aura.aura_duration.scale(duration_vs_table.modifier(&obj.spec));
                if !duration.is_nonzero() {
                    return;
                }
                let strength = amount * vs_table.modifier(&obj.spec);
                obj.create_aura(Aura {
                    name: aura.aura_name.clone(),
                    amount: strength,
                    ends: TickCount(now.get() + duration.get()),
                    range: aura.aura_range,
                    source_id: effect.source.source_id,
                    source_team: effect.source.source_team.clone(),
                });
            }
            EffectKind::AreaDamage {
                target_location,
                hit_ground,
                hit_air,
                radius,
                falloff,
                amount,
                vs_table,
                allow_ff,
            } => {
                let center = Vec2::new(target_location[0], target_location[1]);
                let targets = self.area_targets(center, *radius, None, *hit_ground, *hit_air);
                for hit in targets {
                    if !self.splash_applies(hit.id, &effect.source, *allow_ff) {
                        continue;
                    }
                    let magnitude = falloff.magnitude(hit.dist, *radius);
                    let delivered = amount * magnitude;
                    if delivered != 0.0 {
                        self.hurt_object(
                            hit.id,
                            delivered,
                            vs_table,
                            &effect.source,
                            DeathMethod::Hostile,
                            fx,
                        );
                    }
                }
            }
            EffectKind::AreaAura {
                target_location,
                hit_ground,
                hit_air,
                radius,
                radius_rect,
                falloff,
                amount,
                aura,
                vs_table,
                duration_vs_table,
                allow_ff,
            } => {
                let center = Vec2::new(target_location[0], target_location[1]);
                let targets =
                    self.area_targets(center, *radius, *radius_rect, *hit_ground, *hit_air);
                let now = self.combat.cur_tick;
                for hit in targets {
                    if !self.splash_applies(hit.id, &effect.source, *allow_ff) {
                        continue;
                    }
                    // rectangular coverage has no radial falloff geometry;
                    // anything but constant degrades to the unknown path
                    let magnitude = match (radius_rect, falloff) {
                        (Some(_), Falloff::Constant) => 1.0,
                        (Some(_), _) => Falloff::Unknown.magnitude(hit.dist, *radius),
                        (None, f) => f.magnitude(hit.dist, *radius),
                    };
                    let strength = amount * magnitude;
                    if strength == 0.0 {
                        continue;
                    }
                    let Some(obj) = self.objects.get_mut(hit.id) else { continue };
                    let duration =
                        aura.aura_duration.scale(duration_vs_table.modifier(&obj.spec));
                    if !duration.is_nonzero() {
                        continue;
                    }
                    obj.create_aura(Aura {
                        name: aura.aura_name.clone(),
                        amount: strength * vs_table.modifier(&obj.spec),
                        ends: TickCount(now.get() + duration.get()),
                        range: aura.aura_range,
                        source_id: effect.source.source_id,
                        source_team: effect.source.source_team.clone(),
                    });
                }
            }
        }
    }

    fn apply_kill(&mut self, target: ObjectId, death_method: DeathMethod, fx: &mut dyn FxSink) {
        // dead sentinel or already-removed id: at-most-once guarantee
        let Some(obj) = self.objects.get(target) else { return };
        if obj.is_inert() {
            return;
        }
        let pos = obj.pos;
        let mobile = obj.is_mobile();
        let was_wall = obj.spec.collide_as_wall;
        let already_destroyed = obj.is_destroyed();

        if mobile {
            if death_method == DeathMethod::Hostile {
                fx.combat_event(CombatFxEvent::Destroyed { id: target, pos });
            }
            self.objects.remove_object(target);
        } else if !already_destroyed {
            if let Some(obj) = self.objects.get_mut(target) {
                obj.hp = 0;
            }
            fx.combat_event(CombatFxEvent::Destroyed { id: target, pos });
            if was_wall {
                self.mark_walls_dirty();
            }
        }
    }

    /// Qualifying objects for an area effect: circle query plus optional
    /// per-axis rectangular containment
    fn area_targets(
        &self,
        center: Vec2,
        radius: f32,
        radius_rect: Option<[Pos; 2]>,
        hit_ground: bool,
        hit_air: bool,
    ) -> Vec<QueryResult> {
        if !hit_ground && !hit_air {
            return Vec::new();
        }
        let params = QueryParams {
            exclude_invul: true,
            exclude_flying: !hit_air,
            flying_only: !hit_ground,
            ..Default::default()
        };
        let (query_radius, rect) = match radius_rect {
            // circle circumscribing the rectangle, exact filter below
            Some([w, h]) => ((w * w + h * h).sqrt() * 0.5, Some([w * 0.5, h * 0.5])),
            None => (radius, None),
        };
        let mut hits = self.query_objects_within_distance(center, query_radius, &params);
        if let Some([half_w, half_h]) = rect {
            hits.retain(|r| {
                (r.pos.x - center.x).abs() <= half_w && (r.pos.y - center.y).abs() <= half_h
            });
        }
        hits
    }

    /// Splash eligibility: skip splash-immune objects and, without friendly
    /// fire, the source's own team
    fn splash_applies(&self, id: ObjectId, source: &EffectSource, allow_ff: bool) -> bool {
        let Some(obj) = self.objects.get(id) else { return false };
        if obj.spec.immune_to_splash {
            return false;
        }
        if !allow_ff {
            if let (Some(src_team), Some(team)) = (&source.source_team, &obj.team) {
                if src_team == team {
                    return false;
                }
            }
        }
        true
    }

    /// Advance the simulation by one tick.
    ///
    /// Fixed ordering: observer `before_control`, wall refresh, index
    /// rebuild over a seeded permutation, aura expiry, observer
    /// `before_damage_effects`, due-effect application, observer
    /// `after_damage_effects`, tick increment.
    pub fn run_tick(&mut self, observer: &mut dyn TickObserver, fx: &mut dyn FxSink) {
        observer.before_control(self);

        if let Some(mgr) = self.wall_mgr.as_mut() {
            mgr.refresh(&mut self.objects);
        }
        self.rebuild_accel();

        let now = self.combat.cur_tick;
        for obj in self.objects.iter_mut() {
            obj.expire_auras(now);
        }

        observer.before_damage_effects(self);
        for effect in self.combat.take_due() {
            self.apply_damage_effect(&effect, fx);
        }
        observer.after_damage_effects(self);

        self.combat.cur_tick = self.combat.cur_tick.next();
    }

    /// Full serialization of the world
    pub fn serialize(&self) -> WorldState {
        WorldState {
            base: self.base.clone(),
            objects: self.objects.serialize(),
            combat_engine: self.combat.serialize(),
        }
    }
}
