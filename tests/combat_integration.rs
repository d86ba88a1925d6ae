//! End-to-end combat resolution through the full tick loop

use std::sync::Arc;

use rampart::combat::{DamageEffect, DeathMethod, EffectKind, EffectSource, Falloff};
use rampart::core::types::{ObjectId, TeamId, TickCount, Vec2};
use rampart::core::EngineConfig;
use rampart::data::{GameData, ObjectKind, ObjectSpec, VsTable};
use rampart::objects::GameObject;
use rampart::world::{BaseState, NullFx, NullObserver, World};

fn spec(name: &str, kind: ObjectKind, max_hp: i32) -> ObjectSpec {
    ObjectSpec {
        name: name.into(),
        kind,
        max_hp,
        hit_radius: 0.0,
        flying: false,
        invulnerable: false,
        immune_to_splash: false,
        defense_types: vec![],
        unit_collision_gridsize: None,
        collide_as_wall: false,
    }
}

fn battle_world(seed: u64) -> World {
    let data = GameData::from_specs([
        spec("grunt", ObjectKind::Mobile, 100),
        spec("tower", ObjectKind::Building, 300),
    ]);
    World::new(
        BaseState { map_size: [128, 128], seed },
        Arc::new(data),
        EngineConfig::default(),
    )
    .unwrap()
}

fn spawn(world: &mut World, id: i32, name: &str, team: &str, x: f32, y: f32) {
    let spec = world.gamedata().spec(name).unwrap();
    world
        .objects
        .add_object(GameObject::new(
            ObjectId(id),
            spec,
            Some(TeamId::new(team)),
            Vec2::new(x, y),
        ))
        .unwrap();
}

fn run_ticks(world: &mut World, n: usize) {
    let mut obs = NullObserver;
    let mut fx = NullFx;
    for _ in 0..n {
        world.run_tick(&mut obs, &mut fx);
    }
}

#[test]
fn test_linear_area_damage_halves_at_half_radius() {
    let mut world = battle_world(1);
    spawn(&mut world, 1, "grunt", "red", 55.0, 50.0); // distance 5 from center
    world.combat.queue_damage_effect(DamageEffect::new(
        TickCount(0),
        EffectSource::default(),
        EffectKind::AreaDamage {
            target_location: [50.0, 50.0],
            hit_ground: true,
            hit_air: true,
            radius: 10.0,
            falloff: Falloff::Linear,
            amount: 100.0,
            vs_table: VsTable::default(),
            allow_ff: true,
        },
    ));
    run_ticks(&mut world, 1);
    assert_eq!(world.objects.get(ObjectId(1)).unwrap().hp, 50);
}

#[test]
fn test_constant_area_damage_ignores_distance() {
    let mut world = battle_world(1);
    spawn(&mut world, 1, "grunt", "red", 55.0, 50.0);
    spawn(&mut world, 2, "grunt", "red", 51.0, 50.0);
    world.combat.queue_damage_effect(DamageEffect::new(
        TickCount(0),
        EffectSource::default(),
        EffectKind::AreaDamage {
            target_location: [50.0, 50.0],
            hit_ground: true,
            hit_air: true,
            radius: 10.0,
            falloff: Falloff::Constant,
            amount: 80.0,
            vs_table: VsTable::default(),
            allow_ff: true,
        },
    ));
    run_ticks(&mut world, 1);
    assert_eq!(world.objects.get(ObjectId(1)).unwrap().hp, 20);
    assert_eq!(world.objects.get(ObjectId(2)).unwrap().hp, 20);
}

#[test]
fn test_duplicate_kill_scheduling_fires_once() {
    let mut world = battle_world(1);
    spawn(&mut world, 1, "grunt", "red", 50.0, 50.0);
    let kill = |tick| {
        DamageEffect::new(
            TickCount(tick),
            EffectSource::default(),
            EffectKind::Kill { target_id: ObjectId(1), death_method: DeathMethod::Hostile },
        )
    };
    // the same target scheduled for destruction twice
    world.combat.queue_damage_effect(kill(0));
    world.combat.queue_damage_effect(kill(1));

    run_ticks(&mut world, 2);
    assert!(world.objects.get(ObjectId(1)).is_none());
    assert!(!world.combat.has_queued_effects());
}

#[test]
fn test_future_effects_wait_for_their_tick() {
    let mut world = battle_world(1);
    spawn(&mut world, 1, "tower", "red", 50.0, 50.0);
    world.combat.queue_damage_effect(DamageEffect::new(
        TickCount(3),
        EffectSource::default(),
        EffectKind::TargetedDamage {
            target_id: ObjectId(1),
            amount: 120.0,
            vs_table: VsTable::default(),
        },
    ));

    run_ticks(&mut world, 3);
    assert_eq!(world.objects.get(ObjectId(1)).unwrap().hp, 300);
    run_ticks(&mut world, 1);
    assert_eq!(world.objects.get(ObjectId(1)).unwrap().hp, 180);
}

#[test]
fn test_identical_seeds_yield_identical_battles() {
    let run = |seed: u64| {
        let mut world = battle_world(seed);
        for i in 0..20 {
            let team = if i % 2 == 0 { "red" } else { "blue" };
            spawn(&mut world, i, "grunt", team, 30.0 + i as f32 * 3.0, 60.0);
        }
        for tick in 0..5u64 {
            world.combat.queue_damage_effect(DamageEffect::new(
                TickCount(tick),
                EffectSource { source_id: None, source_team: Some(TeamId::new("red")) },
                EffectKind::AreaDamage {
                    target_location: [45.0 + tick as f32, 60.0],
                    hit_ground: true,
                    hit_air: true,
                    radius: 12.0,
                    falloff: Falloff::Linear,
                    amount: 35.0,
                    vs_table: VsTable::default(),
                    allow_ff: false,
                },
            ));
        }
        run_ticks(&mut world, 8);
        serde_json::to_string(&world.serialize()).unwrap()
    };
    assert_eq!(run(77), run(77));
    assert_eq!(run(99), run(99));
}

#[test]
fn test_destroyed_targets_are_skipped_by_splash() {
    let mut world = battle_world(1);
    spawn(&mut world, 1, "tower", "red", 50.0, 50.0);
    world.objects.get_mut(ObjectId(1)).unwrap().hp = 0; // pre-destroyed

    world.combat.queue_damage_effect(DamageEffect::new(
        TickCount(0),
        EffectSource::default(),
        EffectKind::AreaDamage {
            target_location: [50.0, 50.0],
            hit_ground: true,
            hit_air: true,
            radius: 10.0,
            falloff: Falloff::Constant,
            amount: 50.0,
            vs_table: VsTable::default(),
            allow_ff: true,
        },
    ));
    run_ticks(&mut world, 1);
    // hp does not go further negative and nothing panics
    assert_eq!(world.objects.get(ObjectId(1)).unwrap().hp, 0);
}

#[test]
fn test_air_only_effect_misses_ground_units() {
    let data = GameData::from_specs([
        spec("grunt", ObjectKind::Mobile, 100),
        ObjectSpec { flying: true, ..spec("gyro", ObjectKind::Mobile, 60) },
    ]);
    let mut world = World::new(
        BaseState { map_size: [128, 128], seed: 5 },
        Arc::new(data),
        EngineConfig::default(),
    )
    .unwrap();
    spawn(&mut world, 1, "grunt", "red", 50.0, 50.0);
    spawn(&mut world, 2, "gyro", "red", 52.0, 50.0);

    world.combat.queue_damage_effect(DamageEffect::new(
        TickCount(0),
        EffectSource::default(),
        EffectKind::AreaDamage {
            target_location: [51.0, 50.0],
            hit_ground: false,
            hit_air: true,
            radius: 10.0,
            falloff: Falloff::Constant,
            amount: 30.0,
            vs_table: VsTable::default(),
            allow_ff: true,
        },
    ));
    run_ticks(&mut world, 1);
    assert_eq!(world.objects.get(ObjectId(1)).unwrap().hp, 100);
    assert_eq!(world.objects.get(ObjectId(2)).unwrap().hp, 30);
}
