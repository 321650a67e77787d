use chrono::{Duration, TimeZone, Utc};

use areacontrol::{
    config::RuleConfig,
    events::{MemorySink, ZoneEventKind},
    session::PlayerSession,
    Engine, PositionSample, Timestamp, World,
};

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

fn at(ms: i64) -> Timestamp {
    t0() + Duration::milliseconds(ms)
}

fn sample(lat: f64, lng: f64, ms: i64) -> PositionSample {
    PositionSample::new(lat, lng, 5.0, at(ms)).unwrap()
}

fn small_rules() -> RuleConfig {
    RuleConfig {
        discovery_radius: 1,
        ..RuleConfig::default()
    }
}

fn tick_range(engine: &mut Engine, world: &mut World, from_ms: i64, to_ms: i64) {
    let mut ms = from_ms;
    while ms <= to_ms {
        engine.tick(world, at(ms)).unwrap();
        ms += 500;
    }
}

#[test]
fn capture_reinforce_then_decay_to_neutral() {
    let rules = small_rules();
    let sink = MemorySink::new();
    let mut engine = Engine::standard(rules.clone()).with_sink(sink.clone()).build();
    let mut world = World::new(PlayerSession::new("player-1", "Runner"), &rules);

    assert_eq!(world.observe(sample(28.6139, 77.2090, 0)), 9);
    let home = world.current_zone().unwrap().id.clone();
    assert!(world.registry().iter().all(|zone| zone.is_neutral()));

    tick_range(&mut engine, &mut world, 0, 2_500);
    assert!(world.registry().get(&home).unwrap().is_neutral());
    assert!(world.session().capture_progress().unwrap() > 80.0);

    engine.tick(&mut world, at(3_000)).unwrap();
    let zone = world.registry().get(&home).unwrap();
    assert_eq!(zone.owner(), Some("player-1"));
    assert_eq!(zone.owner_name(), Some("Runner"));
    assert_eq!(zone.hp(), 100.0);
    assert_eq!(zone.captured_at(), Some(at(3_000)));
    assert_eq!(world.session().score(), 10);
    assert_eq!(world.session().zones_captured(), 1);

    tick_range(&mut engine, &mut world, 3_500, 7_000);
    assert_eq!(sink.count(ZoneEventKind::Reinforced), 2);
    assert_eq!(world.registry().get(&home).unwrap().last_reinforced(), at(7_000));

    // Walk a kilometre north and stay away for 50 minutes.
    world.observe(sample(28.6229, 77.2090, 7_500));
    engine.tick(&mut world, at(7_000 + 50 * 60_000)).unwrap();

    let zone = world.registry().get(&home).unwrap();
    assert!(zone.is_neutral());
    assert_eq!(zone.hp(), 0.0);
    assert_eq!(zone.owner_name(), None);
    assert_eq!(zone.captured_at(), None);
    assert_eq!(sink.count(ZoneEventKind::Neutralized), 1);
    assert_eq!(world.session().score(), 10);
}

#[test]
fn stepping_out_restarts_capture_from_zero() {
    let rules = small_rules();
    let mut engine = Engine::standard(rules.clone()).build();
    let mut world = World::new(PlayerSession::new("player-1", "Runner"), &rules);

    world.observe(sample(28.6139, 77.2090, 0));
    let home = world.current_zone().unwrap().id.clone();
    engine.tick(&mut world, at(0)).unwrap();
    engine.tick(&mut world, at(1_500)).unwrap();
    assert_eq!(world.session().capture_progress(), Some(50.0));

    // One tile east.
    world.observe(sample(28.6139, 77.2105, 2_000));
    engine.tick(&mut world, at(2_000)).unwrap();
    assert_ne!(world.current_zone().unwrap().id, home);
    assert_eq!(world.registry().get(&home).unwrap().capture_progress, 0.0);
    assert_eq!(world.session().capture_progress(), Some(0.0));

    world.observe(sample(28.6139, 77.2090, 2_500));
    engine.tick(&mut world, at(2_500)).unwrap();
    engine.tick(&mut world, at(4_000)).unwrap();
    assert_eq!(world.session().capture_progress(), Some(50.0));
    assert!(world.registry().get(&home).unwrap().is_neutral());

    let summary = engine.tick(&mut world, at(5_500)).unwrap();
    assert_eq!(summary.events.len(), 1);
    assert_eq!(summary.events[0].kind, ZoneEventKind::Captured);
    assert!(world.registry().get(&home).unwrap().is_owned_by("player-1"));
    assert_eq!(world.session().zones_captured(), 1);
}

#[test]
fn rival_zone_can_be_taken_while_it_still_has_hp() {
    let rules = small_rules();
    let mut engine = Engine::standard(rules.clone()).build();
    let mut world = World::new(PlayerSession::new("player-1", "Runner"), &rules);

    world.observe(sample(28.6139, 77.2090, 0));
    let home = world.current_zone().unwrap().id.clone();
    world
        .registry_mut()
        .get_mut(&home)
        .unwrap()
        .restore_ownership("rival", "Rival", 40.0, t0(), t0());

    tick_range(&mut engine, &mut world, 0, 3_000);
    let zone = world.registry().get(&home).unwrap();
    assert!(zone.is_owned_by("player-1"));
    assert_eq!(zone.hp(), 100.0);
}

#[test]
fn snapshot_serializes_for_collaborators() {
    let rules = small_rules();
    let mut engine = Engine::standard(rules.clone()).build();
    let mut world = World::new(PlayerSession::new("player-1", "Runner"), &rules);
    world.observe(sample(-33.8568, 151.2153, 0));
    tick_range(&mut engine, &mut world, 0, 3_000);

    let snapshot = world.snapshot();
    assert_eq!(snapshot.zones_discovered, 9);
    assert_eq!(snapshot.zones_owned, 1);
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["player"]["score"], 10);
    assert_eq!(json["player"]["zonesCaptured"], 1);
    assert_eq!(json["zonesDiscovered"], 9);
    assert_eq!(json["currentZone"], snapshot.current_zone.clone().unwrap().as_str());

    let zones = json["zones"].as_array().unwrap();
    assert_eq!(zones.len(), 9);
    let owned = zones.iter().find(|zone| zone["ownerName"] == "Runner").unwrap();
    assert_eq!(owned["captureProgress"], 100.0);
    assert_eq!(owned["capturedAt"], serde_json::to_value(at(3_000)).unwrap());
    assert_eq!(owned["coverRating"], "unknown");
    assert!(zones.iter().all(|zone| zone.get("last_reinforced").is_none()));
}

#[test]
fn stepping_out_between_ticks_still_restarts_capture() {
    let rules = small_rules();
    let mut engine = Engine::standard(rules.clone()).build();
    let mut world = World::new(PlayerSession::new("player-1", "Runner"), &rules);

    world.observe(sample(28.6139, 77.2090, 0));
    let home = world.current_zone().unwrap().id.clone();
    engine.tick(&mut world, at(0)).unwrap();
    engine.tick(&mut world, at(1_000)).unwrap();

    // Out and back again with no tick in between.
    world.observe(sample(28.6139, 77.2105, 1_500));
    world.observe(sample(28.6139, 77.2090, 2_000));

    engine.tick(&mut world, at(3_000)).unwrap();
    let zone = world.registry().get(&home).unwrap();
    assert!(zone.is_neutral());
    assert!((zone.capture_progress - 100.0 / 3.0).abs() < 1e-9);
    assert_eq!(world.session().score(), 0);

    engine.tick(&mut world, at(5_000)).unwrap();
    let zone = world.registry().get(&home).unwrap();
    assert!(zone.is_owned_by("player-1"));
    assert_eq!(zone.captured_at(), Some(at(5_000)));
}

#[test]
fn capture_timer_runs_from_entry_even_with_late_ticks() {
    let rules = small_rules();
    let mut engine = Engine::standard(rules.clone()).build();
    let mut world = World::new(PlayerSession::new("player-1", "Runner"), &rules);

    world.observe(sample(28.6139, 77.2090, 0));
    let home = world.current_zone().unwrap().id.clone();

    engine.tick(&mut world, at(400)).unwrap();
    engine.tick(&mut world, at(2_900)).unwrap();
    assert!(world.registry().get(&home).unwrap().is_neutral());

    let summary = engine.tick(&mut world, at(3_000)).unwrap();
    assert_eq!(summary.events.len(), 1);
    assert_eq!(summary.events[0].kind, ZoneEventKind::Captured);
    assert_eq!(world.registry().get(&home).unwrap().captured_at(), Some(at(3_000)));
}

#[test]
fn stepping_out_between_ticks_resets_reinforcement() {
    let rules = small_rules();
    let sink = MemorySink::new();
    let mut engine = Engine::standard(rules.clone()).with_sink(sink.clone()).build();
    let mut world = World::new(PlayerSession::new("player-1", "Runner"), &rules);

    world.observe(sample(28.6139, 77.2090, 0));
    tick_range(&mut engine, &mut world, 0, 3_000);
    assert_eq!(world.session().zones_captured(), 1);

    world.observe(sample(28.6139, 77.2105, 4_000));
    world.observe(sample(28.6139, 77.2090, 4_500));
    engine.tick(&mut world, at(5_000)).unwrap();
    assert_eq!(sink.count(ZoneEventKind::Reinforced), 0);

    engine.tick(&mut world, at(6_500)).unwrap();
    assert_eq!(sink.count(ZoneEventKind::Reinforced), 1);
}
