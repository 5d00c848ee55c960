//! End-to-end farm scenarios through the public API.

use proptest::prelude::*;
use std::time::Duration;

use verdant_common::{ItemId, SpeciesId, TileCoord, Timestamp};
use verdant_gameplay::prelude::*;

const PLOT: TileCoord = TileCoord::new(3, 1);

fn at(secs: u64) -> Timestamp {
    Timestamp::from_millis(secs * 1000)
}

fn fill_water(session: &mut FarmSession, coord: TileCoord, now: Timestamp) {
    while session.water(coord, now) {}
}

/// Tick once per second, topping up water after every tick, until the plot is
/// ready. Returns the second it became ready.
fn grow_until_ready(session: &mut FarmSession, coord: TileCoord, from: u64, limit: u64) -> u64 {
    let mut now = from;
    while !session.grid().cell(coord).is_ready() {
        now += 1;
        assert!(now - from <= limit, "plot {coord} not ready after {limit}s");
        session.tick(at(now));
        fill_water(session, coord, at(now));
    }
    now
}

#[test]
fn test_wheat_scenario() {
    let mut session = FarmSession::new_game(SessionSettings::default(), at(0));
    let wheat = session.catalog().lookup("wheat").expect("wheat").clone();
    assert!((wheat.base_yield - 45.0).abs() < f32::EPSILON);
    assert!((wheat.special_bonus - 1.1).abs() < f32::EPSILON);
    assert_eq!(wheat.optimal_seasons, vec![Season::Spring, Season::Summer]);

    session.plant(PLOT, "wheat", at(0)).expect("plant");
    fill_water(&mut session, PLOT, at(0));

    let ready_at = grow_until_ready(&mut session, PLOT, 0, 60);
    let four_stages = wheat.total_growth_time();
    assert!(Duration::from_secs(ready_at) <= four_stages);
    assert!(Duration::from_secs(ready_at) >= four_stages.mul_f32(1.0 / 1.2));

    let plant = session.grid().plant_at(PLOT).expect("plant");
    let expected = 45.0 * 1.2 * plant.water_ratio() * (plant.health() / 100.0) * 1.1;

    let harvest = session.harvest(PLOT).expect("harvest");
    assert!((harvest.raw_yield - expected).abs() < 1e-3);
    assert_eq!(harvest.amount, 59);
    assert!(harvest.consumed);
    assert_eq!(session.inventory().count(&ItemId::new("wheat")), 59);
    assert!(session.grid().cell(PLOT).is_empty());
}

#[test]
fn test_multi_harvest_cycles_then_empties() {
    let mut session = FarmSession::new_game(SessionSettings::default(), at(0));
    let tomato = session.catalog().lookup("tomato").expect("tomato").clone();
    assert!(tomato.multi_harvest);

    session.plant(PLOT, "tomato", at(0)).expect("plant");
    fill_water(&mut session, PLOT, at(0));

    let mut now = grow_until_ready(&mut session, PLOT, 0, 120);
    for cycle in 1..=tomato.max_harvest_cycles {
        let harvest = session.harvest(PLOT).expect("harvest");
        assert!(!harvest.consumed);
        assert_eq!(harvest.harvest_count, cycle);

        let info = session.crop_render_info(PLOT).expect("still planted");
        assert_eq!(info.stage, TERMINAL_STAGE - 1);
        assert!(!info.is_ready);

        now = grow_until_ready(&mut session, PLOT, now, 60);
    }

    let last = session.harvest(PLOT).expect("final harvest");
    assert!(last.consumed);
    assert!(session.grid().cell(PLOT).is_empty());
    assert_eq!(session.stats().crops_harvested, u64::from(tomato.max_harvest_cycles) + 1);
}

#[test]
fn test_save_resume_and_harvest() {
    let mut session = FarmSession::new_game(SessionSettings::default(), at(0));
    session.plant(PLOT, "potato", at(0)).expect("plant");
    session.plant(TileCoord::new(0, 0), "carrot", at(0)).expect("plant");
    fill_water(&mut session, PLOT, at(0));
    for second in 1..=12 {
        session.tick(at(second));
        fill_water(&mut session, PLOT, at(second));
    }

    let json = session.snapshot(at(12)).to_json().expect("json");
    let before = session.grid().plant_at(PLOT).expect("plant").clone();

    // Reload an hour later: nothing grew or dried out in between.
    let snapshot = SaveSnapshot::from_json(&json).expect("parse");
    let later = 12 + 3600;
    let mut resumed = FarmSession::restore_or_new(Some(&snapshot), SessionSettings::default(), at(later));

    let after = resumed.grid().plant_at(PLOT).expect("plant");
    assert_eq!(after.growth_stage(), before.growth_stage());
    assert_eq!(after.water_level(), before.water_level());
    assert_eq!(after.growth_progress(), before.growth_progress());
    assert_eq!(resumed.grid().planted_count(), 2);
    assert_eq!(
        resumed.inventory().count(&SpeciesId::new("potato").seed_item()),
        9
    );

    let report = resumed.tick(at(later + 1));
    assert_eq!(report.evaporated(), 0);

    grow_until_ready(&mut resumed, PLOT, later + 1, 120);
    let harvest = resumed.harvest(PLOT).expect("harvest");
    assert!(harvest.amount >= 1);
    assert_eq!(resumed.stats().crops_planted, 2);
}

#[test]
fn test_corrupt_entries_do_not_abort_load() {
    let json = r#"{
        "saveName": "patchy",
        "saveDate": "2026-10-19 12:00:00",
        "gameVersion": "0.1.0",
        "formatVersion": "1.1.0",
        "savedAtEpochMillis": 1000,
        "farmPlots": {
            "bad-key": { "cropId": "wheat", "growthStage": 2, "waterLevel": 1,
                         "plantedAtEpochMillis": 0, "isReadyToHarvest": false },
            "(1, 1)": { "cropId": null, "growthStage": 4, "waterLevel": 3,
                        "plantedAtEpochMillis": 0, "isReadyToHarvest": true },
            "(2, 2)": { "cropId": "corn", "growthStage": 4, "waterLevel": 2,
                        "plantedAtEpochMillis": 0, "isReadyToHarvest": true },
            "(5, 5)": { "cropId": "moonflower", "growthStage": 1, "waterLevel": 1,
                        "plantedAtEpochMillis": 0, "isReadyToHarvest": false }
        }
    }"#;

    let snapshot = SaveSnapshot::from_json(json).expect("parse");
    let mut session = FarmSession::new_game(SessionSettings::default(), at(10));
    let warnings = session.restore(&snapshot, at(10)).expect("restore");

    assert_eq!(warnings.len(), 2);
    assert_eq!(session.grid().planted_count(), 1);
    assert!(session.grid().cell(TileCoord::new(1, 1)).is_empty());
    assert!(session.grid().cell(TileCoord::new(5, 5)).is_empty());

    let corn = session.harvest(TileCoord::new(2, 2)).expect("corn is ready");
    assert!(corn.consumed);
    assert_eq!(session.save_name(), "patchy");
}

#[test]
fn test_wrongly_typed_cell_does_not_abort_load() {
    let json = r#"{
        "saveName": "typed",
        "formatVersion": "1.1.0",
        "savedAtEpochMillis": 1000,
        "farmPlots": {
            "(0, 0)": { "cropId": "wheat", "growthStage": "two", "waterLevel": 1,
                        "plantedAtEpochMillis": 0, "isReadyToHarvest": false },
            "(2, 2)": { "cropId": "corn", "growthStage": 4, "waterLevel": 2,
                        "plantedAtEpochMillis": 0, "isReadyToHarvest": true }
        }
    }"#;

    let snapshot = SaveSnapshot::from_json(json).expect("one bad cell still parses");
    let mut session =
        FarmSession::restore_or_new(Some(&snapshot), SessionSettings::default(), at(10));

    assert_eq!(session.save_name(), "typed");
    assert_eq!(session.grid().planted_count(), 1);
    assert!(session.grid().cell(TileCoord::new(0, 0)).is_empty());
    let corn = session.harvest(TileCoord::new(2, 2)).expect("corn survived");
    assert!(corn.consumed);
}

#[test]
fn test_events_follow_player_actions() {
    let mut session = FarmSession::new_game(SessionSettings::default(), at(0));
    session.plant(PLOT, "wheat", at(0)).expect("plant");
    session.water(PLOT, at(0));
    assert!(session.clear(PLOT));

    let events = session.drain_events();
    assert_eq!(
        events,
        vec![
            FarmEvent::Planted {
                coord: PLOT,
                species_id: SpeciesId::new("wheat"),
            },
            FarmEvent::Watered {
                coord: PLOT,
                water_level: 1,
            },
            FarmEvent::Cleared { coord: PLOT },
        ]
    );
}

proptest! {
    #[test]
    fn prop_growth_is_monotonic_one_stage_per_tick(
        steps in prop::collection::vec((1u64..40_000, any::<bool>()), 1..60),
        species_index in 0usize..21,
    ) {
        let catalog = SpeciesCatalog::with_defaults();
        let species = catalog.all().nth(species_index).expect("species").clone();
        let mut session = FarmSession::new_game(SessionSettings::default(), at(0));
        session
            .inventory_mut()
            .add(species.id.seed_item(), 1)
            .expect("seed");
        session.plant(PLOT, species.id.as_str(), at(0)).expect("plant");

        let mut now = 0u64;
        let mut last_stage = 0u8;
        for (delta_ms, water) in steps {
            if water {
                session.water(PLOT, Timestamp::from_millis(now));
            }
            now += delta_ms;
            session.tick(Timestamp::from_millis(now));

            let stage = session.grid().plant_at(PLOT).expect("plant").growth_stage();
            prop_assert!(stage >= last_stage);
            prop_assert!(stage <= last_stage + 1);
            prop_assert!(stage <= TERMINAL_STAGE);
            last_stage = stage;
        }
    }
}
