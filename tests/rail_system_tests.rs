//! Rail system behaviour tests
//!
//! These drive the engine tick by tick and check the events it produces.

use rail_sim::simulation::{
    Action, EntityKind, Event, EventKind, Light, LoggableEntity, RailError, RailSystem,
    SystemStatus, TrainOutcome, TrainStatus, WaitReason,
};

/// Stations A and B joined by S1, route R1 over S1, train T1 with no delay
fn single_segment_system() -> RailSystem {
    let mut system = RailSystem::new();
    system.add_station("A").unwrap();
    system.add_station("B").unwrap();
    system.add_segment("S1", "A", "B").unwrap();
    system.add_route("R1", false, &["S1"]).unwrap();
    system.add_train("T1", 0).unwrap();
    system
}

/// A -> B -> C over S1 and S2 on route R1
fn two_segment_system() -> RailSystem {
    let mut system = RailSystem::new();
    for station in ["A", "B", "C"] {
        system.add_station(station).unwrap();
    }
    system.add_segment("S1", "A", "B").unwrap();
    system.add_segment("S2", "B", "C").unwrap();
    system.add_route("R1", false, &["S1", "S2"]).unwrap();
    system
}

fn tick(system: &mut RailSystem) -> Vec<Event> {
    system.increment_time();
    let events = system.advance().unwrap();
    assert!(system.check_occupancy(), "occupancy broken at tick {}", system.current_time());
    events
}

fn action(entity: EntityKind, name: &str, tick: u64, action: Action) -> Event {
    Event::action(entity, name, tick, action)
}

fn light(name: &str, tick: u64, from: Light, to: Light) -> Event {
    Event::new(EntityKind::Segment, name, tick, EventKind::Light { from, to })
}

fn occupied(segment: &str, tick: u64, train: &str, entry: bool) -> Event {
    Event::new(
        EntityKind::Segment,
        segment,
        tick,
        EventKind::Occupied {
            train: train.to_string(),
            entry,
        },
    )
}

fn moved(train: &str, tick: u64, from: &str, to: &str) -> Event {
    Event::new(
        EntityKind::Train,
        train,
        tick,
        EventKind::Move {
            from: from.to_string(),
            to: to.to_string(),
        },
    )
}

#[test]
fn test_single_train_end_to_end() {
    let mut system = single_segment_system();
    assert!(system.register_train("T1", "R1", &[]).unwrap());
    system.set_to_working().unwrap();

    let first = tick(&mut system);
    assert_eq!(
        first,
        vec![
            action(EntityKind::Train, "T1", 1, Action::Start),
            action(EntityKind::Route, "R1", 1, Action::Open),
            occupied("S1", 1, "T1", true),
            action(EntityKind::Segment, "S1", 1, Action::Close),
            light("S1", 1, Light::Green, Light::Red),
        ]
    );

    let second = tick(&mut system);
    assert_eq!(
        second,
        vec![
            action(EntityKind::Segment, "S1", 2, Action::Open),
            light("S1", 2, Light::Red, Light::Green),
            occupied("S1", 2, "T1", false),
            moved("T1", 2, "A", "B"),
        ]
    );

    let third = tick(&mut system);
    assert_eq!(third, vec![action(EntityKind::Train, "T1", 3, Action::Finish)]);

    let train = system.train_by_name("T1").unwrap();
    assert_eq!(train.status(), TrainStatus::Completed);
    assert!(!train.is_registered());
    assert!(system.is_finished());
    assert!(!system.closure_hindering_movement());
}

#[test]
fn test_registration_at_tick_zero_counts() {
    let mut system = single_segment_system();
    assert!(system.register_train("T1", "R1", &[]).unwrap());

    let train = system.train_by_name("T1").unwrap();
    assert!(train.is_registered());
    assert_eq!(train.when_registered(), Some(0));
    assert!(!system.is_finished());
}

#[test]
fn test_start_delay_holds_train() {
    let mut system = single_segment_system();
    system.add_train("T2", 3).unwrap();
    assert!(system.register_train("T2", "R1", &[]).unwrap());
    system.set_to_working().unwrap();

    for _ in 0..2 {
        let events = tick(&mut system);
        assert!(events.is_empty());
        assert_eq!(system.last_outcome("T2"), Some(TrainOutcome::Waiting));
        assert!(!system.closure_hindering_movement());
    }

    let events = tick(&mut system);
    assert!(events.contains(&action(EntityKind::Train, "T2", 3, Action::Start)));
}

#[test]
fn test_segment_holds_one_train_at_a_time() {
    let mut system = two_segment_system();
    system.add_train("T1", 0).unwrap();
    system.add_train("T2", 0).unwrap();
    assert!(system.register_train("T1", "R1", &[]).unwrap());
    assert!(system.register_train("T2", "R1", &[]).unwrap());
    system.set_to_working().unwrap();

    let first = tick(&mut system);
    assert!(first.contains(&occupied("S1", 1, "T1", true)));
    assert!(!first.contains(&occupied("S1", 1, "T2", true)));
    // Both trains start but the route opens only once
    let opens = first
        .iter()
        .filter(|event| **event == action(EntityKind::Route, "R1", 1, Action::Open))
        .count();
    assert_eq!(opens, 1);

    let second = tick(&mut system);
    assert!(second.contains(&occupied("S1", 2, "T1", false)));
    assert!(second.contains(&occupied("S2", 2, "T1", true)));
    assert!(second.contains(&occupied("S1", 2, "T2", true)));

    let mut ticks = 2;
    while !system.is_finished() && ticks < 20 {
        tick(&mut system);
        ticks += 1;
    }
    assert!(system.is_finished());
    assert_eq!(ticks, 5);
}

#[test]
fn test_closed_segment_blocks_entry() {
    let mut system = single_segment_system();
    assert!(system.close_segment("S1").is_some());
    assert!(system.register_train("T1", "R1", &[]).unwrap());
    system.set_to_working().unwrap();

    let first = tick(&mut system);
    assert!(first.contains(&action(EntityKind::Train, "T1", 1, Action::Start)));
    assert!(!first
        .iter()
        .any(|event| matches!(event.kind(), EventKind::Occupied { .. })));

    tick(&mut system);
    assert_eq!(system.last_outcome("T1"), Some(TrainOutcome::Blocked));
    assert!(system.closure_hindering_movement());

    assert!(system.open_segment("S1").is_some());
    let third = tick(&mut system);
    assert!(third.contains(&occupied("S1", 3, "T1", true)));
}

#[test]
fn test_red_light_blocks_entry() {
    let mut system = single_segment_system();
    assert!(system.register_train("T1", "R1", &[]).unwrap());
    assert_eq!(
        system.change_route_light("R1", "A"),
        Some(light("S1", 0, Light::Green, Light::Red))
    );
    system.set_to_working().unwrap();

    let events = tick(&mut system);
    assert!(!events
        .iter()
        .any(|event| matches!(event.kind(), EventKind::Occupied { .. })));
    assert!(!system.segment_by_name("S1").unwrap().has_train());

    tick(&mut system);
    assert_eq!(system.last_outcome("T1"), Some(TrainOutcome::Failed));
}

#[test]
fn test_entry_and_exit_toggle_signals_together() {
    let mut system = single_segment_system();
    assert!(system.register_train("T1", "R1", &[]).unwrap());
    system.set_to_working().unwrap();

    tick(&mut system);
    let segment = system.segment_by_name("S1").unwrap();
    assert!(segment.has_train());
    assert!(!segment.is_open());
    assert_eq!(segment.light_colour(), Light::Red);

    tick(&mut system);
    let segment = system.segment_by_name("S1").unwrap();
    assert!(!segment.has_train());
    assert!(segment.is_open());
    assert_eq!(segment.light_colour(), Light::Green);
}

#[test]
fn test_closed_station_deadlocks() {
    let mut system = two_segment_system();
    system.add_train("T1", 0).unwrap();
    assert!(system.register_train("T1", "R1", &[]).unwrap());
    system.set_to_working().unwrap();

    tick(&mut system);
    assert!(!system.closure_hindering_movement());

    assert!(system.close_station("B").is_some());
    let events = tick(&mut system);
    assert!(events.is_empty());
    assert_eq!(system.last_outcome("T1"), Some(TrainOutcome::Blocked));
    assert!(system.closure_hindering_movement());
    assert!(!system.is_finished());

    // Reopening lets the train continue
    assert!(system.open_station("B").is_some());
    let events = tick(&mut system);
    assert!(events.contains(&moved("T1", 3, "A", "B")));
    assert!(!system.closure_hindering_movement());
}

#[test]
fn test_dwelling_train_is_not_deadlocked() {
    let mut system = two_segment_system();
    system.add_train("T1", 0).unwrap();
    assert!(system.register_train("T1", "R1", &["B"]).unwrap());
    system.set_to_working().unwrap();

    tick(&mut system);
    let second = tick(&mut system);
    assert!(second.contains(&moved("T1", 2, "A", "B")));
    // Dwelling at B: no entry into S2 in the arrival tick
    assert!(!second.contains(&occupied("S2", 2, "T1", true)));

    let train = system.train_by_name("T1").unwrap();
    assert!(train.is_dwelling());
    assert_eq!(train.wait_reason(), WaitReason::Dwell);
    assert!(!system.closure_hindering_movement());

    let third = tick(&mut system);
    assert!(third.contains(&occupied("S2", 3, "T1", true)));
}

#[test]
fn test_scheduled_train_prevents_deadlock_report() {
    let mut system = two_segment_system();
    system.add_station("D").unwrap();
    system.add_segment("S3", "C", "D").unwrap();
    system.add_route("R2", false, &["S3"]).unwrap();
    system.add_train("T1", 0).unwrap();
    system.add_train("T2", 10).unwrap();
    assert!(system.register_train("T1", "R1", &[]).unwrap());
    assert!(system.register_train("T2", "R2", &[]).unwrap());
    system.set_to_working().unwrap();

    tick(&mut system);
    system.close_station("B");
    tick(&mut system);

    assert_eq!(system.last_outcome("T1"), Some(TrainOutcome::Blocked));
    assert_eq!(system.last_outcome("T2"), Some(TrainOutcome::Waiting));
    assert!(!system.closure_hindering_movement());
}

#[test]
fn test_round_trip_route_returns_to_start() {
    let mut system = RailSystem::new();
    system.add_station("A").unwrap();
    system.add_station("B").unwrap();
    system.add_segment("S1", "A", "B").unwrap();
    system.add_segment("S2", "B", "A").unwrap();
    system.add_route("R1", true, &["S1", "S2"]).unwrap();
    system.add_train("T1", 0).unwrap();
    assert!(system.register_train("T1", "R1", &[]).unwrap());
    system.set_to_working().unwrap();

    let mut log = Vec::new();
    while !system.is_finished() && system.current_time() < 10 {
        log.extend(tick(&mut system));
    }

    assert!(log.contains(&moved("T1", 2, "A", "B")));
    assert!(log.contains(&moved("T1", 3, "B", "A")));
    assert!(log.contains(&action(EntityKind::Train, "T1", 4, Action::Finish)));
    assert!(system.route_by_name("R1").unwrap().is_round_trip());
}

#[test]
fn test_advance_requires_operational_system() {
    let mut system = single_segment_system();
    assert_eq!(
        system.advance(),
        Err(RailError::InvalidState {
            expected: SystemStatus::Operational,
            actual: SystemStatus::Initialised,
        })
    );

    system.set_to_working().unwrap();
    assert!(matches!(
        system.add_station("C"),
        Err(RailError::InvalidState { .. })
    ));

    system.set_deadlocked();
    assert!(system.advance().is_err());
    assert!(system.register_train("T1", "R1", &[]).is_err());
}

#[test]
fn test_topology_validation() {
    let mut system = single_segment_system();

    assert!(matches!(
        system.add_station("A"),
        Err(RailError::DuplicateName { kind: EntityKind::Station, .. })
    ));
    assert!(matches!(
        system.add_station("  "),
        Err(RailError::EmptyName { .. })
    ));
    assert!(matches!(
        system.add_segment("S2", "A", "Z"),
        Err(RailError::UnknownEntity { kind: EntityKind::Station, .. })
    ));
    assert!(matches!(
        system.add_segment("S2", "A", "A"),
        Err(RailError::InvalidSegment { .. })
    ));
    assert!(matches!(
        system.add_route("R2", false, &["S1"]),
        Err(RailError::InUse { kind: EntityKind::Segment, .. })
    ));
    assert!(matches!(
        system.add_route("R2", false, &["S9"]),
        Err(RailError::UnknownEntity { kind: EntityKind::Segment, .. })
    ));
    assert!(system.verify());
}

#[test]
fn test_non_contiguous_route_rejected() {
    let mut system = RailSystem::new();
    for station in ["A", "B", "C", "D"] {
        system.add_station(station).unwrap();
    }
    system.add_segment("AB", "A", "B").unwrap();
    system.add_segment("CD", "C", "D").unwrap();
    system.add_segment("BC", "B", "C").unwrap();

    assert!(matches!(
        system.add_route("Broken", false, &["AB", "CD"]),
        Err(RailError::MalformedRoute { .. })
    ));
    assert!(matches!(
        system.add_route("Empty", false, &[]),
        Err(RailError::MalformedRoute { .. })
    ));

    system.add_route("Good", false, &["AB", "BC"]).unwrap();
    let route = system.route_by_name("Good").unwrap();
    assert!(route.is_properly_sequenced());
    assert_eq!(route.stations().len(), 3);
    assert_eq!(system.route_is_properly_sequenced("Good"), Some(true));
}

#[test]
fn test_station_open_close_round_trip() {
    let mut system = single_segment_system();

    let events = [
        system.open_station("A"),
        system.close_station("A"),
        system.open_station("A"),
    ];
    assert_eq!(
        events,
        [
            Some(action(EntityKind::Station, "A", 0, Action::Open)),
            Some(action(EntityKind::Station, "A", 0, Action::Close)),
            Some(action(EntityKind::Station, "A", 0, Action::Open)),
        ]
    );
    assert!(system.station_by_name("A").unwrap().is_open());
    assert_eq!(system.open_station("Nowhere"), None);
}

#[test]
fn test_open_segment_preconditions() {
    let mut system = single_segment_system();
    system.close_segment("S1");
    system.close_station("B");
    assert_eq!(system.open_segment("S1"), None);

    system.open_station("B");
    assert!(system.open_segment("S1").is_some());
    assert_eq!(system.open_entity(EntityKind::Train, "T1"), None);
}

#[test]
fn test_registration_rules() {
    let mut system = single_segment_system();

    assert!(!system.register_train("Ghost", "R1", &[]).unwrap());
    assert!(!system.register_train("T1", "Nowhere", &[]).unwrap());

    system.close_route("R1");
    assert!(!system.register_train("T1", "R1", &[]).unwrap());
    system.open_route("R1");

    // Unknown stops are skipped
    assert!(system.register_train("T1", "R1", &["B", "Z"]).unwrap());
    assert_eq!(system.train_by_name("T1").unwrap().designated_stops().len(), 1);
    assert!(!system.register_train("T1", "R1", &[]).unwrap());

    assert!(system.deregister_train("T1"));
    assert!(!system.deregister_train("T1"));
}

#[test]
fn test_reregister_after_completion() {
    let mut system = single_segment_system();
    assert!(system.register_train("T1", "R1", &[]).unwrap());
    system.set_to_working().unwrap();
    for _ in 0..3 {
        tick(&mut system);
    }
    assert!(system.is_finished());

    assert!(system.register_train("T1", "R1", &[]).unwrap());
    assert_eq!(
        system.train_by_name("T1").unwrap().status(),
        TrainStatus::Initialised
    );
    let events = tick(&mut system);
    assert!(events.contains(&action(EntityKind::Train, "T1", 4, Action::Start)));
}

#[test]
fn test_removal_refuses_referenced_entities() {
    let mut system = single_segment_system();
    system.add_station("C").unwrap();

    assert!(matches!(
        system.remove_station("A"),
        Err(RailError::InUse { .. })
    ));
    assert!(matches!(
        system.remove_segment("S1"),
        Err(RailError::InUse { .. })
    ));
    assert_eq!(system.remove_station("C"), Ok(true));
    assert_eq!(system.remove_station("C"), Ok(false));

    system.register_train("T1", "R1", &[]).unwrap();
    assert!(matches!(
        system.remove_route("R1"),
        Err(RailError::InUse { .. })
    ));
    assert_eq!(system.remove_train("T1"), Ok(true));
    assert_eq!(system.remove_route("R1"), Ok(true));
    assert_eq!(system.remove_segment("S1"), Ok(true));
    assert_eq!(system.remove_station("A"), Ok(true));
    assert!(system.station_by_name("B").is_some());
    assert!(system.verify());
}

#[test]
fn test_network_queries() {
    let system = two_segment_system();

    assert_eq!(
        system.find_segment_between("A", "B").map(|segment| segment.id),
        system.segment_by_name("S1").map(|segment| segment.id)
    );
    assert!(system.find_segment_between("B", "A").is_none());
    assert!(system.can_reach("A", "C"));
    assert!(!system.can_reach("C", "A"));

    let entity = system.entity_by_name("S2").unwrap();
    assert_eq!(entity.kind(), EntityKind::Segment);
    assert_eq!(entity.status_description(), "Open");
}

#[test]
fn test_summary_describes_system() {
    let mut system = single_segment_system();
    system.register_train("T1", "R1", &[]).unwrap();

    let summary = system.summary();
    assert!(summary.contains("Station [name=A, status=Open]"));
    assert!(summary.contains("R1"));
    assert!(summary.contains("A -> B"));
    assert!(summary.contains(SystemStatus::Initialised.description()));
}

#[test]
fn test_unnamed_train_gets_default_name() {
    let mut system = RailSystem::new();
    let id = system.add_train("", 0).unwrap();
    let train = system.train(id).unwrap();
    assert_eq!(train.name(), format!("Train {}", id.0 .0));
}

#[test]
fn test_huge_start_delay_keeps_train_waiting() {
    let mut system = single_segment_system();
    system.add_train("T2", u64::MAX).unwrap();
    assert!(system.register_train("T2", "R1", &[]).unwrap());
    system.set_to_working().unwrap();

    for _ in 0..3 {
        let events = tick(&mut system);
        assert!(events.is_empty());
        assert_eq!(system.last_outcome("T2"), Some(TrainOutcome::Waiting));
    }
    let train = system.train_by_name("T2").unwrap();
    assert_eq!(train.status(), TrainStatus::Initialised);
    assert!(train.wait_time_remaining() > 0);
    assert!(!system.closure_hindering_movement());
}

#[test]
fn test_unregistered_train_keeps_engine_unfinished() {
    let mut system = single_segment_system();
    system.add_train("T2", 0).unwrap();
    assert!(system.register_train("T1", "R1", &[]).unwrap());
    system.set_to_working().unwrap();

    for _ in 0..3 {
        tick(&mut system);
    }
    assert_eq!(system.train_by_name("T1").unwrap().status(), TrainStatus::Completed);
    assert_eq!(system.registered_train_count(), 0);
    assert!(!system.is_finished());
}
