//! Per-entity contract tests

use rail_sim::simulation::{
    Light, LightId, LoggableEntity, RailError, Route, RouteId, RsStatus, Segment, SegmentId,
    SimId, Station, StationId, TrafficLight, Train, TrainId, TrainStatus,
};

fn station(id: usize, name: &str) -> Station {
    Station::new(StationId(SimId(id)), name)
}

fn segment(id: usize, name: &str, start: &Station, end: &Station) -> Segment {
    Segment::new(
        SegmentId(SimId(id)),
        name,
        start.id,
        end.id,
        TrafficLight::new(LightId(SimId(id + 100))),
    )
}

#[test]
fn test_traffic_light_toggles() {
    let mut light = TrafficLight::new(LightId(SimId(0)));
    assert!(light.is_green());
    light.change();
    assert!(light.is_red());
    assert_eq!(light.colour(), Light::Red);
    light.change();
    assert_eq!(light.colour(), Light::Green);
    assert!(light.verify());
}

#[test]
fn test_station_status() {
    let mut a = station(0, "A");
    assert_eq!(a.status(), RsStatus::Open);
    assert!(a.verify());

    a.close(1);
    assert_eq!(a.status(), RsStatus::ClosedForMaintenance);
    assert!(!a.verify());
    assert_eq!(a.status_description(), "Closed for Maintenance");
    assert_eq!(a.to_string(), "Station [name=A, status=ClosedForMaintenance]");

    assert!(!station(1, " ").verify());
}

#[test]
fn test_segment_accept_and_release() {
    let a = station(0, "A");
    let mut b = station(1, "B");
    let mut s1 = segment(2, "S1", &a, &b);
    let t1 = Train::new(TrainId(SimId(3)), "T1", 0);
    let t2 = Train::new(TrainId(SimId(4)), "T2", 0);

    assert!(s1.verify(&a, &b));
    assert!(matches!(
        s1.release_train(&b, 1),
        Err(RailError::NotOccupied { .. })
    ));

    s1.accept_train(&t1, 1).unwrap();
    assert!(s1.is_held_by(t1.id));
    assert!(matches!(
        s1.accept_train(&t2, 1),
        Err(RailError::AlreadyOccupied { .. })
    ));

    b.close(2);
    assert!(s1.ensure_releasable(&b).is_err());
    b.open(3);
    s1.release_train(&b, 3).unwrap();
    assert!(!s1.has_train());
}

#[test]
fn test_segment_refuses_entry_on_red() {
    let a = station(0, "A");
    let b = station(1, "B");
    let mut s1 = segment(2, "S1", &a, &b);
    let t1 = Train::new(TrainId(SimId(3)), "T1", 0);

    s1.change_light(1);
    assert!(!s1.can_accept());
    assert!(s1.accept_train(&t1, 1).is_err());

    s1.change_light(2);
    s1.close(2);
    assert!(!s1.can_accept());
    assert!(!s1.verify(&a, &b));
}

#[test]
fn test_route_station_lookups() {
    let a = station(0, "A");
    let b = station(1, "B");
    let c = station(2, "C");
    let s1 = segment(3, "S1", &a, &b);
    let s2 = segment(4, "S2", &b, &c);
    let route = Route::new(RouteId(SimId(5)), "R1", false, &[&s1, &s2]).unwrap();

    assert_eq!(route.stations(), &[a.id, b.id, c.id]);
    assert_eq!(route.start(), a.id);
    assert_eq!(route.end(), c.id);
    assert_eq!(route.next_station(a.id), Some(b.id));
    assert_eq!(route.next_station(c.id), None);
    assert_eq!(route.previous_station(c.id, false), Some(b.id));
    assert_eq!(route.previous_station(b.id, true), Some(a.id));
    assert_eq!(route.next_segment(b.id), Some(s2.id));
    assert_eq!(route.next_segment(c.id), None);
    assert!(route.contains_segment(s1.id));
    assert!(route.verify());
    assert!(Route::are_segments_properly_sequenced(&[&s1, &s2]));
    assert!(!Route::are_segments_properly_sequenced(&[&s2, &s1]));
}

#[test]
fn test_route_rejects_gaps() {
    let a = station(0, "A");
    let b = station(1, "B");
    let c = station(2, "C");
    let d = station(3, "D");
    let ab = segment(4, "AB", &a, &b);
    let cd = segment(5, "CD", &c, &d);

    let err = Route::new(RouteId(SimId(6)), "R1", false, &[&ab, &cd]).unwrap_err();
    assert!(matches!(err, RailError::MalformedRoute { .. }));
    assert!(err.to_string().contains("AB"));
}

#[test]
fn test_train_lifecycle() {
    let a = station(0, "A");
    let b = station(1, "B");
    let s1 = segment(2, "S1", &a, &b);
    let route = Route::new(RouteId(SimId(3)), "R1", false, &[&s1]).unwrap();
    let mut train = Train::new(TrainId(SimId(4)), "T1", 2);

    assert!(!train.is_registered());
    assert!(!train.validate(&route));

    train.register(&route, vec![b.id], 1);
    assert_eq!(train.current_station(), Some(a.id));
    assert_eq!(train.current_segment(), Some(s1.id));
    assert_eq!(train.wait_time_remaining(), 2);
    assert!(train.is_waiting());
    assert!(train.is_at_start());

    train.set_current_time(3);
    train.update_wait_time();
    assert!(!train.is_waiting());

    train.start(&route, 3);
    assert_eq!(train.status(), TrainStatus::Started);

    // Finish is refused away from the terminal station
    train.finish(&route, 3);
    assert_eq!(train.status(), TrainStatus::Started);

    train.deregister();
    assert!(!train.is_registered());
    assert_eq!(train.current_station(), None);
    assert!(train.designated_stops().is_empty());
}
