//! The rail system: owner of every entity and of the logical clock
//!
//! Topology is built while the system is `Initialised`. Once set to working,
//! the driver calls [`RailSystem::increment_time`] and [`RailSystem::advance`]
//! once per tick and collects the returned events.

use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use super::entity::{EntityRef, LoggableEntity};
use super::error::{RailError, RailResult};
use super::event::Event;
use super::network::RailNetwork;
use super::route::Route;
use super::segment::Segment;
use super::station::Station;
use super::traffic_light::TrafficLight;
use super::train::{Train, WaitReason};
use super::types::{
    EntityKind, LightId, RouteId, SegmentId, SimId, StationId, SystemStatus, Tick, TrainId,
    TrainStatus,
};

/// What a registered train achieved during the last tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainOutcome {
    /// Started, moved, entered a segment or finished
    Progressed,
    /// Holding for its scheduled start or dwelling at a designated stop
    Waiting,
    /// Could not move and has no timer that will release it
    Blocked,
    /// Processing was aborted by a failed precondition
    Failed,
}

pub struct RailSystem {
    /// Track topology for connectivity queries
    network: RailNetwork,

    stations: BTreeMap<StationId, Station>,
    segments: BTreeMap<SegmentId, Segment>,
    routes: BTreeMap<RouteId, Route>,
    trains: BTreeMap<TrainId, Train>,

    /// Name indexes; arenas are keyed by handle
    station_names: HashMap<String, StationId>,
    segment_names: HashMap<String, SegmentId>,
    route_names: HashMap<String, RouteId>,
    train_names: HashMap<String, TrainId>,

    /// Outcome of every registered train in the last advance
    last_outcomes: BTreeMap<TrainId, TrainOutcome>,

    /// Next ID to assign
    next_id: usize,

    status: SystemStatus,

    current_time: Tick,
}

impl Default for RailSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl RailSystem {
    pub fn new() -> Self {
        Self {
            network: RailNetwork::new(),
            stations: BTreeMap::new(),
            segments: BTreeMap::new(),
            routes: BTreeMap::new(),
            trains: BTreeMap::new(),
            station_names: HashMap::new(),
            segment_names: HashMap::new(),
            route_names: HashMap::new(),
            train_names: HashMap::new(),
            last_outcomes: BTreeMap::new(),
            next_id: 0,
            status: SystemStatus::Initialised,
            current_time: 0,
        }
    }

    fn next_sim_id(&mut self) -> SimId {
        let id = SimId(self.next_id);
        self.next_id += 1;
        id
    }

    fn ensure_status(&self, expected: SystemStatus) -> RailResult<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(RailError::InvalidState {
                expected,
                actual: self.status,
            })
        }
    }

    fn ensure_name(kind: EntityKind, name: &str) -> RailResult<String> {
        let name = name.trim();
        if name.is_empty() {
            Err(RailError::EmptyName { kind })
        } else {
            Ok(name.to_string())
        }
    }

    // ----- status and clock -----

    pub fn status(&self) -> SystemStatus {
        self.status
    }

    pub fn current_time(&self) -> Tick {
        self.current_time
    }

    /// Advance the clock by one tick and propagate it to every train
    pub fn increment_time(&mut self) -> Tick {
        self.current_time += 1;
        let tick = self.current_time;
        for train in self.trains.values_mut() {
            train.set_current_time(tick);
        }
        tick
    }

    /// Leave the build phase. Calling it again while operational is a no-op.
    pub fn set_to_working(&mut self) -> RailResult<()> {
        match self.status {
            SystemStatus::Initialised => {
                info!(
                    "Rail system operational: {} stations, {} segments, {} routes, {} trains",
                    self.stations.len(),
                    self.segments.len(),
                    self.routes.len(),
                    self.trains.len()
                );
                self.status = SystemStatus::Operational;
                Ok(())
            }
            SystemStatus::Operational => Ok(()),
            actual => Err(RailError::InvalidState {
                expected: SystemStatus::Initialised,
                actual,
            }),
        }
    }

    /// Stop the system for good: no trains left
    pub fn set_stopped(&mut self) {
        self.status = SystemStatus::Finished;
    }

    /// Stop the system for good: trains can no longer move
    pub fn set_deadlocked(&mut self) {
        self.status = SystemStatus::Deadlocked;
    }

    // ----- topology builders -----

    /// Add a station to the network
    pub fn add_station(&mut self, name: &str) -> RailResult<StationId> {
        self.ensure_status(SystemStatus::Initialised)?;
        let name = Self::ensure_name(EntityKind::Station, name)?;
        if self.station_names.contains_key(&name) {
            return Err(RailError::DuplicateName {
                kind: EntityKind::Station,
                name,
            });
        }

        let id = StationId(self.next_sim_id());
        self.network.add_station(id);
        self.station_names.insert(name.clone(), id);
        self.stations.insert(id, Station::new(id, name));
        Ok(id)
    }

    /// Add a directed segment between two existing stations
    pub fn add_segment(&mut self, name: &str, start: &str, end: &str) -> RailResult<SegmentId> {
        self.ensure_status(SystemStatus::Initialised)?;
        let name = Self::ensure_name(EntityKind::Segment, name)?;
        if self.segment_names.contains_key(&name) {
            return Err(RailError::DuplicateName {
                kind: EntityKind::Segment,
                name,
            });
        }

        let start_id = self.require_station(start)?;
        let end_id = self.require_station(end)?;
        if start_id == end_id {
            return Err(RailError::InvalidSegment {
                segment: name,
                reason: "start and end station are the same".to_string(),
            });
        }

        let light = TrafficLight::new(LightId(self.next_sim_id()));
        let id = SegmentId(self.next_sim_id());
        self.network.add_segment(id, start_id, end_id);
        self.segment_names.insert(name.clone(), id);
        self.segments
            .insert(id, Segment::new(id, name, start_id, end_id, light));
        Ok(id)
    }

    /// Add a route over named segments, which must form a contiguous chain
    pub fn add_route(
        &mut self,
        name: &str,
        is_round_trip: bool,
        segment_names: &[&str],
    ) -> RailResult<RouteId> {
        self.ensure_status(SystemStatus::Initialised)?;
        let name = Self::ensure_name(EntityKind::Route, name)?;
        if self.route_names.contains_key(&name) {
            return Err(RailError::DuplicateName {
                kind: EntityKind::Route,
                name,
            });
        }

        let mut segments = Vec::with_capacity(segment_names.len());
        for segment_name in segment_names {
            let segment = self
                .segment_by_name(segment_name)
                .ok_or_else(|| RailError::UnknownEntity {
                    kind: EntityKind::Segment,
                    name: segment_name.trim().to_string(),
                })?;
            if let Some(owner) = self.routes.values().find(|route| route.contains_segment(segment.id)) {
                return Err(RailError::InUse {
                    kind: EntityKind::Segment,
                    name: segment.name().to_string(),
                    user: owner.name().to_string(),
                });
            }
            segments.push(segment);
        }

        let id = RouteId(SimId(self.next_id));
        let route = Route::new(id, name.clone(), is_round_trip, &segments)?;
        self.next_id += 1;
        self.route_names.insert(name, id);
        self.routes.insert(id, route);
        Ok(id)
    }

    /// Add an unregistered train. An empty name becomes "Train <id>".
    pub fn add_train(&mut self, name: &str, start_delay: Tick) -> RailResult<TrainId> {
        self.ensure_status(SystemStatus::Initialised)?;
        if self.train_names.contains_key(name.trim()) {
            return Err(RailError::DuplicateName {
                kind: EntityKind::Train,
                name: name.trim().to_string(),
            });
        }

        let id = TrainId(self.next_sim_id());
        let train = Train::new(id, name.trim(), start_delay);
        self.train_names.insert(train.name().to_string(), id);
        self.trains.insert(id, train);
        Ok(id)
    }

    /// Remove a station no segment refers to. Returns false if it does not exist.
    pub fn remove_station(&mut self, name: &str) -> RailResult<bool> {
        self.ensure_status(SystemStatus::Initialised)?;
        let Some(id) = self.station_names.get(name.trim()).copied() else {
            return Ok(false);
        };
        if let Some(segment) = self
            .segments
            .values()
            .find(|segment| segment.start == id || segment.end == id)
        {
            return Err(RailError::InUse {
                kind: EntityKind::Station,
                name: name.trim().to_string(),
                user: segment.name().to_string(),
            });
        }

        self.network.remove_station(id);
        self.station_names.remove(name.trim());
        self.stations.remove(&id);
        Ok(true)
    }

    /// Remove a segment no route refers to. Returns false if it does not exist.
    pub fn remove_segment(&mut self, name: &str) -> RailResult<bool> {
        self.ensure_status(SystemStatus::Initialised)?;
        let Some(id) = self.segment_names.get(name.trim()).copied() else {
            return Ok(false);
        };
        if let Some(route) = self.routes.values().find(|route| route.contains_segment(id)) {
            return Err(RailError::InUse {
                kind: EntityKind::Segment,
                name: name.trim().to_string(),
                user: route.name().to_string(),
            });
        }

        self.network.remove_segment(id);
        self.segment_names.remove(name.trim());
        self.segments.remove(&id);
        Ok(true)
    }

    /// Remove a route no train is registered on. Returns false if it does not exist.
    pub fn remove_route(&mut self, name: &str) -> RailResult<bool> {
        self.ensure_status(SystemStatus::Initialised)?;
        let Some(id) = self.route_names.get(name.trim()).copied() else {
            return Ok(false);
        };
        if let Some(train) = self.trains.values().find(|train| train.route() == Some(id)) {
            return Err(RailError::InUse {
                kind: EntityKind::Route,
                name: name.trim().to_string(),
                user: train.name().to_string(),
            });
        }

        self.route_names.remove(name.trim());
        self.routes.remove(&id);
        Ok(true)
    }

    /// Remove a train. Returns false if it does not exist.
    pub fn remove_train(&mut self, name: &str) -> RailResult<bool> {
        self.ensure_status(SystemStatus::Initialised)?;
        let Some(id) = self.train_names.remove(name.trim()) else {
            return Ok(false);
        };
        self.trains.remove(&id);
        self.last_outcomes.remove(&id);
        Ok(true)
    }

    fn require_station(&self, name: &str) -> RailResult<StationId> {
        self.station_names
            .get(name.trim())
            .copied()
            .ok_or_else(|| RailError::UnknownEntity {
                kind: EntityKind::Station,
                name: name.trim().to_string(),
            })
    }

    // ----- registration -----

    /// Bind a train to a route with its designated stops.
    ///
    /// Returns `Ok(false)` when the train or route is unknown, the train is
    /// already registered, or the route is unverified or closed.
    pub fn register_train(
        &mut self,
        train_name: &str,
        route_name: &str,
        stops: &[&str],
    ) -> RailResult<bool> {
        if self.status.is_terminal() {
            return Err(RailError::InvalidState {
                expected: SystemStatus::Operational,
                actual: self.status,
            });
        }

        let (Some(train_id), Some(route_id)) = (
            self.train_names.get(train_name.trim()).copied(),
            self.route_names.get(route_name.trim()).copied(),
        ) else {
            warn!("Cannot register {} on {}: unknown train or route", train_name, route_name);
            return Ok(false);
        };
        let (Some(train), Some(route)) = (self.trains.get_mut(&train_id), self.routes.get(&route_id))
        else {
            return Ok(false);
        };
        if train.is_registered() || !route.verify() || !route.is_open() {
            warn!(
                "Cannot register {} on {}: already registered or route unavailable",
                train_name, route_name
            );
            return Ok(false);
        }

        let mut designated = Vec::new();
        for stop in stops {
            match self.station_names.get(stop.trim()) {
                Some(station) if route.contains_station(*station) => designated.push(*station),
                _ => warn!("Ignoring stop {} for {}: not on route {}", stop, train_name, route_name),
            }
        }

        train.register(route, designated, self.current_time);
        info!(
            "Registered {} on {} at tick {}",
            train.name(),
            route.name(),
            self.current_time
        );
        Ok(true)
    }

    /// Release a train from its route. A train holding a segment is refused.
    pub fn deregister_train(&mut self, train_name: &str) -> bool {
        let Some(id) = self.train_names.get(train_name.trim()).copied() else {
            return false;
        };
        if self.segments.values().any(|segment| segment.is_held_by(id)) {
            warn!("Cannot deregister {} while it occupies a segment", train_name);
            return false;
        }
        match self.trains.get_mut(&id) {
            Some(train) if train.is_registered() => {
                train.deregister();
                self.last_outcomes.remove(&id);
                true
            }
            _ => false,
        }
    }

    // ----- entity control -----

    /// Open a named station
    pub fn open_station(&mut self, name: &str) -> Option<Event> {
        let tick = self.current_time;
        let station = self.station_mut(name)?;
        station.has_valid_name().then(|| station.open(tick))
    }

    pub fn close_station(&mut self, name: &str) -> Option<Event> {
        let tick = self.current_time;
        self.station_mut(name).map(|station| station.close(tick))
    }

    /// Open a segment whose ends are open, which is unoccupied and showing green
    pub fn open_segment(&mut self, name: &str) -> Option<Event> {
        let tick = self.current_time;
        let id = *self.segment_names.get(name.trim())?;
        let segment = self.segments.get_mut(&id)?;
        let ends_open = [segment.start, segment.end]
            .iter()
            .all(|station| self.stations.get(station).is_some_and(Station::is_open));

        (ends_open && !segment.has_train() && segment.traffic_light().is_green())
            .then(|| segment.open(tick))
    }

    pub fn close_segment(&mut self, name: &str) -> Option<Event> {
        let tick = self.current_time;
        let id = *self.segment_names.get(name.trim())?;
        self.segments.get_mut(&id).map(|segment| segment.close(tick))
    }

    /// Open a route if it verifies
    pub fn open_route(&mut self, name: &str) -> Option<Event> {
        let id = *self.route_names.get(name.trim())?;
        self.open_route_by_id(id)
    }

    fn open_route_by_id(&mut self, id: RouteId) -> Option<Event> {
        let tick = self.current_time;
        let route = self.routes.get_mut(&id)?;
        route.verify().then(|| route.open(tick))
    }

    /// Close a route if it verifies
    pub fn close_route(&mut self, name: &str) -> Option<Event> {
        let tick = self.current_time;
        let id = *self.route_names.get(name.trim())?;
        let route = self.routes.get_mut(&id)?;
        route.verify().then(|| route.close(tick))
    }

    /// Open any station, segment or route by kind
    pub fn open_entity(&mut self, kind: EntityKind, name: &str) -> Option<Event> {
        match kind {
            EntityKind::Station => self.open_station(name),
            EntityKind::Segment => self.open_segment(name),
            EntityKind::Route => self.open_route(name),
            EntityKind::Train => None,
        }
    }

    pub fn close_entity(&mut self, kind: EntityKind, name: &str) -> Option<Event> {
        match kind {
            EntityKind::Station => self.close_station(name),
            EntityKind::Segment => self.close_segment(name),
            EntityKind::Route => self.close_route(name),
            EntityKind::Train => None,
        }
    }

    /// Toggle the light of the route segment starting at `station`
    pub fn change_route_light(&mut self, route: &str, station: &str) -> Option<Event> {
        let tick = self.current_time;
        let route = self.route_by_name(route)?;
        let station = self.station_names.get(station.trim())?;
        let segment = route.next_segment(*station)?;
        self.segments
            .get_mut(&segment)
            .map(|segment| segment.change_light(tick))
    }

    // ----- lookups -----

    pub fn station_by_name(&self, name: &str) -> Option<&Station> {
        self.station_names
            .get(name.trim())
            .and_then(|id| self.stations.get(id))
    }

    fn station_mut(&mut self, name: &str) -> Option<&mut Station> {
        let id = self.station_names.get(name.trim())?;
        self.stations.get_mut(id)
    }

    pub fn segment_by_name(&self, name: &str) -> Option<&Segment> {
        self.segment_names
            .get(name.trim())
            .and_then(|id| self.segments.get(id))
    }

    pub fn route_by_name(&self, name: &str) -> Option<&Route> {
        self.route_names
            .get(name.trim())
            .and_then(|id| self.routes.get(id))
    }

    pub fn train_by_name(&self, name: &str) -> Option<&Train> {
        self.train_names
            .get(name.trim())
            .and_then(|id| self.trains.get(id))
    }

    /// Look a name up across every entity kind
    pub fn entity_by_name(&self, name: &str) -> Option<EntityRef<'_>> {
        self.station_by_name(name)
            .map(EntityRef::Station)
            .or_else(|| self.segment_by_name(name).map(EntityRef::Segment))
            .or_else(|| self.route_by_name(name).map(EntityRef::Route))
            .or_else(|| self.train_by_name(name).map(EntityRef::Train))
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(&id)
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(&id)
    }

    pub fn route(&self, id: RouteId) -> Option<&Route> {
        self.routes.get(&id)
    }

    pub fn train(&self, id: TrainId) -> Option<&Train> {
        self.trains.get(&id)
    }

    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub fn trains(&self) -> impl Iterator<Item = &Train> {
        self.trains.values()
    }

    /// Name of a station handle, or "none"
    pub fn station_name(&self, id: Option<StationId>) -> &str {
        id.and_then(|id| self.stations.get(&id))
            .map(|station| station.name())
            .unwrap_or("none")
    }

    /// The segment running directly between two named stations
    pub fn find_segment_between(&self, from: &str, to: &str) -> Option<&Segment> {
        let from = self.station_names.get(from.trim())?;
        let to = self.station_names.get(to.trim())?;
        let id = self.network.find_segment_between(*from, *to)?;
        self.segments.get(&id)
    }

    /// Whether track leads from one named station to another
    pub fn can_reach(&self, from: &str, to: &str) -> bool {
        match (
            self.station_names.get(from.trim()),
            self.station_names.get(to.trim()),
        ) {
            (Some(from), Some(to)) => self.network.can_reach(*from, *to),
            _ => false,
        }
    }

    /// Re-check contiguity of a named route against the current segments
    pub fn route_is_properly_sequenced(&self, name: &str) -> Option<bool> {
        let route = self.route_by_name(name)?;
        let segments: Vec<&Segment> = route
            .segments()
            .iter()
            .filter_map(|id| self.segments.get(id))
            .collect();
        Some(
            segments.len() == route.segments().len()
                && Route::are_segments_properly_sequenced(&segments),
        )
    }

    pub fn last_outcome(&self, train_name: &str) -> Option<TrainOutcome> {
        let id = self.train_names.get(train_name.trim())?;
        self.last_outcomes.get(id).copied()
    }

    // ----- simulation -----

    /// Run one tick for every registered train, in creation order.
    ///
    /// Events are returned in the order they were produced. A train whose
    /// processing fails is skipped for the rest of the tick; the others
    /// still run.
    pub fn advance(&mut self) -> RailResult<Vec<Event>> {
        self.ensure_status(SystemStatus::Operational)?;

        let tick = self.current_time;
        let mut events = Vec::new();
        self.last_outcomes.clear();

        // Collect train IDs to avoid borrow issues
        let train_ids: Vec<TrainId> = self.trains.keys().copied().collect();

        for train_id in train_ids {
            let Some(mut train) = self.trains.remove(&train_id) else {
                continue;
            };

            train.set_current_time(tick);
            if train.is_registered() {
                let outcome = match self.process_train(&mut train, tick, &mut events) {
                    Ok(true) => TrainOutcome::Progressed,
                    Ok(false) if train.is_dwelling() => TrainOutcome::Waiting,
                    Ok(false) => TrainOutcome::Blocked,
                    Err(err) => {
                        warn!("Tick {}: train {} skipped: {}", tick, train.name(), err);
                        TrainOutcome::Failed
                    }
                };
                self.last_outcomes.insert(train_id, outcome);
            }

            self.trains.insert(train_id, train);
        }

        debug!("Tick {} produced {} events", tick, events.len());
        Ok(events)
    }

    /// Steps for one registered train. Returns whether it made progress.
    fn process_train(
        &mut self,
        train: &mut Train,
        tick: Tick,
        events: &mut Vec<Event>,
    ) -> RailResult<bool> {
        train.update_wait_time();

        let Some(route_id) = train.route() else {
            return Ok(false);
        };
        let route = self.routes.get(&route_id).ok_or_else(|| RailError::UnknownEntity {
            kind: EntityKind::Route,
            name: format!("#{}", route_id.0 .0),
        })?;

        let mut progressed = false;

        if train.is_at_start() && !train.is_waiting() && train.status() != TrainStatus::Started {
            events.push(train.start(route, tick));
            progressed = train.status() == TrainStatus::Started;
            // Trains sharing a route may start in the same tick
            if let Some(event) = self.open_route_by_id(route_id) {
                if !events.contains(&event) {
                    events.push(event);
                }
            }
        } else if train.is_at_end(route) {
            events.push(train.finish(route, tick));
            info!("Train {} completed {} at tick {}", train.name(), route.name(), tick);
            train.deregister();
            return Ok(true);
        }

        if train.status() == TrainStatus::Started {
            progressed |= self.check_train_status(train, route_id, tick, events)?;
        }

        Ok(progressed)
    }

    /// Move the train on if its surroundings allow, otherwise hold it
    fn check_train_status(
        &mut self,
        train: &mut Train,
        route_id: RouteId,
        tick: Tick,
        events: &mut Vec<Event>,
    ) -> RailResult<bool> {
        let Some(route) = self.routes.get(&route_id) else {
            return Ok(false);
        };
        let current_open = train
            .current_station()
            .and_then(|id| self.stations.get(&id))
            .is_some_and(Station::is_open);
        let next_verified = train
            .next_station(route)
            .and_then(|id| self.stations.get(&id))
            .is_some_and(Station::verify);

        if next_verified && current_open {
            self.process_segment_transition(train, route_id, tick, events)
        } else {
            train.reset_wait_time_remaining(WaitReason::Blocked);
            Ok(false)
        }
    }

    /// Leave the current segment, dwell at designated stops, enter the next segment
    fn process_segment_transition(
        &mut self,
        train: &mut Train,
        route_id: RouteId,
        tick: Tick,
        events: &mut Vec<Event>,
    ) -> RailResult<bool> {
        let mut progressed = false;

        if let Some(segment_id) = train.current_segment() {
            let segment = self.segments.get_mut(&segment_id).ok_or_else(|| {
                RailError::UnknownEntity {
                    kind: EntityKind::Segment,
                    name: format!("#{}", segment_id.0 .0),
                }
            })?;

            if segment.is_held_by(train.id) && !segment.is_open() {
                let end = self
                    .stations
                    .get(&segment.end)
                    .ok_or_else(|| RailError::NotOccupied {
                        segment: segment.name().to_string(),
                    })?;
                segment.ensure_releasable(end)?;

                events.push(segment.open(tick));
                if segment.traffic_light().is_red() {
                    events.push(segment.change_light(tick));
                }
                events.push(segment.release_train(end, tick)?);

                if let Some(route) = self.routes.get(&route_id) {
                    events.push(train.advance(route, &self.stations, tick));
                }
                progressed = true;
            } else if !segment.has_train() && !segment.is_open() {
                train.reset_wait_time_remaining(WaitReason::Blocked);
            }
        }

        if train.take_designated_stop() {
            debug!("Train {} dwelling at tick {}", train.name(), tick);
            train.reset_wait_time_remaining(WaitReason::Dwell);
        }

        // After a move this is the segment leaving the new station
        if let Some(segment_id) = train.current_segment() {
            if let Some(segment) = self.segments.get_mut(&segment_id) {
                if !segment.has_train() && segment.is_open() && !train.is_waiting() {
                    events.push(segment.accept_train(train, tick)?);
                    events.push(segment.close(tick));
                    if segment.traffic_light().is_green() {
                        events.push(segment.change_light(tick));
                    }
                    progressed = true;
                }
            }
        }

        Ok(progressed)
    }

    // ----- termination -----

    /// True when started trains exist but none of them can move and none is
    /// only waiting for a timer to run out.
    pub fn closure_hindering_movement(&self) -> bool {
        let registered: Vec<&Train> = self
            .trains
            .values()
            .filter(|train| train.is_registered())
            .collect();

        let any_started = registered
            .iter()
            .any(|train| train.status() == TrainStatus::Started);
        if !any_started {
            return false;
        }

        registered.iter().all(|train| {
            matches!(
                self.last_outcomes.get(&train.id),
                Some(TrainOutcome::Blocked | TrainOutcome::Failed)
            )
        })
    }

    /// No train is registered and none is still waiting for its first registration
    ///
    /// The driver ends a run on `registered_train_count() == 0` once no
    /// scenario block is left, since nothing can register a waiting train then.
    pub fn is_finished(&self) -> bool {
        self.trains.values().all(|train| {
            !train.is_registered() && train.status() != TrainStatus::Initialised
        })
    }

    pub fn registered_train_count(&self) -> usize {
        self.trains
            .values()
            .filter(|train| train.is_registered())
            .count()
    }

    // ----- verification -----

    /// Every segment is held by at most one registered train, which in turn
    /// points at that segment, and no train holds more than one segment.
    pub fn check_occupancy(&self) -> bool {
        let mut held: HashMap<TrainId, usize> = HashMap::new();
        for segment in self.segments.values() {
            if let Some(occupant) = segment.occupant() {
                let consistent = self.trains.get(&occupant.train).is_some_and(|train| {
                    train.is_registered() && train.current_segment() == Some(segment.id)
                });
                if !consistent || segment.is_open() {
                    return false;
                }
                *held.entry(occupant.train).or_default() += 1;
            }
        }
        held.values().all(|count| *count <= 1)
    }

    /// Structural integrity of the whole system
    pub fn verify(&self) -> bool {
        let stations_ok = self.stations.values().all(|station| station.has_valid_name());
        let segments_ok = self.segments.values().all(|segment| {
            segment.has_valid_name()
                && segment.start != segment.end
                && self.stations.contains_key(&segment.start)
                && self.stations.contains_key(&segment.end)
        });
        let routes_ok = self.routes.values().all(|route| {
            route.verify() && self.route_is_properly_sequenced(route.name()) == Some(true)
        });
        let trains_ok = self.trains.values().all(|train| match train.route() {
            Some(route) => self
                .routes
                .get(&route)
                .is_some_and(|route| train.verify(route)),
            None => !train.is_registered(),
        });

        stations_ok && segments_ok && routes_ok && trains_ok && self.check_occupancy()
    }

    /// Multi-line description of the system state
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Rail System Summary ===");
        let _ = writeln!(out, "Time: {}", self.current_time);
        let _ = writeln!(out, "Status: {}", self.status);
        let _ = writeln!(out, "Verified: {}", if self.verify() { "Yes" } else { "No" });
        let _ = writeln!(
            out,
            "Stations: {}, Segments: {}, Routes: {}, Trains: {} ({} registered)",
            self.network.station_count(),
            self.network.segment_count(),
            self.routes.len(),
            self.trains.len(),
            self.registered_train_count()
        );

        let _ = writeln!(out, "--- Stations ---");
        for station in self.stations.values() {
            let _ = writeln!(out, "  {}", station);
        }

        let _ = writeln!(out, "--- Segments ---");
        for segment in self.segments.values() {
            let _ = writeln!(
                out,
                "  {} ({} -> {})",
                segment,
                self.station_name(Some(segment.start)),
                self.station_name(Some(segment.end))
            );
        }

        let _ = writeln!(out, "--- Routes ---");
        for route in self.routes.values() {
            let stops: Vec<&str> = route
                .stations()
                .iter()
                .map(|id| self.station_name(Some(*id)))
                .collect();
            let _ = writeln!(out, "  {} via {}", route, stops.join(" -> "));
        }

        let _ = writeln!(out, "--- Trains ---");
        for train in self.trains.values() {
            let route = train
                .route()
                .and_then(|id| self.routes.get(&id))
                .map(|route| route.name())
                .unwrap_or("none");
            let _ = writeln!(
                out,
                "  {} route={} at={} waiting={}",
                train,
                route,
                self.station_name(train.current_station()),
                train.is_waiting()
            );
        }

        out
    }
}
