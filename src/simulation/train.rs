//! Train state machine
//!
//! Initialised -> Started -> Completed, with no way back within one
//! registration. Re-registering a completed train starts a new lifecycle.

use log::warn;
use std::collections::BTreeMap;
use std::fmt;

use super::entity::LoggableEntity;
use super::event::{Event, EventKind};
use super::route::Route;
use super::station::Station;
use super::types::{Action, EntityKind, RouteId, SegmentId, StationId, Tick, TrainId, TrainStatus};

/// Why a train is currently holding its position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitReason {
    /// Waiting for its scheduled start
    #[default]
    Scheduled,
    /// Dwelling at a designated stop
    Dwell,
    /// Held back by a closure or an unavailable segment
    Blocked,
}

#[derive(Debug, Clone)]
pub struct Train {
    pub id: TrainId,
    name: String,
    start_delay: Tick,
    status: TrainStatus,
    route: Option<RouteId>,
    /// Index into the route's station list
    position: usize,
    current_station: Option<StationId>,
    current_segment: Option<SegmentId>,
    designated_stops: Vec<StationId>,
    registered_at: Option<Tick>,
    current_tick: Tick,
    wait_time_remaining: i64,
    wait_reason: WaitReason,
}

impl Train {
    /// Create an unregistered train. An empty name becomes "Train <id>".
    pub fn new(id: TrainId, name: &str, start_delay: Tick) -> Self {
        let name = if name.trim().is_empty() {
            format!("Train {}", id.0 .0)
        } else {
            name.to_string()
        };

        Self {
            id,
            name,
            start_delay,
            status: TrainStatus::Initialised,
            route: None,
            position: 0,
            current_station: None,
            current_segment: None,
            designated_stops: Vec::new(),
            registered_at: None,
            current_tick: 0,
            wait_time_remaining: 0,
            wait_reason: WaitReason::Scheduled,
        }
    }

    pub fn status(&self) -> TrainStatus {
        self.status
    }

    pub fn start_delay(&self) -> Tick {
        self.start_delay
    }

    pub fn route(&self) -> Option<RouteId> {
        self.route
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn current_station(&self) -> Option<StationId> {
        self.current_station
    }

    pub fn current_segment(&self) -> Option<SegmentId> {
        self.current_segment
    }

    pub fn designated_stops(&self) -> &[StationId] {
        &self.designated_stops
    }

    pub fn is_registered(&self) -> bool {
        self.registered_at.is_some()
    }

    pub fn when_registered(&self) -> Option<Tick> {
        self.registered_at
    }

    pub fn set_current_time(&mut self, tick: Tick) {
        self.current_tick = tick;
    }

    pub fn current_time(&self) -> Tick {
        self.current_tick
    }

    pub fn wait_time_remaining(&self) -> i64 {
        self.wait_time_remaining
    }

    pub fn wait_reason(&self) -> WaitReason {
        self.wait_reason
    }

    /// Bind the train to `route` at its first station
    pub fn register(&mut self, route: &Route, stops: Vec<StationId>, tick: Tick) {
        self.status = TrainStatus::Initialised;
        self.route = Some(route.id);
        self.position = 0;
        self.current_station = Some(route.start());
        self.current_segment = route.segment_at(0);
        self.designated_stops = stops;
        self.registered_at = Some(tick);
        self.current_tick = tick;
        self.update_wait_time();
    }

    /// Drop the route binding, location and stops
    pub fn deregister(&mut self) {
        self.route = None;
        self.position = 0;
        self.current_station = None;
        self.current_segment = None;
        self.designated_stops.clear();
        self.registered_at = None;
        self.wait_time_remaining = 0;
    }

    /// Recompute the hold from the schedule: start delay + registration - now
    pub fn update_wait_time(&mut self) {
        let Some(registered_at) = self.registered_at else {
            self.wait_time_remaining = 0;
            return;
        };
        // Saturates so extreme delays hold the train instead of overflowing
        let due = self.start_delay.saturating_add(registered_at);
        self.wait_time_remaining = if due >= self.current_tick {
            i64::try_from(due - self.current_tick).unwrap_or(i64::MAX)
        } else {
            -i64::try_from(self.current_tick - due).unwrap_or(i64::MAX)
        };
        self.wait_reason = WaitReason::Scheduled;
    }

    /// Hold the train until at least the next tick
    pub fn reset_wait_time_remaining(&mut self, reason: WaitReason) {
        self.wait_time_remaining = i64::try_from(self.current_tick)
            .unwrap_or(i64::MAX)
            .saturating_add(1);
        self.wait_reason = reason;
    }

    pub fn is_waiting(&self) -> bool {
        self.wait_time_remaining > 0
    }

    /// Waiting on a timer that will run out by itself
    pub fn is_dwelling(&self) -> bool {
        self.is_waiting() && self.wait_reason != WaitReason::Blocked
    }

    pub fn is_at_start(&self) -> bool {
        self.is_registered() && self.position == 0
    }

    pub fn is_at_end(&self, route: &Route) -> bool {
        self.is_registered() && self.position == route.last_position()
    }

    pub fn next_station(&self, route: &Route) -> Option<StationId> {
        route.station_at(self.position + 1)
    }

    /// Remove the current station from the designated stops, if present
    pub fn take_designated_stop(&mut self) -> bool {
        let Some(station) = self.current_station else {
            return false;
        };
        match self.designated_stops.iter().position(|stop| *stop == station) {
            Some(index) => {
                self.designated_stops.remove(index);
                true
            }
            None => false,
        }
    }

    /// Start the journey if registered on a verified route; the event is emitted either way
    pub fn start(&mut self, route: &Route, tick: Tick) -> Event {
        if self.validate(route) {
            self.status = TrainStatus::Started;
        }
        self.event(tick, EventKind::Action(Action::Start))
    }

    /// Complete the journey if at the terminal station; the event is emitted either way
    pub fn finish(&mut self, route: &Route, tick: Tick) -> Event {
        if self.is_at_end(route) {
            self.status = TrainStatus::Completed;
        }
        self.event(tick, EventKind::Action(Action::Finish))
    }

    /// Move to the next station when it can be reached.
    ///
    /// A move event is always produced; a refused move is only logged.
    pub fn advance(
        &mut self,
        route: &Route,
        stations: &BTreeMap<StationId, Station>,
        tick: Tick,
    ) -> Event {
        let from = self.current_station;
        let to = self.next_station(route);

        let reachable = to.is_some_and(|next| route.can_get_to(next, stations));
        if route.verify() && self.status == TrainStatus::Started && reachable {
            self.position += 1;
            self.current_station = to;
            self.current_segment = route.segment_at(self.position);
        } else {
            warn!(
                "Train {} could not move from {} at tick {}",
                self.name,
                station_name(stations, from),
                tick
            );
        }

        self.event(
            tick,
            EventKind::Move {
                from: station_name(stations, from).to_string(),
                to: station_name(stations, to).to_string(),
            },
        )
    }

    /// Ready to start: initialised, registered and on a verified route
    pub fn validate(&self, route: &Route) -> bool {
        self.status == TrainStatus::Initialised
            && self.has_valid_name()
            && self.route == Some(route.id)
            && self.verify(route)
    }

    pub fn verify(&self, route: &Route) -> bool {
        route.verify() && self.is_registered()
    }
}

fn station_name(stations: &BTreeMap<StationId, Station>, station: Option<StationId>) -> &str {
    station
        .and_then(|id| stations.get(&id))
        .map(|station| station.name())
        .unwrap_or("none")
}

impl LoggableEntity for Train {
    fn kind(&self) -> EntityKind {
        EntityKind::Train
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn status_description(&self) -> &'static str {
        match self.status {
            TrainStatus::Initialised => "Initialised",
            TrainStatus::Started => "Started",
            TrainStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for Train {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered = match self.registered_at {
            Some(tick) => tick.to_string(),
            None => "unregistered".to_string(),
        };
        write!(
            f,
            "Train [id={}, name={}, timeRegistered={}, startTime={}, status={}]",
            self.id.0 .0, self.name, registered, self.start_delay, self.status
        )
    }
}
