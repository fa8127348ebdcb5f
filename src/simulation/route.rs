//! Routes: ordered chains of contiguous segments

use std::collections::BTreeMap;
use std::fmt;

use super::entity::{Availability, LoggableEntity};
use super::error::{RailError, RailResult};
use super::event::Event;
use super::segment::Segment;
use super::station::Station;
use super::types::{EntityKind, RouteId, RsStatus, SegmentId, StationId, Tick};

/// A route over one or more segments.
///
/// `stations[i]` is the start of `segments[i]` and `stations[i + 1]` its end,
/// so a route of `n` segments visits `n + 1` stations.
#[derive(Debug, Clone)]
pub struct Route {
    pub id: RouteId,
    core: Availability,
    is_round_trip: bool,
    segments: Vec<SegmentId>,
    stations: Vec<StationId>,
}

impl Route {
    /// Build a route, rejecting empty or non-contiguous segment chains
    pub fn new(
        id: RouteId,
        name: impl Into<String>,
        is_round_trip: bool,
        segments: &[&Segment],
    ) -> RailResult<Self> {
        let name = name.into();
        let stations = Self::sequence_stations(&name, segments)?;

        Ok(Self {
            id,
            core: Availability::new(EntityKind::Route, name),
            is_round_trip,
            segments: segments.iter().map(|segment| segment.id).collect(),
            stations,
        })
    }

    /// Derive the visited stations, checking `segment[i].end == segment[i + 1].start`
    pub fn sequence_stations(route: &str, segments: &[&Segment]) -> RailResult<Vec<StationId>> {
        let first = segments.first().ok_or_else(|| RailError::MalformedRoute {
            route: route.to_string(),
            reason: "route has no segments".to_string(),
        })?;

        let mut stations = vec![first.start];
        for pair in segments.windows(2) {
            if pair[0].end != pair[1].start {
                return Err(RailError::MalformedRoute {
                    route: route.to_string(),
                    reason: format!(
                        "segment {} does not end where segment {} starts",
                        pair[0].name(),
                        pair[1].name()
                    ),
                });
            }
            stations.push(pair[0].end);
        }
        if let Some(last) = segments.last() {
            stations.push(last.end);
        }

        Ok(stations)
    }

    /// True when the given segments form a contiguous chain
    pub fn are_segments_properly_sequenced(segments: &[&Segment]) -> bool {
        segments
            .windows(2)
            .all(|pair| pair[0].end == pair[1].start)
    }

    pub fn is_properly_sequenced(&self) -> bool {
        !self.segments.is_empty() && self.stations.len() == self.segments.len() + 1
    }

    pub fn is_round_trip(&self) -> bool {
        self.is_round_trip
    }

    pub fn status(&self) -> RsStatus {
        self.core.status()
    }

    pub fn is_open(&self) -> bool {
        self.core.is_open()
    }

    pub fn open(&mut self, tick: Tick) -> Event {
        self.core.open(tick)
    }

    pub fn close(&mut self, tick: Tick) -> Event {
        self.core.close(tick)
    }

    pub fn segments(&self) -> &[SegmentId] {
        &self.segments
    }

    pub fn stations(&self) -> &[StationId] {
        &self.stations
    }

    pub fn start(&self) -> StationId {
        self.stations[0]
    }

    pub fn end(&self) -> StationId {
        self.stations[self.stations.len() - 1]
    }

    /// Index of the final station
    pub fn last_position(&self) -> usize {
        self.stations.len() - 1
    }

    pub fn station_at(&self, position: usize) -> Option<StationId> {
        self.stations.get(position).copied()
    }

    /// The segment leaving the station at `position`, if any
    pub fn segment_at(&self, position: usize) -> Option<SegmentId> {
        self.segments.get(position).copied()
    }

    /// Station following the first occurrence of `station`
    pub fn next_station(&self, station: StationId) -> Option<StationId> {
        self.stations
            .iter()
            .skip_while(|candidate| **candidate != station)
            .nth(1)
            .copied()
    }

    /// Station before the last occurrence of `station`; the start when `is_at_start`
    pub fn previous_station(&self, station: StationId, is_at_start: bool) -> Option<StationId> {
        if is_at_start {
            return Some(self.start());
        }
        self.stations
            .iter()
            .rev()
            .skip_while(|candidate| **candidate != station)
            .nth(1)
            .copied()
    }

    /// Every occurrence of `station` on this route must be open
    pub fn can_get_to(&self, station: StationId, stations: &BTreeMap<StationId, Station>) -> bool {
        self.stations
            .iter()
            .filter(|candidate| **candidate == station)
            .all(|candidate| stations.get(candidate).is_some_and(Station::is_open))
    }

    /// The segment starting at the first occurrence of `station`
    pub fn next_segment(&self, station: StationId) -> Option<SegmentId> {
        let position = self.stations.iter().position(|candidate| *candidate == station)?;
        self.segment_at(position)
    }

    pub fn contains_segment(&self, segment: SegmentId) -> bool {
        self.segments.contains(&segment)
    }

    pub fn contains_station(&self, station: StationId) -> bool {
        self.stations.contains(&station)
    }

    pub fn verify(&self) -> bool {
        self.has_valid_name() && self.is_properly_sequenced()
    }
}

impl LoggableEntity for Route {
    fn kind(&self) -> EntityKind {
        EntityKind::Route
    }

    fn name(&self) -> &str {
        self.core.name()
    }

    fn status_description(&self) -> &'static str {
        self.status().description()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Route [name={}, isRoundTrip={}, status={:?}, segments={}, verified={}]",
            self.name(),
            self.is_round_trip,
            self.status(),
            self.segments.len(),
            if self.verify() { "Yes" } else { "No" }
        )
    }
}
