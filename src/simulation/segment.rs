//! Directed track segment between two stations
//!
//! A segment is the unit of mutual exclusion: at most one train may occupy it.
//! Two independent signals gate entry. The open/closed status acts as the
//! reservation lock and the traffic light as the permission to enter. The
//! rail system keeps them in step: entering closes the segment and turns the
//! light red, leaving reopens it and turns the light green.

use std::fmt;

use super::entity::{Availability, LoggableEntity};
use super::error::{RailError, RailResult};
use super::event::{Event, EventKind};
use super::station::Station;
use super::traffic_light::TrafficLight;
use super::train::Train;
use super::types::{EntityKind, Light, RsStatus, SegmentId, StationId, Tick, TrainId};

/// The train currently holding a segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupant {
    pub train: TrainId,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Segment {
    pub id: SegmentId,
    pub start: StationId,
    pub end: StationId,
    core: Availability,
    light: TrafficLight,
    occupant: Option<Occupant>,
}

impl Segment {
    pub fn new(
        id: SegmentId,
        name: impl Into<String>,
        start: StationId,
        end: StationId,
        light: TrafficLight,
    ) -> Self {
        Self {
            id,
            start,
            end,
            core: Availability::new(EntityKind::Segment, name),
            light,
            occupant: None,
        }
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

    pub fn traffic_light(&self) -> &TrafficLight {
        &self.light
    }

    pub fn light_colour(&self) -> Light {
        self.light.colour()
    }

    /// Toggle the light and record the transition
    pub fn change_light(&mut self, tick: Tick) -> Event {
        let from = self.light.colour();
        self.light.change();
        let to = self.light.colour();
        self.event(tick, EventKind::Light { from, to })
    }

    pub fn has_train(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn occupant(&self) -> Option<&Occupant> {
        self.occupant.as_ref()
    }

    /// Check if the given train holds this segment
    pub fn is_held_by(&self, train: TrainId) -> bool {
        self.occupant
            .as_ref()
            .is_some_and(|occupant| occupant.train == train)
    }

    /// Whether a train may enter right now
    pub fn can_accept(&self) -> bool {
        !self.has_train() && self.is_open() && self.light.is_green()
    }

    /// Take exclusive hold of the segment for `train`.
    ///
    /// Requires the segment to be unoccupied, open and showing green.
    pub fn accept_train(&mut self, train: &Train, tick: Tick) -> RailResult<Event> {
        if !self.can_accept() {
            return Err(RailError::AlreadyOccupied {
                segment: self.name().to_string(),
                train: train.name().to_string(),
            });
        }

        self.occupant = Some(Occupant {
            train: train.id,
            name: train.name().to_string(),
        });
        Ok(self.event(
            tick,
            EventKind::Occupied {
                train: train.name().to_string(),
                entry: true,
            },
        ))
    }

    /// Fails unless a train is present and the end station is open
    pub fn ensure_releasable(&self, end: &Station) -> RailResult<()> {
        if self.has_train() && end.id == self.end && end.is_open() {
            Ok(())
        } else {
            Err(RailError::NotOccupied {
                segment: self.name().to_string(),
            })
        }
    }

    /// Let the occupying train out at the end station
    pub fn release_train(&mut self, end: &Station, tick: Tick) -> RailResult<Event> {
        self.ensure_releasable(end)?;

        let occupant = self.occupant.take().ok_or_else(|| RailError::NotOccupied {
            segment: self.name().to_string(),
        })?;
        Ok(self.event(
            tick,
            EventKind::Occupied {
                train: occupant.name,
                entry: false,
            },
        ))
    }

    /// Usable when named, both ends are distinct and open, and the segment is open
    pub fn verify(&self, start: &Station, end: &Station) -> bool {
        self.has_valid_name()
            && self.light.verify()
            && start.verify()
            && end.verify()
            && start.id != end.id
            && self.is_open()
    }
}

impl LoggableEntity for Segment {
    fn kind(&self) -> EntityKind {
        EntityKind::Segment
    }

    fn name(&self) -> &str {
        self.core.name()
    }

    fn status_description(&self) -> &'static str {
        self.status().description()
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Segment [name={}, status={}, trafficLight={}, train={}]",
            self.name(),
            self.status(),
            self.light.colour(),
            self.occupant
                .as_ref()
                .map(|occupant| occupant.name.as_str())
                .unwrap_or("none")
        )
    }
}
