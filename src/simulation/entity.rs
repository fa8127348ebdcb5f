//! Shared capability of everything that writes to the event log

use super::event::{Event, EventKind};
use super::route::Route;
use super::segment::Segment;
use super::station::Station;
use super::train::Train;
use super::types::{Action, EntityKind, RsStatus, Tick};

/// Something with a name and a status that produces log events
pub trait LoggableEntity {
    fn kind(&self) -> EntityKind;

    fn name(&self) -> &str;

    fn status_description(&self) -> &'static str;

    /// Build an event attributed to this entity
    fn event(&self, tick: Tick, kind: EventKind) -> Event {
        Event::new(self.kind(), self.name(), tick, kind)
    }

    fn has_valid_name(&self) -> bool {
        !self.name().trim().is_empty()
    }
}

/// Name plus open/closed status, embedded by stations, segments and routes
#[derive(Debug, Clone)]
pub struct Availability {
    kind: EntityKind,
    name: String,
    status: RsStatus,
}

impl Availability {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            status: RsStatus::Open,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> RsStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status == RsStatus::Open
    }

    pub fn open(&mut self, tick: Tick) -> Event {
        self.status = RsStatus::Open;
        Event::action(self.kind, self.name.clone(), tick, Action::Open)
    }

    pub fn close(&mut self, tick: Tick) -> Event {
        self.status = RsStatus::ClosedForMaintenance;
        Event::action(self.kind, self.name.clone(), tick, Action::Close)
    }
}

/// Borrowed view over one entity of any kind
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Station(&'a Station),
    Segment(&'a Segment),
    Route(&'a Route),
    Train(&'a Train),
}

impl EntityRef<'_> {
    fn as_loggable(&self) -> &dyn LoggableEntity {
        match self {
            EntityRef::Station(station) => *station,
            EntityRef::Segment(segment) => *segment,
            EntityRef::Route(route) => *route,
            EntityRef::Train(train) => *train,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.as_loggable().kind()
    }

    pub fn name(&self) -> &str {
        self.as_loggable().name()
    }

    pub fn status_description(&self) -> &'static str {
        self.as_loggable().status_description()
    }
}
