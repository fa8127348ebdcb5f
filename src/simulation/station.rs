//! Stations of the rail network

use std::fmt;

use super::entity::{Availability, LoggableEntity};
use super::event::Event;
use super::types::{EntityKind, RsStatus, StationId, Tick};

#[derive(Debug, Clone)]
pub struct Station {
    pub id: StationId,
    core: Availability,
}

impl Station {
    pub fn new(id: StationId, name: impl Into<String>) -> Self {
        Self {
            id,
            core: Availability::new(EntityKind::Station, name),
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

    /// A station can be travelled to when it is named and open
    pub fn verify(&self) -> bool {
        self.has_valid_name() && self.is_open()
    }
}

impl LoggableEntity for Station {
    fn kind(&self) -> EntityKind {
        EntityKind::Station
    }

    fn name(&self) -> &str {
        self.core.name()
    }

    fn status_description(&self) -> &'static str {
        self.status().description()
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Station [name={}, status={:?}]", self.name(), self.status())
    }
}
