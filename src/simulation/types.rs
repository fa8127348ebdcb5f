//! Core types for the rail simulation
//!
//! Handles, enums and small value types shared by every entity.

use std::fmt;

/// A logical simulation time step
pub type Tick = u64;

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimId(pub usize);

/// A wrapper type for station IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StationId(pub SimId);

/// A wrapper type for segment IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId(pub SimId);

/// A wrapper type for route IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteId(pub SimId);

/// A wrapper type for train IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrainId(pub SimId);

/// A wrapper type for traffic light IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LightId(pub SimId);

/// Availability of a station, segment or route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RsStatus {
    #[default]
    Open,
    ClosedForMaintenance,
}

impl RsStatus {
    pub fn description(&self) -> &'static str {
        match self {
            RsStatus::Open => "Open",
            RsStatus::ClosedForMaintenance => "Closed for Maintenance",
        }
    }
}

impl fmt::Display for RsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Colour shown by a segment's traffic light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Light {
    Red,
    #[default]
    Green,
}

impl Light {
    /// The other colour
    pub fn toggled(self) -> Light {
        match self {
            Light::Red => Light::Green,
            Light::Green => Light::Red,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Light::Red => "Light is Red",
            Light::Green => "Light is Green",
        }
    }
}

impl fmt::Display for Light {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Lifecycle of a train within one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrainStatus {
    #[default]
    Initialised,
    Started,
    Completed,
}

impl fmt::Display for TrainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrainStatus::Initialised => "Initialised",
            TrainStatus::Started => "Started",
            TrainStatus::Completed => "Completed",
        };
        f.write_str(label)
    }
}

/// Status of the whole rail system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SystemStatus {
    /// Topology may still be changed
    #[default]
    Initialised,
    /// Ticks are being advanced
    Operational,
    /// Trains exist that can never move again
    Deadlocked,
    /// No more trains
    Finished,
}

impl SystemStatus {
    pub fn description(&self) -> &'static str {
        match self {
            SystemStatus::Initialised => "System is Initialised",
            SystemStatus::Operational => "System is Operational",
            SystemStatus::Deadlocked => "System is Deadlocked",
            SystemStatus::Finished => "No More trains!",
        }
    }

    /// Whether the system has stopped for good
    pub fn is_terminal(&self) -> bool {
        matches!(self, SystemStatus::Deadlocked | SystemStatus::Finished)
    }
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Lifecycle actions recorded in the event log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Close,
    Finish,
    Open,
    Start,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::Close => "Close",
            Action::Finish => "Finish",
            Action::Open => "Open",
            Action::Start => "Start",
        };
        f.write_str(label)
    }
}

/// The closed set of entity kinds that produce events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Station,
    Segment,
    Route,
    Train,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Station => "Station",
            EntityKind::Segment => "Segment",
            EntityKind::Route => "Route",
            EntityKind::Train => "Train",
        };
        f.write_str(label)
    }
}
