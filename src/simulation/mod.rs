//! Rail simulation module
//!
//! A tick-driven simulation of trains moving over single-track segments
//! between stations. Each segment admits at most one train at a time; entry
//! is gated by the segment's open/closed status and its traffic light.
//! Everything here runs headless and is driven through [`Simulator`].

mod demo;
mod entity;
mod error;
mod event;
mod event_log;
mod network;
mod rail_system;
mod route;
mod scenario;
mod segment;
mod simulator;
mod station;
mod traffic_light;
mod train;
mod types;

// Re-export public types for external use
pub use demo::{demo_scenario, DEMO_SCENARIO};
pub use entity::{Availability, EntityRef, LoggableEntity};
pub use error::{RailError, RailResult};
pub use event::{Event, EventKind};
pub use event_log::EventLog;
pub use network::RailNetwork;
pub use rail_system::{RailSystem, TrainOutcome};
pub use route::Route;
pub use scenario::{EntityEvent, RouteSpec, Scenario, ScenarioBlock, SegmentSpec, TrainSpec};
pub use segment::{Occupant, Segment};
pub use simulator::{SimulationOutcome, SimulationReport, Simulator};
pub use station::Station;
pub use traffic_light::TrafficLight;
pub use train::{Train, WaitReason};
pub use types::{
    Action, EntityKind, Light, LightId, RouteId, RsStatus, SegmentId, SimId, StationId,
    SystemStatus, Tick, TrainId, TrainStatus,
};
