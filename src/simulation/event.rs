//! Immutable event records produced by entity transitions

use std::fmt;

use super::types::{Action, EntityKind, Light, Tick};

/// What happened to the object named by an [`Event`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Open, close, start or finish of an entity
    Action(Action),
    /// A segment's traffic light changed colour
    Light { from: Light, to: Light },
    /// A train moved between two stations
    Move { from: String, to: String },
    /// A train entered (`entry == true`) or left a segment
    Occupied { train: String, entry: bool },
}

/// A single entry of the event log.
///
/// Fields are private so an event cannot change once created. Equality is
/// structural over every field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Event {
    entity: EntityKind,
    object: String,
    tick: Tick,
    kind: EventKind,
}

impl Event {
    pub fn new(entity: EntityKind, object: impl Into<String>, tick: Tick, kind: EventKind) -> Self {
        Self {
            entity,
            object: object.into(),
            tick,
            kind,
        }
    }

    pub fn action(entity: EntityKind, object: impl Into<String>, tick: Tick, action: Action) -> Self {
        Self::new(entity, object, tick, EventKind::Action(action))
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    pub fn object_name(&self) -> &str {
        &self.object
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// The lifecycle action, if this is an open/close/start/finish event
    pub fn as_action(&self) -> Option<Action> {
        match self.kind {
            EventKind::Action(action) => Some(action),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = format!("Object={}, Time()={}", self.object, self.tick);
        match &self.kind {
            EventKind::Action(action) => write!(f, "{} Event [{}]", action, base),
            EventKind::Light { from, to } => write!(
                f,
                "LightEvent [{}, From colour={}, To colour={}]",
                base, from, to
            ),
            EventKind::Move { from, to } => write!(
                f,
                "MoveEvent [{}, From Station={}, To Station={}]",
                base, from, to
            ),
            EventKind::Occupied { train, entry } => {
                let label = if *entry {
                    "Enter Segment Event"
                } else {
                    "Left Segment Event"
                };
                write!(f, "{} [{}, Train={}]", label, base, train)
            }
        }
    }
}
