//! Error types for the rail simulation

use thiserror::Error;

use super::types::{EntityKind, SystemStatus};

/// Failures raised by the rail system and its entities.
///
/// Name lookups never fail; they return `Option` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RailError {
    #[error("System is {actual:?}, operation requires {expected:?}")]
    InvalidState {
        expected: SystemStatus,
        actual: SystemStatus,
    },

    #[error("Segment {segment} cannot accept train {train}: occupied, closed or red light")]
    AlreadyOccupied { segment: String, train: String },

    #[error("Segment {segment} cannot release: no train or end station closed")]
    NotOccupied { segment: String },

    #[error("Route {route} is malformed: {reason}")]
    MalformedRoute { route: String, reason: String },

    #[error("{kind} name must not be empty")]
    EmptyName { kind: EntityKind },

    #[error("{kind} named {name:?} already exists")]
    DuplicateName { kind: EntityKind, name: String },

    #[error("Unknown {kind} {name:?}")]
    UnknownEntity { kind: EntityKind, name: String },

    #[error("Segment {segment} is invalid: {reason}")]
    InvalidSegment { segment: String, reason: String },

    #[error("{kind} {name} is still referenced by {user}")]
    InUse {
        kind: EntityKind,
        name: String,
        user: String,
    },
}

pub type RailResult<T> = Result<T, RailError>;
