//! Spatial-subsystem error type.

use thiserror::Error;

use wh_core::{PodId, WaypointId};

/// Errors produced by `wh-spatial`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpatialError {
    /// Search exhausted the frontier without reaching the goal.
    #[error("no path from {from} to {to}")]
    NoPath { from: WaypointId, to: WaypointId },

    #[error("waypoint {0} not found in graph")]
    WaypointNotFound(WaypointId),

    #[error("edge {a}-{b} has invalid weight {weight}")]
    InvalidWeight { a: WaypointId, b: WaypointId, weight: f64 },

    #[error("waypoint {waypoint} already holds {pod}")]
    Occupied { waypoint: WaypointId, pod: PodId },
}

pub type SpatialResult<T> = Result<T, SpatialError>;
