use thiserror::Error;

use wh_core::{BotId, WaypointId};
use wh_spatial::SpatialError;

use crate::Interval;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlanError {
    /// Goal unreachable under current occupancy and reservations.
    /// Recoverable: retry later or pick another goal.
    #[error("no path for {bot}: {source}")]
    PathNotFound {
        bot: BotId,
        #[source]
        source: SpatialError,
    },

    /// Two committed intervals on one waypoint overlap.  Indicates a planner
    /// bug and must abort the run.
    #[error("reservation overlap at {waypoint}: {existing:?} vs {requested:?}")]
    ReservationOverlap {
        waypoint:  WaypointId,
        existing:  Interval,
        requested: Interval,
    },

    #[error("invalid reservation interval [{start}, {end})")]
    InvalidInterval { start: f64, end: f64 },

    #[error("planner configuration error: {0}")]
    Config(String),

    #[error("spatial error: {0}")]
    Spatial(#[from] SpatialError),
}

impl PlanError {
    #[inline]
    pub fn is_path_not_found(&self) -> bool {
        matches!(self, PlanError::PathNotFound { .. })
    }

    /// `true` for errors that mean the planner's own state is corrupt.
    #[inline]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, PlanError::ReservationOverlap { .. })
    }

    /// Lift a search failure, keeping `NoPath` distinct from lookup errors.
    pub(crate) fn from_search(bot: BotId, err: SpatialError) -> Self {
        match err {
            SpatialError::NoPath { .. } => PlanError::PathNotFound { bot, source: err },
            other => PlanError::Spatial(other),
        }
    }
}

pub type PlanResult<T> = Result<T, PlanError>;
