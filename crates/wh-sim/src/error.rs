use thiserror::Error;

use wh_agent::AgentError;
use wh_core::{BotId, WhError};
use wh_planner::PlanError;
use wh_spatial::SpatialError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    /// The planner's reservation table lost its disjointness invariant.
    /// Aborts the run.
    #[error("reservation invariant violated: {0}")]
    ReservationInvariant(PlanError),

    #[error("planning error: {0}")]
    Plan(PlanError),

    #[error("agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("spatial error: {0}")]
    Spatial(#[from] SpatialError),

    #[error("{0} is not on the waypoint graph")]
    NotPlaced(BotId),

    #[error("controller error: {0}")]
    Controller(String),

    #[error(transparent)]
    Core(WhError),
}

impl SimError {
    /// The planner found no admissible route.  Recoverable.
    #[inline]
    pub fn is_path_not_found(&self) -> bool {
        matches!(self, SimError::Plan(e) if e.is_path_not_found())
    }

    /// Pickup or setdown violated pod exclusivity.  Nothing was changed.
    #[inline]
    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, SimError::Agent(e) if e.is_invalid_operation())
    }

    /// Errors that must abort `execute`.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, SimError::ReservationInvariant(_))
    }
}

impl From<PlanError> for SimError {
    fn from(e: PlanError) -> Self {
        if e.is_invariant_violation() {
            SimError::ReservationInvariant(e)
        } else {
            SimError::Plan(e)
        }
    }
}

impl From<WhError> for SimError {
    fn from(e: WhError) -> Self {
        match e {
            WhError::Config(msg) => SimError::Config(msg),
            other => SimError::Core(other),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
