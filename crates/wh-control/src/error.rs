use thiserror::Error;

use wh_agent::AgentError;
use wh_core::{OrderId, StationId};
use wh_planner::PlanError;
use wh_sim::SimError;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("controller configuration error: {0}")]
    Config(String),

    #[error("{0} is not in the order book")]
    UnknownOrder(OrderId),

    #[error("{0} is not a known station")]
    UnknownStation(StationId),

    #[error("{station} already holds {capacity} orders")]
    StationFull { station: StationId, capacity: usize },

    #[error("order must contain at least one item")]
    EmptyOrder,

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl From<ControlError> for SimError {
    fn from(e: ControlError) -> Self {
        match e {
            ControlError::Plan(p) => SimError::from(p),
            ControlError::Agent(a) => SimError::Agent(a),
            ControlError::Config(msg) => SimError::Config(msg),
            other => SimError::Controller(other.to_string()),
        }
    }
}

pub type ControlResult<T> = Result<T, ControlError>;
