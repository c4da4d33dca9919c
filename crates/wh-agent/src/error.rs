use thiserror::Error;

use wh_core::{BotId, ItemId, PodId, WaypointId};
use wh_spatial::SpatialError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AgentError {
    #[error("bot {0} not found")]
    BotNotFound(BotId),

    #[error("pod {0} not found")]
    PodNotFound(PodId),

    #[error("{bot} already carries {pod}")]
    AlreadyCarrying { bot: BotId, pod: PodId },

    #[error("{0} is not carrying a pod")]
    NotCarrying(BotId),

    #[error("{pod} is already carried by {carrier}")]
    PodAlreadyCarried { pod: PodId, carrier: BotId },

    #[error("path for {bot} starts at {first}, which is not at or next to the bot")]
    DetachedPath { bot: BotId, first: WaypointId },

    #[error("path for {bot} jumps from {from} to non-adjacent {to}")]
    BrokenPath { bot: BotId, from: WaypointId, to: WaypointId },

    #[error("{pod} cannot take {requested} more items ({available} free)")]
    CapacityExceeded { pod: PodId, requested: u32, available: u32 },

    #[error("{pod} holds {available} of {item}, {requested} requested")]
    InsufficientItems { pod: PodId, item: ItemId, requested: u32, available: u32 },

    #[error("invalid kinematics: {0}")]
    InvalidKinematics(String),

    #[error("spatial error: {0}")]
    Spatial(#[from] SpatialError),
}

impl AgentError {
    /// Pod exclusivity faults: the caller asked for an impossible transfer.
    #[inline]
    pub fn is_invalid_operation(&self) -> bool {
        matches!(
            self,
            AgentError::AlreadyCarrying { .. }
                | AgentError::NotCarrying(_)
                | AgentError::PodAlreadyCarried { .. }
        )
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
