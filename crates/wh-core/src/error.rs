//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `WhError` as one
//! variant where they need to surface configuration or lookup failures.

use thiserror::Error;

use crate::{BotId, PodId, WaypointId};

/// The top-level error type for `wh-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum WhError {
    #[error("bot {0} not found")]
    BotNotFound(BotId),

    #[error("pod {0} not found")]
    PodNotFound(PodId),

    #[error("waypoint {0} not found")]
    WaypointNotFound(WaypointId),

    /// Rejected configuration value (non-positive step, horizon, …).
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `wh-*` crates.
pub type WhResult<T> = Result<T, WhError>;
