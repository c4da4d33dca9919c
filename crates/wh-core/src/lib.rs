//! `wh-core` — foundational types for the `rust_wh` warehouse simulator.
//!
//! This crate is a dependency of every other `wh-*` crate.  It has no `wh-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                    |
//! |------------|-------------------------------------------------------------|
//! | [`ids`]    | `BotId`, `PodId`, `WaypointId`, `StationId`, `ElevatorId`, `OrderId`, `ItemId` |
//! | [`geo`]    | `Point` (planar metres), headings, angle helpers            |
//! | [`time`]   | `Tick`, `SimClock`, `SimConfig`                             |
//! | [`rng`]    | `SimRng` (explicitly seeded, threaded through callers)      |
//! | [`error`]  | `WhError`, `WhResult`                                       |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{WhError, WhResult};
pub use geo::Point;
pub use ids::{BotId, ElevatorId, ItemId, OrderId, PodId, StationId, WaypointId};
pub use rng::SimRng;
pub use time::{SimClock, SimConfig, Tick};
