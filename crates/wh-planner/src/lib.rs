//! `wh-planner` — reservation table and multi-agent path planners.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                      |
//! |-----------------|---------------------------------------------------------------|
//! | [`reservation`] | `Interval`, `ReservationTable` — waypoint → disjoint intervals |
//! | [`planner`]     | `PathPlanner` trait, `CooperativePlanner`, `SimplePlanner`, `AStarPlanner` |
//! | [`shared`]      | `SharedPlanner<P>` — lock-guarded planner handle for threads   |
//! | [`error`]       | `PlanError`, `PlanResult<T>`                                   |
//!
//! # Cooperative planning model
//!
//! 1. A plan starting at time `T` reaches path index `k` at `T + k·hop`.
//! 2. A* runs with a predicate that rejects a candidate when its waypoint is
//!    pod-blocked storage, or when another bot holds an interval overlapping
//!    `[T + k·hop, T + (k+1)·hop)` at the candidate's hop depth `k`.
//! 3. On success each path node `k` is reserved for exactly that slot.
//! 4. On failure the table is left untouched.
//!
//! Reservations are first-come-first-served and never revoked in favour of
//! another bot.  A bot re-planning releases its own earlier reservations.
//! Intervals are half-open: a slot `[5, 6)` is free again at `t = 6`.

pub mod error;
pub mod planner;
pub mod reservation;
pub mod shared;


pub use error::{PlanError, PlanResult};
pub use planner::{
    AStarPlanner, CooperativeConfig, CooperativePlanner, PathPlanner, ReservationHorizon,
    SimplePlanner,
};
pub use reservation::{Interval, ReservationTable};
pub use shared::SharedPlanner;
