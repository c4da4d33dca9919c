//! `wh-agent` — bots, pods, and the arena that owns them.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                       |
//! |-----------|----------------------------------------------------------------|
//! | [`bot`]   | `Bot`, `BotKind`, `BotState`, `Kinematics`, `MotionOutcome`     |
//! | [`pod`]   | `Pod`, `PodStatus` — storage unit with item counts             |
//! | [`fleet`] | `Fleet` — arena of bots and pods; pickup / setdown / path assignment |
//! | [`error`] | `AgentError`, `AgentResult<T>`                                 |
//!
//! # Ownership
//!
//! Bots and pods reference each other by id only.  Every change to the
//! bot ↔ pod carrying relation goes through [`Fleet::pickup`] and
//! [`Fleet::setdown`], which update both sides (and the graph's occupancy)
//! in lockstep or not at all.

pub mod bot;
pub mod error;
pub mod fleet;
pub mod pod;


pub use bot::{ARRIVAL_EPSILON, Bot, BotKind, BotState, Kinematics, MotionOutcome};
pub use error::{AgentError, AgentResult};
pub use fleet::Fleet;
pub use pod::{Pod, PodStatus};
