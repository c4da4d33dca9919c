//! `wh-sim` — discrete-time stepper and event stream for the rust_wh
//! warehouse simulator.
//!
//! # Tick loop
//!
//! ```text
//! execute():
//!   publish simulation_start
//!   controller.on_start
//!   while !stopped && !clock.at_horizon():
//!     step():
//!       ① Motion      — bot.update(dt) for every bot, registration order
//!       ② Collisions  — newly overlapping bot discs → collision events
//!       ③ Control     — controller.on_tick(ctx): plan / pickup / setdown
//!       ④ Maintain    — planner.maintain(now): prune expired reservations
//!       ⑤ Advance     — clock += dt; publish time_step(new time)
//!   controller.on_end
//!   publish simulation_end
//! ```
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`event`]      | `Event`, `EventKind`, `Value`                              |
//! | [`observer`]   | `EventSink` trait, `EventLog`, `NoopSink`                  |
//! | [`bus`]        | `EventBus`, `SubscriptionId`                               |
//! | [`controller`] | `Controller` trait, `NoopController`                       |
//! | [`context`]    | `ControlContext`, `Arrival`                                |
//! | [`stepper`]    | `Stepper`, `RunState`, `StopHandle`, `RunSummary`          |
//! | [`builder`]    | `StepperBuilder`                                           |
//! | [`error`]      | `SimError`, `SimResult<T>`                                 |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the motion phase on Rayon's thread pool.          |
//! | `fx-hash`  | FxHash for the collision pair set.                     |
//!
//! # Determinism
//!
//! Given the same world, seed, and registration order, two runs publish the
//! same event sequence.  The parallel motion phase collects results in bot
//! order, so enabling `parallel` does not change it.

pub mod builder;
pub mod bus;
pub mod context;
pub mod controller;
pub mod error;
pub mod event;
pub mod observer;
pub mod stepper;


pub use builder::StepperBuilder;
pub use bus::{EventBus, SubscriptionId};
pub use context::{Arrival, ControlContext, departure_waypoint};
pub use controller::{Controller, NoopController};
pub use error::{SimError, SimResult};
pub use event::{Event, EventKind, Value};
pub use observer::{EventLog, EventSink, NoopSink, SinkError, SinkResult};
pub use stepper::{RunState, RunSummary, StopHandle, Stepper};
