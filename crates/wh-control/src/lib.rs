//! `wh-control` — order fulfillment on top of the `wh-sim` stepper.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                        |
//! |----------------|-----------------------------------------------------------------|
//! | [`config`]     | `ControllerConfig`, `PathfindingConfig`, `OrderGenConfig`, `StationConfig` |
//! | [`order`]      | `Order`, `OrderBook`                                            |
//! | [`station`]    | `OutputStation`, `InputStation`, `ItemBundle`, `Stations`       |
//! | [`assignment`] | `AssignmentMethod`, free-bot filter, bot choice                 |
//! | [`selection`]  | `SelectionMethod`, `PodSelector`, pod candidates                |
//! | [`controller`] | `FulfillmentController`, `Task`, `TaskKind`, `Phase`            |
//! | [`events`]     | `order_created`, `item_picked`, `order_completed` events        |
//! | [`error`]      | `ControlError`, `ControlResult<T>`                              |
//!
//! # Cargo features
//!
//! | Feature | Effect                                                   |
//! |---------|----------------------------------------------------------|
//! | `serde` | `Serialize`/`Deserialize` for the configuration types.   |
//!
//! # Example
//!
//! ```rust,ignore
//! let config  = ControllerConfig::default();
//! let planner = config.pathfinding.build()?;
//! let control = FulfillmentController::new(config, &graph, rng.child(7))?;
//! let mut stepper = StepperBuilder::new(sim_config, graph, fleet, planner)
//!     .controller(control)
//!     .build()?;
//! stepper.execute()?;
//! ```

pub mod assignment;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod order;
pub mod selection;
pub mod station;

#[cfg(test)]
mod tests;

pub use assignment::{AssignmentMethod, URGENT_PRIORITY};
pub use config::{ControllerConfig, OrderGenConfig, PathfindingConfig, PathfindingMethod, StationConfig};
pub use controller::{FulfillmentController, Phase, Task, TaskKind, stock_levels};
pub use error::{ControlError, ControlResult};
pub use order::{Order, OrderBook};
pub use selection::{PodSelector, SelectionMethod};
pub use station::{InputStation, ItemBundle, OutputStation, Stations};
