//! `wh-spatial` — waypoint graph, pod occupancy, and single-agent search.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                     |
//! |------------|--------------------------------------------------------------|
//! | [`graph`]  | `WaypointGraph` (CSR + R-tree + occupancy), `WaypointGraphBuilder`, `Attachment` |
//! | [`search`] | `AStar`, `Heuristic`, `Path`, `Candidate`                    |
//! | [`error`]  | `SpatialError`, `SpatialResult<T>`                           |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public value types.     |

pub mod error;
pub mod graph;
pub mod search;


pub use error::{SpatialError, SpatialResult};
pub use graph::{Attachment, WaypointGraph, WaypointGraphBuilder};
pub use search::{AStar, Candidate, Heuristic, Path};
