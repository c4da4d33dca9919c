//! Controller configuration.
//!
//! Every section has defaults, so a JSON file only needs the keys it
//! changes:
//!
//! ```json
//! {
//!   "pathfinding":     { "method": "WHCAvStar", "window": 10 },
//!   "task_assignment": "balanced",
//!   "pod_selection":   "random",
//!   "orders":          { "interval_secs": 20.0 }
//! }
//! ```

use wh_planner::{
    AStarPlanner, CooperativeConfig, CooperativePlanner, PathPlanner, PlanResult, ReservationHorizon,
    SimplePlanner,
};

use crate::{AssignmentMethod, ControlError, ControlResult, SelectionMethod};

// ── Pathfinding ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PathfindingMethod {
    /// Windowed hierarchical cooperative A* over a shared reservation table.
    #[default]
    #[cfg_attr(feature = "serde", serde(alias = "WHCAvStar", alias = "whcav_star"))]
    WhcaStar,
    #[cfg_attr(feature = "serde", serde(alias = "AStar"))]
    AStar,
    #[cfg_attr(feature = "serde", serde(alias = "Simple"))]
    Simple,
}

#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PathfindingConfig {
    pub method:       PathfindingMethod,
    /// Planning window in hops.  Only used by `WhcaStar`.
    pub window:       usize,
    pub hop_duration: f64,
    pub horizon:      ReservationHorizon,
}

impl Default for PathfindingConfig {
    fn default() -> Self {
        let coop = CooperativeConfig::default();
        Self {
            method:       PathfindingMethod::default(),
            window:       coop.window,
            hop_duration: coop.hop_duration,
            horizon:      coop.horizon,
        }
    }
}

impl PathfindingConfig {
    /// Construct the configured planner.
    pub fn build(&self) -> PlanResult<Box<dyn PathPlanner>> {
        Ok(match self.method {
            PathfindingMethod::WhcaStar => Box::new(CooperativePlanner::new(CooperativeConfig {
                window:       self.window,
                hop_duration: self.hop_duration,
                horizon:      self.horizon,
                ..CooperativeConfig::default()
            })?),
            PathfindingMethod::AStar => Box::new(AStarPlanner::default()),
            PathfindingMethod::Simple => Box::new(SimplePlanner::new()),
        })
    }
}

// ── Order and bundle generation ───────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OrderGenConfig {
    /// Generate random orders and inbound bundles.  When off, orders only
    /// arrive through `FulfillmentController::submit_order`.
    pub enabled:              bool,
    /// Seconds between generated orders.
    pub interval_secs:        f64,
    pub min_lines:            u32,
    pub max_lines:            u32,
    /// Upper bound on the quantity of one order line.
    pub max_quantity:         u32,
    /// Priorities are drawn from `1..=max_priority`.
    pub max_priority:         u32,
    /// Seconds between inbound bundles per input station.  `0` disables
    /// replenishment.
    pub bundle_interval_secs: f64,
    pub bundle_max_count:     u32,
}

impl Default for OrderGenConfig {
    fn default() -> Self {
        Self {
            enabled:              true,
            interval_secs:        30.0,
            min_lines:            1,
            max_lines:            3,
            max_quantity:         2,
            max_priority:         10,
            bundle_interval_secs: 60.0,
            bundle_max_count:     10,
        }
    }
}

// ── Stations ──────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StationConfig {
    /// Orders an output station holds, including the one in progress.
    pub output_capacity:      usize,
    /// Seconds per item picked at an output station.
    pub item_pick_time:       f64,
    /// Seconds per item stocked at an input station.
    pub item_transfer_time:   f64,
    /// Fixed handling time per bundle at an input station.
    pub bundle_transfer_time: f64,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            output_capacity:      10,
            item_pick_time:       1.0,
            item_transfer_time:   2.0,
            bundle_transfer_time: 3.0,
        }
    }
}

// ── ControllerConfig ──────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ControllerConfig {
    pub pathfinding:        PathfindingConfig,
    pub task_assignment:    AssignmentMethod,
    pub pod_selection:      SelectionMethod,
    pub orders:             OrderGenConfig,
    pub stations:           StationConfig,
    /// Seconds to wait before re-planning after no path was found.
    pub retry_backoff_secs: f64,
    /// Failed plans after which a task that has not yet picked up its pod is
    /// abandoned.
    pub max_plan_attempts:  u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            pathfinding:        PathfindingConfig::default(),
            task_assignment:    AssignmentMethod::default(),
            pod_selection:      SelectionMethod::default(),
            orders:             OrderGenConfig::default(),
            stations:           StationConfig::default(),
            retry_backoff_secs: 2.0,
            max_plan_attempts:  25,
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> ControlResult<()> {
        let o = &self.orders;
        let s = &self.stations;
        let non_negative = |name: &str, v: f64| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(ControlError::Config(format!("{name} must be finite and non-negative, got {v}")))
            }
        };

        non_negative("pathfinding.hop_duration", self.pathfinding.hop_duration)?;
        if self.pathfinding.hop_duration == 0.0 || self.pathfinding.window == 0 {
            return Err(ControlError::Config("pathfinding window and hop_duration must be positive".into()));
        }
        non_negative("orders.interval_secs", o.interval_secs)?;
        non_negative("orders.bundle_interval_secs", o.bundle_interval_secs)?;
        non_negative("stations.item_pick_time", s.item_pick_time)?;
        non_negative("stations.item_transfer_time", s.item_transfer_time)?;
        non_negative("stations.bundle_transfer_time", s.bundle_transfer_time)?;
        non_negative("retry_backoff_secs", self.retry_backoff_secs)?;

        if o.enabled && o.interval_secs == 0.0 {
            return Err(ControlError::Config("orders.interval_secs must be positive".into()));
        }
        if o.min_lines == 0 || o.min_lines > o.max_lines {
            return Err(ControlError::Config(format!(
                "order lines must satisfy 1 <= min_lines <= max_lines, got {}..={}",
                o.min_lines, o.max_lines
            )));
        }
        if o.max_quantity == 0 || o.max_priority == 0 || o.bundle_max_count == 0 {
            return Err(ControlError::Config(
                "max_quantity, max_priority and bundle_max_count must be at least 1".into(),
            ));
        }
        if s.output_capacity == 0 {
            return Err(ControlError::Config("stations.output_capacity must be at least 1".into()));
        }
        if self.max_plan_attempts == 0 {
            return Err(ControlError::Config("max_plan_attempts must be at least 1".into()));
        }
        Ok(())
    }
}
