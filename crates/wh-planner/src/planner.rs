//! The `PathPlanner` trait and its implementations.
//!
//! | Planner              | Search                | Blocks on                         |
//! |----------------------|-----------------------|-----------------------------------|
//! | `CooperativePlanner` | A*, Euclidean         | pod-occupied storage + other bots' reservations |
//! | `SimplePlanner`      | A*, Manhattan         | pod-occupied storage              |
//! | `AStarPlanner`       | A*, Euclidean         | nothing                           |
//!
//! The stepper and controllers only see `dyn PathPlanner` (or a generic
//! `P: PathPlanner`), so planners can be swapped without touching either.

use tracing::debug;

use wh_core::{BotId, WaypointId};
use wh_spatial::{AStar, Heuristic, Path, SpatialError, WaypointGraph};

use crate::{PlanError, PlanResult, ReservationTable};

// ── PathPlanner trait ─────────────────────────────────────────────────────────

/// Pluggable multi-agent planner.
///
/// `Send` so a planner can live inside a `Mutex` shared between threads
/// (see [`SharedPlanner`][crate::SharedPlanner]).
pub trait PathPlanner: Send {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Plan a route for `bot` from `start` to `goal`, departing at `now`.
    ///
    /// Returns [`PlanError::PathNotFound`] when no admissible route exists;
    /// the planner's state is then unchanged.
    fn plan(
        &mut self,
        graph: &WaypointGraph,
        bot:   BotId,
        start: WaypointId,
        goal:  WaypointId,
        now:   f64,
    ) -> PlanResult<Path>;

    /// Per-tick housekeeping, called with the pre-advance time.
    fn maintain(&mut self, _now: f64) -> PlanResult<()> {
        Ok(())
    }

    /// Forget everything held on behalf of `bot`.
    fn release(&mut self, _bot: BotId) {}

    /// Hops after which a bot should request a fresh plan, if bounded.
    fn replan_interval(&self) -> Option<usize> {
        None
    }

    /// The reservation table, for planners that keep one.
    fn reservations(&self) -> Option<&ReservationTable> {
        None
    }
}

impl<P: PathPlanner + ?Sized> PathPlanner for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn plan(
        &mut self,
        graph: &WaypointGraph,
        bot:   BotId,
        start: WaypointId,
        goal:  WaypointId,
        now:   f64,
    ) -> PlanResult<Path> {
        (**self).plan(graph, bot, start, goal, now)
    }

    fn maintain(&mut self, now: f64) -> PlanResult<()> {
        (**self).maintain(now)
    }

    fn release(&mut self, bot: BotId) {
        (**self).release(bot)
    }

    fn replan_interval(&self) -> Option<usize> {
        (**self).replan_interval()
    }

    fn reservations(&self) -> Option<&ReservationTable> {
        (**self).reservations()
    }
}

// ── CooperativePlanner ────────────────────────────────────────────────────────

/// How far ahead reservations are checked and committed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ReservationHorizon {
    /// Check and reserve every hop of the returned path.  The window is
    /// carried in the config but not enforced.
    #[default]
    Full,
    /// Check and reserve only path indices `0..=window`.  The planner
    /// reports `replan_interval() == Some(window)` so the controller
    /// requests a fresh plan after that many hops.
    Windowed,
}

#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CooperativeConfig {
    /// Planning window in hops.  Default: 10.
    pub window: usize,
    /// Time units spent per hop.  Default: 1.0.
    pub hop_duration: f64,
    pub horizon: ReservationHorizon,
    pub heuristic: Heuristic,
}

impl Default for CooperativeConfig {
    fn default() -> Self {
        Self {
            window:       10,
            hop_duration: 1.0,
            horizon:      ReservationHorizon::Full,
            heuristic:    Heuristic::Euclidean,
        }
    }
}

/// Windowed cooperative A* over a shared reservation table.
#[derive(Clone, Debug)]
pub struct CooperativePlanner {
    config: CooperativeConfig,
    search: AStar,
    table:  ReservationTable,
}

impl CooperativePlanner {
    pub fn new(config: CooperativeConfig) -> PlanResult<Self> {
        if !(config.hop_duration.is_finite() && config.hop_duration > 0.0) {
            return Err(PlanError::Config(format!(
                "hop duration must be positive, got {}",
                config.hop_duration
            )));
        }
        if config.window == 0 {
            return Err(PlanError::Config("window must be at least one hop".into()));
        }
        Ok(Self {
            search: AStar::new(config.heuristic),
            config,
            table:  ReservationTable::new(),
        })
    }

    pub fn config(&self) -> &CooperativeConfig {
        &self.config
    }

    pub fn table(&self) -> &ReservationTable {
        &self.table
    }

    /// Drop intervals ending at or before `now`.
    pub fn prune_expired(&mut self, now: f64) -> usize {
        self.table.prune_expired(now)
    }

    /// Slot `[T + k·hop, T + (k+1)·hop)` for path index `k`.
    #[inline]
    pub fn slot(&self, now: f64, k: usize) -> (f64, f64) {
        let h = self.config.hop_duration;
        (now + k as f64 * h, now + (k + 1) as f64 * h)
    }

    /// Number of leading path nodes that carry reservations.
    #[inline]
    fn reserved_len(&self, path_len: usize) -> usize {
        match self.config.horizon {
            ReservationHorizon::Full => path_len,
            ReservationHorizon::Windowed => path_len.min(self.config.window + 1),
        }
    }
}

impl PathPlanner for CooperativePlanner {
    fn name(&self) -> &'static str {
        "cooperative"
    }

    fn plan(
        &mut self,
        graph: &WaypointGraph,
        bot:   BotId,
        start: WaypointId,
        goal:  WaypointId,
        now:   f64,
    ) -> PlanResult<Path> {
        let horizon = self.reserved_len(usize::MAX);
        let hop     = self.config.hop_duration;
        let table   = &self.table;
        let path = self
            .search
            .find_path_with(graph, start, goal, |c| {
                if graph.is_blocked(c.waypoint) {
                    return true;
                }
                let k = c.hops as usize;
                if k >= horizon {
                    return false;
                }
                let (s, e) = (now + k as f64 * hop, now + (k + 1) as f64 * hop);
                table.conflict(c.waypoint, s, e, bot).is_some()
            })
            .map_err(|e| PlanError::from_search(bot, e))?;

        // Start and goal never reach the predicate.  Validate every node that
        // will be reserved before touching the table.
        let reserved = self.reserved_len(path.waypoints.len());
        for (k, &w) in path.waypoints.iter().enumerate().take(reserved) {
            let (s, e) = self.slot(now, k);
            if let Some(held) = self.table.conflict(w, s, e, bot) {
                debug!(
                    bot = %bot, waypoint = %w, holder = %held.owner,
                    "cooperative plan rejected: slot [{s:.2}, {e:.2}) already held"
                );
                return Err(PlanError::PathNotFound {
                    bot,
                    source: SpatialError::NoPath { from: start, to: goal },
                });
            }
        }

        let released = self.table.release_owner(bot);
        for (k, &w) in path.waypoints.iter().enumerate().take(reserved) {
            let (s, e) = self.slot(now, k);
            self.table.reserve(w, s, e, bot)?;
        }
        debug!(
            bot = %bot, from = %start, to = %goal, hops = path.hops(), reserved, released,
            "cooperative plan committed"
        );
        Ok(path)
    }

    fn maintain(&mut self, now: f64) -> PlanResult<()> {
        let pruned = self.table.prune_expired(now);
        if pruned > 0 {
            debug!(now, pruned, remaining = self.table.interval_count(), "pruned reservations");
        }
        self.table.check_invariants()
    }

    fn release(&mut self, bot: BotId) {
        self.table.release_owner(bot);
    }

    fn replan_interval(&self) -> Option<usize> {
        match self.config.horizon {
            ReservationHorizon::Full => None,
            ReservationHorizon::Windowed => Some(self.config.window),
        }
    }

    fn reservations(&self) -> Option<&ReservationTable> {
        Some(&self.table)
    }
}

// ── SimplePlanner ─────────────────────────────────────────────────────────────

/// Non-cooperative Manhattan A* that only avoids pod-occupied storage.
#[derive(Copy, Clone, Debug)]
pub struct SimplePlanner {
    search: AStar,
}

impl SimplePlanner {
    pub fn new() -> Self {
        Self { search: AStar::new(Heuristic::Manhattan) }
    }
}

impl Default for SimplePlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PathPlanner for SimplePlanner {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn plan(
        &mut self,
        graph: &WaypointGraph,
        bot:   BotId,
        start: WaypointId,
        goal:  WaypointId,
        _now:  f64,
    ) -> PlanResult<Path> {
        self.search
            .find_path_with(graph, start, goal, |c| graph.is_blocked(c.waypoint))
            .map_err(|e| PlanError::from_search(bot, e))
    }
}

// ── AStarPlanner ──────────────────────────────────────────────────────────────

/// Plain shortest-path planner; ignores pods and other bots.
#[derive(Copy, Clone, Debug, Default)]
pub struct AStarPlanner {
    search: AStar,
}

impl AStarPlanner {
    pub fn new(heuristic: Heuristic) -> Self {
        Self { search: AStar::new(heuristic) }
    }
}

impl PathPlanner for AStarPlanner {
    fn name(&self) -> &'static str {
        "astar"
    }

    fn plan(
        &mut self,
        graph: &WaypointGraph,
        bot:   BotId,
        start: WaypointId,
        goal:  WaypointId,
        _now:  f64,
    ) -> PlanResult<Path> {
        self.search
            .find_path(graph, start, goal)
            .map_err(|e| PlanError::from_search(bot, e))
    }
}
