//! Thread-shareable planner handle.
//!
//! Planning calls for different bots may come from different threads.  Each
//! call to [`SharedPlanner::plan`] holds the lock from search through commit,
//! so a commit by one bot is fully visible to any plan that acquires the lock
//! after it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use wh_core::{BotId, WaypointId};
use wh_spatial::{Path, WaypointGraph};

use crate::{PathPlanner, PlanResult};

/// Cloneable handle to one planner behind a mutex.
pub struct SharedPlanner<P> {
    inner: Arc<Mutex<P>>,
}

impl<P> Clone for SharedPlanner<P> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<P: PathPlanner> SharedPlanner<P> {
    pub fn new(planner: P) -> Self {
        Self { inner: Arc::new(Mutex::new(planner)) }
    }

    /// Lock the planner, recovering the guard if another holder panicked.
    pub fn lock(&self) -> MutexGuard<'_, P> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with shared access to the planner.
    pub fn with<R>(&self, f: impl FnOnce(&P) -> R) -> R {
        f(&self.lock())
    }
}

impl<P: PathPlanner> PathPlanner for SharedPlanner<P> {
    fn name(&self) -> &'static str {
        self.lock().name()
    }

    fn plan(
        &mut self,
        graph: &WaypointGraph,
        bot:   BotId,
        start: WaypointId,
        goal:  WaypointId,
        now:   f64,
    ) -> PlanResult<Path> {
        self.lock().plan(graph, bot, start, goal, now)
    }

    fn maintain(&mut self, now: f64) -> PlanResult<()> {
        self.lock().maintain(now)
    }

    fn release(&mut self, bot: BotId) {
        self.lock().release(bot)
    }

    fn replan_interval(&self) -> Option<usize> {
        self.lock().replan_interval()
    }
}
