//! The `Stepper` and its tick loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use wh_agent::{Fleet, MotionOutcome};
use wh_core::{BotId, Point, PodId, SimClock, SimConfig, WaypointId};
use wh_planner::PathPlanner;
use wh_spatial::{Path, WaypointGraph};

use crate::context::{self, Arrival, ControlContext};
use crate::{Controller, Event, EventBus, SimResult};

#[cfg(feature = "fx-hash")]
type PairSet = rustc_hash::FxHashSet<(BotId, BotId)>;
#[cfg(not(feature = "fx-hash"))]
type PairSet = std::collections::HashSet<(BotId, BotId)>;

// ── Run state ─────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
}

/// Cloneable handle that asks a running [`Stepper::execute`] to stop.
///
/// The request is honoured before the next tick starts.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Outcome of one [`Stepper::execute`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RunSummary {
    /// Steps taken by this call.
    pub steps:         u64,
    pub final_time:    f64,
    pub stopped_early: bool,
}

// ── Stepper ───────────────────────────────────────────────────────────────────

/// Discrete-time driver for the whole warehouse.
///
/// One [`step`][Self::step]:
///
/// 1. **Motion** — every bot runs `update(dt)` in registration order
///    (on Rayon with the `parallel` feature; results are consumed in the
///    same order).  Carried pods follow their bots.  A `bot_moved` event is
///    emitted per waypoint reached.
/// 2. **Collisions** — pairs of bots whose discs start to overlap emit a
///    `collision` event (when `config.detect_collisions`).
/// 3. **Control** — the controller sees the arrivals and may plan, pick up,
///    set down and emit events.
/// 4. **Maintenance** — the planner prunes reservations ending at or before
///    the pre-advance time.  A broken reservation invariant aborts here.
/// 5. **Advance** — the clock moves by `dt` and a `time_step` event carries
///    the new time.
///
/// Create via [`StepperBuilder`][crate::StepperBuilder].
pub struct Stepper<P: PathPlanner, C: Controller> {
    pub config:     SimConfig,
    pub clock:      SimClock,
    pub graph:      WaypointGraph,
    pub fleet:      Fleet,
    pub planner:    P,
    pub controller: C,
    pub bus:        EventBus,

    pub(crate) state:     RunState,
    pub(crate) stop:      StopHandle,
    pub(crate) steps:     u64,
    pub(crate) colliding: PairSet,
    pub(crate) arrivals:  Vec<Arrival>,
    pub(crate) pending:   Vec<Event>,
}

impl<P: PathPlanner, C: Controller> Stepper<P, C> {
    // ── Queries ───────────────────────────────────────────────────────────

    /// Current simulated time in seconds.
    #[inline]
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Steps taken since construction.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Bots currently moving or carrying a pod.
    pub fn busy_bots(&self) -> usize {
        self.fleet
            .bots()
            .iter()
            .filter(|b| b.is_carrying() || !b.path().is_empty())
            .count()
    }

    // ── Commands ──────────────────────────────────────────────────────────

    /// Ask `execute` to stop before its next tick.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Plan `bot` to `goal` departing now and hand it the path.
    pub fn plan(&mut self, bot: BotId, goal: WaypointId) -> SimResult<Path> {
        let now = self.clock.now();
        context::plan_route(&self.graph, &mut self.fleet, &mut self.planner, bot, goal, now)
    }

    pub fn pickup(&mut self, bot: BotId, pod: PodId) -> SimResult<()> {
        let event = context::pickup(&mut self.graph, &mut self.fleet, bot, pod, self.clock.now())?;
        self.bus.publish(&event);
        Ok(())
    }

    pub fn setdown(&mut self, bot: BotId) -> SimResult<PodId> {
        let (pod, event) = context::setdown(&mut self.graph, &mut self.fleet, bot, self.clock.now())?;
        self.bus.publish(&event);
        Ok(pod)
    }

    /// Advance the simulation by one tick.
    pub fn step(&mut self) -> SimResult<()> {
        let now = self.clock.now();

        self.motion_phase(now);
        if self.config.detect_collisions {
            self.detect_collisions(now);
        }
        self.flush_pending();

        let result = self.with_context(|c, ctx| c.on_tick(ctx));
        self.flush_pending();
        result?;

        self.planner.maintain(now)?;

        self.clock.advance();
        self.steps += 1;
        let event = Event::time_step(
            self.clock.now(),
            self.clock.current_tick,
            self.busy_bots(),
            self.fleet.bot_count(),
        );
        self.bus.publish(&event);
        Ok(())
    }

    /// Run until the horizon is reached or [`stop`][Self::stop] is called.
    ///
    /// Publishes `simulation_start` first and `simulation_end` last, also
    /// when a step fails.
    pub fn execute(&mut self) -> SimResult<RunSummary> {
        self.stop.reset();
        self.state = RunState::Running;
        let first_step = self.steps;

        info!(
            controller = self.controller.name(),
            planner = self.planner.name(),
            bots = self.fleet.bot_count(),
            pods = self.fleet.pod_count(),
            clock = %self.clock,
            "simulation starting"
        );
        self.bus.publish(&Event::simulation_start(
            self.clock.now(),
            self.fleet.bot_count(),
            self.fleet.pod_count(),
            self.graph.waypoint_count(),
        ));

        let result = self.run_loop();

        self.state = RunState::Stopped;
        let summary = RunSummary {
            steps:         self.steps - first_step,
            final_time:    self.clock.now(),
            stopped_early: self.stop.is_stopped(),
        };
        self.bus.publish(&Event::simulation_end(summary.final_time, summary.steps, summary.stopped_early));
        self.bus.flush();
        info!(
            steps = summary.steps,
            time = summary.final_time,
            stopped_early = summary.stopped_early,
            "simulation finished"
        );
        result.map(|()| summary)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn run_loop(&mut self) -> SimResult<()> {
        let result = self.with_context(|c, ctx| c.on_start(ctx));
        self.flush_pending();
        result?;

        let interval = self.config.progress_interval_steps;
        while !self.stop.is_stopped() && !self.clock.at_horizon() {
            self.step()?;
            if interval > 0 && self.steps.is_multiple_of(interval) {
                info!(
                    step = self.steps,
                    time = self.clock.now(),
                    remaining = self.clock.remaining_steps(),
                    busy = self.busy_bots(),
                    "progress"
                );
            }
        }

        let result = self.with_context(|c, ctx| c.on_end(ctx));
        self.flush_pending();
        result
    }

    fn with_context<R>(&mut self, f: impl FnOnce(&mut C, &mut ControlContext<'_>) -> R) -> R {
        let Self { clock, graph, fleet, planner, controller, arrivals, pending, .. } = self;
        let mut ctx = ControlContext::new(
            clock.now(),
            clock.current_tick,
            clock.step_secs,
            graph,
            fleet,
            planner,
            arrivals,
            pending,
        );
        f(controller, &mut ctx)
    }

    fn motion_phase(&mut self, now: f64) {
        let dt    = self.clock.step_secs;
        let graph = &self.graph;

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<MotionOutcome> = self
            .fleet
            .bots_mut()
            .iter_mut()
            .map(|b| b.update(dt, graph))
            .collect();

        #[cfg(feature = "parallel")]
        let outcomes: Vec<MotionOutcome> = {
            use rayon::prelude::*;
            self.fleet
                .bots_mut()
                .par_iter_mut()
                .map(|b| b.update(dt, graph))
                .collect()
        };

        self.fleet.sync_carried_pods();
        self.arrivals.clear();
        for (bot, out) in self.fleet.bots().iter().zip(&outcomes) {
            if let Some(waypoint) = out.arrived {
                self.arrivals.push(Arrival { bot: bot.id, waypoint });
                self.pending.push(Event::bot_moved(
                    now,
                    bot.id,
                    waypoint,
                    bot.position,
                    bot.distance_travelled,
                ));
            }
        }
    }

    /// Emit a collision event for each pair whose discs overlap now but did
    /// not at the end of the previous tick.
    fn detect_collisions(&mut self, now: f64) {
        let bots = self.fleet.bots();
        let mut current = PairSet::default();
        for (i, a) in bots.iter().enumerate() {
            for b in &bots[i + 1..] {
                if !a.position.discs_overlap(a.radius, b.position, b.radius) {
                    continue;
                }
                let pair = (a.id, b.id);
                if !self.colliding.contains(&pair) {
                    let mid = Point::new((a.position.x + b.position.x) / 2.0, (a.position.y + b.position.y) / 2.0);
                    self.pending.push(Event::collision(now, a.id, b.id, mid));
                }
                current.insert(pair);
            }
        }
        self.colliding = current;
    }

    fn flush_pending(&mut self) {
        for event in self.pending.drain(..) {
            self.bus.publish(&event);
        }
    }
}
