//! Fluent builder for constructing a [`Stepper`].

use wh_agent::{Fleet, PodStatus};
use wh_core::SimConfig;
use wh_planner::PathPlanner;
use wh_spatial::WaypointGraph;

use crate::stepper::{RunState, StopHandle};
use crate::{Controller, EventBus, EventKind, EventSink, NoopController, SimError, SimResult, Stepper};

/// Fluent builder for [`Stepper<P, C>`].
///
/// # Required inputs
///
/// - [`SimConfig`] — step, horizon, seed, …
/// - [`WaypointGraph`] with pods already placed
/// - [`Fleet`] of bots and pods
/// - `P: PathPlanner`
///
/// # Optional inputs
///
/// | Method               | Default              |
/// |----------------------|----------------------|
/// | `.controller(c)`     | [`NoopController`]   |
/// | `.subscribe(s)`      | no subscribers       |
/// | `.subscribe_to(k, s)`| no subscribers       |
///
/// # Example
///
/// ```rust,ignore
/// let mut stepper = StepperBuilder::new(config, graph, fleet, CooperativePlanner::new(cfg)?)
///     .controller(FulfillmentController::new(control_cfg, &graph, rng)?)
///     .subscribe(OutputObserver::new(CsvEventWriter::create(out_dir)?))
///     .build()?;
/// stepper.execute()?;
/// ```
pub struct StepperBuilder<P: PathPlanner, C: Controller = NoopController> {
    config:     SimConfig,
    graph:      WaypointGraph,
    fleet:      Fleet,
    planner:    P,
    controller: C,
    bus:        EventBus,
}

impl<P: PathPlanner> StepperBuilder<P, NoopController> {
    pub fn new(config: SimConfig, graph: WaypointGraph, fleet: Fleet, planner: P) -> Self {
        Self {
            config,
            graph,
            fleet,
            planner,
            controller: NoopController,
            bus:        EventBus::new(),
        }
    }
}

impl<P: PathPlanner, C: Controller> StepperBuilder<P, C> {
    /// Replace the controller.
    pub fn controller<C2: Controller>(self, controller: C2) -> StepperBuilder<P, C2> {
        StepperBuilder {
            config:  self.config,
            graph:   self.graph,
            fleet:   self.fleet,
            planner: self.planner,
            controller,
            bus:     self.bus,
        }
    }

    pub fn subscribe(mut self, sink: impl EventSink + 'static) -> Self {
        self.bus.subscribe(sink);
        self
    }

    pub fn subscribe_to(mut self, kinds: &[EventKind], sink: impl EventSink + 'static) -> Self {
        self.bus.subscribe_to(kinds, sink);
        self
    }

    /// Validate the configuration and the world, and return a stopped
    /// [`Stepper`].
    pub fn build(self) -> SimResult<Stepper<P, C>> {
        let clock = self.config.make_clock()?;

        for bot in self.fleet.bots() {
            bot.kinematics.validate()?;
            if !(bot.radius.is_finite() && bot.radius >= 0.0) {
                return Err(SimError::Config(format!("{} has invalid radius {}", bot.id, bot.radius)));
            }
            if let Some(w) = bot.current_waypoint {
                self.graph.check(w)?;
            }
        }
        for pod in self.fleet.pods() {
            if let PodStatus::Resident(w) = pod.status() {
                self.graph.check(w)?;
                if self.graph.occupant(w) != Some(pod.id) {
                    return Err(SimError::Config(format!(
                        "{} is resident on {w} but the graph does not record it there",
                        pod.id
                    )));
                }
            }
        }

        Ok(Stepper {
            clock,
            config:     self.config,
            graph:      self.graph,
            fleet:      self.fleet,
            planner:    self.planner,
            controller: self.controller,
            bus:        self.bus,
            state:      RunState::Stopped,
            stop:       StopHandle::default(),
            steps:      0,
            colliding:  Default::default(),
            arrivals:   Vec::new(),
            pending:    Vec::new(),
        })
    }
}
