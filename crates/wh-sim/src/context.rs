//! Mutable world view handed to the controller each tick, and the
//! `plan` / `pickup` / `setdown` commands shared with [`Stepper`][crate::Stepper].

use wh_agent::Fleet;
use wh_core::{BotId, PodId, Tick, WaypointId};
use wh_planner::PathPlanner;
use wh_spatial::{Path, WaypointGraph};

use crate::{Event, SimError, SimResult};

/// A bot that reached a waypoint during this tick's motion phase.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Arrival {
    pub bot:      BotId,
    pub waypoint: WaypointId,
}

/// Everything a [`Controller`][crate::Controller] may touch during one tick.
///
/// Built by the stepper after the motion phase.  `now` is the pre-advance
/// time; plans made through [`plan`][Self::plan] depart at `now`.  Events
/// emitted here are published, in order, once the controller returns.
pub struct ControlContext<'a> {
    pub now:      f64,
    pub tick:     Tick,
    pub dt:       f64,
    pub graph:    &'a mut WaypointGraph,
    pub fleet:    &'a mut Fleet,
    pub planner:  &'a mut dyn PathPlanner,
    pub arrivals: &'a [Arrival],
    events:       &'a mut Vec<Event>,
}

impl<'a> ControlContext<'a> {
    pub(crate) fn new(
        now:      f64,
        tick:     Tick,
        dt:       f64,
        graph:    &'a mut WaypointGraph,
        fleet:    &'a mut Fleet,
        planner:  &'a mut dyn PathPlanner,
        arrivals: &'a [Arrival],
        events:   &'a mut Vec<Event>,
    ) -> Self {
        Self { now, tick, dt, graph, fleet, planner, arrivals, events }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Plan `bot` to `goal` and hand it the path.
    pub fn plan(&mut self, bot: BotId, goal: WaypointId) -> SimResult<Path> {
        plan_route(self.graph, self.fleet, &mut *self.planner, bot, goal, self.now)
    }

    pub fn pickup(&mut self, bot: BotId, pod: PodId) -> SimResult<()> {
        let event = pickup(self.graph, self.fleet, bot, pod, self.now)?;
        self.emit(event);
        Ok(())
    }

    pub fn setdown(&mut self, bot: BotId) -> SimResult<PodId> {
        let (pod, event) = setdown(self.graph, self.fleet, bot, self.now)?;
        self.emit(event);
        Ok(pod)
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// The waypoint a new plan for `bot` starts from: the one it stands on, else
/// the one it is driving towards.
pub fn departure_waypoint(graph: &WaypointGraph, fleet: &Fleet, bot: BotId) -> SimResult<WaypointId> {
    let b = fleet.bot(bot)?;
    let on = b
        .current_waypoint
        .filter(|&w| graph.contains(w) && graph.position(w).distance(b.position) < wh_agent::ARRIVAL_EPSILON);
    on.or_else(|| b.next_waypoint()).ok_or(SimError::NotPlaced(bot))
}

pub(crate) fn plan_route(
    graph:   &WaypointGraph,
    fleet:   &mut Fleet,
    planner: &mut (impl PathPlanner + ?Sized),
    bot:     BotId,
    goal:    WaypointId,
    now:     f64,
) -> SimResult<Path> {
    let start = departure_waypoint(graph, fleet, bot)?;
    let path = planner.plan(graph, bot, start, goal, now)?;
    if let Err(e) = fleet.assign_path(bot, &path.waypoints, graph) {
        planner.release(bot);
        return Err(e.into());
    }
    Ok(path)
}

pub(crate) fn pickup(
    graph: &mut WaypointGraph,
    fleet: &mut Fleet,
    bot:   BotId,
    pod:   PodId,
    now:   f64,
) -> SimResult<Event> {
    fleet.pickup(bot, pod, graph)?;
    let position = fleet.bot(bot)?.position;
    Ok(Event::bot_pickup(now, bot, pod, position))
}

pub(crate) fn setdown(
    graph: &mut WaypointGraph,
    fleet: &mut Fleet,
    bot:   BotId,
    now:   f64,
) -> SimResult<(PodId, Event)> {
    let pod = fleet.setdown(bot, graph)?;
    let position = fleet.bot(bot)?.position;
    let resident = fleet.pod(pod)?.resident();
    Ok((pod, Event::bot_setdown(now, bot, pod, resident, position)))
}
