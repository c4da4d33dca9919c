//! `FulfillmentController`: orders in, pods to stations, pods back.
//!
//! # Per-tick order
//!
//! 1. Announce orders submitted from outside since the last tick.
//! 2. Generate orders and inbound bundles when their intervals elapse.
//! 3. Move backlogged orders onto output stations with room.
//! 4. Advance every task (below).
//! 5. Dispatch free bots: one pick task per output station's current
//!    order, one replenish task per input station's head bundle.
//!
//! # Task lifecycle
//!
//! ```text
//! ToPod ──pickup──▶ ToStation ──arrive──▶ AtStation{until} ──work──▶ ReturnPod ──setdown──▶ done
//! ```
//!
//! A task whose plan fails waits `retry_backoff_secs` and tries again.
//! Tasks that have not yet picked up their pod are abandoned after
//! `max_plan_attempts` failures.  When the planner bounds its window, a
//! moving bot re-plans after that many hops.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use wh_agent::{ARRIVAL_EPSILON, Fleet};
use wh_core::{BotId, ItemId, OrderId, PodId, SimRng, StationId, WaypointId};
use wh_sim::{ControlContext, Controller, SimResult};
use wh_spatial::WaypointGraph;

use crate::assignment::{choose_bot, free_bots};
use crate::selection::{PodSelector, candidates};
use crate::{ControlResult, ControllerConfig, ItemBundle, OrderBook, Stations, events};

/// Slack for comparing accumulated simulated times.
const TIME_EPSILON: f64 = 1e-9;

// ── Tasks ─────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaskKind {
    /// Bring a pod holding items of `order` to an output station.
    Pick { order: OrderId, station: StationId },
    /// Bring a pod with room for `bundle` to an input station.
    Replenish { station: StationId, bundle: ItemBundle },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Phase {
    ToPod,
    ToStation,
    AtStation { until: f64 },
    ReturnPod,
}

#[derive(Clone, Debug)]
pub struct Task {
    pub kind:     TaskKind,
    pub pod:      PodId,
    pub phase:    Phase,
    /// Storage waypoint the pod was picked up from.
    pub home:     WaypointId,
    /// Waypoint the current phase drives to.
    pub goal:     WaypointId,
    /// Consecutive failed plans.
    pub attempts: u32,
    retry_at:        f64,
    hops_since_plan: usize,
}

// ── FulfillmentController ─────────────────────────────────────────────────────

pub struct FulfillmentController {
    config:         ControllerConfig,
    rng:            SimRng,
    selector:       PodSelector,
    orders:         OrderBook,
    stations:       Stations,
    tasks:          BTreeMap<BotId, Task>,
    claimed:        BTreeSet<PodId>,
    completed:      BTreeMap<BotId, u64>,
    unannounced:    Vec<OrderId>,
    catalog:        Vec<ItemId>,
    next_order_at:  f64,
    next_bundle_at: f64,
    abandoned:      u64,
}

impl FulfillmentController {
    /// Stations are read from `graph`'s attachments.  `rng` drives order
    /// generation; pod selection gets a child stream.
    pub fn new(config: ControllerConfig, graph: &WaypointGraph, mut rng: SimRng) -> ControlResult<Self> {
        config.validate()?;
        let stations = Stations::from_graph(graph, &config.stations);
        let selector = PodSelector::new(config.pod_selection, rng.child(1));
        Ok(Self {
            config,
            rng,
            selector,
            orders:         OrderBook::new(),
            stations,
            tasks:          BTreeMap::new(),
            claimed:        BTreeSet::new(),
            completed:      BTreeMap::new(),
            unannounced:    Vec::new(),
            catalog:        Vec::new(),
            next_order_at:  0.0,
            next_bundle_at: 0.0,
            abandoned:      0,
        })
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn orders(&self) -> &OrderBook {
        &self.orders
    }

    pub fn stations(&self) -> &Stations {
        &self.stations
    }

    pub fn tasks(&self) -> &BTreeMap<BotId, Task> {
        &self.tasks
    }

    pub fn task(&self, bot: BotId) -> Option<&Task> {
        self.tasks.get(&bot)
    }

    pub fn tasks_completed(&self, bot: BotId) -> u64 {
        self.completed.get(&bot).copied().unwrap_or(0)
    }

    pub fn abandoned_tasks(&self) -> u64 {
        self.abandoned
    }

    /// Items known to the warehouse; inbound bundles draw from these.
    pub fn catalog(&self) -> &[ItemId] {
        &self.catalog
    }

    // ── Commands ──────────────────────────────────────────────────────────

    /// Add an order and route it to the least loaded output station, or the
    /// backlog when all are full.  Its `order_created` event is published on
    /// the next tick.
    pub fn submit_order(
        &mut self,
        lines:    impl IntoIterator<Item = (ItemId, u32)>,
        priority: u32,
        now:      f64,
    ) -> ControlResult<OrderId> {
        let id = self.orders.create(lines, priority, now)?;
        self.route_order(id)?;
        self.unannounced.push(id);
        Ok(id)
    }

    /// Queue an inbound bundle at an input station.
    pub fn add_bundle(&mut self, station: StationId, bundle: ItemBundle) -> ControlResult<()> {
        self.stations.input_mut(station)?.add_bundle(bundle);
        if let Err(i) = self.catalog.binary_search(&bundle.item) {
            self.catalog.insert(i, bundle.item);
        }
        Ok(())
    }

    // ── Orders and bundles ────────────────────────────────────────────────

    fn route_order(&mut self, id: OrderId) -> ControlResult<()> {
        match self.stations.least_loaded_output() {
            Some(station) => {
                self.stations.output_mut(station)?.assign_order(id)?;
                self.orders.get_mut(id)?.station = Some(station);
            }
            None => self.orders.defer(id),
        }
        Ok(())
    }

    fn drain_backlog(&mut self) -> ControlResult<()> {
        while self.orders.backlog_len() > 0 {
            let Some(station) = self.stations.least_loaded_output() else { break };
            let Some(id) = self.orders.next_deferred() else { break };
            self.stations.output_mut(station)?.assign_order(id)?;
            self.orders.get_mut(id)?.station = Some(station);
            debug!(order = %id, %station, "backlogged order assigned");
        }
        Ok(())
    }

    fn generate_orders(&mut self, ctx: &mut ControlContext<'_>) -> SimResult<()> {
        let cfg = self.config.orders;
        while ctx.now + TIME_EPSILON >= self.next_order_at {
            self.next_order_at += cfg.interval_secs;

            let stock = stock_levels(ctx.fleet);
            let mut in_stock: Vec<ItemId> = stock.keys().copied().collect();
            if in_stock.is_empty() {
                debug!(time = ctx.now, "no stock to generate an order from");
                continue;
            }
            self.rng.shuffle(&mut in_stock);
            let line_count = self.rng.gen_range(cfg.min_lines..=cfg.max_lines) as usize;
            let mut lines = Vec::with_capacity(line_count);
            for &item in in_stock.iter().take(line_count) {
                let quantity = self.rng.gen_range(1..=cfg.max_quantity);
                lines.push((item, quantity.min(stock[&item])));
            }
            let priority = self.rng.gen_range(1..=cfg.max_priority);

            let id = self.orders.create(lines, priority, ctx.now)?;
            self.route_order(id)?;
            let order = self.orders.get(id)?;
            debug!(order = %id, items = order.total_items(), priority, "order created");
            ctx.emit(events::order_created(ctx.now, order));
        }
        Ok(())
    }

    fn generate_bundles(&mut self, now: f64) {
        let cfg = self.config.orders;
        if cfg.bundle_interval_secs <= 0.0 || self.catalog.is_empty() {
            return;
        }
        while now + TIME_EPSILON >= self.next_bundle_at {
            self.next_bundle_at += cfg.bundle_interval_secs;
            for station in &mut self.stations.input {
                let Some(&item) = self.rng.choose(&self.catalog) else { return };
                let count = self.rng.gen_range(1..=cfg.bundle_max_count);
                station.add_bundle(ItemBundle { item, count });
                debug!(station = %station.id, %item, count, "bundle arrived");
            }
        }
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    fn dispatch(&mut self, ctx: &mut ControlContext<'_>) -> SimResult<()> {
        let mut free = free_bots(ctx.fleet, |b| self.tasks.contains_key(&b));

        let current: Vec<(StationId, OrderId, WaypointId)> = self
            .stations
            .output
            .iter()
            .filter_map(|s| s.current().map(|o| (s.id, o, s.waypoint)))
            .collect();
        for (station, order, waypoint) in current {
            if free.is_empty() {
                return Ok(());
            }
            let served = self
                .tasks
                .values()
                .any(|t| matches!(t.kind, TaskKind::Pick { order: o, .. } if o == order));
            if served {
                continue;
            }
            let o = self.orders.get(order)?;
            let pods = candidates(ctx.fleet, &self.claimed, |p| {
                o.outstanding_lines().any(|(item, _)| p.has_item(item, 1))
            });
            let priority = o.priority;
            let Some(pod) = self.selector.select(ctx.fleet, &pods, ctx.graph.position(waypoint)) else {
                continue;
            };
            self.start_task(ctx, &mut free, TaskKind::Pick { order, station }, pod, priority)?;
        }

        let inbound: Vec<(StationId, ItemBundle, WaypointId)> = self
            .stations
            .input
            .iter()
            .filter_map(|s| s.next_bundle().map(|b| (s.id, b, s.waypoint)))
            .collect();
        for (station, bundle, waypoint) in inbound {
            if free.is_empty() {
                return Ok(());
            }
            let served = self
                .tasks
                .values()
                .any(|t| matches!(t.kind, TaskKind::Replenish { station: s, .. } if s == station));
            if served {
                continue;
            }
            let pods = candidates(ctx.fleet, &self.claimed, |p| p.available_capacity() >= bundle.count);
            let Some(pod) = self.selector.select(ctx.fleet, &pods, ctx.graph.position(waypoint)) else {
                continue;
            };
            self.start_task(ctx, &mut free, TaskKind::Replenish { station, bundle }, pod, 0)?;
        }
        Ok(())
    }

    fn start_task(
        &mut self,
        ctx:      &mut ControlContext<'_>,
        free:     &mut Vec<BotId>,
        kind:     TaskKind,
        pod:      PodId,
        priority: u32,
    ) -> SimResult<()> {
        let p = ctx.fleet.pod(pod)?;
        let Some(home) = p.resident() else { return Ok(()) };
        let target = p.position;
        let method = self.config.task_assignment;
        let Some(bot) = choose_bot(method, ctx.fleet, free, &self.completed, target, priority) else {
            return Ok(());
        };
        free.retain(|&b| b != bot);
        self.claimed.insert(pod);

        let mut task = Task {
            kind,
            pod,
            phase:           Phase::ToPod,
            home,
            goal:            home,
            attempts:        0,
            retry_at:        ctx.now,
            hops_since_plan: 0,
        };
        debug!(%bot, %pod, ?kind, "task assigned");
        if at_waypoint(ctx, bot, home)? || self.plan(ctx, bot, &mut task)? {
            self.tasks.insert(bot, task);
        }
        Ok(())
    }

    // ── Task progression ──────────────────────────────────────────────────

    fn advance_tasks(&mut self, ctx: &mut ControlContext<'_>) -> SimResult<()> {
        let bots: Vec<BotId> = self.tasks.keys().copied().collect();
        for bot in bots {
            let Some(mut task) = self.tasks.remove(&bot) else { continue };
            task.hops_since_plan += ctx.arrivals.iter().filter(|a| a.bot == bot).count();
            if self.step_task(ctx, bot, &mut task)? {
                self.tasks.insert(bot, task);
            }
        }
        Ok(())
    }

    /// Returns `false` once the task is finished or abandoned.
    fn step_task(&mut self, ctx: &mut ControlContext<'_>, bot: BotId, task: &mut Task) -> SimResult<bool> {
        if !at_waypoint(ctx, bot, task.goal)? {
            return self.keep_moving(ctx, bot, task);
        }

        match task.phase {
            Phase::ToPod => {
                match ctx.pickup(bot, task.pod) {
                    Ok(()) => {}
                    Err(e) if e.is_invalid_operation() => {
                        debug!(%bot, pod = %task.pod, error = %e, "pickup refused, dropping task");
                        self.claimed.remove(&task.pod);
                        self.abandoned += 1;
                        return Ok(false);
                    }
                    Err(e) => return Err(e),
                }
                task.phase = Phase::ToStation;
                task.goal = self.station_waypoint(task.kind)?;
                task.retry_at = ctx.now;
                self.plan(ctx, bot, task)
            }
            Phase::ToStation => {
                let dwell = self.dwell_time(ctx.fleet, task)?;
                task.phase = Phase::AtStation { until: ctx.now + dwell };
                Ok(true)
            }
            Phase::AtStation { until } => {
                if ctx.now + TIME_EPSILON < until {
                    return Ok(true);
                }
                self.work_at_station(ctx, task)?;
                task.phase = Phase::ReturnPod;
                task.goal = self.return_slot(ctx, bot, task)?;
                task.retry_at = ctx.now;
                self.plan(ctx, bot, task)
            }
            Phase::ReturnPod => {
                if ctx.graph.occupant(task.goal).is_some() {
                    task.goal = self.return_slot(ctx, bot, task)?;
                    return self.plan(ctx, bot, task);
                }
                ctx.setdown(bot)?;
                self.claimed.remove(&task.pod);
                *self.completed.entry(bot).or_insert(0) += 1;
                debug!(%bot, pod = %task.pod, waypoint = %task.goal, "task finished");
                Ok(false)
            }
        }
    }

    fn keep_moving(&mut self, ctx: &mut ControlContext<'_>, bot: BotId, task: &mut Task) -> SimResult<bool> {
        if ctx.now + TIME_EPSILON < task.retry_at {
            return Ok(true);
        }
        let idle = ctx.fleet.bot(bot)?.is_idle();
        let replan_due = ctx
            .planner
            .replan_interval()
            .is_some_and(|n| task.hops_since_plan >= n);
        if idle || replan_due {
            return self.plan(ctx, bot, task);
        }
        Ok(true)
    }

    /// Plan `bot` to `task.goal`.  A missing path schedules a retry; returns
    /// `false` when the task is abandoned instead.
    fn plan(&mut self, ctx: &mut ControlContext<'_>, bot: BotId, task: &mut Task) -> SimResult<bool> {
        match ctx.plan(bot, task.goal) {
            Ok(path) => {
                task.attempts = 0;
                task.hops_since_plan = 0;
                debug!(%bot, goal = %task.goal, hops = path.waypoints.len(), phase = ?task.phase, "planned");
                Ok(true)
            }
            Err(e) if e.is_path_not_found() => {
                task.attempts += 1;
                task.retry_at = ctx.now + self.config.retry_backoff_secs;
                let give_up = task.phase == Phase::ToPod
                    && task.attempts >= self.config.max_plan_attempts
                    && ctx.fleet.bot(bot)?.is_idle();
                if give_up {
                    debug!(%bot, pod = %task.pod, attempts = task.attempts, "abandoning unreachable pod");
                    self.claimed.remove(&task.pod);
                    self.abandoned += 1;
                    return Ok(false);
                }
                debug!(%bot, goal = %task.goal, attempts = task.attempts, "no path, retrying later");
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    fn station_waypoint(&self, kind: TaskKind) -> ControlResult<WaypointId> {
        Ok(match kind {
            TaskKind::Pick { station, .. } => self.stations.output(station)?.waypoint,
            TaskKind::Replenish { station, .. } => self.stations.input(station)?.waypoint,
        })
    }

    fn dwell_time(&self, fleet: &Fleet, task: &Task) -> SimResult<f64> {
        Ok(match task.kind {
            TaskKind::Pick { order, station } => {
                let pod = fleet.pod(task.pod)?;
                let items: u32 = self
                    .orders
                    .get(order)?
                    .outstanding_lines()
                    .map(|(item, n)| n.min(pod.item_count(item)))
                    .sum();
                self.stations.output(station)?.pick_duration(items)
            }
            TaskKind::Replenish { station, bundle } => self.stations.input(station)?.transfer_duration(&bundle),
        })
    }

    fn work_at_station(&mut self, ctx: &mut ControlContext<'_>, task: &Task) -> SimResult<()> {
        match task.kind {
            TaskKind::Pick { order, station } => {
                let lines: Vec<(ItemId, u32)> = self.orders.get(order)?.outstanding_lines().collect();
                for (item, wanted) in lines {
                    let pod = ctx.fleet.pod_mut(task.pod)?;
                    let take = wanted.min(pod.item_count(item));
                    if take == 0 {
                        continue;
                    }
                    pod.remove_items(item, take)?;
                    self.orders.get_mut(order)?.record_pick(item, take);
                    self.stations.output_mut(station)?.pick_items(take);
                    ctx.emit(events::item_picked(ctx.now, order, station, task.pod, item, take));
                }

                if self.orders.get(order)?.is_complete() {
                    let done = self.orders.complete(order, ctx.now)?;
                    debug!(order = %order, %station, processing_time = ?done.processing_time(), "order completed");
                    ctx.emit(events::order_completed(ctx.now, done, station));
                    let s = self.stations.output_mut(station)?;
                    s.complete_order();
                    s.process_order();
                }
            }
            TaskKind::Replenish { station, bundle } => {
                let pod = ctx.fleet.pod_mut(task.pod)?;
                let count = bundle.count.min(pod.available_capacity());
                if count > 0 {
                    pod.add_items(bundle.item, count)?;
                }
                self.stations.input_mut(station)?.process_bundle();
                debug!(%station, pod = %task.pod, item = %bundle.item, count, "bundle stocked");
            }
        }
        Ok(())
    }

    /// Where to return the task's pod: its home when free and not promised
    /// to another task, else the nearest such storage waypoint.
    fn return_slot(&self, ctx: &ControlContext<'_>, bot: BotId, task: &Task) -> SimResult<WaypointId> {
        let promised: BTreeSet<WaypointId> = self
            .tasks
            .values()
            .flat_map(|t| [Some(t.home), (t.phase == Phase::ReturnPod).then_some(t.goal)])
            .flatten()
            .collect();
        let usable = |w: WaypointId| ctx.graph.occupant(w).is_none() && !promised.contains(&w);
        if usable(task.home) {
            return Ok(task.home);
        }
        let from = ctx.fleet.bot(bot)?.position;
        Ok(ctx
            .graph
            .available_storage()
            .into_iter()
            .filter(|&w| usable(w))
            .map(|w| (ctx.graph.position(w).distance(from), w))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map_or(task.home, |(_, w)| w))
    }
}

impl Controller for FulfillmentController {
    fn name(&self) -> &'static str {
        "fulfillment"
    }

    fn on_start(&mut self, ctx: &mut ControlContext<'_>) -> SimResult<()> {
        let known: BTreeSet<ItemId> = ctx
            .fleet
            .pods()
            .iter()
            .flat_map(|p| p.items().map(|(item, _)| item))
            .chain(self.catalog.iter().copied())
            .collect();
        self.catalog = known.into_iter().collect();
        self.next_order_at = ctx.now;
        self.next_bundle_at = ctx.now + self.config.orders.bundle_interval_secs;
        info!(
            output_stations = self.stations.output.len(),
            input_stations = self.stations.input.len(),
            items = self.catalog.len(),
            "fulfillment controller started"
        );
        Ok(())
    }

    fn on_tick(&mut self, ctx: &mut ControlContext<'_>) -> SimResult<()> {
        for id in std::mem::take(&mut self.unannounced) {
            ctx.emit(events::order_created(ctx.now, self.orders.get(id)?));
        }
        if self.config.orders.enabled {
            self.generate_orders(ctx)?;
            self.generate_bundles(ctx.now);
        }
        self.drain_backlog()?;
        for station in &mut self.stations.output {
            station.process_order();
        }
        self.advance_tasks(ctx)?;
        self.dispatch(ctx)
    }

    fn on_end(&mut self, ctx: &mut ControlContext<'_>) -> SimResult<()> {
        info!(
            time = ctx.now,
            orders = self.orders.len(),
            completed = self.orders.completed_count(),
            backlog = self.orders.backlog_len(),
            open_tasks = self.tasks.len(),
            abandoned = self.abandoned,
            "fulfillment controller finished"
        );
        Ok(())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Units per item held by pods, resting or carried.  Items with no stock
/// are omitted.
pub fn stock_levels(fleet: &Fleet) -> BTreeMap<ItemId, u32> {
    let mut stock = BTreeMap::new();
    for pod in fleet.pods() {
        for (item, n) in pod.items() {
            *stock.entry(item).or_insert(0) += n;
        }
    }
    stock.retain(|_, n| *n > 0);
    stock
}

/// `bot` has no path left and stands on `w`.
fn at_waypoint(ctx: &ControlContext<'_>, bot: BotId, w: WaypointId) -> SimResult<bool> {
    let b = ctx.fleet.bot(bot)?;
    Ok(b.path().is_empty()
        && b.current_waypoint == Some(w)
        && ctx.graph.contains(w)
        && ctx.graph.position(w).distance(b.position) < ARRIVAL_EPSILON)
}
