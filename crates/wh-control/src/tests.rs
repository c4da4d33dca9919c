//! Unit tests for wh-control.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use wh_agent::{BotKind, Fleet, Kinematics};
use wh_core::{BotId, ItemId, OrderId, Point, PodId, SimConfig, SimRng, StationId, WaypointId};
use wh_planner::{CooperativeConfig, CooperativePlanner, PathPlanner};
use wh_sim::{EventKind, EventLog, Stepper, StepperBuilder};
use wh_spatial::{Attachment, WaypointGraph, WaypointGraphBuilder};

use crate::{
    AssignmentMethod, ControlError, ControllerConfig, FulfillmentController, InputStation, ItemBundle,
    Order, OrderBook, OutputStation, PathfindingMethod, PodSelector, SelectionMethod, StationConfig,
    Stations, assignment, selection,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const OUTPUT: StationId = StationId(0);
const INPUT: StationId = StationId(1);

fn w(i: u32) -> WaypointId {
    WaypointId(i)
}

fn item(i: u32) -> ItemId {
    ItemId(i)
}

/// A single aisle with storage above it and a station at each end.
///
/// ```text
///          w7  w8  w9  w10 w11         (storage, y = 1)
///          |   |   |   |   |
/// w13 ─ w0 ─ w1 ─ w2 ─ w3 ─ w4 ─ w5 ─ w6 ─ w12
/// (input)                                  (output)
/// ```
fn aisle() -> WaypointGraph {
    let mut b = WaypointGraphBuilder::new();
    for x in 0..7 {
        b.add_waypoint(Point::new(x as f64, 0.0), false);
    }
    for x in 1..6 {
        b.add_waypoint(Point::new(x as f64, 1.0), true);
    }
    let output = b.add_waypoint(Point::new(7.0, 0.0), false);
    let input = b.add_waypoint(Point::new(-1.0, 0.0), false);
    for x in 0..6 {
        b.add_edge(w(x), w(x + 1)).unwrap();
    }
    for x in 1..6 {
        b.add_edge(w(x), w(x + 6)).unwrap();
    }
    b.add_edge(w(6), output).unwrap();
    b.add_edge(w(0), input).unwrap();
    b.attach(output, Attachment::OutputStation(OUTPUT)).unwrap();
    b.attach(input, Attachment::InputStation(INPUT)).unwrap();
    b.build()
}

/// Bots on `bots`, and one pod per `(waypoint, item, count)`.
fn stocked(graph: &mut WaypointGraph, bots: &[u32], pods: &[(u32, u32, u32)]) -> Fleet {
    let mut fleet = Fleet::new();
    for &at in bots {
        fleet.add_bot_at(graph, w(at), BotKind::Standard, 0.3, Kinematics::default()).unwrap();
    }
    for &(at, it, count) in pods {
        let pod = fleet.add_pod(graph.position(w(at)), 100);
        fleet.place_pod(pod, w(at), graph).unwrap();
        fleet.pod_mut(pod).unwrap().add_items(item(it), count).unwrap();
    }
    fleet
}

fn sim_config(duration: f64) -> SimConfig {
    SimConfig {
        time_step:               0.1,
        duration,
        seed:                    11,
        progress_interval_steps: 0,
        detect_collisions:       true,
    }
}

/// Orders only arrive through `submit_order`.
fn manual_config() -> ControllerConfig {
    let mut config = ControllerConfig::default();
    config.orders.enabled = false;
    config
}

type Sim = Stepper<CooperativePlanner, FulfillmentController>;

fn stepper(
    graph:    WaypointGraph,
    fleet:    Fleet,
    control:  FulfillmentController,
    log:      &Arc<Mutex<EventLog>>,
    duration: f64,
) -> Sim {
    let planner = CooperativePlanner::new(CooperativeConfig::default()).unwrap();
    StepperBuilder::new(sim_config(duration), graph, fleet, planner)
        .controller(control)
        .subscribe(Arc::clone(log))
        .build()
        .unwrap()
}

fn count(log: &Arc<Mutex<EventLog>>, kind: EventKind) -> usize {
    log.lock().unwrap().count(kind)
}

// ── Orders ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod orders {
    use super::*;

    #[test]
    fn lines_are_merged_and_zeroes_dropped() {
        let o = Order::new(OrderId(0), [(item(1), 2), (item(2), 0), (item(1), 3)], 4, 1.5);
        assert_eq!(o.lines().collect::<Vec<_>>(), vec![(item(1), 5)]);
        assert_eq!(o.total_items(), 5);
        assert_eq!(o.line_count(), 1);
    }

    #[test]
    fn record_pick_clamps_to_outstanding() {
        let mut o = Order::new(OrderId(0), [(item(1), 2), (item(2), 1)], 1, 0.0);
        assert_eq!(o.record_pick(item(1), 5), 2);
        assert_eq!(o.record_pick(item(3), 1), 0);
        assert_eq!(o.outstanding(item(1)), 0);
        assert_eq!(o.outstanding_lines().collect::<Vec<_>>(), vec![(item(2), 1)]);
        assert!(!o.is_complete());
        o.record_pick(item(2), 1);
        assert!(o.is_complete());
        assert_eq!(o.picked_items(), 3);
    }

    #[test]
    fn processing_time_needs_completion() {
        let mut book = OrderBook::new();
        let id = book.create([(item(1), 1)], 1, 10.0).unwrap();
        assert_eq!(book.get(id).unwrap().processing_time(), None);
        book.complete(id, 14.5).unwrap();
        assert_eq!(book.get(id).unwrap().processing_time(), Some(4.5));
        // A second completion keeps the first stamp.
        book.complete(id, 20.0).unwrap();
        assert_eq!(book.get(id).unwrap().completed_at, Some(14.5));
        assert_eq!(book.completed_count(), 1);
        assert_eq!(book.pending().count(), 0);
    }

    #[test]
    fn ids_are_sequential() {
        let mut book = OrderBook::new();
        assert_eq!(book.create([(item(1), 1)], 1, 0.0).unwrap(), OrderId(0));
        assert_eq!(book.create([(item(2), 1)], 1, 0.0).unwrap(), OrderId(1));
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn empty_order_is_rejected() {
        let mut book = OrderBook::new();
        let err = book.create([(item(1), 0)], 1, 0.0).unwrap_err();
        assert!(matches!(err, ControlError::EmptyOrder));
        assert!(book.is_empty());
        // The rejected order does not consume an id.
        assert_eq!(book.create([(item(1), 1)], 1, 0.0).unwrap(), OrderId(0));
    }

    #[test]
    fn unknown_order() {
        let book = OrderBook::new();
        assert!(matches!(book.get(OrderId(3)), Err(ControlError::UnknownOrder(OrderId(3)))));
    }

    #[test]
    fn backlog_is_fifo() {
        let mut book = OrderBook::new();
        book.defer(OrderId(4));
        book.defer(OrderId(2));
        book.restore_deferred(OrderId(9));
        assert_eq!(book.backlog_len(), 3);
        assert_eq!(book.next_deferred(), Some(OrderId(9)));
        assert_eq!(book.next_deferred(), Some(OrderId(4)));
        assert_eq!(book.next_deferred(), Some(OrderId(2)));
        assert_eq!(book.next_deferred(), None);
    }
}

// ── Stations ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod stations {
    use super::*;

    fn small() -> StationConfig {
        StationConfig { output_capacity: 2, ..StationConfig::default() }
    }

    #[test]
    fn output_station_queue() {
        let mut s = OutputStation::new(OUTPUT, w(12), &small());
        assert_eq!(s.process_order(), None);
        s.assign_order(OrderId(1)).unwrap();
        s.assign_order(OrderId(2)).unwrap();
        assert!(s.is_full());
        let err = s.assign_order(OrderId(3)).unwrap_err();
        assert!(matches!(err, ControlError::StationFull { station: OUTPUT, capacity: 2 }));

        assert_eq!(s.process_order(), Some(OrderId(1)));
        // Still the same order until it is completed.
        assert_eq!(s.process_order(), Some(OrderId(1)));
        assert_eq!(s.pending_count(), 2);

        assert_eq!(s.complete_order(), Some(OrderId(1)));
        assert_eq!(s.orders_completed, 1);
        assert_eq!(s.current(), None);
        assert_eq!(s.process_order(), Some(OrderId(2)));
        assert_eq!(s.complete_order(), Some(OrderId(2)));
        assert_eq!(s.complete_order(), None);
        assert_eq!(s.orders_completed, 2);
    }

    #[test]
    fn pick_accounting() {
        let mut s = OutputStation::new(OUTPUT, w(12), &StationConfig::default());
        s.pick_items(3);
        s.pick_items(2);
        assert_eq!(s.items_picked, 5);
        assert_eq!(s.pick_duration(3), 3.0);
    }

    #[test]
    fn input_station_bundles() {
        let mut s = InputStation::new(INPUT, w(13), &StationConfig::default());
        assert_eq!(s.process_bundle(), None);
        s.add_bundle(ItemBundle { item: item(1), count: 4 });
        s.add_bundle(ItemBundle { item: item(2), count: 1 });
        assert_eq!(s.bundle_count(), 2);
        assert_eq!(s.next_bundle(), Some(ItemBundle { item: item(1), count: 4 }));

        let b = s.process_bundle().unwrap();
        assert_eq!(b.item, item(1));
        assert_eq!(s.bundles_processed, 1);
        assert_eq!(s.items_received, 4);
        assert_eq!(s.bundle_count(), 1);
        // 3 s handling plus 2 s per item.
        assert_eq!(s.transfer_duration(&b), 11.0);
    }

    #[test]
    fn found_through_attachments() {
        let stations = Stations::from_graph(&aisle(), &StationConfig::default());
        assert_eq!(stations.output.len(), 1);
        assert_eq!(stations.input.len(), 1);
        assert_eq!(stations.output(OUTPUT).unwrap().waypoint, w(12));
        assert_eq!(stations.input(INPUT).unwrap().waypoint, w(13));
        assert!(matches!(stations.output(INPUT), Err(ControlError::UnknownStation(INPUT))));
    }

    #[test]
    fn least_loaded_skips_full_and_breaks_ties_by_id() {
        let config = StationConfig { output_capacity: 1, ..StationConfig::default() };
        let mut stations = Stations {
            output: vec![
                OutputStation::new(StationId(5), w(0), &config),
                OutputStation::new(StationId(2), w(1), &config),
            ],
            input: Vec::new(),
        };
        assert_eq!(stations.least_loaded_output(), Some(StationId(2)));
        stations.output_mut(StationId(2)).unwrap().assign_order(OrderId(0)).unwrap();
        assert_eq!(stations.least_loaded_output(), Some(StationId(5)));
        stations.output_mut(StationId(5)).unwrap().assign_order(OrderId(1)).unwrap();
        assert_eq!(stations.least_loaded_output(), None);
    }
}

// ── Assignment and selection ──────────────────────────────────────────────────

#[cfg(test)]
mod choosing {
    use super::*;

    #[test]
    fn free_bots_filter() {
        let mut graph = aisle();
        let mut fleet = stocked(&mut graph, &[0, 3, 5, 6], &[(8, 1, 1)]);
        fleet.bot_mut(BotId(1)).unwrap().set_active(false);
        fleet.assign_path(BotId(2), &[w(5), w(4)], &graph).unwrap();

        let free = assignment::free_bots(&fleet, |b| b == BotId(3));
        assert_eq!(free, vec![BotId(0)]);

        let free = assignment::free_bots(&fleet, |_| false);
        assert_eq!(free, vec![BotId(0), BotId(3)]);
    }

    #[test]
    fn carrying_bot_is_not_free() {
        let mut graph = aisle();
        let mut fleet = stocked(&mut graph, &[0], &[(7, 1, 1)]);
        fleet.bot_mut(BotId(0)).unwrap().position = graph.position(w(7));
        fleet.bot_mut(BotId(0)).unwrap().current_waypoint = Some(w(7));
        fleet.pickup(BotId(0), PodId(0), &mut graph).unwrap();
        assert!(assignment::free_bots(&fleet, |_| false).is_empty());
    }

    #[test]
    fn bot_choice() {
        let mut graph = aisle();
        let fleet = stocked(&mut graph, &[0, 4, 6], &[]);
        let free = [BotId(0), BotId(1), BotId(2)];
        let target = Point::new(5.0, 1.0);
        let mut completed = BTreeMap::new();
        completed.insert(BotId(0), 3);
        completed.insert(BotId(1), 1);
        completed.insert(BotId(2), 1);

        let choose = |method, priority| assignment::choose_bot(method, &fleet, &free, &completed, target, priority);
        // w4 at (4, 0) and w6 at (6, 0) are equally far; the first listed wins.
        assert_eq!(choose(AssignmentMethod::Nearest, 0), Some(BotId(1)));
        assert_eq!(choose(AssignmentMethod::Balanced, 0), Some(BotId(1)));
        assert_eq!(choose(AssignmentMethod::Priority, 9), Some(BotId(1)));
        assert_eq!(choose(AssignmentMethod::Priority, 5), Some(BotId(0)));

        let none = assignment::choose_bot(AssignmentMethod::Nearest, &fleet, &[], &completed, target, 0);
        assert_eq!(none, None);
    }

    #[test]
    fn candidates_skip_claimed_and_unwanted() {
        let mut graph = aisle();
        let fleet = stocked(&mut graph, &[], &[(7, 1, 2), (8, 2, 2), (9, 1, 1)]);
        let claimed: BTreeSet<PodId> = [PodId(2)].into();
        let pods = selection::candidates(&fleet, &claimed, |p| p.has_item(item(1), 1));
        assert_eq!(pods, vec![PodId(0)]);
    }

    #[test]
    fn pod_choice() {
        let mut graph = aisle();
        let fleet = stocked(&mut graph, &[], &[(7, 1, 1), (9, 1, 1), (11, 1, 1)]);
        let all = [PodId(0), PodId(1), PodId(2)];
        let station = graph.position(w(12));

        let mut nearest = PodSelector::new(SelectionMethod::Nearest, SimRng::new(1));
        assert_eq!(nearest.select(&fleet, &all, station), Some(PodId(2)));

        let mut fixed = PodSelector::new(SelectionMethod::Fixed, SimRng::new(1));
        assert_eq!(fixed.select(&fleet, &all, station), Some(PodId(0)));
        assert_eq!(fixed.select(&fleet, &[], station), None);

        let mut a = PodSelector::new(SelectionMethod::Random, SimRng::new(5));
        let mut b = PodSelector::new(SelectionMethod::Random, SimRng::new(5));
        for _ in 0..10 {
            let pick = a.select(&fleet, &all, station);
            assert!(pick.is_some_and(|p| all.contains(&p)));
            assert_eq!(pick, b.select(&fleet, &all, station));
        }
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod config {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ControllerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.pathfinding.method, PathfindingMethod::WhcaStar);
        assert_eq!(config.pathfinding.window, 10);
        assert_eq!(config.task_assignment, AssignmentMethod::Nearest);
        assert_eq!(config.pod_selection, SelectionMethod::Nearest);
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = ControllerConfig::default();
        config.orders.min_lines = 4;
        assert!(matches!(config.validate(), Err(ControlError::Config(_))));

        let mut config = ControllerConfig::default();
        config.retry_backoff_secs = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = ControllerConfig::default();
        config.stations.output_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = ControllerConfig::default();
        config.pathfinding.window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn builds_each_planner() {
        let mut config = ControllerConfig::default();
        for (method, name) in [
            (PathfindingMethod::WhcaStar, "cooperative"),
            (PathfindingMethod::AStar, "astar"),
            (PathfindingMethod::Simple, "simple"),
        ] {
            config.pathfinding.method = method;
            let planner = config.pathfinding.build().unwrap();
            assert_eq!(planner.name(), name);
        }
    }

    #[test]
    fn controller_rejects_invalid_config() {
        let mut config = ControllerConfig::default();
        config.max_plan_attempts = 0;
        let err = FulfillmentController::new(config, &aisle(), SimRng::new(1)).err();
        assert!(matches!(err, Some(ControlError::Config(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn parses_partial_json() {
        let json = r#"{
            "pathfinding": { "method": "WHCAvStar", "window": 6 },
            "task_assignment": "balanced",
            "pod_selection": "random",
            "orders": { "interval_secs": 12.5 }
        }"#;
        let config: ControllerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.pathfinding.method, PathfindingMethod::WhcaStar);
        assert_eq!(config.pathfinding.window, 6);
        assert_eq!(config.task_assignment, AssignmentMethod::Balanced);
        assert_eq!(config.pod_selection, SelectionMethod::Random);
        assert_eq!(config.orders.interval_secs, 12.5);
        assert_eq!(config.orders.max_lines, 3);
        config.validate().unwrap();
    }
}

// ── Fulfillment ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod fulfillment {
    use super::*;

    #[test]
    fn order_is_picked_and_pod_returned() {
        let mut graph = aisle();
        let fleet = stocked(&mut graph, &[0], &[(7, 1, 5), (9, 2, 5)]);
        let mut control = FulfillmentController::new(manual_config(), &graph, SimRng::new(3)).unwrap();
        let order = control.submit_order([(item(1), 2)], 3, 0.0).unwrap();
        assert_eq!(control.orders().get(order).unwrap().station, Some(OUTPUT));

        let log = Arc::new(Mutex::new(EventLog::new()));
        let mut sim = stepper(graph, fleet, control, &log, 60.0);
        sim.execute().unwrap();

        let control = &sim.controller;
        let o = control.orders().get(order).unwrap();
        assert!(o.is_complete());
        assert!(o.processing_time().is_some_and(|t| t > 0.0));
        assert!(control.tasks().is_empty());
        assert_eq!(control.tasks_completed(BotId(0)), 1);
        assert_eq!(control.stations().output(OUTPUT).unwrap().orders_completed, 1);
        assert_eq!(control.stations().output(OUTPUT).unwrap().items_picked, 2);

        let pod = sim.fleet.pod(PodId(0)).unwrap();
        assert_eq!(pod.item_count(item(1)), 3);
        assert_eq!(pod.resident(), Some(w(7)));
        assert_eq!(sim.graph.occupant(w(7)), Some(PodId(0)));
        // The other pod was never touched.
        assert_eq!(sim.fleet.pod(PodId(1)).unwrap().times_moved, 0);

        assert_eq!(count(&log, EventKind::OrderCreated), 1);
        assert_eq!(count(&log, EventKind::ItemPicked), 1);
        assert_eq!(count(&log, EventKind::OrderCompleted), 1);
        assert_eq!(count(&log, EventKind::BotPickup), 1);
        assert_eq!(count(&log, EventKind::BotSetdown), 1);

        let log = log.lock().unwrap();
        let picked = log.of_kind(EventKind::ItemPicked).next().unwrap();
        assert_eq!(picked.get_i64("count"), Some(2));
        assert_eq!(picked.get_i64("pod"), Some(0));
        let order_at = |kind| log.events().iter().position(|e| e.kind == kind).unwrap();
        assert!(order_at(EventKind::OrderCreated) < order_at(EventKind::BotPickup));
        assert!(order_at(EventKind::BotPickup) < order_at(EventKind::ItemPicked));
        assert!(order_at(EventKind::OrderCompleted) < order_at(EventKind::BotSetdown));
    }

    #[test]
    fn order_spanning_two_pods() {
        let mut graph = aisle();
        let fleet = stocked(&mut graph, &[0], &[(7, 1, 5), (9, 2, 5)]);
        let mut control = FulfillmentController::new(manual_config(), &graph, SimRng::new(3)).unwrap();
        let order = control.submit_order([(item(1), 1), (item(2), 2)], 3, 0.0).unwrap();

        let log = Arc::new(Mutex::new(EventLog::new()));
        let mut sim = stepper(graph, fleet, control, &log, 120.0);
        sim.execute().unwrap();

        assert!(sim.controller.orders().get(order).unwrap().is_complete());
        assert_eq!(sim.controller.tasks_completed(BotId(0)), 2);
        assert_eq!(count(&log, EventKind::ItemPicked), 2);
        assert_eq!(count(&log, EventKind::OrderCompleted), 1);
        assert_eq!(sim.fleet.pod(PodId(1)).unwrap().item_count(item(2)), 3);
    }

    #[test]
    fn bundle_is_stocked_into_a_pod() {
        let mut graph = aisle();
        let fleet = stocked(&mut graph, &[0], &[(7, 1, 5)]);
        let mut control = FulfillmentController::new(manual_config(), &graph, SimRng::new(3)).unwrap();
        control.add_bundle(INPUT, ItemBundle { item: item(4), count: 6 }).unwrap();
        assert!(control.catalog().contains(&item(4)));
        assert!(matches!(
            control.add_bundle(OUTPUT, ItemBundle { item: item(4), count: 1 }),
            Err(ControlError::UnknownStation(OUTPUT))
        ));

        let log = Arc::new(Mutex::new(EventLog::new()));
        let mut sim = stepper(graph, fleet, control, &log, 90.0);
        sim.execute().unwrap();

        let input = sim.controller.stations().input(INPUT).unwrap();
        assert_eq!(input.bundles_processed, 1);
        assert_eq!(input.items_received, 6);
        let pod = sim.fleet.pod(PodId(0)).unwrap();
        assert_eq!(pod.item_count(item(4)), 6);
        assert_eq!(pod.item_count(item(1)), 5);
        assert_eq!(pod.resident(), Some(w(7)));
    }

    #[test]
    fn full_stations_backlog_orders() {
        let mut graph = aisle();
        let fleet = stocked(&mut graph, &[0], &[(7, 1, 5)]);
        let mut config = manual_config();
        config.stations.output_capacity = 1;
        let mut control = FulfillmentController::new(config, &graph, SimRng::new(3)).unwrap();
        let first = control.submit_order([(item(1), 1)], 1, 0.0).unwrap();
        let second = control.submit_order([(item(1), 1)], 1, 0.0).unwrap();
        assert_eq!(control.orders().backlog_len(), 1);
        assert_eq!(control.orders().get(second).unwrap().station, None);

        let log = Arc::new(Mutex::new(EventLog::new()));
        let mut sim = stepper(graph, fleet, control, &log, 120.0);
        sim.execute().unwrap();

        let orders = sim.controller.orders();
        assert!(orders.get(first).unwrap().is_complete());
        assert!(orders.get(second).unwrap().is_complete());
        assert_eq!(orders.get(second).unwrap().station, Some(OUTPUT));
        assert_eq!(orders.backlog_len(), 0);
        assert_eq!(sim.fleet.pod(PodId(0)).unwrap().item_count(item(1)), 3);
    }

    #[test]
    fn unreachable_pod_is_abandoned() {
        let mut graph = {
            let mut b = WaypointGraphBuilder::new();
            let a = b.add_waypoint(Point::new(0.0, 0.0), false);
            let s = b.add_waypoint(Point::new(1.0, 0.0), false);
            b.add_waypoint(Point::new(5.0, 5.0), true);
            b.add_edge(a, s).unwrap();
            b.attach(s, Attachment::OutputStation(OUTPUT)).unwrap();
            b.build()
        };
        let fleet = stocked(&mut graph, &[0], &[(2, 1, 5)]);
        let mut config = manual_config();
        config.max_plan_attempts = 2;
        config.retry_backoff_secs = 0.5;
        let mut control = FulfillmentController::new(config, &graph, SimRng::new(3)).unwrap();
        let order = control.submit_order([(item(1), 1)], 1, 0.0).unwrap();

        let log = Arc::new(Mutex::new(EventLog::new()));
        let mut sim = stepper(graph, fleet, control, &log, 5.0);
        sim.execute().unwrap();

        assert!(sim.controller.abandoned_tasks() >= 1);
        assert!(!sim.controller.orders().get(order).unwrap().is_complete());
        assert_eq!(sim.fleet.pod(PodId(0)).unwrap().resident(), Some(w(2)));
        assert_eq!(count(&log, EventKind::BotPickup), 0);
    }

    #[test]
    fn generator_creates_orders_on_interval() {
        let mut graph = aisle();
        let fleet = stocked(&mut graph, &[0, 6], &[(7, 1, 50), (9, 2, 50), (11, 3, 50)]);
        let mut config = ControllerConfig::default();
        config.orders.interval_secs = 5.0;
        config.orders.max_lines = 1;
        config.orders.bundle_interval_secs = 0.0;
        let control = FulfillmentController::new(config, &graph, SimRng::new(3)).unwrap();

        let log = Arc::new(Mutex::new(EventLog::new()));
        let mut sim = stepper(graph, fleet, control, &log, 60.0);
        sim.execute().unwrap();

        let orders = sim.controller.orders();
        assert_eq!(orders.len(), 12);
        assert_eq!(count(&log, EventKind::OrderCreated), 12);
        assert!(orders.completed_count() >= 1);
        for o in orders.iter() {
            assert_eq!(o.line_count(), 1);
            assert!((1..=10).contains(&o.priority));
            assert!(o.lines().all(|(_, n)| (1..=2).contains(&n)));
        }
    }

    #[test]
    fn runs_are_deterministic() {
        let run = || {
            let mut graph = aisle();
            let fleet = stocked(&mut graph, &[0, 6], &[(7, 1, 50), (9, 2, 50), (11, 3, 50)]);
            let mut config = ControllerConfig::default();
            config.orders.interval_secs = 4.0;
            config.orders.bundle_interval_secs = 15.0;
            config.pod_selection = SelectionMethod::Random;
            let control = FulfillmentController::new(config, &graph, SimRng::new(9)).unwrap();
            let log = Arc::new(Mutex::new(EventLog::new()));
            let mut sim = stepper(graph, fleet, control, &log, 45.0);
            sim.execute().unwrap();
            let events = log.lock().unwrap().events().to_vec();
            events
        };
        let a = run();
        assert!(a.iter().any(|e| e.kind == EventKind::OrderCreated));
        assert_eq!(a, run());
    }
}
