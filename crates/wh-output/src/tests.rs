//! Unit and integration tests for wh-output.

use tempfile::TempDir;

use wh_core::{BotId, Point, PodId, Tick};
use wh_sim::{Event, EventKind, EventSink};

use crate::{CsvEventWriter, EVENTS_FILE, EventRow, OutputError, OutputObserver, OutputWriter, StatsTracker};

fn tmp() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

fn read_rows(dir: &TempDir) -> Vec<csv::StringRecord> {
    let mut rdr = csv::Reader::from_path(dir.path().join(EVENTS_FILE)).unwrap();
    rdr.records().map(|r| r.unwrap()).collect()
}

fn completed(time: f64, secs: f64) -> Event {
    Event::new(EventKind::OrderCompleted, time).with("processing_time", secs)
}

// ── Rows ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod rows {
    use super::*;

    #[test]
    fn payload_is_joined_in_key_order() {
        let e = Event::bot_pickup(1.5, BotId(2), PodId(4), Point::new(1.0, 2.5));
        let row = EventRow::from(&e);
        assert_eq!(row.time, 1.5);
        assert_eq!(row.event, "bot_pickup");
        assert_eq!(row.data, "bot=2;pod=4;x=1;y=2.5");
    }

    #[test]
    fn empty_payload() {
        let row = EventRow::from(&Event::new(EventKind::SimulationStart, 0.0));
        assert_eq!(row.data, "");
    }
}

// ── CSV ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_tests {
    use super::*;

    #[test]
    fn creates_file_with_header() {
        let dir = tmp();
        let mut w = CsvEventWriter::create(dir.path()).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join(EVENTS_FILE)).unwrap();
        let headers: Vec<_> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(headers, ["time", "event", "data"]);
        assert!(read_rows(&dir).is_empty());
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tmp();
        let nested = dir.path().join("runs").join("a");
        let _w = CsvEventWriter::create(&nested).unwrap();
        assert!(nested.join(EVENTS_FILE).exists());
    }

    #[test]
    fn rows_are_written_in_order() {
        let dir = tmp();
        let mut w = CsvEventWriter::create(dir.path()).unwrap();
        w.write_event(&EventRow::from(&Event::simulation_start(0.0, 2, 1, 9))).unwrap();
        w.write_event(&EventRow::from(&Event::collision(0.25, BotId(0), BotId(1), Point::new(0.5, 0.0))))
            .unwrap();
        assert_eq!(w.rows(), 2);
        w.finish().unwrap();

        let rows = read_rows(&dir);
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "0.000");
        assert_eq!(&rows[0][1], "simulation_start");
        assert_eq!(&rows[0][2], "bots=2;pods=1;waypoints=9");
        assert_eq!(&rows[1][0], "0.250");
        assert_eq!(&rows[1][1], "collision");
        assert_eq!(&rows[1][2], "bot=0;other=1;x=0.5;y=0");
    }

    #[test]
    fn finish_is_idempotent_and_final() {
        let dir = tmp();
        let mut w = CsvEventWriter::create(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
        w.flush().unwrap();
        let err = w.write_event(&EventRow::from(&Event::new(EventKind::TimeStep, 0.1))).unwrap_err();
        assert!(matches!(err, OutputError::Finished));
    }

    #[test]
    fn observer_flushes_at_simulation_end() {
        let dir = tmp();
        let mut obs = OutputObserver::new(CsvEventWriter::create(dir.path()).unwrap());
        obs.on_event(&Event::simulation_start(0.0, 1, 0, 2)).unwrap();
        obs.on_event(&Event::time_step(0.1, Tick(1), 0, 1)).unwrap();
        obs.on_event(&Event::simulation_end(0.1, 1, false)).unwrap();

        // Readable before the observer is finished.
        let rows = read_rows(&dir);
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[2][1], "simulation_end");

        let writer = obs.finish().unwrap();
        assert_eq!(writer.rows(), 3);
    }

    #[test]
    fn observer_reports_write_errors() {
        let dir = tmp();
        let mut writer = CsvEventWriter::create(dir.path()).unwrap();
        writer.finish().unwrap();
        let mut obs = OutputObserver::new(writer);
        assert!(obs.on_event(&Event::new(EventKind::TimeStep, 0.1)).is_err());
    }
}

// ── Statistics ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod stats {
    use super::*;
    use crate::metrics::{mean, percentile, throughput_per_hour};

    #[test]
    fn metric_helpers() {
        assert!((throughput_per_hour(3, 1800.0) - 6.0).abs() < 1e-9);
        assert_eq!(throughput_per_hour(3, 0.0), 0.0);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 6.0]), 3.0);
        let v = [5.0, 1.0, 3.0, 2.0, 4.0];
        assert_eq!(percentile(&v, 50.0), 3.0);
        assert_eq!(percentile(&v, 95.0), 5.0);
        assert_eq!(percentile(&v, 100.0), 5.0);
        assert_eq!(percentile(&[], 95.0), 0.0);
    }

    #[test]
    fn counts_events() {
        let mut s = StatsTracker::new(0);
        s.on_event(&Event::new(EventKind::OrderCreated, 0.0)).unwrap();
        s.on_event(&Event::new(EventKind::OrderCreated, 0.0)).unwrap();
        s.on_event(&Event::new(EventKind::ItemPicked, 1.0).with("count", 3u32)).unwrap();
        s.on_event(&completed(2.0, 2.0)).unwrap();
        s.on_event(&Event::bot_pickup(0.5, BotId(0), PodId(0), Point::ORIGIN)).unwrap();
        s.on_event(&Event::bot_setdown(3.0, BotId(0), PodId(0), None, Point::ORIGIN)).unwrap();
        s.on_event(&Event::collision(1.0, BotId(0), BotId(1), Point::ORIGIN)).unwrap();

        let t = s.totals();
        assert_eq!(t.orders_created, 2);
        assert_eq!(t.orders_completed, 1);
        assert_eq!(t.items_picked, 3);
        assert_eq!(t.pickups, 1);
        assert_eq!(t.setdowns, 1);
        assert_eq!(t.collisions, 1);
        assert_eq!(s.order_times(), &[2.0]);
        assert!(s.snapshots().is_empty());
    }

    #[test]
    fn distance_is_cumulative_per_bot() {
        let mut s = StatsTracker::new(0);
        let moved = |bot, d| Event::bot_moved(1.0, BotId(bot), wh_core::WaypointId(0), Point::ORIGIN, d);
        s.on_event(&moved(0, 1.0)).unwrap();
        s.on_event(&moved(0, 2.0)).unwrap();
        s.on_event(&moved(1, 4.0)).unwrap();
        assert_eq!(s.bot_distance(0), 2.0);
        assert_eq!(s.bot_distance(1), 4.0);
        assert_eq!(s.bot_distance(7), 0.0);
        assert_eq!(s.total_distance(), 6.0);
        assert_eq!(s.totals().hops, 3);
    }

    #[test]
    fn snapshots_every_n_steps() {
        let mut s = StatsTracker::new(2);
        s.on_event(&completed(0.1, 0.1)).unwrap();
        for k in 1..=4u64 {
            s.on_event(&Event::time_step(k as f64 * 0.5, Tick(k), 1, 4)).unwrap();
        }
        let snaps = s.snapshots();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].time, 1.0);
        assert_eq!(snaps[0].orders_completed, 1);
        assert_eq!(snaps[0].throughput, 1.0);
        assert_eq!(snaps[0].utilization, 0.25);
        assert_eq!(snaps[1].time, 2.0);
        assert_eq!(snaps[1].throughput, 0.5);
    }

    #[test]
    fn summary() {
        let mut s = StatsTracker::new(1);
        s.on_event(&completed(10.0, 4.0)).unwrap();
        s.on_event(&completed(20.0, 8.0)).unwrap();
        s.on_event(&Event::time_step(1800.0, Tick(1), 2, 2)).unwrap();
        s.on_event(&Event::simulation_end(1800.0, 1, false)).unwrap();

        let sum = s.summary();
        assert_eq!(sum.simulation_time, 1800.0);
        assert_eq!(sum.totals.orders_completed, 2);
        assert!((sum.throughput_per_hour - 4.0).abs() < 1e-9);
        assert_eq!(sum.mean_order_time, 6.0);
        assert_eq!(sum.p95_order_time, 8.0);
        assert_eq!(sum.average_utilization, 1.0);
        assert!(sum.to_string().contains("orders completed"));
    }

    #[test]
    fn time_series_csv() {
        let dir = tmp();
        let mut s = StatsTracker::new(1);
        s.on_event(&Event::time_step(0.5, Tick(1), 0, 2)).unwrap();
        s.on_event(&Event::time_step(1.0, Tick(2), 1, 2)).unwrap();
        let path = dir.path().join("timeseries.csv");
        s.write_time_series(&path).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][0], "1.000");
        assert_eq!(&rows[1][3], "0.5");
    }
}

// ── End to end ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod integration {
    use std::sync::{Arc, Mutex};

    use wh_agent::{BotKind, Fleet, Kinematics};
    use wh_core::{SimConfig, WaypointId};
    use wh_planner::AStarPlanner;
    use wh_sim::StepperBuilder;
    use wh_spatial::WaypointGraphBuilder;

    use super::*;

    #[test]
    fn stepper_run_is_exported() {
        let mut b = WaypointGraphBuilder::new();
        for x in 0..4 {
            b.add_waypoint(Point::new(x as f64, 0.0), false);
        }
        for x in 0..3 {
            b.add_edge(WaypointId(x), WaypointId(x + 1)).unwrap();
        }
        let graph = b.build();
        let mut fleet = Fleet::new();
        fleet.add_bot_at(&graph, WaypointId(0), BotKind::Standard, 0.3, Kinematics::default()).unwrap();

        let config = SimConfig {
            time_step:               0.1,
            duration:                10.0,
            seed:                    1,
            progress_interval_steps: 0,
            detect_collisions:       true,
        };
        let dir = tmp();
        let stats = Arc::new(Mutex::new(StatsTracker::new(10)));
        let mut stepper = StepperBuilder::new(config, graph, fleet, AStarPlanner::default())
            .subscribe(Arc::clone(&stats))
            .subscribe(OutputObserver::new(CsvEventWriter::create(dir.path()).unwrap()))
            .build()
            .unwrap();
        stepper.plan(BotId(0), WaypointId(3)).unwrap();
        stepper.execute().unwrap();

        let rows = read_rows(&dir);
        assert_eq!(&rows[0][1], "simulation_start");
        assert_eq!(&rows[rows.len() - 1][1], "simulation_end");
        let moved = rows.iter().filter(|r| &r[1] == "bot_moved").count();
        let steps = rows.iter().filter(|r| &r[1] == "time_step").count();
        assert_eq!(moved, 3);
        assert_eq!(steps, 100);

        let stats = stats.lock().unwrap();
        assert_eq!(stats.totals().hops, 3);
        assert_eq!(stats.totals().time_steps, 100);
        assert_eq!(stats.snapshots().len(), 10);
        assert!((stats.total_distance() - 3.0).abs() < 1e-3);
        assert!((stats.summary().simulation_time - 10.0).abs() < 1e-9);
    }
}
