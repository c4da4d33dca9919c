//! `StatsTracker` — an event sink that accumulates run statistics.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use csv::Writer;

use wh_sim::{Event, EventKind, EventSink, SinkResult};

use crate::OutputResult;
use crate::metrics::{mean, percentile, throughput_per_hour};

/// State sampled every `snapshot_every` time steps.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    pub time:             f64,
    pub orders_completed: u64,
    /// Completed orders per second since the start.
    pub throughput:       f64,
    /// Share of bots moving or carrying a pod.
    pub utilization:      f64,
}

/// Event counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Totals {
    pub orders_created:   u64,
    pub orders_completed: u64,
    pub items_picked:     u64,
    pub collisions:       u64,
    pub pickups:          u64,
    pub setdowns:         u64,
    /// Waypoints reached by all bots.
    pub hops:             u64,
    pub time_steps:       u64,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Summary {
    pub totals:              Totals,
    pub simulation_time:     f64,
    pub total_distance:      f64,
    pub average_throughput:  f64,
    pub average_utilization: f64,
    pub throughput_per_hour: f64,
    pub mean_order_time:     f64,
    pub p95_order_time:      f64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.totals;
        writeln!(f, "simulated time      {:>10.1} s", self.simulation_time)?;
        writeln!(f, "orders created      {:>10}", t.orders_created)?;
        writeln!(f, "orders completed    {:>10}", t.orders_completed)?;
        writeln!(f, "items picked        {:>10}", t.items_picked)?;
        writeln!(f, "throughput          {:>10.2} orders/h", self.throughput_per_hour)?;
        writeln!(f, "mean order time     {:>10.1} s (p95 {:.1} s)", self.mean_order_time, self.p95_order_time)?;
        writeln!(f, "bot utilization     {:>10.1} %", self.average_utilization * 100.0)?;
        writeln!(f, "distance travelled  {:>10.1} m", self.total_distance)?;
        writeln!(f, "pickups / setdowns  {:>10} / {}", t.pickups, t.setdowns)?;
        write!(f, "collisions          {:>10}", t.collisions)
    }
}

/// Accumulates counters, per-bot distance, order processing times and
/// periodic snapshots from the event stream.
///
/// Subscribe it behind an `Arc<Mutex<_>>` to read it after the run.
#[derive(Clone, Debug)]
pub struct StatsTracker {
    snapshot_every: u64,
    totals:         Totals,
    /// Cumulative distance per bot id, from `bot_moved` events.
    distance:       BTreeMap<i64, f64>,
    order_times:    Vec<f64>,
    snapshots:      Vec<Snapshot>,
    last_time:      f64,
}

impl StatsTracker {
    /// `snapshot_every` is in time steps; `0` disables snapshots.
    pub fn new(snapshot_every: u64) -> Self {
        Self {
            snapshot_every,
            totals:      Totals::default(),
            distance:    BTreeMap::new(),
            order_times: Vec::new(),
            snapshots:   Vec::new(),
            last_time:   0.0,
        }
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Processing times of completed orders, in completion order.
    pub fn order_times(&self) -> &[f64] {
        &self.order_times
    }

    pub fn bot_distance(&self, bot: i64) -> f64 {
        self.distance.get(&bot).copied().unwrap_or(0.0)
    }

    pub fn total_distance(&self) -> f64 {
        self.distance.values().sum()
    }

    pub fn summary(&self) -> Summary {
        let throughputs: Vec<f64> = self.snapshots.iter().map(|s| s.throughput).collect();
        let utilizations: Vec<f64> = self.snapshots.iter().map(|s| s.utilization).collect();
        Summary {
            totals:              self.totals,
            simulation_time:     self.last_time,
            total_distance:      self.total_distance(),
            average_throughput:  mean(&throughputs),
            average_utilization: mean(&utilizations),
            throughput_per_hour: throughput_per_hour(self.totals.orders_completed, self.last_time),
            mean_order_time:     mean(&self.order_times),
            p95_order_time:      percentile(&self.order_times, 95.0),
        }
    }

    /// Write the snapshots to `path` as CSV.
    pub fn write_time_series(&self, path: &Path) -> OutputResult<()> {
        let mut w = Writer::from_path(path)?;
        w.write_record(["time", "orders_completed", "throughput", "utilization"])?;
        for s in &self.snapshots {
            w.write_record([
                format!("{:.3}", s.time),
                s.orders_completed.to_string(),
                s.throughput.to_string(),
                s.utilization.to_string(),
            ])?;
        }
        w.flush()?;
        Ok(())
    }

    fn record_time_step(&mut self, event: &Event) {
        self.totals.time_steps += 1;
        self.last_time = event.time;
        if self.snapshot_every == 0 || !self.totals.time_steps.is_multiple_of(self.snapshot_every) {
            return;
        }
        let busy = event.get_i64("busy_bots").unwrap_or(0);
        let bots = event.get_i64("bots").unwrap_or(0);
        let completed = self.totals.orders_completed;
        self.snapshots.push(Snapshot {
            time:             event.time,
            orders_completed: completed,
            throughput:       if event.time > 0.0 { completed as f64 / event.time } else { 0.0 },
            utilization:      if bots > 0 { busy as f64 / bots as f64 } else { 0.0 },
        });
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new(100)
    }
}

impl EventSink for StatsTracker {
    fn on_event(&mut self, event: &Event) -> SinkResult {
        if event.kind == EventKind::TimeStep {
            self.record_time_step(event);
            return Ok(());
        }
        let t = &mut self.totals;
        match event.kind {
            EventKind::BotMoved => {
                t.hops += 1;
                if let (Some(bot), Some(d)) = (event.get_i64("bot"), event.get_f64("distance")) {
                    let entry = self.distance.entry(bot).or_insert(0.0);
                    *entry = entry.max(d);
                }
            }
            EventKind::BotPickup => t.pickups += 1,
            EventKind::BotSetdown => t.setdowns += 1,
            EventKind::Collision => t.collisions += 1,
            EventKind::OrderCreated => t.orders_created += 1,
            EventKind::ItemPicked => t.items_picked += event.get_i64("count").unwrap_or(1).max(0) as u64,
            EventKind::OrderCompleted => {
                t.orders_completed += 1;
                if let Some(secs) = event.get_f64("processing_time") {
                    self.order_times.push(secs);
                }
            }
            EventKind::SimulationEnd => self.last_time = self.last_time.max(event.time),
            EventKind::SimulationStart | EventKind::TimeStep => {}
        }
        Ok(())
    }
}
