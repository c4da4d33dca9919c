//! `wh-output` — statistics and event export for the rust_wh warehouse
//! simulator.
//!
//! | Type               | Role                                                      |
//! |--------------------|-----------------------------------------------------------|
//! | [`StatsTracker`]   | Event sink: counters, distance, order times, snapshots    |
//! | [`CsvEventWriter`] | [`OutputWriter`] writing `events.csv`                     |
//! | [`OutputObserver`] | Event sink driving any [`OutputWriter`]                   |
//!
//! # Usage
//!
//! ```rust,ignore
//! use wh_output::{CsvEventWriter, OutputObserver, StatsTracker};
//!
//! let stats = Arc::new(Mutex::new(StatsTracker::new(100)));
//! let mut stepper = StepperBuilder::new(config, graph, fleet, planner)
//!     .subscribe(Arc::clone(&stats))
//!     .subscribe(OutputObserver::new(CsvEventWriter::create(Path::new("./output"))?))
//!     .build()?;
//! stepper.execute()?;
//! println!("{}", stats.lock().unwrap().summary());
//! ```

pub mod csv;
pub mod error;
pub mod metrics;
pub mod observer;
pub mod row;
pub mod stats;
pub mod writer;

#[cfg(test)]
mod tests;

pub use csv::{CsvEventWriter, EVENTS_FILE};
pub use error::{OutputError, OutputResult};
pub use observer::OutputObserver;
pub use row::EventRow;
pub use stats::{Snapshot, StatsTracker, Summary, Totals};
pub use writer::OutputWriter;
