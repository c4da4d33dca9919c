//! CSV output backend.
//!
//! Creates `events.csv` in the output directory with columns
//! `time,event,data`.

use std::fs::{self, File};
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{EventRow, OutputError, OutputResult};

pub const EVENTS_FILE: &str = "events.csv";

/// Writes one CSV row per event.
pub struct CsvEventWriter {
    events:   Writer<File>,
    rows:     u64,
    finished: bool,
}

impl CsvEventWriter {
    /// Create `dir` if needed, open `dir/events.csv` (truncating it) and
    /// write the header row.
    pub fn create(dir: &Path) -> OutputResult<Self> {
        fs::create_dir_all(dir)?;
        let mut events = Writer::from_path(dir.join(EVENTS_FILE))?;
        events.write_record(["time", "event", "data"])?;
        Ok(Self { events, rows: 0, finished: false })
    }

    /// Data rows written so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }
}

impl OutputWriter for CsvEventWriter {
    fn write_event(&mut self, row: &EventRow) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        self.events.write_record([format!("{:.3}", row.time), row.event.to_owned(), row.data.clone()])?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        if !self.finished {
            self.events.flush()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.events.flush()?;
        self.finished = true;
        Ok(())
    }
}
