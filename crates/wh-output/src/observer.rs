//! `OutputObserver<W>` — bridges the event bus to an `OutputWriter`.

use wh_sim::{Event, EventKind, EventSink, SinkResult};

use crate::{EventRow, OutputResult};
use crate::writer::OutputWriter;

/// An [`EventSink`] that writes every event it receives to `W`.
///
/// Buffered rows are flushed when `simulation_end` arrives and whenever the
/// bus flushes.  Write errors are returned to the bus, which counts and
/// logs them.
pub struct OutputObserver<W: OutputWriter> {
    writer: W,
}

impl<W: OutputWriter> OutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Finish the writer and return it.
    pub fn finish(mut self) -> OutputResult<W> {
        self.writer.finish()?;
        Ok(self.writer)
    }
}

impl<W: OutputWriter> EventSink for OutputObserver<W> {
    fn on_event(&mut self, event: &Event) -> SinkResult {
        self.writer.write_event(&EventRow::from(event))?;
        if event.kind == EventKind::SimulationEnd {
            self.writer.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> SinkResult {
        self.writer.flush()?;
        Ok(())
    }
}
