//! The `OutputWriter` trait implemented by backend writers.

use crate::{EventRow, OutputResult};

/// A destination for event rows.
///
/// Driven by [`OutputObserver`][crate::OutputObserver], which turns bus
/// events into [`EventRow`]s.
pub trait OutputWriter: Send {
    fn write_event(&mut self, row: &EventRow) -> OutputResult<()>;

    /// Flush buffered rows to the underlying file.
    fn flush(&mut self) -> OutputResult<()>;

    /// Flush and close.  Idempotent; later writes fail with
    /// [`OutputError::Finished`][crate::OutputError::Finished].
    fn finish(&mut self) -> OutputResult<()>;
}
