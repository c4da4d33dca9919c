//! Event sinks: the subscriber side of the [`EventBus`][crate::EventBus].

use std::sync::{Arc, Mutex, PoisonError};

use crate::{Event, EventKind};

/// Error type a sink may return.  The bus logs it and carries on.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

pub type SinkResult = Result<(), SinkError>;

/// Receives every event published on the bus it is subscribed to, in
/// publication order.
///
/// Sinks only ever see `&Event`; a sink that errors or keeps bad state of
/// its own cannot reach back into the simulation.
///
/// # Example — collision counter
///
/// ```rust,ignore
/// struct Collisions(u64);
///
/// impl EventSink for Collisions {
///     fn on_event(&mut self, event: &Event) -> SinkResult {
///         if event.kind == EventKind::Collision {
///             self.0 += 1;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait EventSink: Send {
    fn on_event(&mut self, event: &Event) -> SinkResult;

    /// Called after the simulation-end event of each run.
    fn flush(&mut self) -> SinkResult {
        Ok(())
    }
}

/// Lets the caller keep a handle to a sink after handing a clone to the bus.
impl<S: EventSink> EventSink for Arc<Mutex<S>> {
    fn on_event(&mut self, event: &Event) -> SinkResult {
        self.lock().unwrap_or_else(PoisonError::into_inner).on_event(event)
    }

    fn flush(&mut self) -> SinkResult {
        self.lock().unwrap_or_else(PoisonError::into_inner).flush()
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn on_event(&mut self, event: &Event) -> SinkResult {
        (**self).on_event(event)
    }

    fn flush(&mut self) -> SinkResult {
        (**self).flush()
    }
}

/// A sink that ignores everything.
pub struct NoopSink;

impl EventSink for NoopSink {
    fn on_event(&mut self, _event: &Event) -> SinkResult {
        Ok(())
    }
}

/// Records every event it receives.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for EventLog {
    fn on_event(&mut self, event: &Event) -> SinkResult {
        self.events.push(event.clone());
        Ok(())
    }
}
