//! Synchronous, ordered event bus.
//!
//! `publish` hands the event to every matching subscriber in subscription
//! order before returning.  A subscription lives until `unsubscribe` is
//! called with its [`SubscriptionId`], which returns the sink to the caller.

use tracing::warn;

use crate::{Event, EventKind, EventSink};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u32);

struct Subscription {
    id:       SubscriptionId,
    /// `None` receives every kind.
    kinds:    Option<Vec<EventKind>>,
    sink:     Box<dyn EventSink>,
    failures: u64,
}

impl Subscription {
    #[inline]
    fn wants(&self, kind: EventKind) -> bool {
        self.kinds.as_ref().is_none_or(|k| k.contains(&kind))
    }
}

#[derive(Default)]
pub struct EventBus {
    subs:      Vec<Subscription>,
    next_id:   u32,
    published: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `sink` to every event kind.
    pub fn subscribe(&mut self, sink: impl EventSink + 'static) -> SubscriptionId {
        self.insert(None, Box::new(sink))
    }

    /// Subscribe `sink` to the listed kinds only.
    pub fn subscribe_to(&mut self, kinds: &[EventKind], sink: impl EventSink + 'static) -> SubscriptionId {
        self.insert(Some(kinds.to_vec()), Box::new(sink))
    }

    fn insert(&mut self, kinds: Option<Vec<EventKind>>, sink: Box<dyn EventSink>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subs.push(Subscription { id, kinds, sink, failures: 0 });
        id
    }

    /// End a subscription, handing the sink back.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> Option<Box<dyn EventSink>> {
        let pos = self.subs.iter().position(|s| s.id == id)?;
        Some(self.subs.remove(pos).sink)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subs.len()
    }

    /// Total events published since construction.
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Failed deliveries to subscription `id`.
    pub fn failures(&self, id: SubscriptionId) -> u64 {
        self.subs.iter().find(|s| s.id == id).map_or(0, |s| s.failures)
    }

    pub fn publish(&mut self, event: &Event) {
        self.published += 1;
        for sub in &mut self.subs {
            if !sub.wants(event.kind) {
                continue;
            }
            if let Err(e) = sub.sink.on_event(event) {
                sub.failures += 1;
                if sub.failures == 1 {
                    warn!(subscription = sub.id.0, kind = %event.kind, error = %e, "event sink failed");
                }
            }
        }
    }

    /// Flush every sink; failures are logged and counted.
    pub fn flush(&mut self) {
        for sub in &mut self.subs {
            if let Err(e) = sub.sink.flush() {
                sub.failures += 1;
                warn!(subscription = sub.id.0, error = %e, "event sink flush failed");
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subs.len())
            .field("published", &self.published)
            .finish()
    }
}
