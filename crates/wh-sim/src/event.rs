//! Simulation events and their payloads.
//!
//! Every event carries a kind, the simulated time it happened at, and a
//! small key → value payload.  Keys are static strings and the payload is a
//! `BTreeMap`, so iteration order (and therefore CSV output) is stable.

use std::collections::BTreeMap;
use std::fmt;

use wh_core::{BotId, ItemId, OrderId, Point, PodId, StationId, Tick, WaypointId};

// ── EventKind ─────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    SimulationStart,
    SimulationEnd,
    TimeStep,
    BotMoved,
    BotPickup,
    BotSetdown,
    Collision,
    OrderCreated,
    OrderCompleted,
    ItemPicked,
}

impl EventKind {
    pub const ALL: [EventKind; 10] = [
        EventKind::SimulationStart,
        EventKind::SimulationEnd,
        EventKind::TimeStep,
        EventKind::BotMoved,
        EventKind::BotPickup,
        EventKind::BotSetdown,
        EventKind::Collision,
        EventKind::OrderCreated,
        EventKind::OrderCompleted,
        EventKind::ItemPicked,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::SimulationStart => "simulation_start",
            EventKind::SimulationEnd   => "simulation_end",
            EventKind::TimeStep        => "time_step",
            EventKind::BotMoved        => "bot_moved",
            EventKind::BotPickup       => "bot_pickup",
            EventKind::BotSetdown      => "bot_setdown",
            EventKind::Collision       => "collision",
            EventKind::OrderCreated    => "order_created",
            EventKind::OrderCompleted  => "order_completed",
            EventKind::ItemPicked      => "item_picked",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Value ─────────────────────────────────────────────────────────────────────

/// A payload value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(v),
            Value::Int(v) => Some(v as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v)  => write!(f, "{v}"),
            Value::Int(v)   => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v)  => f.write_str(v),
        }
    }
}

macro_rules! value_from {
    ($($t:ty => $variant:ident($v:ident) $body:expr;)*) => {
        $(
            impl From<$t> for Value {
                #[inline]
                fn from($v: $t) -> Value {
                    Value::$variant($body)
                }
            }
        )*
    };
}

value_from! {
    bool       => Bool(v) v;
    f64        => Float(v) v;
    i64        => Int(v) v;
    i32        => Int(v) v as i64;
    u32        => Int(v) v as i64;
    u64        => Int(v) v as i64;
    usize      => Int(v) v as i64;
    BotId      => Int(v) v.0 as i64;
    PodId      => Int(v) v.0 as i64;
    WaypointId => Int(v) v.0 as i64;
    StationId  => Int(v) v.0 as i64;
    OrderId    => Int(v) v.0 as i64;
    ItemId     => Int(v) v.0 as i64;
    Tick       => Int(v) v.0 as i64;
    String     => Text(v) v;
    &str       => Text(v) v.to_owned();
}

// ── Event ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub kind:    EventKind,
    /// Simulated seconds.
    pub time:    f64,
    pub payload: BTreeMap<&'static str, Value>,
}

impl Event {
    pub fn new(kind: EventKind, time: f64) -> Self {
        Self { kind, time, payload: BTreeMap::new() }
    }

    /// Builder-style payload insert.
    pub fn with(mut self, key: &'static str, value: impl Into<Value>) -> Self {
        self.payload.insert(key, value.into());
        self
    }

    fn at(self, p: Point) -> Self {
        self.with("x", p.x).with("y", p.y)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    // ── Core event constructors ───────────────────────────────────────────

    pub fn simulation_start(time: f64, bots: usize, pods: usize, waypoints: usize) -> Self {
        Event::new(EventKind::SimulationStart, time)
            .with("bots", bots)
            .with("pods", pods)
            .with("waypoints", waypoints)
    }

    pub fn simulation_end(time: f64, steps: u64, stopped: bool) -> Self {
        Event::new(EventKind::SimulationEnd, time)
            .with("steps", steps)
            .with("stopped", stopped)
    }

    /// `busy` counts bots that are moving or carrying a pod.
    pub fn time_step(time: f64, tick: Tick, busy: usize, bots: usize) -> Self {
        Event::new(EventKind::TimeStep, time)
            .with("tick", tick)
            .with("busy_bots", busy)
            .with("bots", bots)
    }

    /// A bot reached `waypoint`.
    pub fn bot_moved(time: f64, bot: BotId, waypoint: WaypointId, position: Point, distance: f64) -> Self {
        Event::new(EventKind::BotMoved, time)
            .with("bot", bot)
            .with("waypoint", waypoint)
            .with("distance", distance)
            .at(position)
    }

    pub fn bot_pickup(time: f64, bot: BotId, pod: PodId, position: Point) -> Self {
        Event::new(EventKind::BotPickup, time)
            .with("bot", bot)
            .with("pod", pod)
            .at(position)
    }

    pub fn bot_setdown(time: f64, bot: BotId, pod: PodId, waypoint: Option<WaypointId>, position: Point) -> Self {
        let e = Event::new(EventKind::BotSetdown, time)
            .with("bot", bot)
            .with("pod", pod)
            .at(position);
        match waypoint {
            Some(w) => e.with("waypoint", w),
            None => e,
        }
    }

    pub fn collision(time: f64, a: BotId, b: BotId, position: Point) -> Self {
        Event::new(EventKind::Collision, time)
            .with("bot", a)
            .with("other", b)
            .at(position)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} t={:.2}", self.kind, self.time)?;
        for (k, v) in &self.payload {
            write!(f, " {k}={v}")?;
        }
        Ok(())
    }
}
