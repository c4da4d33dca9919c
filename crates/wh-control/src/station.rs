//! Input and output stations.
//!
//! Stations are found on the graph through their waypoint attachments.
//! Output stations queue orders and pick items from pods brought to them;
//! input stations queue inbound item bundles and stock them into pods.

use std::collections::VecDeque;

use wh_core::{ItemId, OrderId, StationId, WaypointId};
use wh_spatial::{Attachment, WaypointGraph};

use crate::{ControlError, ControlResult, StationConfig};

/// A quantity of one item arriving at an input station.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ItemBundle {
    pub item:  ItemId,
    pub count: u32,
}

// ── OutputStation ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct OutputStation {
    pub id:               StationId,
    pub waypoint:         WaypointId,
    /// Orders held at once, including the current one.
    pub capacity:         usize,
    pub item_pick_time:   f64,
    pub orders_completed: u64,
    pub items_picked:     u64,
    assigned:             VecDeque<OrderId>,
    current:              Option<OrderId>,
}

impl OutputStation {
    pub fn new(id: StationId, waypoint: WaypointId, config: &StationConfig) -> Self {
        Self {
            id,
            waypoint,
            capacity:         config.output_capacity,
            item_pick_time:   config.item_pick_time,
            orders_completed: 0,
            items_picked:     0,
            assigned:         VecDeque::new(),
            current:          None,
        }
    }

    /// Queue `order`.  Fails once `capacity` orders are held.
    pub fn assign_order(&mut self, order: OrderId) -> ControlResult<()> {
        if self.is_full() {
            return Err(ControlError::StationFull { station: self.id, capacity: self.capacity });
        }
        self.assigned.push_back(order);
        Ok(())
    }

    /// The order being worked on, promoting the next queued one if the
    /// station is free.
    pub fn process_order(&mut self) -> Option<OrderId> {
        if self.current.is_none() {
            self.current = self.assigned.pop_front();
        }
        self.current
    }

    pub fn current(&self) -> Option<OrderId> {
        self.current
    }

    /// Finish the current order.
    pub fn complete_order(&mut self) -> Option<OrderId> {
        let done = self.current.take();
        if done.is_some() {
            self.orders_completed += 1;
        }
        done
    }

    pub fn pick_items(&mut self, count: u32) {
        self.items_picked += u64::from(count);
    }

    pub fn pending_count(&self) -> usize {
        self.assigned.len() + usize::from(self.current.is_some())
    }

    pub fn is_full(&self) -> bool {
        self.pending_count() >= self.capacity
    }

    /// Seconds to pick `items` units.
    pub fn pick_duration(&self, items: u32) -> f64 {
        self.item_pick_time * f64::from(items)
    }
}

// ── InputStation ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct InputStation {
    pub id:                   StationId,
    pub waypoint:             WaypointId,
    pub item_transfer_time:   f64,
    pub bundle_transfer_time: f64,
    pub bundles_processed:    u64,
    pub items_received:       u64,
    incoming:                 VecDeque<ItemBundle>,
}

impl InputStation {
    pub fn new(id: StationId, waypoint: WaypointId, config: &StationConfig) -> Self {
        Self {
            id,
            waypoint,
            item_transfer_time:   config.item_transfer_time,
            bundle_transfer_time: config.bundle_transfer_time,
            bundles_processed:    0,
            items_received:       0,
            incoming:             VecDeque::new(),
        }
    }

    pub fn add_bundle(&mut self, bundle: ItemBundle) {
        self.incoming.push_back(bundle);
    }

    pub fn next_bundle(&self) -> Option<ItemBundle> {
        self.incoming.front().copied()
    }

    /// Take the head of the queue as stocked.
    pub fn process_bundle(&mut self) -> Option<ItemBundle> {
        let bundle = self.incoming.pop_front()?;
        self.bundles_processed += 1;
        self.items_received += u64::from(bundle.count);
        Some(bundle)
    }

    pub fn bundle_count(&self) -> usize {
        self.incoming.len()
    }

    /// Seconds to stock `bundle` into a pod.
    pub fn transfer_duration(&self, bundle: &ItemBundle) -> f64 {
        self.bundle_transfer_time + self.item_transfer_time * f64::from(bundle.count)
    }
}

// ── Stations ──────────────────────────────────────────────────────────────────

/// All stations of a graph, each list sorted by id.
#[derive(Clone, Debug, Default)]
pub struct Stations {
    pub output: Vec<OutputStation>,
    pub input:  Vec<InputStation>,
}

impl Stations {
    pub fn from_graph(graph: &WaypointGraph, config: &StationConfig) -> Self {
        let mut stations = Stations::default();
        for (w, attachment) in graph.attached() {
            match attachment {
                Attachment::OutputStation(id) => stations.output.push(OutputStation::new(id, w, config)),
                Attachment::InputStation(id) => stations.input.push(InputStation::new(id, w, config)),
                Attachment::Elevator(_) => {}
            }
        }
        stations.output.sort_by_key(|s| s.id);
        stations.input.sort_by_key(|s| s.id);
        stations
    }

    pub fn output(&self, id: StationId) -> ControlResult<&OutputStation> {
        self.output.iter().find(|s| s.id == id).ok_or(ControlError::UnknownStation(id))
    }

    pub fn output_mut(&mut self, id: StationId) -> ControlResult<&mut OutputStation> {
        self.output.iter_mut().find(|s| s.id == id).ok_or(ControlError::UnknownStation(id))
    }

    pub fn input(&self, id: StationId) -> ControlResult<&InputStation> {
        self.input.iter().find(|s| s.id == id).ok_or(ControlError::UnknownStation(id))
    }

    pub fn input_mut(&mut self, id: StationId) -> ControlResult<&mut InputStation> {
        self.input.iter_mut().find(|s| s.id == id).ok_or(ControlError::UnknownStation(id))
    }

    /// The non-full output station with the fewest pending orders; ties go
    /// to the lowest id.
    pub fn least_loaded_output(&self) -> Option<StationId> {
        self.output
            .iter()
            .filter(|s| !s.is_full())
            .min_by_key(|s| (s.pending_count(), s.id))
            .map(|s| s.id)
    }
}
