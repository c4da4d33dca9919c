//! Customer orders and the order book.

use std::collections::{BTreeMap, VecDeque};

use wh_core::{ItemId, OrderId, StationId};

use crate::{ControlError, ControlResult};

// ── Order ─────────────────────────────────────────────────────────────────────

/// A customer order: item quantities to be picked at one output station.
#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    pub id:           OrderId,
    /// Higher is more urgent.
    pub priority:     u32,
    pub created_at:   f64,
    pub completed_at: Option<f64>,
    /// Output station the order is assigned to, once assigned.
    pub station:      Option<StationId>,
    lines:            BTreeMap<ItemId, u32>,
    picked:           BTreeMap<ItemId, u32>,
}

impl Order {
    /// Duplicate items are merged and zero quantities dropped.
    pub fn new(id: OrderId, lines: impl IntoIterator<Item = (ItemId, u32)>, priority: u32, created_at: f64) -> Self {
        let mut merged = BTreeMap::new();
        for (item, count) in lines {
            if count > 0 {
                *merged.entry(item).or_insert(0) += count;
            }
        }
        Self {
            id,
            priority,
            created_at,
            completed_at: None,
            station:      None,
            lines:        merged,
            picked:       BTreeMap::new(),
        }
    }

    /// Ordered quantity per item.
    pub fn lines(&self) -> impl Iterator<Item = (ItemId, u32)> + '_ {
        self.lines.iter().map(|(&i, &n)| (i, n))
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn total_items(&self) -> u32 {
        self.lines.values().sum()
    }

    pub fn picked_items(&self) -> u32 {
        self.picked.values().sum()
    }

    /// Quantity of `item` still to pick.
    pub fn outstanding(&self, item: ItemId) -> u32 {
        let ordered = self.lines.get(&item).copied().unwrap_or(0);
        ordered - self.picked.get(&item).copied().unwrap_or(0)
    }

    /// Items with a non-zero outstanding quantity, in item order.
    pub fn outstanding_lines(&self) -> impl Iterator<Item = (ItemId, u32)> + '_ {
        self.lines
            .keys()
            .map(|&item| (item, self.outstanding(item)))
            .filter(|&(_, n)| n > 0)
    }

    /// Record up to `count` units of `item` as picked.  Returns the amount
    /// actually applied.
    pub fn record_pick(&mut self, item: ItemId, count: u32) -> u32 {
        let applied = count.min(self.outstanding(item));
        if applied > 0 {
            *self.picked.entry(item).or_insert(0) += applied;
        }
        applied
    }

    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some() || self.outstanding_lines().next().is_none()
    }

    /// Seconds from creation to completion.
    pub fn processing_time(&self) -> Option<f64> {
        self.completed_at.map(|t| t - self.created_at)
    }
}

// ── OrderBook ─────────────────────────────────────────────────────────────────

/// Every order seen during a run, plus the backlog of orders no output
/// station had room for.
#[derive(Clone, Debug, Default)]
pub struct OrderBook {
    orders:  BTreeMap<OrderId, Order>,
    backlog: VecDeque<OrderId>,
    next_id: u32,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new order.  Ids are issued sequentially from 0.
    pub fn create(
        &mut self,
        lines:    impl IntoIterator<Item = (ItemId, u32)>,
        priority: u32,
        now:      f64,
    ) -> ControlResult<OrderId> {
        let id = OrderId(self.next_id);
        let order = Order::new(id, lines, priority, now);
        if order.line_count() == 0 {
            return Err(ControlError::EmptyOrder);
        }
        self.next_id += 1;
        self.orders.insert(id, order);
        Ok(id)
    }

    pub fn get(&self, id: OrderId) -> ControlResult<&Order> {
        self.orders.get(&id).ok_or(ControlError::UnknownOrder(id))
    }

    pub fn get_mut(&mut self, id: OrderId) -> ControlResult<&mut Order> {
        self.orders.get_mut(&id).ok_or(ControlError::UnknownOrder(id))
    }

    /// Stamp `id` as completed at `now`.
    pub fn complete(&mut self, id: OrderId, now: f64) -> ControlResult<&Order> {
        let order = self.get_mut(id)?;
        order.completed_at.get_or_insert(now);
        Ok(order)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Order> {
        self.orders.values().filter(|o| o.completed_at.is_none())
    }

    pub fn completed(&self) -> impl Iterator<Item = &Order> {
        self.orders.values().filter(|o| o.completed_at.is_some())
    }

    pub fn completed_count(&self) -> usize {
        self.completed().count()
    }

    // ── Backlog ───────────────────────────────────────────────────────────

    pub fn defer(&mut self, id: OrderId) {
        self.backlog.push_back(id);
    }

    pub fn next_deferred(&mut self) -> Option<OrderId> {
        self.backlog.pop_front()
    }

    /// Put an order back at the head of the backlog.
    pub fn restore_deferred(&mut self, id: OrderId) {
        self.backlog.push_front(id);
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }
}
