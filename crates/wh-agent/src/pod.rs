//! Storage pods.

use std::collections::BTreeMap;

use wh_core::{BotId, ItemId, Point, PodId, WaypointId};

use crate::{AgentError, AgentResult};

/// Default item capacity of a pod.
pub const DEFAULT_POD_CAPACITY: u32 = 100;

/// Default pod footprint radius, metres.
pub const DEFAULT_POD_RADIUS: f64 = 0.5;

/// Where a pod is.  Exactly one of these holds at any time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PodStatus {
    Resident(WaypointId),
    Carried(BotId),
    /// Set down somewhere that could not take it (off-grid or occupied).
    Free,
}

#[derive(Clone, Debug)]
pub struct Pod {
    pub id:       PodId,
    pub position: Point,
    pub radius:   f64,
    pub capacity: u32,
    pub times_picked: u32,
    pub times_moved:  u32,

    items: BTreeMap<ItemId, u32>,
    pub(crate) carrier:  Option<BotId>,
    pub(crate) resident: Option<WaypointId>,
}

impl Pod {
    pub fn new(id: PodId, position: Point, capacity: u32) -> Self {
        Self {
            id,
            position,
            radius:       DEFAULT_POD_RADIUS,
            capacity,
            times_picked: 0,
            times_moved:  0,
            items:        BTreeMap::new(),
            carrier:      None,
            resident:     None,
        }
    }

    pub fn status(&self) -> PodStatus {
        match (self.carrier, self.resident) {
            (Some(bot), _) => PodStatus::Carried(bot),
            (None, Some(w)) => PodStatus::Resident(w),
            (None, None) => PodStatus::Free,
        }
    }

    #[inline]
    pub fn carrier(&self) -> Option<BotId> {
        self.carrier
    }

    #[inline]
    pub fn resident(&self) -> Option<WaypointId> {
        self.resident
    }

    #[inline]
    pub fn is_carried(&self) -> bool {
        self.carrier.is_some()
    }

    #[inline]
    pub fn is_stored(&self) -> bool {
        self.resident.is_some()
    }

    // ── Contents ──────────────────────────────────────────────────────────

    #[inline]
    pub fn item_count(&self, item: ItemId) -> u32 {
        self.items.get(&item).copied().unwrap_or(0)
    }

    pub fn total_items(&self) -> u32 {
        self.items.values().sum()
    }

    pub fn available_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.total_items())
    }

    #[inline]
    pub fn has_item(&self, item: ItemId, count: u32) -> bool {
        self.item_count(item) >= count.max(1)
    }

    /// `(item, count)` pairs in item order; zero counts are never stored.
    pub fn items(&self) -> impl Iterator<Item = (ItemId, u32)> + '_ {
        self.items.iter().map(|(&i, &n)| (i, n))
    }

    /// Stock `count` units of `item`.
    pub fn add_items(&mut self, item: ItemId, count: u32) -> AgentResult<()> {
        let available = self.available_capacity();
        if count > available {
            return Err(AgentError::CapacityExceeded { pod: self.id, requested: count, available });
        }
        if count > 0 {
            *self.items.entry(item).or_insert(0) += count;
        }
        Ok(())
    }

    /// Pick `count` units of `item`.
    pub fn remove_items(&mut self, item: ItemId, count: u32) -> AgentResult<()> {
        let available = self.item_count(item);
        if count > available {
            return Err(AgentError::InsufficientItems {
                pod: self.id,
                item,
                requested: count,
                available,
            });
        }
        if count == available {
            self.items.remove(&item);
        } else {
            *self.items.entry(item).or_insert(0) -= count;
        }
        if count > 0 {
            self.times_picked += 1;
        }
        Ok(())
    }
}
