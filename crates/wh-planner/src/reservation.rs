//! Time-indexed waypoint reservations.
//!
//! Each waypoint maps to a `Vec<Interval>` kept sorted by `start` and
//! pairwise disjoint.  Because the vector is disjoint and sorted, an
//! insertion only has to be checked against its two would-be neighbours.
//!
//! Entries whose vector becomes empty are removed immediately, so
//! `waypoint_count()` only ever counts waypoints with live reservations.

use std::collections::BTreeMap;

use wh_core::{BotId, WaypointId};

use crate::{PlanError, PlanResult};

// ── Interval ──────────────────────────────────────────────────────────────────

/// Half-open occupancy interval `[start, end)` held by `owner`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Interval {
    pub start: f64,
    pub end:   f64,
    pub owner: BotId,
}

impl Interval {
    pub fn new(start: f64, end: f64, owner: BotId) -> Self {
        Self { start, end, owner }
    }

    /// `start <= t < end`.
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }

    /// `true` if `[start, end)` shares any instant with `self`.
    #[inline]
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.start < end && start < self.end
    }
}

// ── ReservationTable ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct ReservationTable {
    slots: BTreeMap<WaypointId, Vec<Interval>>,
}

impl ReservationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `[start, end)` for `owner` on `waypoint`.
    ///
    /// Fails without inserting if the interval is empty or not finite, or if
    /// it overlaps any interval already held on `waypoint` (whoever owns it).
    pub fn reserve(&mut self, waypoint: WaypointId, start: f64, end: f64, owner: BotId) -> PlanResult<()> {
        if !(start.is_finite() && end.is_finite() && start < end) {
            return Err(PlanError::InvalidInterval { start, end });
        }
        let requested = Interval::new(start, end, owner);
        let list = self.slots.entry(waypoint).or_default();
        let idx = list.partition_point(|iv| iv.start < start);

        let clash = idx
            .checked_sub(1)
            .and_then(|i| list.get(i))
            .filter(|iv| iv.overlaps(start, end))
            .or_else(|| list.get(idx).filter(|iv| iv.overlaps(start, end)))
            .copied();

        if let Some(existing) = clash {
            return Err(PlanError::ReservationOverlap { waypoint, existing, requested });
        }
        list.insert(idx, requested);
        Ok(())
    }

    /// `true` if any interval on `waypoint` contains `t`.
    pub fn is_reserved_at(&self, waypoint: WaypointId, t: f64) -> bool {
        self.holder_at(waypoint, t).is_some()
    }

    /// The bot holding `waypoint` at instant `t`.
    pub fn holder_at(&self, waypoint: WaypointId, t: f64) -> Option<BotId> {
        let list = self.slots.get(&waypoint)?;
        // Last interval starting at or before `t` is the only candidate.
        let idx = list.partition_point(|iv| iv.start <= t);
        idx.checked_sub(1)
            .map(|i| list[i])
            .filter(|iv| iv.contains(t))
            .map(|iv| iv.owner)
    }

    /// First interval on `waypoint` overlapping `[start, end)` held by a bot
    /// other than `requester`.
    pub fn conflict(&self, waypoint: WaypointId, start: f64, end: f64, requester: BotId) -> Option<Interval> {
        let list = self.slots.get(&waypoint)?;
        // Sorted and disjoint, so ends are sorted too: skip everything that
        // finished at or before `start`.
        let from = list.partition_point(|iv| iv.end <= start);
        list[from..]
            .iter()
            .take_while(|iv| iv.start < end)
            .find(|iv| iv.owner != requester)
            .copied()
    }

    /// Drop every interval held by `owner`.  Returns how many were removed.
    pub fn release_owner(&mut self, owner: BotId) -> usize {
        self.retain(|iv| iv.owner != owner)
    }

    /// Drop every interval with `end <= now`.  Returns how many were removed.
    pub fn prune_expired(&mut self, now: f64) -> usize {
        self.retain(|iv| iv.end > now)
    }

    fn retain(&mut self, mut keep: impl FnMut(&Interval) -> bool) -> usize {
        let mut removed = 0;
        self.slots.retain(|_, list| {
            let before = list.len();
            list.retain(|iv| keep(iv));
            removed += before - list.len();
            !list.is_empty()
        });
        removed
    }

    pub fn intervals(&self, waypoint: WaypointId) -> &[Interval] {
        self.slots.get(&waypoint).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `(waypoint, intervals)` in waypoint order.
    pub fn iter(&self) -> impl Iterator<Item = (WaypointId, &[Interval])> + '_ {
        self.slots.iter().map(|(w, list)| (*w, list.as_slice()))
    }

    /// Waypoints with at least one live interval.
    pub fn waypoint_count(&self) -> usize {
        self.slots.len()
    }

    pub fn interval_count(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Verify that every waypoint's intervals are sorted and disjoint.
    pub fn check_invariants(&self) -> PlanResult<()> {
        for (&waypoint, list) in &self.slots {
            for pair in list.windows(2) {
                if pair[1].start < pair[0].end {
                    return Err(PlanError::ReservationOverlap {
                        waypoint,
                        existing:  pair[0],
                        requested: pair[1],
                    });
                }
            }
        }
        Ok(())
    }
}
