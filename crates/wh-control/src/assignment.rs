//! Choosing which free bot takes a task.

use std::collections::BTreeMap;

use wh_agent::Fleet;
use wh_core::{BotId, Point};

/// Orders with a priority above this get the nearest bot under
/// [`AssignmentMethod::Priority`].
pub const URGENT_PRIORITY: u32 = 5;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AssignmentMethod {
    /// Closest free bot to the task's first target.
    #[default]
    Nearest,
    /// Free bot with the fewest completed tasks.
    Balanced,
    /// Nearest for urgent orders, otherwise the first free bot.
    Priority,
}

/// Bots that may take a new task: active, idle, empty-handed and not
/// already tasked.  Returned in id order.
pub fn free_bots(fleet: &Fleet, is_tasked: impl Fn(BotId) -> bool) -> Vec<BotId> {
    fleet
        .bots()
        .iter()
        .filter(|b| b.is_active() && b.is_idle() && !b.is_carrying() && !is_tasked(b.id))
        .map(|b| b.id)
        .collect()
}

/// Pick one of `free` for a task whose first leg heads to `target`.
///
/// Ties go to the bot listed first.  Ids not in `fleet` are skipped.
pub fn choose_bot(
    method:    AssignmentMethod,
    fleet:     &Fleet,
    free:      &[BotId],
    completed: &BTreeMap<BotId, u64>,
    target:    Point,
    priority:  u32,
) -> Option<BotId> {
    let nearest = || {
        free.iter()
            .filter_map(|&id| fleet.bot(id).ok())
            .map(|b| (b.position.distance(target), b.id))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, id)| id)
    };

    match method {
        AssignmentMethod::Nearest => nearest(),
        AssignmentMethod::Balanced => free
            .iter()
            .copied()
            .min_by_key(|id| completed.get(id).copied().unwrap_or(0)),
        AssignmentMethod::Priority if priority > URGENT_PRIORITY => nearest(),
        AssignmentMethod::Priority => free.first().copied(),
    }
}
