//! Choosing which pod serves an order or receives a bundle.

use std::collections::BTreeSet;

use wh_agent::{Fleet, Pod};
use wh_core::{PodId, Point, SimRng};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SelectionMethod {
    /// Closest candidate to the station.
    #[default]
    Nearest,
    /// Uniform draw from the candidates.
    Random,
    /// Lowest-id candidate.
    Fixed,
}

/// Pods resting on the graph, not carried and not claimed by a task, for
/// which `wanted` holds.  Returned in id order.
pub fn candidates(fleet: &Fleet, claimed: &BTreeSet<PodId>, wanted: impl Fn(&Pod) -> bool) -> Vec<PodId> {
    fleet
        .pods()
        .iter()
        .filter(|p| p.is_stored() && !claimed.contains(&p.id) && wanted(p))
        .map(|p| p.id)
        .collect()
}

/// Applies a [`SelectionMethod`], drawing random choices from its own
/// stream.
#[derive(Clone, Debug)]
pub struct PodSelector {
    pub method: SelectionMethod,
    rng:        SimRng,
}

impl PodSelector {
    pub fn new(method: SelectionMethod, rng: SimRng) -> Self {
        Self { method, rng }
    }

    pub fn select(&mut self, fleet: &Fleet, candidates: &[PodId], station: Point) -> Option<PodId> {
        match self.method {
            SelectionMethod::Nearest => candidates
                .iter()
                .filter_map(|&id| fleet.pod(id).ok())
                .map(|p| (p.position.distance(station), p.id))
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, id)| id),
            SelectionMethod::Random => self.rng.choose(candidates).copied(),
            SelectionMethod::Fixed => candidates.first().copied(),
        }
    }
}
