//! Waypoint graph representation and builder.
//!
//! # Data layout
//!
//! Adjacency is stored in **Compressed Sparse Row (CSR)** format.  Given a
//! `WaypointId w`, its neighbours occupy the slice:
//!
//! ```text
//! edge_to[ out_start[w] .. out_start[w+1] ]
//! ```
//!
//! Every undirected edge is stored once per direction with the same weight,
//! so the symmetry invariant holds by construction.  Neighbours of a
//! waypoint keep the order in which their edges were added.
//!
//! # Mutable state
//!
//! Topology is frozen by [`WaypointGraphBuilder::build`].  The only state
//! that changes afterwards is pod occupancy, mutated exclusively through
//! [`WaypointGraph::place_pod`] and [`WaypointGraph::remove_pod`].
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps floor coordinates to the nearest waypoint.
//! Used to snap spawn positions and station locations onto the graph.

use std::collections::HashMap;

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use wh_core::{ElevatorId, PodId, Point, StationId, WaypointId};

use crate::{SpatialError, SpatialResult};

// ── Attachment ────────────────────────────────────────────────────────────────

/// Fixed equipment bound to a waypoint.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Attachment {
    InputStation(StationId),
    OutputStation(StationId),
    Elevator(ElevatorId),
}

// ── R-tree entry ──────────────────────────────────────────────────────────────

#[derive(Clone)]
struct WaypointEntry {
    point: [f64; 2],
    id:    WaypointId,
}

impl RTreeObject for WaypointEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for WaypointEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── WaypointGraph ─────────────────────────────────────────────────────────────

/// Undirected weighted waypoint graph in CSR format with pod occupancy.
///
/// Topology fields are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`WaypointGraphBuilder`].
pub struct WaypointGraph {
    // ── Waypoint data ─────────────────────────────────────────────────────
    /// Floor position of each waypoint.  Indexed by `WaypointId`.
    pub positions: Vec<Point>,

    /// `true` where a pod may be stored.
    pub storage: Vec<bool>,

    /// `true` where the waypoint is part of a station queue.
    pub queue: Vec<bool>,

    pub attachments: Vec<Option<Attachment>>,

    // ── CSR adjacency ─────────────────────────────────────────────────────
    /// CSR row pointer.  Length = `waypoint_count + 1`.
    pub out_start: Vec<u32>,

    /// Neighbour at the far end of each directed half-edge.
    pub edge_to: Vec<WaypointId>,

    /// Distance of each directed half-edge.
    pub edge_weight: Vec<f64>,

    // ── Mutable occupancy ─────────────────────────────────────────────────
    occupant: Vec<Option<PodId>>,

    // ── Spatial index ─────────────────────────────────────────────────────
    spatial_idx: RTree<WaypointEntry>,
}

impl WaypointGraph {
    /// Construct an empty graph.  Every search against it fails.
    pub fn empty() -> Self {
        WaypointGraphBuilder::new().build()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn waypoint_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edge_to.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn contains(&self, w: WaypointId) -> bool {
        w.index() < self.positions.len()
    }

    /// `Ok(())` if `w` names a waypoint of this graph.
    #[inline]
    pub fn check(&self, w: WaypointId) -> SpatialResult<()> {
        if self.contains(w) { Ok(()) } else { Err(SpatialError::WaypointNotFound(w)) }
    }

    /// Iterator over all waypoint ids in index order.
    pub fn waypoints(&self) -> impl Iterator<Item = WaypointId> + '_ {
        (0..self.positions.len()).map(|i| WaypointId(i as u32))
    }

    // ── Per-waypoint attributes ───────────────────────────────────────────

    #[inline]
    pub fn position(&self, w: WaypointId) -> Point {
        self.positions[w.index()]
    }

    #[inline]
    pub fn is_storage(&self, w: WaypointId) -> bool {
        self.storage[w.index()]
    }

    #[inline]
    pub fn is_queue(&self, w: WaypointId) -> bool {
        self.queue[w.index()]
    }

    #[inline]
    pub fn attachment(&self, w: WaypointId) -> Option<Attachment> {
        self.attachments[w.index()]
    }

    /// The waypoint carrying `attachment`, if any.
    pub fn find_attachment(&self, attachment: Attachment) -> Option<WaypointId> {
        self.attachments
            .iter()
            .position(|a| *a == Some(attachment))
            .map(|i| WaypointId(i as u32))
    }

    /// All `(waypoint, attachment)` pairs in waypoint order.
    pub fn attached(&self) -> impl Iterator<Item = (WaypointId, Attachment)> + '_ {
        self.attachments
            .iter()
            .enumerate()
            .filter_map(|(i, a)| a.map(|a| (WaypointId(i as u32), a)))
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// `(neighbour, distance)` pairs of `w` in insertion order.
    ///
    /// A contiguous slice scan; no allocation.
    #[inline]
    pub fn neighbors(&self, w: WaypointId) -> impl Iterator<Item = (WaypointId, f64)> + '_ {
        let start = self.out_start[w.index()] as usize;
        let end   = self.out_start[w.index() + 1] as usize;
        self.edge_to[start..end]
            .iter()
            .copied()
            .zip(self.edge_weight[start..end].iter().copied())
    }

    #[inline]
    pub fn degree(&self, w: WaypointId) -> usize {
        let start = self.out_start[w.index()] as usize;
        let end   = self.out_start[w.index() + 1] as usize;
        end - start
    }

    /// Weight of the edge `a`–`b`, or `None` if they are not adjacent.
    pub fn edge_weight(&self, a: WaypointId, b: WaypointId) -> Option<f64> {
        if !self.contains(a) || !self.contains(b) {
            return None;
        }
        self.neighbors(a).find(|&(n, _)| n == b).map(|(_, d)| d)
    }

    #[inline]
    pub fn is_adjacent(&self, a: WaypointId, b: WaypointId) -> bool {
        self.edge_weight(a, b).is_some()
    }

    // ── Occupancy ─────────────────────────────────────────────────────────

    #[inline]
    pub fn occupant(&self, w: WaypointId) -> Option<PodId> {
        self.occupant[w.index()]
    }

    /// `true` iff `w` is storage-capable and currently holds a pod.
    #[inline]
    pub fn is_blocked(&self, w: WaypointId) -> bool {
        self.storage[w.index()] && self.occupant[w.index()].is_some()
    }

    /// Record `pod` as resting on `w`.
    ///
    /// Re-placing the same pod is a no-op; a different pod is rejected.
    pub fn place_pod(&mut self, w: WaypointId, pod: PodId) -> SpatialResult<()> {
        self.check(w)?;
        match self.occupant[w.index()] {
            Some(existing) if existing != pod => {
                Err(SpatialError::Occupied { waypoint: w, pod: existing })
            }
            _ => {
                self.occupant[w.index()] = Some(pod);
                Ok(())
            }
        }
    }

    /// Clear the occupant of `w`, returning it.
    pub fn remove_pod(&mut self, w: WaypointId) -> Option<PodId> {
        self.occupant.get_mut(w.index()).and_then(Option::take)
    }

    /// Storage waypoints with no pod on them, in waypoint order.
    pub fn available_storage(&self) -> Vec<WaypointId> {
        self.waypoints()
            .filter(|&w| self.storage[w.index()] && self.occupant[w.index()].is_none())
            .collect()
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Nearest waypoint to `pos`; `None` only for an empty graph.
    pub fn nearest_waypoint(&self, pos: Point) -> Option<WaypointId> {
        self.spatial_idx.nearest_neighbor(&[pos.x, pos.y]).map(|e| e.id)
    }

    /// Up to `k` nearest waypoints to `pos`, sorted by ascending distance.
    pub fn k_nearest(&self, pos: Point, k: usize) -> Vec<WaypointId> {
        self.spatial_idx
            .nearest_neighbor_iter(&[pos.x, pos.y])
            .take(k)
            .map(|e| e.id)
            .collect()
    }

    /// The waypoint whose position equals `pos` within `eps`.
    pub fn waypoint_at(&self, pos: Point, eps: f64) -> Option<WaypointId> {
        self.nearest_waypoint(pos)
            .filter(|&w| self.positions[w.index()].distance(pos) <= eps)
    }
}

impl std::fmt::Debug for WaypointGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaypointGraph")
            .field("waypoints", &self.waypoint_count())
            .field("edges", &self.edge_count())
            .field("storage", &self.storage.iter().filter(|s| **s).count())
            .finish()
    }
}

// ── WaypointGraphBuilder ──────────────────────────────────────────────────────

/// Construct a [`WaypointGraph`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use wh_core::Point;
/// use wh_spatial::WaypointGraphBuilder;
///
/// let mut b = WaypointGraphBuilder::new();
/// let a = b.add_waypoint(Point::new(0.0, 0.0), false);
/// let c = b.add_waypoint(Point::new(3.0, 4.0), true);
/// b.add_edge(a, c).unwrap();
/// let g = b.build();
/// assert_eq!(g.edge_weight(c, a), Some(5.0));
/// ```
pub struct WaypointGraphBuilder {
    nodes:     Vec<NodeSpec>,
    raw_edges: Vec<RawEdge>,
    /// Unordered pair → index in `raw_edges`.
    seen:      HashMap<(u32, u32), usize>,
}

struct NodeSpec {
    pos:        Point,
    storage:    bool,
    queue:      bool,
    attachment: Option<Attachment>,
}

struct RawEdge {
    a:      WaypointId,
    b:      WaypointId,
    weight: f64,
}

impl WaypointGraphBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_edges: Vec::new(), seen: HashMap::new() }
    }

    pub fn with_capacity(waypoints: usize, edges: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(waypoints),
            raw_edges: Vec::with_capacity(edges),
            seen:      HashMap::with_capacity(edges),
        }
    }

    /// Add a waypoint and return its id (sequential from 0).
    pub fn add_waypoint(&mut self, pos: Point, storage: bool) -> WaypointId {
        let id = WaypointId(self.nodes.len() as u32);
        self.nodes.push(NodeSpec { pos, storage, queue: false, attachment: None });
        id
    }

    pub fn set_queue(&mut self, w: WaypointId, queue: bool) -> SpatialResult<()> {
        self.node_mut(w)?.queue = queue;
        Ok(())
    }

    pub fn attach(&mut self, w: WaypointId, attachment: Attachment) -> SpatialResult<()> {
        self.node_mut(w)?.attachment = Some(attachment);
        Ok(())
    }

    /// Connect `a` and `b` in both directions at their Euclidean distance.
    pub fn add_edge(&mut self, a: WaypointId, b: WaypointId) -> SpatialResult<()> {
        let pa = self.position(a)?;
        let pb = self.position(b)?;
        self.add_edge_weighted(a, b, pa.distance(pb))
    }

    /// Connect `a` and `b` in both directions with an explicit weight.
    ///
    /// Self-loops are ignored.  Re-adding an existing pair overwrites its
    /// weight but keeps its original position in neighbour order.
    pub fn add_edge_weighted(&mut self, a: WaypointId, b: WaypointId, weight: f64) -> SpatialResult<()> {
        self.position(a)?;
        self.position(b)?;
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(SpatialError::InvalidWeight { a, b, weight });
        }
        if a == b {
            return Ok(());
        }
        let key = (a.0.min(b.0), a.0.max(b.0));
        match self.seen.get(&key) {
            Some(&i) => self.raw_edges[i].weight = weight,
            None => {
                self.seen.insert(key, self.raw_edges.len());
                self.raw_edges.push(RawEdge { a, b, weight });
            }
        }
        Ok(())
    }

    pub fn position(&self, w: WaypointId) -> SpatialResult<Point> {
        self.nodes
            .get(w.index())
            .map(|n| n.pos)
            .ok_or(SpatialError::WaypointNotFound(w))
    }

    pub fn waypoint_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    fn node_mut(&mut self, w: WaypointId) -> SpatialResult<&mut NodeSpec> {
        self.nodes.get_mut(w.index()).ok_or(SpatialError::WaypointNotFound(w))
    }

    /// Consume the builder and produce a [`WaypointGraph`].
    ///
    /// O(E log E) for the stable edge sort plus O(N log N) for the R-tree
    /// bulk load.
    pub fn build(self) -> WaypointGraph {
        let n = self.nodes.len();

        // Expand into directed half-edges in insertion order, then stable
        // sort by source so each row keeps that order.
        let mut half: Vec<(WaypointId, WaypointId, f64)> = Vec::with_capacity(self.raw_edges.len() * 2);
        for e in &self.raw_edges {
            half.push((e.a, e.b, e.weight));
            half.push((e.b, e.a, e.weight));
        }
        half.sort_by_key(|&(from, _, _)| from.0);

        let mut out_start = vec![0u32; n + 1];
        for &(from, _, _) in &half {
            out_start[from.index() + 1] += 1;
        }
        for i in 1..=n {
            out_start[i] += out_start[i - 1];
        }
        debug_assert_eq!(out_start[n] as usize, half.len());

        let edge_to:     Vec<WaypointId> = half.iter().map(|&(_, to, _)| to).collect();
        let edge_weight: Vec<f64>        = half.iter().map(|&(_, _, w)| w).collect();

        let entries: Vec<WaypointEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, s)| WaypointEntry { point: [s.pos.x, s.pos.y], id: WaypointId(i as u32) })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        WaypointGraph {
            positions:   self.nodes.iter().map(|s| s.pos).collect(),
            storage:     self.nodes.iter().map(|s| s.storage).collect(),
            queue:       self.nodes.iter().map(|s| s.queue).collect(),
            attachments: self.nodes.iter().map(|s| s.attachment).collect(),
            out_start,
            edge_to,
            edge_weight,
            occupant:    vec![None; n],
            spatial_idx,
        }
    }
}

impl Default for WaypointGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
