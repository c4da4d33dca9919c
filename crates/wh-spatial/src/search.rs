//! Single-agent A* search over the waypoint graph.
//!
//! # Blocking predicate
//!
//! Callers may supply a predicate evaluated for every candidate expansion
//! *except* the goal.  The predicate sees a [`Candidate`], which carries the
//! hop depth at which the search would reach the waypoint; the cooperative
//! planner uses that depth to look up time-indexed reservations.
//!
//! # Determinism
//!
//! Frontier entries with equal f-score pop in insertion order (a FIFO
//! sequence number breaks ties), so identical inputs always yield identical
//! paths.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use wh_core::{Point, WaypointId};

use crate::graph::WaypointGraph;
use crate::{SpatialError, SpatialResult};

// ── Heuristic ─────────────────────────────────────────────────────────────────

/// Distance estimate to the goal.
///
/// `Euclidean` is admissible whenever edge weights are at least the
/// straight-line distance between endpoints; `Manhattan` additionally needs
/// axis-aligned edges (grid layouts).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Heuristic {
    #[default]
    Euclidean,
    Manhattan,
}

impl Heuristic {
    #[inline]
    pub fn estimate(self, a: Point, b: Point) -> f64 {
        match self {
            Heuristic::Euclidean => a.distance(b),
            Heuristic::Manhattan => a.manhattan(b),
        }
    }
}

// ── Path ──────────────────────────────────────────────────────────────────────

/// An ordered list of waypoints from start to goal inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub waypoints: Vec<WaypointId>,
    /// Sum of traversed edge weights.
    pub length: f64,
}

impl Path {
    /// The single-waypoint path `[w]`.
    pub fn trivial(w: WaypointId) -> Self {
        Self { waypoints: vec![w], length: 0.0 }
    }

    /// Number of edge traversals.
    pub fn hops(&self) -> usize {
        self.waypoints.len().saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn start(&self) -> Option<WaypointId> {
        self.waypoints.first().copied()
    }

    pub fn goal(&self) -> Option<WaypointId> {
        self.waypoints.last().copied()
    }
}

// ── Candidate ─────────────────────────────────────────────────────────────────

/// A prospective expansion handed to the blocking predicate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub waypoint: WaypointId,
    /// Waypoint the search would arrive from.
    pub from: WaypointId,
    /// Path index the waypoint would occupy (the start is hop 0).
    pub hops: u32,
}

// ── Frontier entry ────────────────────────────────────────────────────────────

/// Min-heap entry on `f`, FIFO on ties.
struct Frontier {
    f:        f64,
    g:        f64,
    seq:      u64,
    waypoint: WaypointId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

// ── AStar ─────────────────────────────────────────────────────────────────────

/// A* search with a configurable heuristic.
#[derive(Copy, Clone, Debug, Default)]
pub struct AStar {
    pub heuristic: Heuristic,
}

impl AStar {
    pub fn new(heuristic: Heuristic) -> Self {
        Self { heuristic }
    }

    /// Shortest path with nothing blocked.
    pub fn find_path(
        &self,
        graph: &WaypointGraph,
        start: WaypointId,
        goal: WaypointId,
    ) -> SpatialResult<Path> {
        self.find_path_with(graph, start, goal, |_| false)
    }

    /// Shortest path avoiding every candidate for which `blocked` returns
    /// `true`.  The goal is never offered to the predicate.
    ///
    /// Returns [`SpatialError::NoPath`] when the frontier is exhausted.
    pub fn find_path_with<F>(
        &self,
        graph: &WaypointGraph,
        start: WaypointId,
        goal: WaypointId,
        mut blocked: F,
    ) -> SpatialResult<Path>
    where
        F: FnMut(Candidate) -> bool,
    {
        graph.check(start)?;
        graph.check(goal)?;
        if start == goal {
            return Ok(Path::trivial(start));
        }

        let n = graph.waypoint_count();
        let goal_pos = graph.position(goal);

        let mut g_score   = vec![f64::INFINITY; n];
        let mut hops      = vec![0u32; n];
        let mut came_from = vec![WaypointId::INVALID; n];
        let mut seq: u64 = 0;

        g_score[start.index()] = 0.0;

        let mut heap = BinaryHeap::new();
        heap.push(Frontier {
            f:        self.heuristic.estimate(graph.position(start), goal_pos),
            g:        0.0,
            seq,
            waypoint: start,
        });

        while let Some(Frontier { g, waypoint: current, .. }) = heap.pop() {
            if current == goal {
                return Ok(reconstruct(&came_from, start, goal, g));
            }

            // Skip stale heap entries.
            if g > g_score[current.index()] {
                continue;
            }

            let depth = hops[current.index()] + 1;
            for (neighbor, weight) in graph.neighbors(current) {
                if neighbor == start {
                    continue;
                }
                if neighbor != goal
                    && blocked(Candidate { waypoint: neighbor, from: current, hops: depth })
                {
                    continue;
                }

                let tentative = g + weight;
                if tentative < g_score[neighbor.index()] {
                    g_score[neighbor.index()]   = tentative;
                    hops[neighbor.index()]      = depth;
                    came_from[neighbor.index()] = current;
                    seq += 1;
                    heap.push(Frontier {
                        f:        tentative + self.heuristic.estimate(graph.position(neighbor), goal_pos),
                        g:        tentative,
                        seq,
                        waypoint: neighbor,
                    });
                }
            }
        }

        Err(SpatialError::NoPath { from: start, to: goal })
    }
}

fn reconstruct(came_from: &[WaypointId], start: WaypointId, goal: WaypointId, length: f64) -> Path {
    let mut waypoints = vec![goal];
    let mut cur = goal;
    while cur != start {
        cur = came_from[cur.index()];
        waypoints.push(cur);
    }
    waypoints.reverse();
    Path { waypoints, length }
}
