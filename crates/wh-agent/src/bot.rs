//! Bot kinematic state machine.
//!
//! A bot follows its path one waypoint at a time as a bounded-acceleration
//! point mass.  Each [`Bot::update`] either moves the bot along the straight
//! segment towards the head waypoint or, once it is within
//! [`ARRIVAL_EPSILON`], snaps it exactly onto that waypoint and pops it.
//!
//! | State     | Condition                          | `update`          |
//! |-----------|------------------------------------|-------------------|
//! | `Idle`    | path empty                         | no-op             |
//! | `Moving`  | path non-empty, active, not paused | advance           |
//! | `Waiting` | paused or deactivated              | no-op             |

use std::collections::VecDeque;

use wh_core::geo::{angle_diff, normalize_angle};
use wh_core::{BotId, Point, PodId, WaypointId};
use wh_spatial::WaypointGraph;

use crate::{AgentError, AgentResult};

/// Below this separation the bot is considered to be on its target.
pub const ARRIVAL_EPSILON: f64 = 1e-6;

/// Heading error a hazard bot tolerates before it stops to turn.
const HEADING_TOLERANCE: f64 = 1e-3;

/// Evade radius of a hazard bot, in multiples of its own radius.
const HAZARD_EVADE_FACTOR: f64 = 2.3;

// ── Kinematic parameters ──────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Kinematics {
    /// m/s².  Default: 1.0.
    pub max_acceleration: f64,
    /// m/s².  Default: 1.0.
    pub max_deceleration: f64,
    /// m/s.  Default: 2.0.
    pub max_velocity: f64,
}

impl Default for Kinematics {
    fn default() -> Self {
        Self {
            max_acceleration: 1.0,
            max_deceleration: 1.0,
            max_velocity:     2.0,
        }
    }
}

impl Kinematics {
    pub fn validate(&self) -> AgentResult<()> {
        for (name, v) in [
            ("max_acceleration", self.max_acceleration),
            ("max_deceleration", self.max_deceleration),
            ("max_velocity", self.max_velocity),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(AgentError::InvalidKinematics(format!(
                    "{name} must be positive, got {v}"
                )));
            }
        }
        Ok(())
    }
}

/// Motion model variant.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum BotKind {
    /// Turns instantly and accelerates straight at the target.
    #[default]
    Standard,
    /// Turns in place at `turn_speed` rad/s before driving, and brakes so
    /// that it could stop on the target with `max_deceleration`.
    Hazard { turn_speed: f64 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BotState {
    Idle,
    Moving,
    Waiting,
}

/// Result of one [`Bot::update`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MotionOutcome {
    /// Distance covered this update, in metres.
    pub moved: f64,
    /// Waypoint reached and popped this update.
    pub arrived: Option<WaypointId>,
}

impl MotionOutcome {
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.moved == 0.0 && self.arrived.is_none()
    }
}

// ── Bot ───────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Bot {
    pub id:          BotId,
    pub kind:        BotKind,
    pub position:    Point,
    /// Radians in `(-π, π]`.
    pub orientation: f64,
    pub radius:      f64,
    pub kinematics:  Kinematics,
    /// Current speed, m/s.
    pub velocity:    f64,
    /// Last waypoint the bot stood exactly on.
    pub current_waypoint: Option<WaypointId>,
    pub hops_travelled:     u64,
    pub distance_travelled: f64,

    pub(crate) carried: Option<PodId>,
    path:    VecDeque<WaypointId>,
    active:  bool,
    waiting: bool,
}

impl Bot {
    pub fn new(id: BotId, kind: BotKind, position: Point, radius: f64, kinematics: Kinematics) -> Self {
        Self {
            id,
            kind,
            position,
            orientation:        0.0,
            radius,
            kinematics,
            velocity:           0.0,
            current_waypoint:   None,
            hops_travelled:     0,
            distance_travelled: 0.0,
            carried:            None,
            path:               VecDeque::new(),
            active:             true,
            waiting:            false,
        }
    }

    pub fn state(&self) -> BotState {
        if self.waiting || !self.active {
            BotState::Waiting
        } else if self.path.is_empty() {
            BotState::Idle
        } else {
            BotState::Moving
        }
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.state() == BotState::Idle
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn carried(&self) -> Option<PodId> {
        self.carried
    }

    #[inline]
    pub fn is_carrying(&self) -> bool {
        self.carried.is_some()
    }

    /// Remaining waypoints, front first.
    #[inline]
    pub fn path(&self) -> &VecDeque<WaypointId> {
        &self.path
    }

    #[inline]
    pub fn next_waypoint(&self) -> Option<WaypointId> {
        self.path.front().copied()
    }

    #[inline]
    pub fn destination(&self) -> Option<WaypointId> {
        self.path.back().copied()
    }

    /// Distance within which a hazard bot asks others to give way.
    pub fn evade_distance(&self) -> Option<f64> {
        match self.kind {
            BotKind::Standard => None,
            BotKind::Hazard { .. } => Some(HAZARD_EVADE_FACTOR * self.radius),
        }
    }

    /// Replace the path.  A leading waypoint the bot is already standing on
    /// is dropped.  Adjacency is checked by [`Fleet::assign_path`][crate::Fleet::assign_path].
    pub fn assign_path(&mut self, waypoints: impl IntoIterator<Item = WaypointId>) {
        self.path.clear();
        self.path.extend(waypoints);
        if self.current_waypoint.is_some() && self.path.front().copied() == self.current_waypoint {
            self.path.pop_front();
        }
    }

    pub fn clear_path(&mut self) {
        self.path.clear();
    }

    pub fn pause(&mut self) {
        self.waiting = true;
        self.velocity = 0.0;
    }

    pub fn resume(&mut self) {
        self.waiting = false;
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        if !active {
            self.velocity = 0.0;
        }
    }

    /// Advance the bot by `dt` seconds along its path.
    ///
    /// Never moves farther than `max_velocity · dt`.  On arrival the bot
    /// sits exactly on the waypoint with zero velocity.
    pub fn update(&mut self, dt: f64, graph: &WaypointGraph) -> MotionOutcome {
        if self.state() != BotState::Moving {
            return MotionOutcome::default();
        }
        let Some(&target_id) = self.path.front() else {
            return MotionOutcome::default();
        };
        if !graph.contains(target_id) {
            self.path.clear();
            self.velocity = 0.0;
            return MotionOutcome::default();
        }
        let target = graph.position(target_id);

        let remaining = self.position.distance(target);
        if remaining < ARRIVAL_EPSILON {
            return self.arrive(target_id, target);
        }

        let heading = self.position.heading_to(target);
        let k = self.kinematics;
        let speed = match self.kind {
            BotKind::Standard => (self.velocity + k.max_acceleration * dt).min(k.max_velocity),
            BotKind::Hazard { turn_speed } => {
                if !self.turn_towards(heading, turn_speed * dt) {
                    self.velocity = 0.0;
                    return MotionOutcome::default();
                }
                let braking = (2.0 * k.max_deceleration * remaining).sqrt();
                (self.velocity + k.max_acceleration * dt).min(k.max_velocity).min(braking)
            }
        };

        let step = (speed * dt).min(remaining);
        self.velocity = speed;
        self.position = self.position.step_towards(target, step);
        self.orientation = heading;
        self.distance_travelled += step;

        MotionOutcome { moved: step, arrived: None }
    }

    fn arrive(&mut self, waypoint: WaypointId, at: Point) -> MotionOutcome {
        self.position = at;
        self.path.pop_front();
        self.current_waypoint = Some(waypoint);
        self.velocity = 0.0;
        self.hops_travelled += 1;
        MotionOutcome { moved: 0.0, arrived: Some(waypoint) }
    }

    /// Rotate towards `heading` by at most `max_turn`.  Returns `true` once
    /// aligned.
    fn turn_towards(&mut self, heading: f64, max_turn: f64) -> bool {
        let diff = angle_diff(self.orientation, heading);
        if diff.abs() <= HEADING_TOLERANCE || diff.abs() <= max_turn {
            self.orientation = heading;
            return true;
        }
        self.orientation = normalize_angle(self.orientation + max_turn.copysign(diff));
        false
    }
}
