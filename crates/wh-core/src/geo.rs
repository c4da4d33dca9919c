//! Planar coordinate type and heading utilities.
//!
//! The warehouse floor is a flat plane measured in metres, so `Point` uses
//! `f64` Cartesian coordinates.  Orientation is expressed in radians,
//! counter-clockwise from the +x axis, normalised to `(-π, π]`.

use std::f64::consts::{PI, TAU};

/// A position on the warehouse floor.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance.
    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// L1 (taxicab) distance.
    #[inline]
    pub fn manhattan(self, other: Point) -> f64 {
        (other.x - self.x).abs() + (other.y - self.y).abs()
    }

    /// Heading from `self` towards `other`, in radians.
    #[inline]
    pub fn heading_to(self, other: Point) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Move `dist` metres from `self` towards `target`.
    ///
    /// Never overshoots: a `dist` at or beyond the separation returns
    /// `target` exactly.
    pub fn step_towards(self, target: Point, dist: f64) -> Point {
        let total = self.distance(target);
        if dist >= total || total <= f64::EPSILON {
            return target;
        }
        let f = dist / total;
        Point::new(self.x + (target.x - self.x) * f, self.y + (target.y - self.y) * f)
    }

    /// `true` if discs of radius `r_self` and `r_other` overlap.
    #[inline]
    pub fn discs_overlap(self, r_self: f64, other: Point, r_other: f64) -> bool {
        self.distance(other) < r_self + r_other
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// Wrap an angle into `(-π, π]`.
pub fn normalize_angle(theta: f64) -> f64 {
    let mut a = theta.rem_euclid(TAU);
    if a > PI {
        a -= TAU;
    }
    a
}

/// Signed smallest rotation taking `from` onto `to`.
#[inline]
pub fn angle_diff(from: f64, to: f64) -> f64 {
    normalize_angle(to - from)
}
