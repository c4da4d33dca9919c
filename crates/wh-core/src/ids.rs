//! Strongly typed, zero-cost identifier wrappers.
//!
//! Every entity lives in an arena (`Vec`) owned by its subsystem; cross-entity
//! references are these ids rather than pointers.  All ids are
//! `Copy + Ord + Hash`, and the inner integer is `pub` so arenas can index
//! with `id.index()`.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as an arena index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a bot in the fleet arena.  Registration order is id order.
    pub struct BotId(u32);
}

typed_id! {
    /// Index of a pod (mobile storage unit).
    pub struct PodId(u32);
}

typed_id! {
    /// Index of a waypoint in the navigation graph.
    pub struct WaypointId(u32);
}

typed_id! {
    /// Index of an input or output station.  Input and output stations are
    /// numbered independently.
    pub struct StationId(u32);
}

typed_id! {
    /// Index of an elevator linking tiers.
    pub struct ElevatorId(u32);
}

typed_id! {
    /// Sequential order number.
    pub struct OrderId(u32);
}

typed_id! {
    /// Item description (SKU) identifier.
    pub struct ItemId(u32);
}
