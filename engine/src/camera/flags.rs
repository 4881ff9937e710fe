//! Camera Flag Sets
//!
//! Small bitsets for per-brain behaviour switches and controller-wide state.

use serde::{Deserialize, Serialize};

macro_rules! flag_set {
    ($(#[$meta:meta])* $name:ident { $($(#[$fmeta:meta])* $flag:ident = $bit:expr,)* }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            $($(#[$fmeta])* pub const $flag: Self = Self(1 << $bit);)*

            pub const fn empty() -> Self {
                Self(0)
            }

            #[inline]
            pub const fn bits(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0 && other.0 != 0
            }

            #[inline]
            pub const fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }

            #[inline]
            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }

            #[inline]
            pub fn remove(&mut self, other: Self) {
                self.0 &= !other.0;
            }

            #[inline]
            pub fn set(&mut self, other: Self, on: bool) {
                if on {
                    self.insert(other);
                } else {
                    self.remove(other);
                }
            }

            #[inline]
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            /// Names of the set flags, for logging.
            pub fn names(self) -> Vec<&'static str> {
                let mut out = Vec::new();
                $(if self.contains(Self::$flag) { out.push(stringify!($flag)); })*
                out
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl std::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.names().join(" | "))
            }
        }
    };
}

flag_set! {
    /// Behaviour switches of a single brain.
    BrainFlags {
        /// Position always snaps to its goal
        CUT_POS = 0,
        /// Point of aim always snaps to its goal
        CUT_POA = 1,
        /// Position snaps on the next update only
        CUT_POS_ONCE = 2,
        /// Point of aim snaps on the next update only
        CUT_POA_ONCE = 3,
        /// Not physically simulated; snaps like a cut
        NON_PHYS = 4,
        MAINTAIN_LOS = 5,
        /// POA offset is in world axes rather than subject axes
        WORLDSPACE_POA = 6,
        /// Position offset is in world axes rather than subject axes
        WORLDSPACE_POS = 7,
        /// Lagging far behind the subject; catch up at panic speed
        PANIC_VELOCITY = 8,
        IS_TRANSITION_CAMERA = 9,
        ANIMATE_FOV = 10,
        ZOOM_ENABLED = 11,
        /// Subject is rebound to the local avatar whenever it loads
        FOLLOW_LOCAL_AVATAR = 12,
        VERTICAL_WHEN_FALLING = 13,
        SPEED_UP_WHEN_RUNNING = 14,
        /// Fall notified, waiting for the fall delay to expire
        BEGIN_FALLING = 15,
        FALLING = 16,
        RUNNING = 17,
    }
}

flag_set! {
    /// Controller-wide state bits.
    CameraFlags {
        /// Output is delivered to the pipeline
        RENDER = 0,
        /// Next stack change cuts instead of blending
        CUT_NEXT_TRANS = 1,
        /// Output FOV changed and must be pushed to the pipeline
        SET_FOV = 2,
        /// Avatar is walking (forward/backward held)
        AVATAR_WALKING = 3,
        /// View is decaying back to centre
        UNPAN = 4,
        /// Pan limits are interpolating toward the active brain's limits
        INTERP_PAN_LIMITS = 5,
        FALLING = 6,
        FIRST_PERSON_ENABLED = 7,
        FIRST_PERSON_USER_SELECTED = 8,
        FIRST_PERSON_AT_LINK_OUT = 9,
        RESPONDER_FORCED_3RD = 10,
        SCRIPTS_FORCED_3RD = 11,
        SCRIPTS_DISABLED_1ST = 12,
        /// Camera region triggers are ignored
        REGION_IGNORE = 13,
        /// Mouse deltas are inverted
        INVERT_MOUSE = 14,
    }
}
