use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a directed [`Link`] inside its [`Topology`].
///
/// Unlike a physical cable, a `LinkId` has a direction: the two directed
/// links of one connection have two different identifiers, so guarantee
/// tables and stream registrations can differ per direction.
///
/// Links are always allocated in mirrored pairs, the forward link on an
/// even position and its mirror right after it. [`LinkId::mirror`]
/// relies on this.
///
/// ```
/// # use tsnsynth_core::link::LinkId;
/// let forward = LinkId::ZERO;
/// let backward = forward.mirror();
/// assert_ne!(forward, backward);
/// assert_eq!(backward.mirror(), forward);
/// ```
///
/// [`Link`]: crate::link::Link
/// [`Topology`]: crate::topology::Topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(u32);

impl LinkId {
    pub const ZERO: Self = Self(0);

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// the identifier of the same connection in the other direction
    #[inline]
    pub fn mirror(self) -> Self {
        Self(self.0 ^ 1)
    }

    /// `true` for the first link of a mirrored pair
    #[inline]
    pub fn is_forward(self) -> bool {
        self.0 & 1 == 0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}", self.0)
    }
}
