/// Virtual time for the offloading simulation.
///
/// A tick counter with no relation to `std::time`. The clock only moves
/// when the simulation resumes the next pending wake-up.

/// A point on the simulated timeline, measured in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(transparent))]
pub struct VirtualTime(u64);

impl VirtualTime {
    /// Start of every run.
    pub const ZERO: VirtualTime = VirtualTime(0);

    #[inline]
    pub fn new(ticks: u64) -> Self {
        VirtualTime(ticks)
    }

    #[inline]
    pub fn ticks(self) -> u64 {
        self.0
    }

    /// The instant `delay` ticks after `self`, or `None` on overflow.
    #[inline]
    pub fn after(self, delay: u64) -> Option<VirtualTime> {
        self.0.checked_add(delay).map(VirtualTime)
    }

    /// Ticks elapsed between `earlier` and `self`.
    /// Returns `None` if `earlier` is actually later.
    #[inline]
    pub fn since(self, earlier: VirtualTime) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }
}

impl From<u64> for VirtualTime {
    fn from(ticks: u64) -> Self {
        VirtualTime(ticks)
    }
}

impl std::fmt::Display for VirtualTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t={}", self.0)
    }
}
