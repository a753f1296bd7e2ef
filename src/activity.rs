//! Cooperative activities: small state machines re-entered by the engine.
//!
//! An activity never blocks. Each time it is resumed it does some work
//! against the shared world and returns a [`Step`] telling the engine
//! when to resume it next.

use crate::simulation::SimulationContext;

// ── ActivityId ────────────────────────────────────────────────────────

/// Identifier of a spawned activity, in spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActivityId(u64);

impl ActivityId {
    #[inline]
    pub fn new(raw: u64) -> Self {
        ActivityId(raw)
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "A{}", self.0)
    }
}

// ── Step ──────────────────────────────────────────────────────────────

/// The suspension an activity asks for when it yields control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Park for a fixed number of ticks.
    Sleep(u64),
    /// Park until the given activity has finished.
    Join(ActivityId),
    /// The activity is finished and is never resumed again.
    Done,
}

// ── Activity ──────────────────────────────────────────────────────────

/// A unit of cooperative concurrent execution over a world `W`.
///
/// Implementations must route every side effect through `ctx` and must
/// be deterministic for equal inputs.
///
/// # Example
///
/// ```rust
/// use offload_sim::activity::{Activity, Step};
/// use offload_sim::simulation::{Simulation, SimulationContext};
///
/// struct Blink { left: u32 }
///
/// impl Activity<Vec<u64>> for Blink {
///     fn resume(&mut self, ctx: &mut SimulationContext<'_, Vec<u64>>) -> Step {
///         let now = ctx.now().ticks();
///         ctx.world_mut().push(now);
///         if self.left == 0 {
///             return Step::Done;
///         }
///         self.left -= 1;
///         Step::Sleep(10)
///     }
/// }
///
/// let mut sim = Simulation::new(Vec::new());
/// sim.spawn(Box::new(Blink { left: 2 }));
/// sim.run();
/// assert_eq!(sim.world(), &vec![0, 10, 20]);
/// ```
pub trait Activity<W> {
    /// Resume the activity at `ctx.now()`.
    fn resume(&mut self, ctx: &mut SimulationContext<'_, W>) -> Step;

    /// Short name used in trace output.
    fn label(&self) -> &str {
        "activity"
    }
}

/// An activity backed by a closure, handy for tests and one-off probes.
impl<W, F> Activity<W> for F
where
    F: FnMut(&mut SimulationContext<'_, W>) -> Step,
{
    fn resume(&mut self, ctx: &mut SimulationContext<'_, W>) -> Step {
        (self)(ctx)
    }
}
