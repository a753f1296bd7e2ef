/// Simulation execution loop.
///
/// Owns the virtual clock, the wake-up queue, the live activities and
/// the world they operate on. Everything runs on one thread: exactly one
/// activity executes at any instant, so the world needs no locking.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::activity::{Activity, ActivityId, Step};
use crate::event::{Event, EventType};
use crate::scheduler::Scheduler;
use crate::time::VirtualTime;

// ── Horizon ───────────────────────────────────────────────────────────

/// How a run treats wake-ups scheduled exactly at its end time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "snake_case"))]
pub enum Horizon {
    /// Wake-ups at the end time are resumed (`run_until`).
    Inclusive,
    /// Wake-ups at the end time are left pending (`run_before`).
    #[default]
    Exclusive,
}

// ── Simulation Context ───────────────────────────────────────────────

/// Handle passed to an activity on every resumption.
///
/// Gives access to the current time, the shared world and the ability
/// to spawn new activities. Spawned activities are only registered once
/// the current resumption returns.
pub struct SimulationContext<'a, W> {
    pub(crate) world: &'a mut W,
    pub(crate) now: VirtualTime,
    pub(crate) next_activity: &'a mut u64,
    pub(crate) spawned: Vec<(ActivityId, Box<dyn Activity<W>>)>,
}

impl<'a, W> SimulationContext<'a, W> {
    /// Current virtual time.
    #[inline]
    pub fn now(&self) -> VirtualTime {
        self.now
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut *self.world
    }

    /// Start a new concurrent activity. Its first resumption happens at
    /// the current time, after everything already queued for this time.
    pub fn spawn(&mut self, activity: Box<dyn Activity<W>>) -> ActivityId {
        let id = ActivityId::new(*self.next_activity);
        *self.next_activity += 1;
        self.spawned.push((id, activity));
        id
    }
}

// ── Simulation ────────────────────────────────────────────────────────

/// Top-level driver for a world `W` and the activities acting on it.
///
/// Call `advance` to move the clock to the next wake-up time, or
/// `run_until`/`run_before` to drive the run up to an end time.
/// Activities still suspended when a run stops are never resumed and
/// are not cleaned up.
pub struct Simulation<W> {
    scheduler: Scheduler,
    current_time: VirtualTime,
    world: W,
    activities: BTreeMap<ActivityId, Box<dyn Activity<W>>>,
    /// Activities parked on the completion of another one.
    joiners: BTreeMap<ActivityId, Vec<ActivityId>>,
    next_activity: u64,
    resumptions: u64,
}

impl<W> Simulation<W> {
    /// Create a simulation at time zero around `world`.
    pub fn new(world: W) -> Self {
        Simulation {
            scheduler: Scheduler::new(),
            current_time: VirtualTime::ZERO,
            world,
            activities: BTreeMap::new(),
            joiners: BTreeMap::new(),
            next_activity: 0,
            resumptions: 0,
        }
    }

    pub fn current_time(&self) -> VirtualTime {
        self.current_time
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Consume the simulation, keeping only the world.
    pub fn into_world(self) -> W {
        self.world
    }

    /// Total activity resumptions so far.
    pub fn resumptions(&self) -> u64 {
        self.resumptions
    }

    /// Number of spawned activities that have not finished yet.
    pub fn live_activities(&self) -> usize {
        self.activities.len()
    }

    /// Time of the earliest pending wake-up, if any.
    pub fn next_wakeup(&self) -> Option<VirtualTime> {
        self.scheduler.next_time()
    }

    /// Returns `true` if nothing is left to resume.
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_empty()
    }

    /// Register an activity from outside the run; it starts at the
    /// current time.
    pub fn spawn(&mut self, activity: Box<dyn Activity<W>>) -> ActivityId {
        let id = ActivityId::new(self.next_activity);
        self.next_activity += 1;
        self.register(id, activity);
        id
    }

    fn register(&mut self, id: ActivityId, activity: Box<dyn Activity<W>>) {
        self.activities.insert(id, activity);
        self.scheduler.schedule(self.current_time, EventType::Start(id));
    }

    /// Resume exactly one pending wake-up.
    ///
    /// Returns the event that was processed, or `None` if the queue is
    /// empty.
    pub fn step(&mut self) -> Option<Event> {
        let event = self.scheduler.pop_next()?;

        assert!(
            event.scheduled_at >= self.current_time,
            "time went backward: current={}, event={}",
            self.current_time,
            event.scheduled_at
        );
        self.current_time = event.scheduled_at;

        let id = event.payload.activity();
        let Some(activity) = self.activities.get_mut(&id) else {
            return Some(event);
        };
        self.resumptions += 1;
        trace!(
            time = self.current_time.ticks(),
            event = %event.payload,
            label = activity.label(),
            "resume"
        );

        let mut ctx = SimulationContext {
            world: &mut self.world,
            now: self.current_time,
            next_activity: &mut self.next_activity,
            spawned: Vec::new(),
        };
        let step = activity.resume(&mut ctx);
        let spawned = ctx.spawned;

        // Children go into the queue ahead of the parent's own wake-up.
        for (child, activity) in spawned {
            self.register(child, activity);
        }
        self.apply(id, step);

        Some(event)
    }

    fn apply(&mut self, id: ActivityId, step: Step) {
        match step {
            Step::Sleep(ticks) => match self.current_time.after(ticks) {
                Some(at) => {
                    self.scheduler.schedule(at, EventType::Wake(id));
                }
                // Past the last representable instant: stays suspended.
                None => debug!(activity = %id, ticks, "wake-up beyond u64 time dropped"),
            },
            Step::Join(target) => {
                assert!(target != id, "activity {} cannot join itself", id);
                if self.activities.contains_key(&target) {
                    self.joiners.entry(target).or_default().push(id);
                } else {
                    self.scheduler.schedule(self.current_time, EventType::Wake(id));
                }
            }
            Step::Done => {
                self.activities.remove(&id);
                for joiner in self.joiners.remove(&id).unwrap_or_default() {
                    self.scheduler
                        .schedule(self.current_time, EventType::Wake(joiner));
                }
            }
        }
    }

    /// Move the clock to the earliest pending wake-up time and resume
    /// every activity due at exactly that time, in submission order.
    /// Wake-ups scheduled for the same instant during this call are
    /// resumed too.
    ///
    /// Returns the new time, or `None` (clock unchanged) if nothing is
    /// pending.
    pub fn advance(&mut self) -> Option<VirtualTime> {
        let at = self.scheduler.next_time()?;
        while self.scheduler.next_time() == Some(at) {
            self.step();
        }
        Some(at)
    }

    /// Advance while the next wake-up is at or before `end`.
    ///
    /// Returns the number of resumptions performed.
    pub fn run_until(&mut self, end: VirtualTime) -> u64 {
        let start = self.resumptions;
        while self.scheduler.next_time().is_some_and(|t| t <= end) {
            self.advance();
        }
        self.resumptions - start
    }

    /// Advance while the next wake-up is strictly before `end`.
    ///
    /// Returns the number of resumptions performed.
    pub fn run_before(&mut self, end: VirtualTime) -> u64 {
        let start = self.resumptions;
        while self.scheduler.next_time().is_some_and(|t| t < end) {
            self.advance();
        }
        self.resumptions - start
    }

    /// Run up to `end` with the given boundary treatment.
    pub fn run_to(&mut self, end: VirtualTime, horizon: Horizon) -> u64 {
        match horizon {
            Horizon::Inclusive => self.run_until(end),
            Horizon::Exclusive => self.run_before(end),
        }
    }

    /// Run until the wake-up queue is empty.
    ///
    /// Never returns if an activity keeps rescheduling itself forever.
    pub fn run(&mut self) -> u64 {
        let start = self.resumptions;
        while self.advance().is_some() {}
        self.resumptions - start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Vec<(u64, &'static str)>;

    /// Record `tag` at every resumption, sleeping `period` in between.
    fn ticker(tag: &'static str, period: u64, times: u32) -> Box<dyn Activity<Log>> {
        let mut left = times;
        Box::new(move |ctx: &mut SimulationContext<'_, Log>| {
            let now = ctx.now().ticks();
            ctx.world_mut().push((now, tag));
            left -= 1;
            if left == 0 {
                Step::Done
            } else {
                Step::Sleep(period)
            }
        })
    }

    #[test]
    fn test_spawned_activity_starts_at_current_time() {
        let mut sim = Simulation::new(Log::new());
        sim.spawn(ticker("a", 10, 3));
        let processed = sim.run();

        assert_eq!(processed, 3);
        assert_eq!(sim.world(), &vec![(0, "a"), (10, "a"), (20, "a")]);
        assert_eq!(sim.current_time(), VirtualTime::new(20));
        assert_eq!(sim.live_activities(), 0);
        assert!(sim.is_finished());
    }

    #[test]
    fn test_same_time_resumes_in_submission_order() {
        let mut sim = Simulation::new(Log::new());
        sim.spawn(ticker("first", 5, 2));
        sim.spawn(ticker("second", 5, 2));
        sim.spawn(ticker("third", 5, 2));
        sim.run();

        assert_eq!(
            sim.world(),
            &vec![
                (0, "first"),
                (0, "second"),
                (0, "third"),
                (5, "first"),
                (5, "second"),
                (5, "third"),
            ]
        );
    }

    #[test]
    fn test_advance_resumes_whole_time_bucket() {
        let mut sim = Simulation::new(Log::new());
        sim.spawn(ticker("a", 10, 2));
        sim.spawn(ticker("b", 30, 2));

        assert_eq!(sim.advance(), Some(VirtualTime::new(0)));
        assert_eq!(sim.world().len(), 2);

        assert_eq!(sim.advance(), Some(VirtualTime::new(10)));
        assert_eq!(sim.world().last(), Some(&(10, "a")));

        assert_eq!(sim.advance(), Some(VirtualTime::new(30)));
        assert_eq!(sim.advance(), None);
        assert_eq!(sim.current_time(), VirtualTime::new(30));
    }

    #[test]
    fn test_advance_on_empty_queue_keeps_clock() {
        let mut sim = Simulation::new(Log::new());
        assert_eq!(sim.advance(), None);
        assert_eq!(sim.current_time(), VirtualTime::ZERO);
        assert_eq!(sim.run(), 0);
    }

    #[test]
    fn test_zero_sleep_resumes_in_same_advance() {
        let mut sim = Simulation::new(Log::new());
        sim.spawn(ticker("z", 0, 3));
        assert_eq!(sim.advance(), Some(VirtualTime::ZERO));
        assert_eq!(sim.world().len(), 3);
        assert!(sim.is_finished());
    }

    #[test]
    fn test_run_until_is_inclusive() {
        let mut sim = Simulation::new(Log::new());
        sim.spawn(ticker("a", 100, 10));
        sim.run_until(VirtualTime::new(300));

        let times: Vec<u64> = sim.world().iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec![0, 100, 200, 300]);
        assert_eq!(sim.current_time(), VirtualTime::new(300));
        assert_eq!(sim.next_wakeup(), Some(VirtualTime::new(400)));
    }

    #[test]
    fn test_run_before_is_exclusive() {
        let mut sim = Simulation::new(Log::new());
        sim.spawn(ticker("a", 100, 10));
        sim.run_before(VirtualTime::new(300));

        let times: Vec<u64> = sim.world().iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec![0, 100, 200]);
        assert_eq!(sim.current_time(), VirtualTime::new(200));
        assert_eq!(sim.next_wakeup(), Some(VirtualTime::new(300)));
    }

    #[test]
    fn test_run_to_dispatches_on_horizon() {
        let mut inclusive = Simulation::new(Log::new());
        inclusive.spawn(ticker("a", 50, 5));
        inclusive.run_to(VirtualTime::new(100), Horizon::Inclusive);

        let mut exclusive = Simulation::new(Log::new());
        exclusive.spawn(ticker("a", 50, 5));
        exclusive.run_to(VirtualTime::new(100), Horizon::Exclusive);

        assert_eq!(inclusive.world().len(), 3);
        assert_eq!(exclusive.world().len(), 2);
    }

    #[test]
    fn test_truncated_activity_is_abandoned() {
        let mut sim = Simulation::new(Log::new());
        sim.spawn(ticker("long", 1_000, 2));
        sim.run_until(VirtualTime::new(500));

        assert_eq!(sim.world(), &vec![(0, "long")]);
        assert_eq!(sim.live_activities(), 1);
        assert!(!sim.is_finished());
    }

    #[test]
    fn test_join_waits_for_child_completion() {
        let mut sim = Simulation::new(Log::new());
        let mut joined = false;
        sim.spawn(Box::new(move |ctx: &mut SimulationContext<'_, Log>| {
            let now = ctx.now().ticks();
            if joined {
                ctx.world_mut().push((now, "parent resumed"));
                return Step::Done;
            }
            joined = true;
            ctx.world_mut().push((now, "parent spawns"));
            let child = ctx.spawn(ticker("child", 40, 2));
            Step::Join(child)
        }));
        sim.run();

        assert_eq!(
            sim.world(),
            &vec![
                (0, "parent spawns"),
                (0, "child"),
                (40, "child"),
                (40, "parent resumed"),
            ]
        );
    }

    #[test]
    fn test_join_on_finished_activity_wakes_immediately() {
        let mut sim = Simulation::new(Log::new());
        let early = sim.spawn(ticker("early", 1, 1));
        sim.run();
        assert_eq!(sim.live_activities(), 0);

        let mut waited = false;
        sim.spawn(Box::new(move |ctx: &mut SimulationContext<'_, Log>| {
            if waited {
                let now = ctx.now().ticks();
                ctx.world_mut().push((now, "woke"));
                return Step::Done;
            }
            waited = true;
            Step::Join(early)
        }));
        sim.run();
        assert_eq!(sim.world().last(), Some(&(0, "woke")));
    }

    #[test]
    fn test_children_start_before_parent_next_wakeup() {
        let mut sim = Simulation::new(Log::new());
        let mut rounds = 0;
        sim.spawn(Box::new(move |ctx: &mut SimulationContext<'_, Log>| {
            rounds += 1;
            if rounds > 2 {
                return Step::Done;
            }
            let now = ctx.now().ticks();
            ctx.world_mut().push((now, "parent"));
            ctx.spawn(ticker("child", 1, 1));
            Step::Sleep(0)
        }));
        sim.run();

        assert_eq!(
            sim.world(),
            &vec![(0, "parent"), (0, "child"), (0, "parent"), (0, "child")]
        );
    }

    #[test]
    fn test_sleep_past_u64_time_leaves_activity_suspended() {
        let mut sim = Simulation::new(Log::new());
        let mut sleeps = [u64::MAX, 1].into_iter();
        sim.spawn(Box::new(move |ctx: &mut SimulationContext<'_, Log>| {
            let now = ctx.now().ticks();
            ctx.world_mut().push((now, "far"));
            sleeps.next().map_or(Step::Done, Step::Sleep)
        }));
        // Wakes at u64::MAX, then asks for one more tick.
        sim.run();

        assert_eq!(sim.world(), &vec![(0, "far"), (u64::MAX, "far")]);
        assert!(sim.is_finished());
        assert_eq!(sim.live_activities(), 1);
    }

    #[test]
    fn test_deterministic_replay() {
        fn run_trace() -> Log {
            let mut sim = Simulation::new(Log::new());
            sim.spawn(ticker("x", 7, 5));
            sim.spawn(ticker("y", 3, 9));
            sim.spawn(ticker("z", 21, 2));
            sim.run_until(VirtualTime::new(25));
            sim.into_world()
        }
        assert_eq!(run_trace(), run_trace());
    }
}
