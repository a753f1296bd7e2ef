/// Deterministic wake-up queue.
///
/// A `BinaryHeap` with reversed `Ord` on `Event` acts as a min-heap keyed
/// by `(scheduled_at, event_id)`. Event IDs are handed out in submission
/// order, so wake-ups sharing a timestamp come back out FIFO.

use std::collections::BinaryHeap;

use crate::event::{Event, EventId, EventIdGen, EventType};
use crate::time::VirtualTime;

/// Owns the pending wake-ups and the event-ID generator.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Event>,
    id_gen: EventIdGen,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            queue: BinaryHeap::new(),
            id_gen: EventIdGen::new(),
        }
    }

    /// Queue `payload` to fire at `at`. Returns the assigned `EventId`.
    pub fn schedule(&mut self, at: VirtualTime, payload: EventType) -> EventId {
        let id = self.id_gen.next_id();
        self.queue.push(Event::new(id, at, payload));
        id
    }

    /// Pop the next event (earliest time, lowest ID).
    pub fn pop_next(&mut self) -> Option<Event> {
        self.queue.pop()
    }

    /// Time of the earliest pending wake-up.
    pub fn next_time(&self) -> Option<VirtualTime> {
        self.queue.peek().map(|e| e.scheduled_at)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Drain every pending event in dispatch order.
    pub fn drain_ordered(&mut self) -> Vec<Event> {
        let mut events = Vec::with_capacity(self.queue.len());
        while let Some(e) = self.queue.pop() {
            events.push(e);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityId;

    fn wake(n: u64) -> EventType {
        EventType::Wake(ActivityId::new(n))
    }

    #[test]
    fn test_fifo_at_same_time() {
        let mut sched = Scheduler::new();
        sched.schedule(VirtualTime::new(10), wake(3));
        sched.schedule(VirtualTime::new(10), wake(1));
        sched.schedule(VirtualTime::new(10), wake(2));

        let order: Vec<u64> = sched
            .drain_ordered()
            .into_iter()
            .map(|e| e.payload.activity().raw())
            .collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn test_time_ordering() {
        let mut sched = Scheduler::new();
        sched.schedule(VirtualTime::new(300), wake(0));
        sched.schedule(VirtualTime::new(50), wake(1));
        sched.schedule(VirtualTime::new(250), wake(2));

        assert_eq!(sched.next_time(), Some(VirtualTime::new(50)));
        let times: Vec<u64> = sched
            .drain_ordered()
            .iter()
            .map(|e| e.scheduled_at.ticks())
            .collect();
        assert_eq!(times, vec![50, 250, 300]);
    }

    #[test]
    fn test_interleaved_times_sorted_by_time_then_id() {
        let mut sched = Scheduler::new();
        for (at, n) in [(50, 0), (10, 1), (10, 2), (30, 3), (10, 4)] {
            sched.schedule(VirtualTime::new(at), wake(n));
        }
        let events = sched.drain_ordered();
        for pair in events.windows(2) {
            assert!(
                (pair[0].scheduled_at, pair[0].id) < (pair[1].scheduled_at, pair[1].id),
                "out of order: {:?} vs {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_empty_scheduler() {
        let mut sched = Scheduler::new();
        assert!(sched.is_empty());
        assert_eq!(sched.len(), 0);
        assert!(sched.next_time().is_none());
        assert!(sched.pop_next().is_none());
    }
}
