/// Wake-up events for the activity scheduler.
///
/// The engine has exactly one kind of effect: resuming a suspended
/// activity at a point in virtual time. Each such resumption is an
/// immutable `Event` placed on the scheduler's priority queue.

use std::cmp::Ordering;

use crate::activity::ActivityId;
use crate::time::VirtualTime;

// ── Event ID ──────────────────────────────────────────────────────────

/// Strictly increasing event identifier.
///
/// Two wake-ups at the same `VirtualTime` are ordered by `EventId`,
/// i.e. by the order in which they were submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u64);

impl EventId {
    #[inline]
    pub fn new(raw: u64) -> Self {
        EventId(raw)
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E#{}", self.0)
    }
}

/// Monotonic event-ID counter, one per scheduler.
#[derive(Debug, Clone, Default)]
pub struct EventIdGen {
    next: u64,
}

impl EventIdGen {
    pub fn new() -> Self {
        EventIdGen { next: 0 }
    }

    /// Mint the next event ID.
    pub fn next_id(&mut self) -> EventId {
        let id = EventId(self.next);
        self.next += 1;
        id
    }
}

// ── Event Type ────────────────────────────────────────────────────────

/// What happens when an event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    /// First resumption of a freshly spawned activity.
    Start(ActivityId),
    /// Resumption of an activity after a sleep or a join.
    Wake(ActivityId),
}

impl EventType {
    /// The activity this event resumes.
    pub fn activity(self) -> ActivityId {
        match self {
            EventType::Start(id) | EventType::Wake(id) => id,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Start(id) => write!(f, "Start({})", id),
            EventType::Wake(id) => write!(f, "Wake({})", id),
        }
    }
}

// ── Event ─────────────────────────────────────────────────────────────

/// A single pending wake-up, ordered by `(scheduled_at, id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub scheduled_at: VirtualTime,
    pub payload: EventType,
}

impl Event {
    pub fn new(id: EventId, scheduled_at: VirtualTime, payload: EventType) -> Self {
        Event {
            id,
            scheduled_at,
            payload,
        }
    }
}

/// Reversed so that `BinaryHeap` (a max-heap) pops the smallest
/// `(scheduled_at, id)` first.
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .scheduled_at
            .cmp(&self.scheduled_at)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
