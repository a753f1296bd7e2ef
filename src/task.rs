//! The unit of work handed from the dispatcher to a processing node.

use crate::time::VirtualTime;

/// Payload size given to every generated task.
pub const DEFAULT_TASK_SIZE: u64 = 1000;

/// An immutable computational task.
///
/// `size` travels with the task but does not influence processing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Task {
    pub id: u64,
    pub size: u64,
    pub created_at: VirtualTime,
}

impl Task {
    pub fn new(id: u64, size: u64, created_at: VirtualTime) -> Self {
        Task {
            id,
            size,
            created_at,
        }
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Task {} (created {})", self.id, self.created_at)
    }
}
