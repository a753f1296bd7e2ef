//! Result sink — the ordered output of one simulation run.
//!
//! Records are appended in completion order, which can differ from task
//! creation order whenever several nodes process concurrently.

use crate::node::ServiceTier;
use crate::time::VirtualTime;

// ── CompletionRecord ──────────────────────────────────────────────────

/// The outcome of one processed task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct CompletionRecord {
    pub task_id: u64,
    /// Name of the node that processed the task.
    pub processed_by: String,
    /// `completed_at - created_at`, in ticks.
    pub latency: u64,
    pub service_tier: ServiceTier,
    pub completed_at: VirtualTime,
}

impl std::fmt::Display for CompletionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] task {} by {} latency={} {}",
            self.completed_at,
            self.task_id,
            self.processed_by,
            self.latency,
            self.service_tier.label()
        )
    }
}

// ── ResultSink ────────────────────────────────────────────────────────

/// Append-only sequence of completion records owned by one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(transparent))]
pub struct ResultSink {
    records: Vec<CompletionRecord>,
}

impl ResultSink {
    pub fn new() -> Self {
        ResultSink {
            records: Vec::new(),
        }
    }

    /// Only processing activities append.
    pub(crate) fn push(&mut self, record: CompletionRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[CompletionRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompletionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stable fingerprint of the whole record sequence.
    ///
    /// Equal for two runs exactly when they produced the same records
    /// in the same order (up to hash collisions).
    pub fn digest(&self) -> u64 {
        let mut h = hash_combine(0, self.records.len() as u64);
        for r in &self.records {
            h = hash_combine(h, r.task_id);
            h = hash_combine(h, hash_bytes(r.processed_by.as_bytes()));
            h = hash_combine(h, r.latency);
            h = hash_combine(h, r.service_tier as u64);
            h = hash_combine(h, r.completed_at.ticks());
        }
        h
    }
}

impl<'a> IntoIterator for &'a ResultSink {
    type Item = &'a CompletionRecord;
    type IntoIter = std::slice::Iter<'a, CompletionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn hash_combine(a: u64, b: u64) -> u64 {
    let mut h = a.wrapping_mul(0x517cc1b727220a95);
    h = h.wrapping_add(b);
    h ^= h >> 32;
    h
}

/// FNV-1a.
fn hash_bytes(data: &[u8]) -> u64 {
    data.iter().fold(0xcbf29ce484222325, |h, &b| {
        (h ^ b as u64).wrapping_mul(0x100000001b3)
    })
}
