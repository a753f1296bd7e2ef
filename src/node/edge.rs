//! `EdgeNode` — a processing node with bounded concurrent capacity.

use super::{ComputeNode, ServiceTier};

/// Processing time of an edge node in the reference setup.
pub const DEFAULT_EDGE_PROCESSING_TIME: u64 = 200;

/// An edge node that can run at most `capacity` tasks at once.
///
/// `busy` tracks tasks currently in flight and always stays within
/// `0..=capacity`. `load` counts every task ever accepted; it never
/// decreases and is what the dispatcher balances on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeNode {
    name: String,
    capacity: u32,
    busy: u32,
    load: u64,
    processing_time: u64,
}

impl EdgeNode {
    pub fn new(name: impl Into<String>, capacity: u32, processing_time: u64) -> Self {
        EdgeNode {
            name: name.into(),
            capacity,
            busy: 0,
            load: 0,
            processing_time,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Tasks currently in flight.
    pub fn busy(&self) -> u32 {
        self.busy
    }
}

impl ComputeNode for EdgeNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_capacity(&self) -> bool {
        self.busy < self.capacity
    }

    fn load(&self) -> u64 {
        self.load
    }

    fn processing_time(&self) -> u64 {
        self.processing_time
    }

    fn tier(&self) -> ServiceTier {
        ServiceTier::Partial
    }

    fn accept(&mut self) {
        assert!(
            self.busy < self.capacity,
            "edge node {} dispatched without free capacity ({}/{})",
            self.name,
            self.busy,
            self.capacity
        );
        self.busy += 1;
        self.load += 1;
    }

    fn release(&mut self) {
        assert!(self.busy > 0, "edge node {} released while idle", self.name);
        self.busy -= 1;
    }
}
