//! `CloudNode` — unbounded capacity, fixed delay.

use super::{ComputeNode, ServiceTier};

/// Cloud round-trip delay in the reference setup.
pub const DEFAULT_CLOUD_DELAY: u64 = 300;

/// The cloud: any number of tasks in parallel, each taking `delay` ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudNode {
    name: String,
    delay: u64,
}

impl CloudNode {
    pub fn new(name: impl Into<String>, delay: u64) -> Self {
        CloudNode {
            name: name.into(),
            delay,
        }
    }

    pub fn delay(&self) -> u64 {
        self.delay
    }
}

impl ComputeNode for CloudNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_capacity(&self) -> bool {
        true
    }

    /// The cloud is never balanced against, so it reports no load.
    fn load(&self) -> u64 {
        0
    }

    fn processing_time(&self) -> u64 {
        self.delay
    }

    fn tier(&self) -> ServiceTier {
        ServiceTier::Full
    }

    fn accept(&mut self) {}

    fn release(&mut self) {}
}
