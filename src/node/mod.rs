//! Processing nodes: bounded edge nodes and an unbounded cloud node.
//!
//! Both variants expose the same capability set through [`ComputeNode`]:
//! accept a task, report availability and load, hold a task for a fixed
//! processing time, and release it with a service tier for the result.
//!
//! # Module structure
//!
//! | Sub-module | Contents |
//! |---|---|
//! | [`edge`] | [`EdgeNode`] |
//! | [`cloud`] | [`CloudNode`] |

pub mod cloud;
pub mod edge;

pub use cloud::CloudNode;
pub use edge::EdgeNode;

// ── ServiceTier ───────────────────────────────────────────────────────

/// Quality of service delivered for a completed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum ServiceTier {
    /// Reduced-fidelity processing on an edge node.
    Partial,
    /// Full processing in the cloud.
    Full,
}

impl ServiceTier {
    /// Short name, as used in exports.
    pub fn name(self) -> &'static str {
        match self {
            ServiceTier::Partial => "Partial",
            ServiceTier::Full => "Full",
        }
    }

    /// Human-readable label including the fidelity level.
    pub fn label(self) -> &'static str {
        match self {
            ServiceTier::Partial => "Partial (70%)",
            ServiceTier::Full => "Full (100%)",
        }
    }
}

impl std::fmt::Display for ServiceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ── NodeRef ───────────────────────────────────────────────────────────

/// Which node a task was dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeRef {
    /// Index into the configured edge-node list.
    Edge(usize),
    Cloud,
}

// ── ComputeNode ───────────────────────────────────────────────────────

/// Capabilities shared by every processing node.
///
/// # Contract
///
/// `accept` may only be called when `has_capacity()` is `true`; each
/// `accept` is paired with exactly one later `release`.
pub trait ComputeNode {
    fn name(&self) -> &str;

    /// Whether another task can start right now.
    fn has_capacity(&self) -> bool;

    /// Lifetime count of accepted tasks.
    fn load(&self) -> u64;

    /// Ticks a task stays on this node.
    fn processing_time(&self) -> u64;

    fn tier(&self) -> ServiceTier;

    /// Take a task on.
    ///
    /// # Panics
    /// Panics if the node has no free capacity.
    fn accept(&mut self);

    /// Hand back the slot taken by a finished task.
    fn release(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_names() {
        assert_eq!(ServiceTier::Partial.to_string(), "Partial");
        assert_eq!(ServiceTier::Full.name(), "Full");
        assert_eq!(ServiceTier::Partial.label(), "Partial (70%)");
        assert_eq!(ServiceTier::Full.label(), "Full (100%)");
    }

    #[test]
    fn test_nodes_behind_trait_object() {
        let mut nodes: Vec<Box<dyn ComputeNode>> = vec![
            Box::new(EdgeNode::new("Edge1", 1, 200)),
            Box::new(CloudNode::new("Cloud", 300)),
        ];
        for node in nodes.iter_mut() {
            assert!(node.has_capacity());
            node.accept();
        }
        assert!(!nodes[0].has_capacity());
        assert!(nodes[1].has_capacity());
        assert_eq!(nodes[0].tier(), ServiceTier::Partial);
        assert_eq!(nodes[1].tier(), ServiceTier::Full);
        assert_eq!(nodes[1].processing_time(), 300);
    }
}
