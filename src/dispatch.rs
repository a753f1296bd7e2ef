//! Task generation, node selection and processing activities.
//!
//! The world every activity shares is a [`Cluster`]: the configured edge
//! nodes, the cloud node and the run's result sink. A single
//! [`TaskGenerator`] produces tasks at a fixed period and spawns one
//! [`Processing`] activity per task on the node chosen by
//! [`select_node`].

use tracing::debug;

use crate::activity::{Activity, Step};
use crate::node::{CloudNode, ComputeNode, EdgeNode, NodeRef};
use crate::simulation::SimulationContext;
use crate::sink::{CompletionRecord, ResultSink};
use crate::task::Task;

// ── Cluster ───────────────────────────────────────────────────────────

/// Nodes and output of one run.
///
/// Node state is only mutated by processing activities; the generator
/// only reads it to pick a target.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub edges: Vec<EdgeNode>,
    pub cloud: CloudNode,
    pub sink: ResultSink,
    pub(crate) tasks_generated: u64,
}

impl Cluster {
    pub fn new(edges: Vec<EdgeNode>, cloud: CloudNode) -> Self {
        Cluster {
            edges,
            cloud,
            sink: ResultSink::new(),
            tasks_generated: 0,
        }
    }

    /// Tasks handed to a node so far.
    pub fn tasks_generated(&self) -> u64 {
        self.tasks_generated
    }

    pub fn node_mut(&mut self, target: NodeRef) -> &mut dyn ComputeNode {
        match target {
            NodeRef::Edge(i) => &mut self.edges[i],
            NodeRef::Cloud => &mut self.cloud,
        }
    }
}

// ── Selection policy ──────────────────────────────────────────────────

/// Least-loaded available edge node, else the cloud.
///
/// Ties on load go to the edge node listed first.
pub fn select_node(edges: &[EdgeNode]) -> NodeRef {
    edges
        .iter()
        .enumerate()
        .filter(|(_, e)| e.has_capacity())
        .min_by_key(|(_, e)| e.load())
        .map_or(NodeRef::Cloud, |(i, _)| NodeRef::Edge(i))
}

// ── TaskGenerator ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GeneratorPhase {
    /// Not resumed yet.
    Idle,
    /// The next resumption is an arrival.
    Arrival,
    /// Resumed after the dispatched task completed.
    Completed,
}

/// The single long-lived activity producing tasks.
///
/// Waits one `period`, creates a task stamped with the current time,
/// dispatches it, and repeats. With `serialize` set, the wait for the
/// next arrival only begins once the dispatched task has completed.
#[derive(Debug, Clone)]
pub struct TaskGenerator {
    period: u64,
    task_size: u64,
    serialize: bool,
    next_id: u64,
    phase: GeneratorPhase,
}

impl TaskGenerator {
    pub fn new(period: u64, task_size: u64, serialize: bool) -> Self {
        TaskGenerator {
            period,
            task_size,
            serialize,
            next_id: 0,
            phase: GeneratorPhase::Idle,
        }
    }

    fn arrive(&mut self, ctx: &mut SimulationContext<'_, Cluster>) -> Step {
        let task = Task::new(self.next_id, self.task_size, ctx.now());
        self.next_id += 1;
        debug!(time = task.created_at.ticks(), task = task.id, "task created");

        let cluster = ctx.world_mut();
        let target = select_node(&cluster.edges);
        if target == NodeRef::Cloud && !cluster.edges.is_empty() {
            debug!(task = task.id, "all edge nodes busy, sending to cloud");
        }
        cluster.tasks_generated += 1;

        let child = ctx.spawn(Box::new(Processing::new(target, task)));
        if self.serialize {
            self.phase = GeneratorPhase::Completed;
            Step::Join(child)
        } else {
            Step::Sleep(self.period)
        }
    }
}

impl Activity<Cluster> for TaskGenerator {
    fn resume(&mut self, ctx: &mut SimulationContext<'_, Cluster>) -> Step {
        match self.phase {
            GeneratorPhase::Idle | GeneratorPhase::Completed => {
                self.phase = GeneratorPhase::Arrival;
                Step::Sleep(self.period)
            }
            GeneratorPhase::Arrival => self.arrive(ctx),
        }
    }

    fn label(&self) -> &str {
        "generator"
    }
}

// ── Processing ────────────────────────────────────────────────────────

/// One task held by one node for that node's processing time.
///
/// On start the node accepts the task; after the processing time the
/// node releases it and a completion record goes to the sink.
#[derive(Debug, Clone)]
pub struct Processing {
    target: NodeRef,
    task: Task,
    started: bool,
}

impl Processing {
    pub fn new(target: NodeRef, task: Task) -> Self {
        Processing {
            target,
            task,
            started: false,
        }
    }
}

impl Activity<Cluster> for Processing {
    fn resume(&mut self, ctx: &mut SimulationContext<'_, Cluster>) -> Step {
        let now = ctx.now();
        let cluster = ctx.world_mut();

        if !self.started {
            self.started = true;
            let node = cluster.node_mut(self.target);
            node.accept();
            debug!(
                time = now.ticks(),
                node = node.name(),
                task = self.task.id,
                "processing started"
            );
            return Step::Sleep(node.processing_time());
        }

        let node = cluster.node_mut(self.target);
        node.release();
        let record = CompletionRecord {
            task_id: self.task.id,
            processed_by: node.name().to_string(),
            latency: now
                .since(self.task.created_at)
                .expect("task completed before it was created"),
            service_tier: node.tier(),
            completed_at: now,
        };
        debug!(
            time = now.ticks(),
            node = node.name(),
            task = self.task.id,
            latency = record.latency,
            "processing completed"
        );
        cluster.sink.push(record);
        Step::Done
    }

    fn label(&self) -> &str {
        "processing"
    }
}
