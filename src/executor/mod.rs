pub mod adapter;

pub use adapter::*;

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ahash::{AHashMap, AHashSet};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ExecutionError;
use crate::graph::{Graph, Node, NodeType};
use crate::plan::ExecutionPlan;

/// Lifecycle of a single node within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    Pending,
    Running,
    Succeeded,
    Errored,
}

/// Lifecycle of a graph run as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Queued,
    Running,
    Completed,
    Failed,
}

/// Why a node ended `Errored`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCause {
    /// The node's own adapter returned an error.
    Runtime(String),
    /// An upstream node failed; this node's adapter was never invoked.
    DependencyFailed { upstream: String },
    /// The run was cancelled before or while this node could settle.
    Cancelled,
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCause::Runtime(msg) => write!(f, "{}", msg),
            ErrorCause::DependencyFailed { upstream } => {
                write!(f, "dependency failed: {}", upstream)
            }
            ErrorCause::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal record for one node of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeExecutionRecord {
    pub node_id: String,
    pub status: NodeStatus,
    pub output: Option<serde_json::Value>,
    pub error: Option<ErrorCause>,
    pub duration: Duration,
}

/// Aggregated outcome of a graph run, consumed by monitoring and UI
/// collaborators. `success` is false iff any node ended `Errored`,
/// independent of whether its siblings succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphExecutionResult {
    pub run_id: String,
    pub graph_id: String,
    pub state: RunState,
    pub success: bool,
    pub records: Vec<NodeExecutionRecord>,
    pub duration: Duration,
}

impl GraphExecutionResult {
    pub fn record(&self, node_id: &str) -> Option<&NodeExecutionRecord> {
        self.records.iter().find(|r| r.node_id == node_id)
    }
}

/// Sender half of a cooperative cancellation signal.
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiver half of a cooperative cancellation signal. Cheap to clone; a
/// signal that is never fired behaves like no signal at all.
#[derive(Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn channel() -> (CancelHandle, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, CancelSignal { rx })
    }

    /// A signal that never fires, for callers without cancellation needs.
    pub fn none() -> CancelSignal {
        // Dropping the sender immediately means the value can never change
        // from `false`; `fired` pends forever on such a signal.
        let (_, rx) = watch::channel(false);
        CancelSignal { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when the signal fires. Never resolves for a dropped or
    /// silent handle.
    async fn fired(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Sender dropped without cancelling.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Barrier-synchronized DAG scheduler: layer-sequential across layers,
/// node-concurrent within a layer.
///
/// For any connected pair A→B, A's result is fully settled before B's
/// adapter is invoked; no ordering is guaranteed between unconnected nodes
/// in the same layer. A node failure never aborts its siblings, it only
/// poisons its downstream nodes.
pub struct Executor {
    runtimes: AHashMap<NodeType, Arc<dyn NodeRuntime>>,
    grace: Duration,
}

pub struct ExecutorBuilder {
    runtimes: AHashMap<NodeType, Arc<dyn NodeRuntime>>,
    grace: Duration,
}

impl ExecutorBuilder {
    pub fn new() -> Self {
        Self {
            runtimes: AHashMap::new(),
            grace: Duration::from_secs(5),
        }
    }

    /// Registers the runtime adapter for a node type.
    pub fn with_runtime(mut self, node_type: NodeType, runtime: Arc<dyn NodeRuntime>) -> Self {
        self.runtimes.insert(node_type, runtime);
        self
    }

    /// How long in-flight adapters may keep running after cancellation
    /// before they are force-marked errored.
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn build(self) -> Executor {
        Executor {
            runtimes: self.runtimes,
            grace: self.grace,
        }
    }
}

impl Default for ExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    pub fn builder() -> ExecutorBuilder {
        ExecutorBuilder::new()
    }

    /// Runs a compiled plan against its graph.
    ///
    /// Only configuration problems (plan/graph mismatch, missing adapters)
    /// abort the call; every per-node failure is collected into the result.
    pub async fn execute(
        &self,
        graph: &Graph,
        plan: &ExecutionPlan,
        cancel: CancelSignal,
    ) -> Result<GraphExecutionResult, ExecutionError> {
        self.check_configuration(graph, plan)?;

        let run_id = format!("run-{}", Uuid::new_v4());
        let started = Instant::now();
        info!(run = %run_id, graph = %graph.id, layers = plan.layers.len(), "run started");

        // One slot per node id, written exactly once when that node settles.
        let slots: Arc<Mutex<AHashMap<String, NodeExecutionRecord>>> =
            Arc::new(Mutex::new(AHashMap::new()));
        let mut outputs: AHashMap<String, serde_json::Value> = AHashMap::new();
        let mut failed: AHashSet<String> = AHashSet::new();
        let mut records: Vec<NodeExecutionRecord> = Vec::new();
        let mut cancelled = false;

        for (layer_index, layer) in plan.layers.iter().enumerate() {
            if cancelled || cancel.is_cancelled() {
                cancelled = true;
                for node_id in &layer.node_ids {
                    records.push(cancelled_record(node_id));
                }
                continue;
            }

            debug!(run = %run_id, layer = layer_index, nodes = layer.node_ids.len(), "layer dispatch");

            // Nodes below a failed upstream are settled synthetically,
            // without invoking their adapter.
            let mut runnable: Vec<&Node> = Vec::new();
            for node_id in &layer.node_ids {
                let node = graph
                    .node(node_id)
                    .ok_or_else(|| ExecutionError::UnknownPlanNode {
                        layer: layer_index,
                        node_id: node_id.clone(),
                    })?;
                let failed_upstream = graph
                    .incoming(node_id)
                    .find(|c| failed.contains(c.source.as_str()));
                match failed_upstream {
                    Some(conn) => {
                        failed.insert(node_id.clone());
                        records.push(NodeExecutionRecord {
                            node_id: node_id.clone(),
                            status: NodeStatus::Errored,
                            output: None,
                            error: Some(ErrorCause::DependencyFailed {
                                upstream: conn.source.clone(),
                            }),
                            duration: Duration::ZERO,
                        });
                    }
                    None => runnable.push(node),
                }
            }

            // Dispatch every runnable node concurrently and wait for the
            // whole layer to settle before admitting the next one.
            let mut handles = Vec::with_capacity(runnable.len());
            for node in &runnable {
                let runtime = self
                    .runtimes
                    .get(&node.node_type)
                    .cloned()
                    .ok_or_else(|| ExecutionError::MissingRuntime {
                        node_type: node.node_type.to_string(),
                        node_id: node.id.clone(),
                    })?;
                let node = (*node).clone();
                let inputs = gather_inputs(graph, &node.id, &outputs);
                let slots = Arc::clone(&slots);
                handles.push(tokio::spawn(async move {
                    let node_started = Instant::now();
                    let result = runtime.run(&node, inputs).await;
                    let duration = node_started.elapsed();
                    let record = match result {
                        Ok(output) => NodeExecutionRecord {
                            node_id: node.id.clone(),
                            status: NodeStatus::Succeeded,
                            output: Some(output),
                            error: None,
                            duration,
                        },
                        Err(err) => {
                            warn!(node = %node.id, error = %err, "node adapter failed");
                            NodeExecutionRecord {
                                node_id: node.id.clone(),
                                status: NodeStatus::Errored,
                                output: None,
                                error: Some(ErrorCause::Runtime(err.message)),
                                duration,
                            }
                        }
                    };
                    if let Ok(mut slots) = slots.lock() {
                        slots.insert(node.id.clone(), record);
                    }
                }));
            }

            let abort_handles: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();
            let barrier = join_all(handles);
            tokio::pin!(barrier);

            let mut cancel_watch = cancel.clone();
            let settled = tokio::select! {
                _ = &mut barrier => true,
                _ = cancel_watch.fired() => {
                    cancelled = true;
                    debug!(run = %run_id, layer = layer_index, "cancellation observed, granting grace period");
                    timeout(self.grace, &mut barrier).await.is_ok()
                }
            };
            if !settled {
                for handle in abort_handles {
                    handle.abort();
                }
            }

            // Collect this layer's slots; anything still unsettled was
            // force-marked by cancellation.
            let mut layer_slots = match slots.lock() {
                Ok(mut slots) => std::mem::take(&mut *slots),
                Err(_) => AHashMap::new(),
            };
            for node in runnable {
                let record = layer_slots.remove(&node.id).unwrap_or_else(|| {
                    if settled {
                        // The barrier settled but the slot is empty: the
                        // task itself died before writing its record.
                        NodeExecutionRecord {
                            node_id: node.id.clone(),
                            status: NodeStatus::Errored,
                            output: None,
                            error: Some(ErrorCause::Runtime("adapter panicked".to_string())),
                            duration: Duration::ZERO,
                        }
                    } else {
                        cancelled_record(&node.id)
                    }
                });
                match record.status {
                    NodeStatus::Succeeded => {
                        if let Some(output) = &record.output {
                            outputs.insert(node.id.clone(), output.clone());
                        }
                    }
                    _ => {
                        failed.insert(node.id.clone());
                    }
                }
                records.push(record);
            }
        }

        let success = !records
            .iter()
            .any(|r| r.status == NodeStatus::Errored);
        let state = if success {
            RunState::Completed
        } else {
            RunState::Failed
        };
        let duration = started.elapsed();
        info!(run = %run_id, ?state, ?duration, "run finished");

        Ok(GraphExecutionResult {
            run_id,
            graph_id: graph.id.clone(),
            state,
            success,
            records,
            duration,
        })
    }

    fn check_configuration(
        &self,
        graph: &Graph,
        plan: &ExecutionPlan,
    ) -> Result<(), ExecutionError> {
        if plan.graph_id != graph.id {
            return Err(ExecutionError::PlanMismatch {
                graph_id: graph.id.clone(),
                plan_graph_id: plan.graph_id.clone(),
            });
        }
        for (layer_index, layer) in plan.layers.iter().enumerate() {
            for node_id in &layer.node_ids {
                let node = graph
                    .node(node_id)
                    .ok_or_else(|| ExecutionError::UnknownPlanNode {
                        layer: layer_index,
                        node_id: node_id.clone(),
                    })?;
                if !self.runtimes.contains_key(&node.node_type) {
                    return Err(ExecutionError::MissingRuntime {
                        node_type: node.node_type.to_string(),
                        node_id: node.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Upstream outputs routed to their target ports, in connection order: with
/// fan-in on one port, the last-declared connection wins.
fn gather_inputs(
    graph: &Graph,
    node_id: &str,
    outputs: &AHashMap<String, serde_json::Value>,
) -> NodeInputs {
    let mut inputs = NodeInputs::new();
    for conn in graph.incoming(node_id) {
        if let Some(value) = outputs.get(conn.source.as_str()) {
            inputs.insert(conn.target_port.clone(), value.clone());
        }
    }
    inputs
}

fn cancelled_record(node_id: &str) -> NodeExecutionRecord {
    NodeExecutionRecord {
        node_id: node_id.to_string(),
        status: NodeStatus::Errored,
        output: None,
        error: Some(ErrorCause::Cancelled),
        duration: Duration::ZERO,
    }
}
