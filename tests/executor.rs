//! Tests for the layer-parallel execution orchestrator.
mod common;
use common::*;
use seiyaku::error::{ExecutionError, NodeRunError};
use seiyaku::prelude::*;
// The prelude re-exports a 1-arg `Result<T>` alias that shadows std's 2-arg
// `Result` under the glob import; this explicit import restores std's Result,
// which the NodeRuntime trait signature below relies on.
use std::result::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Adapter driven by closures, so each test wires exactly the behavior it
/// needs per node id.
struct ScriptedRuntime {
    script: Box<
        dyn Fn(&Node, &NodeInputs) -> Result<serde_json::Value, NodeRunError> + Send + Sync,
    >,
    delay: Duration,
    invocations: Arc<AtomicUsize>,
}

impl ScriptedRuntime {
    fn new(
        script: impl Fn(&Node, &NodeInputs) -> Result<serde_json::Value, NodeRunError>
        + Send
        + Sync
        + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            delay: Duration::ZERO,
            invocations: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn with_delay(
        delay: Duration,
        script: impl Fn(&Node, &NodeInputs) -> Result<serde_json::Value, NodeRunError>
        + Send
        + Sync
        + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            delay,
            invocations: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait::async_trait]
impl NodeRuntime for ScriptedRuntime {
    async fn run(
        &self,
        node: &Node,
        inputs: NodeInputs,
    ) -> Result<serde_json::Value, NodeRunError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.script)(node, &inputs)
    }
}

fn int_input(inputs: &NodeInputs, port: &str) -> i64 {
    inputs.get(port).and_then(|v| v.as_i64()).unwrap_or(0)
}

#[tokio::test]
async fn chain_propagates_outputs_layer_by_layer() {
    let graph = pipeline_graph();
    let plan = DependencyAnalyzer::new().plan(&graph).expect("plan");

    let source = ScriptedRuntime::new(|_, _| Ok(serde_json::json!(1)));
    let doubler =
        ScriptedRuntime::new(|_, inputs| Ok(serde_json::json!(int_input(inputs, "value") * 2)));

    let executor = Executor::builder()
        .with_runtime(NodeType::DataSource, source)
        .with_runtime(NodeType::Transform, doubler.clone())
        .with_runtime(NodeType::Output, doubler.clone())
        .build();

    let result = executor
        .execute(&graph, &plan, CancelSignal::none())
        .await
        .expect("run");

    assert!(result.success);
    assert_eq!(result.state, RunState::Completed);
    assert_eq!(result.record("a").unwrap().output, Some(serde_json::json!(1)));
    assert_eq!(result.record("b").unwrap().output, Some(serde_json::json!(2)));
    assert_eq!(result.record("c").unwrap().output, Some(serde_json::json!(4)));
}

#[tokio::test]
async fn upstream_error_poisons_downstream_without_invoking_it() {
    let graph = pipeline_graph();
    let plan = DependencyAnalyzer::new().plan(&graph).expect("plan");

    let failing = ScriptedRuntime::new(|_, _| Err(NodeRunError::new("connection refused")));
    let downstream = ScriptedRuntime::new(|_, _| Ok(serde_json::json!(0)));

    let executor = Executor::builder()
        .with_runtime(NodeType::DataSource, failing)
        .with_runtime(NodeType::Transform, downstream.clone())
        .with_runtime(NodeType::Output, downstream.clone())
        .build();

    let result = executor
        .execute(&graph, &plan, CancelSignal::none())
        .await
        .expect("run");

    assert!(!result.success);
    assert_eq!(result.state, RunState::Failed);

    let a = result.record("a").unwrap();
    assert_eq!(a.status, NodeStatus::Errored);
    assert_eq!(a.error, Some(ErrorCause::Runtime("connection refused".to_string())));

    let b = result.record("b").unwrap();
    assert_eq!(b.status, NodeStatus::Errored);
    assert_eq!(
        b.error,
        Some(ErrorCause::DependencyFailed { upstream: "a".to_string() })
    );

    let c = result.record("c").unwrap();
    assert_eq!(
        c.error,
        Some(ErrorCause::DependencyFailed { upstream: "b".to_string() })
    );

    // Neither poisoned node ever reached its adapter.
    assert_eq!(downstream.invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sibling_failure_does_not_abort_the_rest_of_the_layer() {
    let graph = fan_in_graph();
    let plan = DependencyAnalyzer::new().plan(&graph).expect("plan");

    let sources = ScriptedRuntime::new(|node, _| {
        if node.id == "a" {
            Err(NodeRunError::new("boom"))
        } else {
            Ok(serde_json::json!(7))
        }
    });
    let join = ScriptedRuntime::new(|_, _| Ok(serde_json::json!(0)));

    let executor = Executor::builder()
        .with_runtime(NodeType::DataSource, sources)
        .with_runtime(NodeType::Transform, join.clone())
        .build();

    let result = executor
        .execute(&graph, &plan, CancelSignal::none())
        .await
        .expect("run");

    assert!(!result.success);
    assert_eq!(result.record("b").unwrap().status, NodeStatus::Succeeded);
    assert_eq!(
        result.record("c").unwrap().error,
        Some(ErrorCause::DependencyFailed { upstream: "a".to_string() })
    );
    assert_eq!(join.invocations.load(Ordering::SeqCst), 0);
}

// Multi-threaded runtime: the sources block their worker thread on purpose,
// so true overlap is only observable with parallel workers.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn layer_siblings_run_concurrently_and_barrier_before_next_layer() {
    let graph = fan_in_graph();
    let plan = DependencyAnalyzer::new().plan(&graph).expect("plan");

    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let settled_sources = Arc::new(AtomicUsize::new(0));

    let sources = {
        let in_flight = in_flight.clone();
        let peak = peak.clone();
        let settled = settled_sources.clone();
        ScriptedRuntime::new(move |_, _| {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(30));
            in_flight.fetch_sub(1, Ordering::SeqCst);
            settled.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::json!(1))
        })
    };

    let seen_by_join = Arc::new(AtomicUsize::new(0));
    let join = {
        let settled = settled_sources.clone();
        let seen = seen_by_join.clone();
        ScriptedRuntime::new(move |_, _| {
            seen.store(settled.load(Ordering::SeqCst), Ordering::SeqCst);
            Ok(serde_json::json!(2))
        })
    };

    let executor = Executor::builder()
        .with_runtime(NodeType::DataSource, sources)
        .with_runtime(NodeType::Transform, join)
        .build();

    let result = executor
        .execute(&graph, &plan, CancelSignal::none())
        .await
        .expect("run");

    assert!(result.success);
    assert_eq!(peak.load(Ordering::SeqCst), 2, "sources must overlap in time");
    assert_eq!(
        seen_by_join.load(Ordering::SeqCst),
        2,
        "the join node must start only after both sources settled"
    );
}

#[tokio::test]
async fn cancellation_skips_unstarted_layers_and_respects_grace() {
    let graph = pipeline_graph();
    let plan = DependencyAnalyzer::new().plan(&graph).expect("plan");

    // The first layer settles comfortably inside the grace period; later
    // layers must never be dispatched.
    let slow_source =
        ScriptedRuntime::with_delay(Duration::from_millis(40), |_, _| Ok(serde_json::json!(1)));
    let downstream = ScriptedRuntime::new(|_, _| Ok(serde_json::json!(0)));

    let executor = Executor::builder()
        .with_runtime(NodeType::DataSource, slow_source)
        .with_runtime(NodeType::Transform, downstream.clone())
        .with_runtime(NodeType::Output, downstream.clone())
        .build();

    let (handle, signal) = CancelSignal::channel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        handle.cancel();
    });

    let result = executor.execute(&graph, &plan, signal).await.expect("run");

    assert!(!result.success);
    assert_eq!(result.record("a").unwrap().status, NodeStatus::Succeeded);
    assert_eq!(result.record("b").unwrap().error, Some(ErrorCause::Cancelled));
    assert_eq!(result.record("c").unwrap().error, Some(ErrorCause::Cancelled));
    assert_eq!(downstream.invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn expired_grace_force_marks_in_flight_nodes() {
    let graph = pipeline_graph();
    let plan = DependencyAnalyzer::new().plan(&graph).expect("plan");

    let stuck_source =
        ScriptedRuntime::with_delay(Duration::from_secs(30), |_, _| Ok(serde_json::json!(1)));
    let downstream = ScriptedRuntime::new(|_, _| Ok(serde_json::json!(0)));

    let executor = Executor::builder()
        .with_runtime(NodeType::DataSource, stuck_source)
        .with_runtime(NodeType::Transform, downstream.clone())
        .with_runtime(NodeType::Output, downstream)
        .with_grace_period(Duration::from_millis(30))
        .build();

    let (handle, signal) = CancelSignal::channel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        handle.cancel();
    });

    let result = executor.execute(&graph, &plan, signal).await.expect("run");

    assert!(!result.success);
    for id in ["a", "b", "c"] {
        assert_eq!(
            result.record(id).unwrap().error,
            Some(ErrorCause::Cancelled),
            "node {} should be force-marked cancelled",
            id
        );
    }
}

#[tokio::test]
async fn missing_runtime_aborts_before_any_dispatch() {
    let graph = pipeline_graph();
    let plan = DependencyAnalyzer::new().plan(&graph).expect("plan");

    let source = ScriptedRuntime::new(|_, _| Ok(serde_json::json!(1)));
    let executor = Executor::builder()
        .with_runtime(NodeType::DataSource, source.clone())
        .build();

    match executor.execute(&graph, &plan, CancelSignal::none()).await {
        Err(ExecutionError::MissingRuntime { node_type, node_id }) => {
            assert_eq!(node_type, "transform");
            assert_eq!(node_id, "b");
        }
        other => panic!("expected MissingRuntime, got {:?}", other),
    }
    assert_eq!(source.invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn plan_from_another_graph_is_rejected() {
    let graph = pipeline_graph();
    let mut other = pipeline_graph();
    other.id = "other".to_string();
    let plan = DependencyAnalyzer::new().plan(&other).expect("plan");

    let runtime = ScriptedRuntime::new(|_, _| Ok(serde_json::json!(1)));
    let executor = Executor::builder()
        .with_runtime(NodeType::DataSource, runtime.clone())
        .with_runtime(NodeType::Transform, runtime.clone())
        .with_runtime(NodeType::Output, runtime)
        .build();

    match executor.execute(&graph, &plan, CancelSignal::none()).await {
        Err(ExecutionError::PlanMismatch { graph_id, plan_graph_id }) => {
            assert_eq!(graph_id, "pipeline");
            assert_eq!(plan_graph_id, "other");
        }
        other => panic!("expected PlanMismatch, got {:?}", other),
    }
}
