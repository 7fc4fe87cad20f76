//! Gateway Integration Tests
//!
//! These tests drive the assembled gateway end to end: FIFO dispatch
//! through the single worker, the cancel-vs-dispatch race, session
//! cascades, queue-depth reporting, and shutdown.
//!
//! Execution is made deterministic with a gated executor: it announces
//! every invocation on a channel and then blocks until the test releases
//! it, so the tests control exactly when a job is RUNNING.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use skinfaxi_adapter_sim::SimExecutor;
use skinfaxi_hal::{
    ExecOptions, Executor, ExecutorError, ExecutorRegistry, ExecutorResult, MetadataCatalog, Pub,
    ResultBlob,
};
use skinfaxi_sched::{Gateway, JobFilter, JobId, JobParams, JobStatus, SchedError};
use tokio::sync::mpsc;

/// Executor that announces each invocation and blocks on a permit.
struct GatedExecutor {
    name: &'static str,
    started_tx: mpsc::UnboundedSender<String>,
    gate_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<()>>,
}

impl GatedExecutor {
    /// Returns the executor, the stream of started-job tags, and the
    /// permit sender that releases one blocked invocation per send.
    fn new(
        name: &'static str,
    ) -> (
        Arc<Self>,
        mpsc::UnboundedReceiver<String>,
        mpsc::UnboundedSender<()>,
    ) {
        let (started_tx, started_rx) = mpsc::unbounded_channel();
        let (gate_tx, gate_rx) = mpsc::unbounded_channel();
        let executor = Arc::new(Self {
            name,
            started_tx,
            gate_rx: tokio::sync::Mutex::new(gate_rx),
        });
        (executor, started_rx, gate_tx)
    }

    async fn run(&self, pubs: &[Pub]) -> ExecutorResult<ResultBlob> {
        let tag = pubs
            .first()
            .and_then(|p| p.get("tag"))
            .and_then(|t| t.as_str())
            .unwrap_or("untagged")
            .to_string();

        let _ = self.started_tx.send(tag.clone());
        self.gate_rx.lock().await.recv().await;

        if pubs.iter().any(|p| p.get("fail").is_some()) {
            return Err(ExecutorError::Execution(format!("scripted failure: {tag}")));
        }
        Ok(json!({ "tag": tag }))
    }
}

#[async_trait]
impl Executor for GatedExecutor {
    fn name(&self) -> &str {
        self.name
    }

    async fn execute_sampler(
        &self,
        pubs: &[Pub],
        _options: &ExecOptions,
        _device: &str,
    ) -> ExecutorResult<ResultBlob> {
        self.run(pubs).await
    }

    async fn execute_estimator(
        &self,
        pubs: &[Pub],
        _options: &ExecOptions,
        _device: &str,
    ) -> ExecutorResult<ResultBlob> {
        self.run(pubs).await
    }
}

fn gated_gateway() -> (
    Arc<Gateway>,
    mpsc::UnboundedReceiver<String>,
    mpsc::UnboundedSender<()>,
) {
    let catalog = Arc::new(MetadataCatalog::builtin(30));
    let (executor, started_rx, gate_tx) = GatedExecutor::new("aer");
    let mut registry = ExecutorRegistry::new();
    registry.register(executor).unwrap();
    (Gateway::new(catalog, registry), started_rx, gate_tx)
}

fn tagged(tag: &str) -> JobParams {
    JobParams::from_pubs(vec![json!({ "tag": tag })])
}

async fn wait_for_status(gateway: &Gateway, id: &JobId, status: JobStatus) {
    for _ in 0..400 {
        if gateway.job_status(id).unwrap().status == status {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "job {id} never reached {status} (currently {})",
        gateway.job_status(id).unwrap().status
    );
}

fn running_count(gateway: &Gateway) -> usize {
    gateway
        .list_jobs(&JobFilter::all().status(JobStatus::Running))
        .len()
}

#[tokio::test]
async fn test_fifo_order_with_mid_queue_cancellation() {
    let (gateway, mut started_rx, gate_tx) = gated_gateway();

    let j1 = gateway
        .create_job("sampler", "fake_manila@aer", tagged("j1"), ExecOptions::new(), None)
        .unwrap();
    let j2 = gateway
        .create_job("sampler", "fake_manila@aer", tagged("j2"), ExecOptions::new(), None)
        .unwrap();
    let j3 = gateway
        .create_job("sampler", "fake_manila@aer", tagged("j3"), ExecOptions::new(), None)
        .unwrap();

    // The worker dispatches strictly in enqueue order: J1 first.
    assert_eq!(started_rx.recv().await.unwrap(), "j1");
    wait_for_status(&gateway, &j1, JobStatus::Running).await;
    assert_eq!(running_count(&gateway), 1);

    // While J1 runs: cancel J2 (still queued). Cancelling J1 conflicts —
    // there is no preemption.
    gateway.cancel_job(&j2).unwrap();
    let err = gateway.cancel_job(&j1).unwrap_err();
    assert!(matches!(
        err,
        SchedError::CancelConflict { status: "RUNNING", .. }
    ));

    // Double cancel conflicts too.
    let err = gateway.cancel_job(&j2).unwrap_err();
    assert!(matches!(
        err,
        SchedError::CancelConflict { status: "CANCELLED", .. }
    ));

    // Release J1; the worker must skip J2 entirely and start J3.
    gate_tx.send(()).unwrap();
    assert_eq!(started_rx.recv().await.unwrap(), "j3");
    assert_eq!(running_count(&gateway), 1);
    gate_tx.send(()).unwrap();

    wait_for_status(&gateway, &j1, JobStatus::Completed).await;
    wait_for_status(&gateway, &j3, JobStatus::Completed).await;

    // Terminal jobs cannot be cancelled either.
    let err = gateway.cancel_job(&j1).unwrap_err();
    assert!(matches!(
        err,
        SchedError::CancelConflict { status: "COMPLETED", .. }
    ));

    let snap = gateway.job_status(&j2).unwrap();
    assert_eq!(snap.status, JobStatus::Cancelled);
    assert_eq!(snap.error.as_deref(), Some("cancelled by user"));
    // A cancelled job never reached the executor.
    assert!(snap.started_at.is_none());

    // Results exist only for completed jobs.
    assert_eq!(gateway.job_results(&j1).unwrap()["tag"], "j1");
    let err = gateway.job_results(&j2).unwrap_err();
    assert!(matches!(
        err,
        SchedError::ResultsUnavailable { status: "CANCELLED", .. }
    ));

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_executor_failure_is_absorbed() {
    let (gateway, mut started_rx, gate_tx) = gated_gateway();

    let bad = gateway
        .create_job(
            "sampler",
            "fake_manila@aer",
            JobParams::from_pubs(vec![json!({ "tag": "bad", "fail": true })]),
            ExecOptions::new(),
            None,
        )
        .unwrap();
    let good = gateway
        .create_job("estimator", "fake_manila@aer", tagged("good"), ExecOptions::new(), None)
        .unwrap();

    assert_eq!(started_rx.recv().await.unwrap(), "bad");
    gate_tx.send(()).unwrap();

    // The failure is captured in the record; the worker moves on.
    wait_for_status(&gateway, &bad, JobStatus::Failed).await;
    let snap = gateway.job_status(&bad).unwrap();
    assert_eq!(
        snap.error.as_deref(),
        Some("execution failed: scripted failure: bad")
    );

    assert_eq!(started_rx.recv().await.unwrap(), "good");
    gate_tx.send(()).unwrap();
    wait_for_status(&gateway, &good, JobStatus::Completed).await;

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_session_close_cascades_to_queued_only() {
    let (gateway, mut started_rx, gate_tx) = gated_gateway();

    let session = gateway
        .create_session("dedicated", "fake_manila@aer", Some(3600))
        .unwrap();

    let running = gateway
        .create_job(
            "sampler",
            "fake_manila@aer",
            tagged("running"),
            ExecOptions::new(),
            Some(&session.id.0),
        )
        .unwrap();
    let queued = gateway
        .create_job(
            "sampler",
            "fake_manila@aer",
            tagged("queued"),
            ExecOptions::new(),
            Some(&session.id.0),
        )
        .unwrap();

    assert_eq!(started_rx.recv().await.unwrap(), "running");
    wait_for_status(&gateway, &running, JobStatus::Running).await;

    // Close while one job runs and one waits.
    let cancelled = gateway.close_session(&session.id).unwrap();
    assert_eq!(cancelled, 1);

    let snap = gateway.job_status(&queued).unwrap();
    assert_eq!(snap.status, JobStatus::Cancelled);
    assert_eq!(snap.error.as_deref(), Some("cancelled on session close"));

    // The running job is left to finish normally.
    assert_eq!(gateway.job_status(&running).unwrap().status, JobStatus::Running);
    gate_tx.send(()).unwrap();
    wait_for_status(&gateway, &running, JobStatus::Completed).await;

    // The closed session admits nothing further.
    let err = gateway
        .create_job(
            "sampler",
            "fake_manila@aer",
            tagged("late"),
            ExecOptions::new(),
            Some(&session.id.0),
        )
        .unwrap_err();
    assert!(matches!(err, SchedError::SessionClosed(_)));
    assert!(!gateway.get_session(&session.id).unwrap().active);

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_backend_status_reports_executor_queue_depth() {
    let (gateway, mut started_rx, gate_tx) = gated_gateway();

    let j1 = gateway
        .create_job("sampler", "fake_manila@aer", tagged("j1"), ExecOptions::new(), None)
        .unwrap();
    let j2 = gateway
        .create_job("sampler", "fake_kolkata@aer", tagged("j2"), ExecOptions::new(), None)
        .unwrap();

    assert_eq!(started_rx.recv().await.unwrap(), "j1");

    // Depth is per executor half, across devices.
    let status = gateway.backend_status("fake_manila@aer").unwrap();
    assert_eq!(status.pending_jobs, 2);
    assert!(status.operational);
    let status = gateway.backend_status("fake_lima@aer").unwrap();
    assert_eq!(status.pending_jobs, 2);

    gate_tx.send(()).unwrap();
    gate_tx.send(()).unwrap();
    wait_for_status(&gateway, &j1, JobStatus::Completed).await;
    wait_for_status(&gateway, &j2, JobStatus::Completed).await;

    let status = gateway.backend_status("fake_manila@aer").unwrap();
    assert_eq!(status.pending_jobs, 0);

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_cancels_queued_tail_and_lets_running_finish() {
    let (gateway, mut started_rx, gate_tx) = gated_gateway();

    let running = gateway
        .create_job("sampler", "fake_manila@aer", tagged("running"), ExecOptions::new(), None)
        .unwrap();
    let queued = gateway
        .create_job("sampler", "fake_manila@aer", tagged("queued"), ExecOptions::new(), None)
        .unwrap();

    assert_eq!(started_rx.recv().await.unwrap(), "running");

    let shutdown = {
        let gateway = Arc::clone(&gateway);
        tokio::spawn(async move { gateway.shutdown().await })
    };

    // Give the shutdown signal time to land, then let the running job out.
    tokio::time::sleep(Duration::from_millis(50)).await;
    gate_tx.send(()).unwrap();
    shutdown.await.unwrap();

    assert_eq!(gateway.job_status(&running).unwrap().status, JobStatus::Completed);
    let snap = gateway.job_status(&queued).unwrap();
    assert_eq!(snap.status, JobStatus::Cancelled);
    assert_eq!(snap.error.as_deref(), Some("cancelled on shutdown"));

    // No further work is accepted.
    let err = gateway
        .create_job("sampler", "fake_manila@aer", tagged("late"), ExecOptions::new(), None)
        .unwrap_err();
    assert!(matches!(err, SchedError::ShutDown));
}

#[tokio::test]
async fn test_end_to_end_with_sim_engines() {
    let catalog = Arc::new(MetadataCatalog::builtin(30));
    let mut registry = ExecutorRegistry::new();
    registry
        .register(Arc::new(
            SimExecutor::new("aer", Arc::clone(&catalog)).with_seed(7),
        ))
        .unwrap();
    registry
        .register(Arc::new(
            SimExecutor::new("custatevec", Arc::clone(&catalog)).with_seed(7),
        ))
        .unwrap();

    let devices = catalog.len();
    let gateway = Gateway::new(catalog, registry);

    // Full cross product, every name resolvable.
    let listing = gateway.list_backends();
    assert_eq!(listing.len(), devices * 2);
    for descriptor in &listing {
        gateway.backend_configuration(&descriptor.backend_name).unwrap();
    }

    // Bad inputs are refused synchronously.
    let err = gateway
        .create_job("oracle", "fake_manila@aer", JobParams::default(), ExecOptions::new(), None)
        .unwrap_err();
    assert!(matches!(err, SchedError::InvalidProgramKind(_)));
    let err = gateway
        .create_job("sampler", "fake_manila@qsim", JobParams::default(), ExecOptions::new(), None)
        .unwrap_err();
    assert_eq!(err.to_string(), "unknown executor: qsim");

    // A sampler run produces counts summing to the requested shots.
    let job = gateway
        .create_job(
            "sampler",
            "fake_manila@aer",
            JobParams::from_pubs(vec![json!({ "shots": 64 })]),
            ExecOptions::new(),
            None,
        )
        .unwrap();
    wait_for_status(&gateway, &job, JobStatus::Completed).await;
    let results = gateway.job_results(&job).unwrap();
    let total: u64 = results["results"][0]["counts"]
        .as_object()
        .unwrap()
        .values()
        .map(|v| v.as_u64().unwrap())
        .sum();
    assert_eq!(total, 64);

    // An estimator run on the other engine.
    let job = gateway
        .create_job(
            "estimator",
            "fake_kolkata@custatevec",
            JobParams::from_pubs(vec![json!({})]),
            ExecOptions::new(),
            None,
        )
        .unwrap();
    wait_for_status(&gateway, &job, JobStatus::Completed).await;
    let results = gateway.job_results(&job).unwrap();
    assert_eq!(results["metadata"]["executor"], "custatevec");
    assert_eq!(results["metadata"]["num_qubits"], 27);

    gateway.shutdown().await;
}
