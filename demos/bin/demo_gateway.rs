//! Gateway Tour
//!
//! Builds the built-in device catalog, registers one stand-in execution
//! engine per requested name, and walks the full request surface: backend
//! enumeration, job submission, sessions, cancellation, and shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use serde_json::json;

use skinfaxi_adapter_sim::SimExecutor;
use skinfaxi_demos::{print_header, print_result, print_section, print_success};
use skinfaxi_hal::{ExecutorRegistry, MetadataCatalog};
use skinfaxi_sched::{Gateway, JobId, JobParams, JobStatus};

#[derive(Parser, Debug)]
#[command(name = "demo-gateway")]
#[command(about = "Tour the Skinfaxi runtime gateway")]
struct Args {
    /// Comma-separated executor names to register.
    #[arg(long, default_value = "aer,custatevec")]
    executors: String,

    /// Qubit count for the statevector simulator catalog entry.
    #[arg(long, default_value_t = 30)]
    statevector_qubits: u32,

    /// Shots per sampler job.
    #[arg(long, default_value_t = 256)]
    shots: u64,

    /// Enable debug logging.
    #[arg(long)]
    verbose: bool,
}

async fn wait_terminal(gateway: &Gateway, id: &JobId) -> anyhow::Result<JobStatus> {
    for _ in 0..500 {
        let status = gateway.job_status(id)?.status;
        if status.is_terminal() {
            return Ok(status);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    bail!("job {id} did not finish in time");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "debug".into()),
            )
            .init();
    }

    print_header("Skinfaxi Gateway Tour");

    // Assemble the catalog and the engine registry.
    let catalog = Arc::new(MetadataCatalog::builtin(args.statevector_qubits));
    let mut registry = ExecutorRegistry::new();
    for name in args.executors.split(',').map(str::trim) {
        registry
            .register(Arc::new(SimExecutor::new(
                name.to_string(),
                Arc::clone(&catalog),
            )))
            .with_context(|| format!("registering executor '{name}'"))?;
    }

    let devices = catalog.len();
    let engines = registry.len();
    let gateway = Gateway::new(catalog, registry);

    print_section("Virtual Backends");
    let listing = gateway.list_backends();
    print_result("devices", devices);
    print_result("executors", engines);
    print_result("virtual backends", listing.len());
    for descriptor in listing.iter().take(4) {
        print_result(
            &descriptor.backend_name,
            format!("{} qubits", descriptor.num_qubits),
        );
    }

    let backend = &listing[0].backend_name;
    let config = gateway.backend_configuration(backend)?;
    print_result(
        "sample configuration",
        format!(
            "{} ({} basis gates, {} coupling edges)",
            config.backend_name,
            config.basis_gates.len(),
            config.coupling_map.len()
        ),
    );

    print_section("Jobs");
    let sampler = gateway.create_job(
        "sampler",
        backend,
        JobParams::from_pubs(vec![json!({ "shots": args.shots })]),
        Default::default(),
        None,
    )?;
    print_result("submitted sampler", &sampler);

    let estimator = gateway.create_job(
        "estimator",
        backend,
        JobParams::from_pubs(vec![json!({})]),
        Default::default(),
        None,
    )?;
    print_result("submitted estimator", &estimator);

    let status = wait_terminal(&gateway, &sampler).await?;
    print_result("sampler status", status);
    if status == JobStatus::Completed {
        let results = gateway.job_results(&sampler)?;
        let outcomes = results["results"][0]["counts"]
            .as_object()
            .map(|c| c.len())
            .unwrap_or(0);
        print_result("distinct outcomes", outcomes);
    }
    print_result("estimator status", wait_terminal(&gateway, &estimator).await?);

    print_section("Sessions");
    let session = gateway.create_session("dedicated", backend, Some(3600))?;
    print_result("session", &session.id);

    let in_session = gateway.create_job(
        "sampler",
        backend,
        JobParams::from_pubs(vec![json!({ "shots": args.shots })]),
        Default::default(),
        Some(&session.id.0),
    )?;
    wait_terminal(&gateway, &in_session).await?;

    let cancelled = gateway.close_session(&session.id)?;
    let snapshot = gateway.get_session(&session.id)?;
    print_result("closed", format!("{} queued jobs cancelled", cancelled));
    print_result("active", snapshot.active);
    print_result("attached jobs", snapshot.jobs.len());

    print_section("Shutdown");
    gateway.shutdown().await;
    print_success("gateway drained and stopped");

    Ok(())
}
