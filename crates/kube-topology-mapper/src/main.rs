//! Kube Topology Collector - Kubernetes topology record stream
//!
//! Watches the cluster, maps every supported resource into a topology
//! record, and writes the records to stdout as JSON lines. Every live record
//! is re-emitted once per collection interval.
//!
//! # HTTP Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /ready` - Readiness check
//! - `GET /v1/stats` - Dispatch counters and live key count

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use kube_topology_mapper::{
    BufferedSink, Clock, Dispatcher, JobRouter, KeepaliveScheduler, StatsSnapshot, SystemClock,
    TopologyConfig, WorkerPool,
};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
struct AppState {
    dispatcher: Arc<Dispatcher>,
    sink: Arc<BufferedSink>,
    keepalive: Arc<KeepaliveScheduler>,
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            sink: Arc::clone(&self.sink),
            keepalive: Arc::clone(&self.keepalive),
        }
    }
}

// ============================================================================
// Health Endpoints
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        service: "kube-topology-collector",
    })
}

async fn ready_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.sink.is_closed() {
        return (StatusCode::SERVICE_UNAVAILABLE, "sink closed");
    }
    (StatusCode::OK, "ready")
}

// ============================================================================
// Stats Endpoint
// ============================================================================

#[derive(Serialize)]
struct StatsResponse {
    #[serde(flatten)]
    dispatch: StatsSnapshot,
    live_keys: usize,
    buffered: usize,
    sink_dropped: u64,
    keepalive: &'static str,
}

/// GET /v1/stats
async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatsResponse {
        dispatch: state.dispatcher.stats(),
        live_keys: state.dispatcher.cache().len(),
        buffered: state.sink.len(),
        sink_dropped: state.sink.dropped(),
        keepalive: state.keepalive.state().as_str(),
    })
}

fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & readiness
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        // Counters
        .route("/v1/stats", get(stats_handler))
        .with_state(state)
}

// ============================================================================
// Record Output
// ============================================================================

/// Write every record as one JSON line until the sink is closed and empty.
async fn drain_to_stdout(sink: Arc<BufferedSink>) {
    let mut stdout = tokio::io::stdout();
    while let Some(record) = sink.recv().await {
        let mut line = match serde_json::to_vec(&record) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize record");
                continue;
            }
        };
        line.push(b'\n');
        if let Err(e) = stdout.write_all(&line).await {
            tracing::error!(error = %e, "Failed to write record, stopping output");
            // Unblock producers waiting on a full buffer
            sink.close();
            return;
        }
    }
    if let Err(e) = stdout.flush().await {
        tracing::warn!(error = %e, "Failed to flush stdout");
    }
    tracing::info!("Record output drained");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout carries only records
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,kube_topology=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Kube Topology Collector");

    // Load configuration from environment
    let config = TopologyConfig::from_env();
    config.validate()?;

    tracing::info!(
        domain = %config.domain,
        cluster_id = %config.cluster_id,
        interval_seconds = config.interval_seconds,
        workers = config.workers,
        backpressure = ?config.backpressure,
        "Loaded topology configuration"
    );

    let client = kube::Client::try_default().await?;
    tracing::info!("Connected to Kubernetes cluster");

    let config = Arc::new(config);
    let token = CancellationToken::new();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let sink = Arc::new(BufferedSink::from_config(&config));
    let dispatcher = Arc::new(Dispatcher::with_defaults(Arc::clone(&config), sink.clone()));
    let pool = Arc::new(WorkerPool::from_config(Arc::clone(&dispatcher), token.clone()));
    let router: Arc<dyn JobRouter> = pool.clone();

    let output = tokio::spawn(drain_to_stdout(Arc::clone(&sink)));

    let keepalive = Arc::new(KeepaliveScheduler::from_config(
        &config,
        Arc::clone(dispatcher.cache()),
        Arc::clone(&router),
    ));
    let keepalive_task = {
        let keepalive = Arc::clone(&keepalive);
        let token = token.clone();
        tokio::spawn(async move {
            if let Err(e) = keepalive.run(token).await {
                tracing::error!(error = %e, "Keepalive scheduler failed to start");
            }
        })
    };

    let watch_task = tokio::spawn(kube_topology_mapper::watch_cluster(
        client,
        router,
        clock,
        token.clone(),
    ));
    tracing::info!("Started cluster watchers");

    // Cancel everything on ctrl-c
    {
        let token = token.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown requested");
            token.cancel();
        });
    }

    let state = AppState {
        dispatcher,
        sink: Arc::clone(&sink),
        keepalive,
    };
    let app = create_router(state);

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    let shutdown = token.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    // Producers first, then workers, then the output
    token.cancel();
    let (watch_result, keepalive_result) = tokio::join!(watch_task, keepalive_task);
    for (task, result) in [("watchers", watch_result), ("keepalive", keepalive_result)] {
        if let Err(e) = result {
            tracing::warn!(task, error = %e, "Task panicked");
        }
    }
    pool.join().await;
    sink.close();
    if let Err(e) = output.await {
        tracing::warn!(error = %e, "Record output task panicked");
    }

    tracing::info!("Kube Topology Collector stopped");
    Ok(())
}
