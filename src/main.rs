//! traffic-audit demo server.
//!
//! Hosts a handful of test endpoints behind the audit middleware so the
//! pipeline can be exercised end to end:
//!
//! ```text
//! GET  /test           plain JSON response
//! POST /test           echoes the JSON body
//! POST /test/secret    echoes the body; register it under security_actions
//! GET  /test/warning   emits an application warning inside a scope
//! GET  /test/error     fails with an unhandled fault (generic 500)
//! GET  /test/image     binary response, recorded as a sentinel
//! ```
//!
//! Configuration comes from `--config <file>` (TOML) and is reloaded when
//! the file changes.

use axum::{
    extract::State,
    http::{header, HeaderName, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use clap::Parser;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use traffic_audit::config::{load_config, AuditConfig, ConfigWatcher};
use traffic_audit::middleware::{UnhandledFault, REQUEST_ID_HEADER};
use traffic_audit::observability;
use traffic_audit::scope::ScopeFrame;
use traffic_audit::{audit_middleware, AuditControls, AuditState, Logger, Pipeline, Shutdown};

#[derive(Parser)]
#[command(name = "traffic-audit")]
#[command(about = "Demo server for the traffic audit pipeline", long_about = None)]
struct Cli {
    /// TOML configuration file, watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides `server.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AuditConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    observability::logging::init(&config.observability.log_level);
    tracing::info!(
        bind_address = %config.server.bind_address,
        console = config.console.enabled,
        index_collector = config.index_collector.enabled,
        event_collector = config.event_collector.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let pipeline = Pipeline::from_config(&config);
    let controls = AuditControls::new(&config.middleware);
    let lifetime = pipeline.logger(config.console.lifecycle_category.clone());

    // Kept alive for the lifetime of the server.
    let _watcher = match &cli.config {
        Some(path) => spawn_reload(path.clone(), pipeline.clone(), controls.clone()),
        None => None,
    };

    let state = AuditState::new(pipeline.logger("traffic_audit::middleware"), controls);
    let app = router(state, pipeline.logger("traffic_audit::demo"), &config);

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let local_addr = listener.local_addr()?;
    lifetime.info(format!("Now listening on: http://{local_addr}"));
    lifetime.info("Application started. Press Ctrl+C to shut down.");

    let shutdown = Shutdown::new();
    let signal = async move { shutdown.wait_for_signal().await };

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(signal)
        .await?;

    lifetime.info("Application is shutting down...");
    pipeline.shutdown().await;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn router(state: AuditState, logger: Logger, config: &AuditConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/test", get(ping).post(echo))
        .route("/test/secret", axum::routing::post(echo))
        .route("/test/warning", get(warning))
        .route("/test/error", get(failure))
        .route("/test/image", get(image))
        .with_state(logger)
        .layer(middleware::from_fn_with_state(state, audit_middleware))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
}

fn spawn_reload(path: PathBuf, pipeline: Pipeline, controls: AuditControls) -> Option<notify::RecommendedWatcher> {
    let (watcher, mut updates) = ConfigWatcher::new(&path);
    let handle = match watcher.run() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, path = ?path, "Failed to start config watcher");
            return None;
        }
    };

    tokio::spawn(async move {
        while let Some(config) = updates.recv().await {
            pipeline.apply(&config);
            controls.apply(&config.middleware);
            tracing::info!("Configuration reloaded");
        }
    });

    Some(handle)
}

async fn ping() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}

async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(body)
}

async fn warning(State(logger): State<Logger>) -> StatusCode {
    let _scope = logger.begin_scope(ScopeFrame::properties([("Operation", "warning-demo")]));
    logger.warn("Something looks off but the request continues");
    StatusCode::NO_CONTENT
}

async fn failure() -> Result<Json<Value>, UnhandledFault> {
    let error = std::io::Error::other("Test exception");
    Err(UnhandledFault::from_error(&error))
}

async fn image() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], vec![0x89u8, b'P', b'N', b'G'])
}
