use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use im_replay::config::AppConfig;
use im_replay::error::AppError;
use im_replay::replay::{
    replay_router, InMemoryDocumentStore, IncomeDocument, InformationRequest, LogPublisher,
    ReplayService,
};
use im_replay::telemetry;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "im-replay",
    about = "Store income-reporting documents and replay unconsumed ones to downstream case processing",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the event intake service (default command)
    Serve(ServeArgs),
    /// Evaluate one request/document pair offline and print the decision
    Check(CheckArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP intake
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP intake
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Path to an information-request JSON file
    #[arg(long)]
    request: PathBuf,
    /// Path to an income-document JSON file
    #[arg(long)]
    document: PathBuf,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Check(args) => run_check(args),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let store = Arc::new(InMemoryDocumentStore::new());
    let publisher = Arc::new(LogPublisher);
    let service = Arc::new(ReplayService::new(store, publisher));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(replay_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "income-document replay service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<(), AppError> {
    let request: InformationRequest =
        serde_json::from_str(&std::fs::read_to_string(&args.request)?)?;
    let document: IncomeDocument =
        serde_json::from_str(&std::fs::read_to_string(&args.document)?)?;

    render_check(&request, &document);
    Ok(())
}

fn render_check(request: &InformationRequest, document: &IncomeDocument) {
    println!(
        "Request: subject {}, employer {}, case {}",
        request.subject_id, request.employer_id, request.case_id
    );
    println!(
        "  employer period requested: {}",
        request.requires_employer_period
    );
    println!(
        "  sick-leave periods: {}, self-certified periods: {}",
        request.sick_leave_periods.len(),
        request.self_certified_periods.len()
    );
    println!(
        "Document: employer periods: {}, first absence day: {}, reduction reason: {}",
        document.employer_periods.len(),
        document
            .first_absence_day
            .map(|date| date.to_string())
            .unwrap_or_else(|| "none".to_string()),
        document.reduced_payment_reason.as_deref().unwrap_or("none"),
    );

    if request.is_document_relevant(document) {
        println!("\nDocument is relevant to the request and would be replayed.");
    } else {
        println!("\nDocument is not relevant to the request.");
    }
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
