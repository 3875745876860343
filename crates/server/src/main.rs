//! Forge Server
//!
//! Axum server exposing the agent pipeline orchestrator: project CRUD,
//! pipeline triggers, status polling, and invocation logs. All orchestration
//! logic lives in `forge_core`; this binary wires the pieces together at
//! startup and keeps the HTTP layer thin.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

use forge_core::agents::{AgentBridge, CliInvoker, InvocationLog};
use forge_core::pipeline::{PipelineRunner, StateTracker};
use forge_core::store::{InMemoryStore, ProjectStore};
use forge_core::Settings;

mod api;

use api::{agents, projects};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application state shared by all handlers
pub struct AppState {
    pub settings: Settings,
    pub store: Arc<dyn ProjectStore>,
    pub tracker: Arc<StateTracker>,
    pub bridge: Arc<AgentBridge>,
    pub runner: Arc<PipelineRunner>,
}

pub type SharedState = Arc<AppState>;

#[derive(Parser)]
#[command(name = "forge", about = "Prompt-to-deploy agent pipeline server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Forge API",
        version = "0.1.0",
        description = "Prompt-to-Deploy: agent pipeline orchestration API"
    ),
    paths(
        projects::create_project,
        projects::list_projects,
        projects::get_project,
        projects::patch_project,
        projects::delete_project,
        agents::trigger_agent,
        agents::pipeline_status,
        agents::agent_logs,
    ),
    components(schemas(api::ErrorBody, projects::CreateProjectRequest))
)]
struct ApiDoc;

async fn serve_openapi() -> Json<serde_json::Value> {
    Json(serde_json::to_value(ApiDoc::openapi()).unwrap_or_default())
}

async fn root(axum::extract::State(state): axum::extract::State<SharedState>) -> Json<serde_json::Value> {
    Json(json!({
        "name": state.settings.app_name,
        "version": VERSION,
        "docs": "/api/v1/openapi.json",
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": VERSION,
        "timestamp": chrono::Utc::now(),
    }))
}

fn build_state(settings: Settings) -> SharedState {
    let log = Arc::new(InvocationLog::new(settings.logs_dir.clone()));
    let bridge = Arc::new(AgentBridge::new(
        settings.clone(),
        Arc::new(CliInvoker::new()),
        log,
    ));
    let tracker = Arc::new(StateTracker::new());
    let store: Arc<dyn ProjectStore> = Arc::new(InMemoryStore::new());
    let runner = Arc::new(PipelineRunner::new(
        bridge.clone(),
        tracker.clone(),
        store.clone(),
    ));

    Arc::new(AppState {
        settings,
        store,
        tracker,
        bridge,
        runner,
    })
}

fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.settings.cors_origins);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1/projects", projects::project_routes())
        .nest("/api/v1/agents", agents::agent_routes())
        .route("/api/v1/openapi.json", get(serve_openapi))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(tower_http::cors::Any)
}

async fn run_server() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let settings = Settings::from_env();
    let state = build_state(settings);
    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    println!("🚀 Forge Server running at http://{}", addr);
    println!("   API v1 Routes:");
    println!("   Projects:  /api/v1/projects (POST, GET), /api/v1/projects/{{id}} (GET, PATCH, DELETE)");
    println!("   Agents:    /api/v1/agents/trigger, /status/{{id}}, /logs/{{id}}");
    println!("   OpenAPI:   /api/v1/openapi.json");
    println!("   Health:    /health");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════╗");
    println!("║            FORGE SERVER              ║");
    println!("╚══════════════════════════════════════╝");

    run_server().await
}
