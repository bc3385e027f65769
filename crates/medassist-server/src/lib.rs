//! MedAssist Server - HTTP front end for the case workflow engine
//!
//! Provides:
//! - RESTful HTTP API via axum (patients, workflow, case runs)
//! - Static serving of run workspaces under `/artifacts`
//!
//! The engine itself lives in `medassist-core`; this crate only adapts it
//! to HTTP.

pub mod api;
pub mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use medassist_core::{AppConfig, CaseRunner};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use self::state::{AppState, AppStateInner};

/// Configuration for the MedAssist HTTP server.
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Overrides `MEDASSIST_OUTPUT_DIR` when set.
    pub output_dir: Option<String>,
    /// Overrides `MEDASSIST_WORKFLOW` when set.
    pub workflow: Option<String>,
    /// Build retrieval indices before accepting requests.
    pub warm_up: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3210,
            output_dir: None,
            workflow: None,
            warm_up: true,
        }
    }
}

/// Build the shared `AppState` from the environment plus server overrides.
pub async fn create_app_state(config: &ServerConfig) -> Result<AppState, String> {
    let mut app_config = AppConfig::from_env().map_err(|e| e.to_string())?;
    if let Some(ref dir) = config.output_dir {
        app_config.output_dir = PathBuf::from(dir);
    }
    if let Some(ref workflow) = config.workflow {
        app_config.workflow_path = Some(PathBuf::from(workflow));
    }

    let runner = CaseRunner::from_config(&app_config)
        .map_err(|e| format!("Failed to initialize case runner: {}", e))?;

    if config.warm_up {
        runner
            .warm_up()
            .await
            .map_err(|e| format!("Failed to build knowledge indices: {}", e))?;
    }

    Ok(Arc::new(AppStateInner::new(runner)))
}

/// Assemble the complete router: API routes, artifact files, CORS and
/// request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let artifacts = ServeDir::new(state.runner.output_root());

    Router::new()
        .merge(api::api_router())
        .route("/api/health", axum::routing::get(health_check))
        .nest_service("/artifacts", artifacts)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// Returns the actual address the server is listening on.
pub async fn start_server(config: ServerConfig) -> Result<SocketAddr, String> {
    // The CLI may already have installed a subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medassist_server=info,medassist_core=info,tower_http=info".into()),
        )
        .try_init();

    tracing::info!(
        "Starting MedAssist server on {}:{}",
        config.host,
        config.port
    );

    let state = create_app_state(&config).await?;

    start_server_with_state(config, state).await
}

/// Start the HTTP server with a pre-built `AppState`.
pub async fn start_server_with_state(
    config: ServerConfig,
    state: AppState,
) -> Result<SocketAddr, String> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    let local_addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get local address: {}", e))?;

    tracing::info!("MedAssist server listening on {}", local_addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(local_addr)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "server": "medassist-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
