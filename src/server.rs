use crate::aggregation::{self, DashboardContext};
use crate::config::{AppConfig, ServerConfig};
use crate::types::{ChartViews, MapPoint};
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

pub struct AppState {
    pub context: DashboardContext,
}

#[derive(Deserialize)]
pub struct SummaryParams {
    province: Option<String>,
}

#[derive(Serialize)]
pub struct ProvincesResponse {
    options: Vec<String>,
    default: Option<String>,
}

pub fn router(context: DashboardContext, config: &AppConfig) -> Router {
    let state = Arc::new(AppState { context });

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/provinces", get(provinces_handler))
        .route("/api/map", get(map_handler))
        .route("/api/summary", get(summary_handler));

    let app = match &config.server.static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    };

    app.layer(CorsLayer::permissive()).with_state(state)
}

/// Binds `host:port`; the host may be a hostname or an IP literal.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener> {
    TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))
}

pub async fn start_server(config: AppConfig, context: DashboardContext) -> Result<()> {
    let listener = bind(&config.server).await?;
    let app = router(context, &config);

    info!("Starting server on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn provinces_handler(State(state): State<Arc<AppState>>) -> Json<ProvincesResponse> {
    Json(ProvincesResponse {
        options: state.context.province_options().to_vec(),
        default: state.context.default_selection().map(str::to_string),
    })
}

async fn map_handler(State(state): State<Arc<AppState>>) -> Json<Vec<MapPoint>> {
    Json(aggregation::map_points(&state.context))
}

// An empty `province` parameter is the same as none at all.
async fn summary_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummaryParams>,
) -> Json<ChartViews> {
    let selection = params.province.as_deref().filter(|p| !p.is_empty());
    Json(aggregation::chart_views(&state.context, selection))
}
