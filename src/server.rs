use crate::config::AppConfig;
use crate::processing::choose_color;
use crate::render::{fit_bounds, MapView};
use crate::session::SessionManager;
use crate::types::{FilterState, ALL_BOROUGHS};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::services::ServeDir;
use tower_http::cors::CorsLayer;

/// Key used when a caller does not name its own session.
const DEFAULT_SESSION: &str = "default";

pub struct AppState {
    pub config: AppConfig,
    pub client: Client,
    // One manager per page session, so a request only supersedes requests
    // from the same page.
    sessions: Mutex<HashMap<String, Arc<SessionManager>>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            client: Client::new(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<String, Arc<SessionManager>>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn sessions_for(&self, key: &str) -> Arc<SessionManager> {
        self.lock_sessions()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(SessionManager::new()))
            .clone()
    }

    fn existing_sessions(&self, key: &str) -> Option<Arc<SessionManager>> {
        self.lock_sessions().get(key).cloned()
    }
}

#[derive(Deserialize)]
pub struct MapParams {
    complaint_type: String,
    borough: Option<String>,
    session: Option<String>,
}

#[derive(Deserialize)]
pub struct LookupParams {
    lat: f64,
    lon: f64,
    session: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct NeighborhoodResponse {
    neighborhood: String,
    borough: Option<String>,
    color: &'static str,
    bounds: Option<[[f64; 2]; 2]>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = ServeDir::new(&state.config.server.static_dir);

    Router::new()
        .route("/api/map", get(map_handler))
        .route("/api/neighborhood", get(neighborhood_handler))
        .fallback_service(static_dir)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: AppConfig) -> Result<()> {
    let port = config.server.port;
    let state = Arc::new(AppState::new(config));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn map_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MapParams>,
) -> Result<Json<MapView>, (StatusCode, String)> {
    let borough = params.borough.as_deref().unwrap_or(ALL_BOROUGHS);
    let filter = FilterState::new(&params.complaint_type, borough);

    let sessions = state.sessions_for(params.session.as_deref().unwrap_or(DEFAULT_SESSION));

    match sessions.render(&state.config, &state.client, &filter).await {
        Ok(Some(rendered)) => Ok(Json(rendered.view.clone())),
        Ok(None) => Err((
            StatusCode::CONFLICT,
            "superseded by a newer request".to_string(),
        )),
        Err(e) => {
            tracing::error!("render cycle failed: {:#}", e);
            Err((StatusCode::BAD_GATEWAY, format!("{:#}", e)))
        }
    }
}

async fn neighborhood_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LookupParams>,
) -> Json<Option<NeighborhoodResponse>> {
    let key = params.session.as_deref().unwrap_or(DEFAULT_SESSION);
    let Some(current) = state.existing_sessions(key).and_then(|s| s.current()) else {
        return Json(None);
    };

    Json(current.boundaries.locate(params.lon, params.lat).map(|feature| NeighborhoodResponse {
        neighborhood: feature.neighborhood.clone(),
        borough: feature.borough.clone(),
        color: choose_color(feature.borough.as_deref()),
        bounds: fit_bounds(&feature.geometry),
    }))
}
