//! HTTP layer: thin axum glue between the browser and the core.
//!
//! Routing only: discovery and research behavior lives in
//! [`crate::prompt`], [`crate::anthropic`], and [`crate::parse`]. Handlers
//! never panic; every failure maps to the `{"error": "..."}` body the
//! page's script expects.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::anthropic::AnthropicClient;
use crate::config::AppConfig;
use crate::profile::ArtistProfile;
use crate::venue::VenueRecord;
use crate::{parse, prompt};

/// Single-page UI, compiled into the binary so the deployment is one file.
const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Shared per-request state; both fields are `Arc`s so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<AnthropicClient>,
    pub config: Arc<AppConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscoverRequest {
    profile: ArtistProfile,
    target_city: String,
}

#[derive(Debug, Serialize)]
struct DiscoverResponse {
    venues: Vec<VenueRecord>,
}

#[derive(Debug, Deserialize)]
struct ResearchRequest {
    venue: VenueRecord,
    profile: ArtistProfile,
}

#[derive(Debug, Serialize)]
struct ResearchResponse {
    research: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

/// Error reply in the shape the browser script expects.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn upstream(err: &crate::anthropic::AnthropicError) -> Self {
        error!(error = %err, "Anthropic API call failed");
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Build the application router over the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/discover", post(discover))
        .route("/research", post(research))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the web application until ctrl-c or SIGTERM.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let client = build_client(&config)?;
    let bind_addr = config.bind_addr;
    let state = AppState {
        client: Arc::new(client),
        config: Arc::new(config),
    };

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "venuescout listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Construct the API client from resolved configuration.
pub fn build_client(config: &AppConfig) -> anyhow::Result<AnthropicClient> {
    let client = match config.anthropic_base_url.as_deref() {
        Some(base_url) => AnthropicClient::with_base_url(
            &config.api_key,
            config.request_timeout_secs,
            config.max_retries,
            base_url,
        )?,
        None => AnthropicClient::new(
            &config.api_key,
            config.request_timeout_secs,
            config.max_retries,
        )?,
    };
    Ok(client)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}

async fn discover(
    State(state): State<AppState>,
    Json(req): Json<DiscoverRequest>,
) -> Result<Json<DiscoverResponse>, ApiError> {
    req.profile
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    if req.target_city.trim().is_empty() {
        return Err(ApiError::bad_request("Required field 'targetCity' is blank"));
    }

    let prompt = prompt::discovery(&req.profile, &req.target_city);
    let text = state
        .client
        .send(&prompt, &state.config.model, state.config.max_tokens_discover)
        .await
        .map_err(|e| ApiError::upstream(&e))?;

    // An empty parse is a valid outcome (the model produced no usable
    // blocks), not an error.
    let venues = parse::parse_venues(&text);
    info!(
        city = %req.target_city,
        artist = %req.profile.name,
        count = venues.len(),
        "venue discovery complete"
    );

    Ok(Json(DiscoverResponse { venues }))
}

async fn research(
    State(state): State<AppState>,
    Json(req): Json<ResearchRequest>,
) -> Result<Json<ResearchResponse>, ApiError> {
    req.profile
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    if req.venue.name.trim().is_empty() {
        return Err(ApiError::bad_request("Required field 'venue.name' is blank"));
    }

    let prompt = prompt::research(&req.venue, &req.profile);
    let research = state
        .client
        .send(&prompt, &state.config.model, state.config.max_tokens_research)
        .await
        .map_err(|e| ApiError::upstream(&e))?;

    info!(
        venue = %req.venue.name,
        report_len = research.len(),
        "venue research complete"
    );

    Ok(Json(ResearchResponse { research }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("received shutdown signal, starting graceful shutdown");
}
