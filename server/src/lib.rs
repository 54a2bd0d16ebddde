// Narration HTTP API
//
// POST /api/text-to-speech resolves (or synthesizes) the narration for an
// article; GET /tts/* serves cached objects when they live on local disk.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use narration_core::types::ErrorBody;
use narration_core::{NarrationConfig, NarrationError, NarrationRequest, NarrationResponse, NarrationService};
use std::path::PathBuf;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub const NARRATION_ROUTE: &str = "/api/text-to-speech";
pub const CACHE_ROUTE: &str = "/tts";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Narration(#[from] NarrationError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Narration(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(target: "server", status = status.as_u16(), error = %self, "Narration request failed");
        } else {
            warn!(target: "server", status = status.as_u16(), error = %self, "Narration request rejected");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

#[derive(Clone)]
struct AppState {
    service: NarrationService,
}

/// Build the API router. `cache_dir` is the filesystem store root whose
/// `tts/` subtree is exposed under [`CACHE_ROUTE`].
pub fn router(service: NarrationService, cache_dir: Option<PathBuf>) -> Router {
    let mut app = Router::new()
        .route(NARRATION_ROUTE, post(narrate_handler))
        .route("/healthz", get(health_handler));

    if let Some(dir) = cache_dir {
        app = app.nest_service(CACHE_ROUTE, ServeDir::new(dir.join("tts")));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(AppState { service })
}

/// Bind and serve until the process is interrupted.
pub async fn serve(cfg: &NarrationConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let service = NarrationService::from_config(cfg)?;
    let app = router(service, cfg.served_dir().cloned());

    let addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        target: "server",
        url = %format!("http://{}", addr),
        content = %cfg.content_dir.display(),
        "Narration server ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!(target: "server", "Shutting down");
        })
        .await?;
    Ok(())
}

async fn narrate_handler(
    State(state): State<AppState>,
    payload: Result<Json<NarrationRequest>, JsonRejection>,
) -> Result<Json<NarrationResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let narration = state.service.narrate(&request).await?;
    Ok(Json(narration))
}

async fn health_handler() -> &'static str {
    "ok"
}
