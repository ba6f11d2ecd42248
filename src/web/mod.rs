//! HTTP surface
//!
//! | Route               | Purpose                                   |
//! |---------------------|-------------------------------------------|
//! | `GET /`             | landing page                              |
//! | `GET/POST /merge`   | form, then merge uploaded PDFs            |
//! | `GET/POST /protect` | form, then encrypt one uploaded PDF       |
//! | `POST /reset-usage` | admin: zero today's counter               |

pub mod admin;
pub mod error;
pub mod handlers;
pub mod templates;
pub mod upload;

use std::sync::Arc;
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::Result;
use crate::usage::{JsonFileUsageStore, QuotaGate, UsageStore};
use crate::web::error::WebError;
use crate::web::upload::RequestWorkspace;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub usage: Arc<dyn UsageStore>,
    pub gate: QuotaGate,
}

impl AppState {
    pub fn new(config: Config, usage: Arc<dyn UsageStore>) -> Self {
        let gate = QuotaGate::new(config.quota.daily_limit);

        Self {
            config: Arc::new(config),
            usage,
            gate,
        }
    }

    /// State backed by the JSON usage file named in `config`
    pub fn from_config(config: Config) -> Self {
        let usage = Arc::new(JsonFileUsageStore::new(&config.storage.usage_file));
        Self::new(config, usage)
    }

    async fn workspace(&self) -> std::io::Result<RequestWorkspace> {
        RequestWorkspace::create(&self.config.storage.upload_dir, &self.config.storage.output_dir)
            .await
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes();

    Router::new()
        .route("/", get(handlers::index))
        .route("/merge", get(handlers::merge_form).post(handlers::merge))
        .route("/protect", get(handlers::protect_form).post(handlers::protect))
        .route("/reset-usage", post(admin::reset_usage))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(state.clone(), reject_oversized))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Turn away bodies that declare a length over the cap before any handler
/// runs. Bodies without a declared length are cut off by `DefaultBodyLimit`
/// while they are read; whatever 413 an extractor produces for that is
/// replaced with ours.
async fn reject_oversized(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let limit = state.config.server.max_upload_bytes() as u64;
    let too_large = WebError::PayloadTooLarge {
        max_mb: state.config.server.max_upload_mb,
    };
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    if let Some(length) = declared.filter(|&length| length > limit) {
        tracing::warn!("Rejected {} byte request to {}", length, request.uri().path());
        return too_large.into_response();
    }

    let path = request.uri().path().to_owned();
    let response = next.run(request).await;

    if response.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("Request body to {} exceeded {} bytes", path, limit);
        return too_large.into_response();
    }

    response
}

/// Bind and serve until the process is stopped
pub async fn serve(config: Config) -> Result<()> {
    let addr = config.server.bind_addr();

    if config.admin_secret().is_none() {
        tracing::warn!("No admin secret configured; POST /reset-usage will reject every request");
    }

    let state = AppState::from_config(config);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("PDF workbench listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
