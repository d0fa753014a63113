//! HTTP server for the similarity dashboard

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use crate::remote::TaskService;
use crate::session::AnalysisSession;
use crate::staging::StagingScheme;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::info;
use super::handler::{
    match_handler, reset_handler, results_handler, staging_handler, status_handler,
    submit_handler,
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "src/http/static/"]
struct Assets;

/// Session shared by all handlers. Holding the lock for a whole request
/// runs handlers one at a time.
pub type SharedSession<S> = Arc<Mutex<AnalysisSession<S>>>;

/// Router state. The staging scheme never changes, so it is kept outside
/// the session lock.
pub struct AppState<S> {
    pub session: SharedSession<S>,
    pub staging: Arc<StagingScheme>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            staging: Arc::clone(&self.staging),
        }
    }
}

impl<S: TaskService> AppState<S> {
    pub fn new(session: AnalysisSession<S>) -> Self {
        let staging = session.shared_staging();
        Self {
            session: Arc::new(Mutex::new(session)),
            staging,
        }
    }
}

async fn static_handler() -> Response {
    match Assets::get("index.html") {
        Some(page) => Html(String::from_utf8_lossy(page.data.as_ref()).into_owned()).into_response(),
        None => (StatusCode::NOT_FOUND, "dashboard page not bundled").into_response(),
    }
}

/// Dashboard page and JSON API
pub fn router<S: TaskService + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/", get(static_handler))
        .route("/api/staging", get(staging_handler::<S>))
        .route("/api/status", get(status_handler::<S>))
        .route("/api/task", post(submit_handler::<S>))
        .route("/api/results", post(results_handler::<S>))
        .route("/api/match", post(match_handler::<S>))
        .route("/api/reset", post(reset_handler::<S>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// HTTP server hosting the dashboard
pub struct HttpServer<S> {
    state: AppState<S>,
    address: String,
    port: u16,
}

impl<S: TaskService + 'static> HttpServer<S> {
    pub fn new(session: AnalysisSession<S>, address: impl Into<String>, port: u16) -> Self {
        Self {
            state: AppState::new(session),
            address: address.into(),
            port,
        }
    }

    pub fn session(&self) -> SharedSession<S> {
        Arc::clone(&self.state.session)
    }

    /// Bind and serve until the process stops
    pub async fn start(&self) -> std::io::Result<()> {
        let app = router(self.state.clone());

        let addr = format!("{}:{}", self.address, self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!("Dashboard available at http://localhost:{}", self.port);

        axum::serve(listener, app).await
    }
}
