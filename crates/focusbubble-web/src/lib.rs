//! FocusBubble Web API Server
//!
//! REST surface for identity sign-in, schedules, focus sessions and block
//! windows. Every body is wrapped in the [`ApiResponse`] envelope.

mod handlers;
mod response;

pub use handlers::SessionOut;
pub use response::{status_for, ApiJson, ApiResponse};

use axum::{
    http::{header::HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use focusbubble_engine::Engine;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    engine: Engine,
}

impl AppState {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

/// Create the API router with permissive CORS
pub fn create_router(state: AppState) -> Router {
    create_router_with_cors(state, None)
}

/// Create the API router. Without an origin any origin is allowed.
pub fn create_router_with_cors(state: AppState, cors_origin: Option<&str>) -> Router {
    let cors = cors_layer(cors_origin);

    Router::new()
        // Liveness and connectivity
        .route("/health", get(handlers::health))
        .route("/test/echo", post(handlers::echo))
        // Identity
        .route("/auth/identity", post(handlers::sign_in))
        .route("/auth/google", post(handlers::sign_in))
        // Users
        .route("/users", post(handlers::create_user))
        .route("/users/:user_id", get(handlers::get_user))
        // Schedules
        .route(
            "/users/:user_id/schedules",
            post(handlers::create_schedule).get(handlers::list_schedules),
        )
        .route(
            "/users/:user_id/schedules/:schedule_id",
            delete(handlers::delete_schedule),
        )
        // Sessions
        .route("/users/:user_id/sessions", post(handlers::start_session))
        .route(
            "/users/:user_id/sessions/active",
            get(handlers::list_active_sessions),
        )
        .route("/sessions/:session_id/pause", post(handlers::pause_session))
        .route("/sessions/:session_id/resume", post(handlers::resume_session))
        .route("/sessions/:session_id/stop", post(handlers::stop_session))
        // Block windows
        .route(
            "/users/:user_id/blocks",
            post(handlers::create_blocks).get(handlers::list_blocks),
        )
        .route("/refresh_blocks", post(handlers::refresh_blocks))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    match origin {
        None => base.allow_origin(Any),
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(value) => base.allow_origin(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}; cross-origin requests are refused", origin);
                base
            }
        },
    }
}

/// Serve the API until the shutdown channel fires or its sender is dropped
pub async fn serve(
    bind_addr: &str,
    state: AppState,
    cors_origin: Option<&str>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    let app = create_router_with_cors(state, cors_origin);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("FocusBubble API listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;

    info!("FocusBubble API stopped");
    Ok(())
}
