use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    response::IntoResponse,
    routing::{any, get},
};
use log::info;
use tower_http::cors::CorsLayer;

use crate::{AppState, ServiceError, ws::ws_handler};

mod google;
mod live_scores;

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.frontend_url);
    Router::new()
        .route("/auth/google", get(google::start_sign_in))
        .route("/auth/google/callback", get(google::callback))
        .route("/auth/logout", get(google::logout))
        .route("/auth/failure", get(google::failure))
        .route("/tournaments/live-scores", get(live_scores::get_live_scores))
        .route("/health", get(health))
        .route("/ws", any(ws_handler))
        .fallback(not_found)
        .layer(cors)
        .with_state(state)
}

pub async fn run(
    state: AppState,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let address = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    let ws = state.ws.clone();

    info!("Server listening on {}", address);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown_signal.await;
            info!("Closing {} WebSocket connections", ws.connection_count());
            ws.close_all();
        })
        .await?;

    info!("HTTP server shut down gracefully");
    Ok(())
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);
    match HeaderValue::from_str(frontend_url) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            log::warn!("FRONTEND_URL {} is not a valid origin, CORS disabled", frontend_url);
            layer
        }
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "success": true }))
}

async fn not_found() -> ServiceError {
    ServiceError::NotFound("Route not found".to_string())
}
