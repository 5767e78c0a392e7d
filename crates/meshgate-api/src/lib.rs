pub mod handlers;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use handlers::ApiState;

/// Gateway routes with permissive CORS.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/aggregate", get(handlers::handle_aggregate))
        .route("/stats", get(handlers::handle_stats))
        .route("/health", get(handlers::handle_health))
        .route("/peers", get(handlers::handle_peers))
        .route("/logs", get(handlers::handle_logs))
        .route("/stream", get(handlers::handle_stream))
        .with_state(state)
        .layer(cors)
}

pub async fn serve(state: ApiState, listen_addr: &str, port: u16) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind((listen_addr, port)).await?;
    tracing::info!(addr = listen_addr, port, "gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}
