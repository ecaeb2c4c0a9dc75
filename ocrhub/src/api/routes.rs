use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::frontend;
use super::handlers;
use super::openapi;
use super::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let pages = Router::new()
        .route("/", get(frontend::redirect_root))
        .route("/index.html", get(frontend::serve_index))
        .route("/static/{*path}", get(frontend::serve_static));

    let ocr = Router::new()
        .route("/GetOcrList", get(handlers::ocr::get_ocr_list))
        .route("/GetOcr", post(handlers::ocr::get_ocr))
        .route("/ocr", post(handlers::ocr::legacy_ocr))
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes));

    let meta = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/openapi.json", get(openapi::openapi_json))
        .merge(openapi::redoc_router());

    Router::new()
        .merge(pages)
        .merge(ocr)
        .merge(meta)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
