use axum::{Router, routing::get};
use std::sync::Arc;

use crate::presentation::http::handlers::LibraryHandler;

pub fn library_routes(library_handler: Arc<LibraryHandler>) -> Router {
    Router::new()
        .route("/", get(LibraryHandler::root))
        .route("/health", get(LibraryHandler::health))
        .route("/stats", get(LibraryHandler::statistics))
        .with_state(library_handler)
}
