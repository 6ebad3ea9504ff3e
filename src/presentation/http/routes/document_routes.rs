use axum::{
    Router,
    routing::{delete, post},
};
use std::sync::Arc;

use crate::presentation::http::handlers::DocumentHandler;

pub fn document_routes(document_handler: Arc<DocumentHandler>) -> Router {
    Router::new()
        .route(
            "/documents",
            post(DocumentHandler::upload_document).get(DocumentHandler::list_documents),
        )
        .route("/documents/import", post(DocumentHandler::import_document))
        .route("/documents/{document_id}", delete(DocumentHandler::delete_document))
        .with_state(document_handler)
}
