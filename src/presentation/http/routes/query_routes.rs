use axum::{Router, routing::post};
use std::sync::Arc;

use crate::presentation::http::handlers::QueryHandler;

pub fn query_routes(query_handler: Arc<QueryHandler>) -> Router {
    Router::new()
        .route(
            "/queries",
            post(QueryHandler::ask_question)
                .get(QueryHandler::recent_queries)
                .delete(QueryHandler::purge_queries),
        )
        .with_state(query_handler)
}
