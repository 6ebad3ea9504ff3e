use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::application::use_cases::GetStatisticsUseCase;
use crate::domain::repositories::LibraryStatistics;
use crate::presentation::http::dto::{ApiResponse, HealthResponseDto};

pub struct LibraryHandler {
    statistics_use_case: Arc<GetStatisticsUseCase>,
}

impl LibraryHandler {
    pub fn new(statistics_use_case: Arc<GetStatisticsUseCase>) -> Self {
        Self {
            statistics_use_case,
        }
    }

    pub async fn root() -> impl IntoResponse {
        (
            StatusCode::OK,
            Json(ApiResponse::success("Librarian".to_string())),
        )
    }

    pub async fn health(State(handler): State<Arc<LibraryHandler>>) -> impl IntoResponse {
        let (status, storage) = match handler.statistics_use_case.health_check().await {
            Ok(()) => (StatusCode::OK, "ok".to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "health check failed");
                (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
        };

        let health_response = HealthResponseDto {
            status: if status.is_success() { "healthy" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            storage,
        };

        (status, Json(ApiResponse::success(health_response)))
    }

    pub async fn statistics(
        State(handler): State<Arc<LibraryHandler>>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.statistics_use_case.execute().await {
            Ok(statistics) => Ok((StatusCode::OK, Json(ApiResponse::success(statistics)))),
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<LibraryStatistics>::error(
                    "STATISTICS_FAILED",
                    e.to_string(),
                    None,
                )),
            )),
        }
    }
}
