use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::application::use_cases::{
    AnswerQuestionError, AnswerQuestionRequest, AnswerQuestionUseCase, ManageQueryLogUseCase,
};
use crate::presentation::http::dto::{
    AnswerResponseDto, ApiResponse, AskQuestionRequestDto, PurgeResponseDto, QueryRecordDto,
    RecentQueriesParams,
};

pub struct QueryHandler {
    answer_use_case: Arc<AnswerQuestionUseCase>,
    query_log_use_case: Arc<ManageQueryLogUseCase>,
}

impl QueryHandler {
    pub fn new(
        answer_use_case: Arc<AnswerQuestionUseCase>,
        query_log_use_case: Arc<ManageQueryLogUseCase>,
    ) -> Self {
        Self {
            answer_use_case,
            query_log_use_case,
        }
    }

    pub async fn ask_question(
        State(handler): State<Arc<QueryHandler>>,
        Json(body): Json<AskQuestionRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        if body.question.trim().is_empty() {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<AnswerResponseDto>::error(
                    "EMPTY_QUESTION",
                    "Question cannot be empty".to_string(),
                    None,
                )),
            ));
        }

        let request = AnswerQuestionRequest {
            question: body.question,
            document_ids: body.document_ids,
        };

        match handler.answer_use_case.execute(request).await {
            Ok(response) => Ok((
                StatusCode::OK,
                Json(ApiResponse::success(AnswerResponseDto::from(response))),
            )),
            Err(e) => {
                let (status, code) = match &e {
                    AnswerQuestionError::ValidationError(_) => {
                        (StatusCode::BAD_REQUEST, "INVALID_QUESTION")
                    }
                    AnswerQuestionError::Storage(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_FAILED")
                    }
                    AnswerQuestionError::InvalidState(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "QUERY_FAILED")
                    }
                };
                Ok((
                    status,
                    Json(ApiResponse::<AnswerResponseDto>::error(code, e.to_string(), None)),
                ))
            }
        }
    }

    pub async fn recent_queries(
        State(handler): State<Arc<QueryHandler>>,
        Query(params): Query<RecentQueriesParams>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.query_log_use_case.recent(params.limit).await {
            Ok(records) => {
                let dto: Vec<QueryRecordDto> =
                    records.into_iter().map(QueryRecordDto::from).collect();
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Vec<QueryRecordDto>>::error(
                    "QUERY_LOG_FAILED",
                    e.to_string(),
                    None,
                )),
            )),
        }
    }

    pub async fn purge_queries(
        State(handler): State<Arc<QueryHandler>>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.query_log_use_case.purge().await {
            Ok(removed) => Ok((
                StatusCode::OK,
                Json(ApiResponse::success(PurgeResponseDto { removed })),
            )),
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<PurgeResponseDto>::error(
                    "PURGE_FAILED",
                    e.to_string(),
                    None,
                )),
            )),
        }
    }
}
