use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::use_cases::{
    DeleteDocumentUseCase, IngestDocumentError, IngestDocumentRequest, IngestDocumentUseCase,
    IngestSource, ListDocumentsRequest, ListDocumentsUseCase,
};
use crate::domain::repositories::StorageError;
use crate::presentation::http::dto::{
    ApiResponse, DocumentListResponseDto, DocumentResponseDto, DocumentSearchParams,
    ImportDocumentRequestDto, IngestResponseDto, MessageResponseDto,
};

pub struct DocumentHandler {
    ingest_use_case: Arc<IngestDocumentUseCase>,
    list_use_case: Arc<ListDocumentsUseCase>,
    delete_use_case: Arc<DeleteDocumentUseCase>,
}

impl DocumentHandler {
    pub fn new(
        ingest_use_case: Arc<IngestDocumentUseCase>,
        list_use_case: Arc<ListDocumentsUseCase>,
        delete_use_case: Arc<DeleteDocumentUseCase>,
    ) -> Self {
        Self {
            ingest_use_case,
            list_use_case,
            delete_use_case,
        }
    }

    /// Multipart upload: a `file` part plus optional `title` and `author`.
    pub async fn upload_document(
        State(handler): State<Arc<DocumentHandler>>,
        mut multipart: Multipart,
    ) -> Result<impl IntoResponse, StatusCode> {
        let mut upload: Option<(String, Vec<u8>)> = None;
        let mut title = None;
        let mut author = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| StatusCode::BAD_REQUEST)?
        {
            match field.name() {
                Some("file") => {
                    let file_name = field.file_name().unwrap_or("document.pdf").to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|_| StatusCode::BAD_REQUEST)?
                        .to_vec();
                    upload = Some((file_name, data));
                }
                Some("title") => {
                    title = Some(field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?);
                }
                Some("author") => {
                    author = Some(field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?);
                }
                _ => {}
            }
        }

        let Some((file_name, data)) = upload else {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<IngestResponseDto>::error(
                    "NO_FILE_PROVIDED",
                    "No file provided in the request".to_string(),
                    None,
                )),
            ));
        };

        let request = IngestDocumentRequest {
            source: IngestSource::Upload { file_name, data },
            title,
            author,
        };

        Ok(handler.ingest(request).await)
    }

    pub async fn import_document(
        State(handler): State<Arc<DocumentHandler>>,
        Json(body): Json<ImportDocumentRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let request = IngestDocumentRequest {
            source: IngestSource::LocalFile(PathBuf::from(body.path)),
            title: body.title,
            author: body.author,
        };

        Ok(handler.ingest(request).await)
    }

    async fn ingest(
        &self,
        request: IngestDocumentRequest,
    ) -> (StatusCode, Json<ApiResponse<IngestResponseDto>>) {
        match self.ingest_use_case.execute(request).await {
            Ok(response) => (
                StatusCode::CREATED,
                Json(ApiResponse::success(IngestResponseDto::from(response))),
            ),
            Err(e) => {
                let (status, code) = ingest_error_status(&e);
                let details = match &e {
                    IngestDocumentError::AlreadyIngested(id) => Some(id.to_string()),
                    _ => None,
                };
                (status, Json(ApiResponse::error(code, e.to_string(), details)))
            }
        }
    }

    pub async fn list_documents(
        State(handler): State<Arc<DocumentHandler>>,
        Query(params): Query<DocumentSearchParams>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let request = ListDocumentsRequest {
            title: params.title,
            author: params.author,
        };

        match handler.list_use_case.execute(request).await {
            Ok(response) => {
                let dto = DocumentListResponseDto {
                    total: response.total_count,
                    documents: response
                        .documents
                        .into_iter()
                        .map(DocumentResponseDto::from)
                        .collect(),
                };
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<DocumentListResponseDto>::error(
                    "LIST_FAILED",
                    e.to_string(),
                    None,
                )),
            )),
        }
    }

    pub async fn delete_document(
        State(handler): State<Arc<DocumentHandler>>,
        Path(document_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.delete_use_case.execute(document_id).await {
            Ok(()) => Ok((
                StatusCode::OK,
                Json(ApiResponse::success(MessageResponseDto {
                    message: format!("Document {} deleted", document_id),
                })),
            )),
            Err(e @ StorageError::DocumentNotFound(_)) => Ok((
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<MessageResponseDto>::error(
                    "DOCUMENT_NOT_FOUND",
                    e.to_string(),
                    None,
                )),
            )),
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<MessageResponseDto>::error(
                    "DELETE_FAILED",
                    e.to_string(),
                    None,
                )),
            )),
        }
    }
}

fn ingest_error_status(error: &IngestDocumentError) -> (StatusCode, &'static str) {
    match error {
        IngestDocumentError::ValidationError(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
        IngestDocumentError::AlreadyIngested(_) => (StatusCode::CONFLICT, "ALREADY_INGESTED"),
        IngestDocumentError::NoTextExtracted(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "NO_TEXT_EXTRACTED")
        }
        IngestDocumentError::IoError(_) => (StatusCode::BAD_REQUEST, "FILE_UNREADABLE"),
        IngestDocumentError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_FAILED"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_error_status() {
        let duplicate = IngestDocumentError::AlreadyIngested(Uuid::new_v4());
        assert_eq!(ingest_error_status(&duplicate).0, StatusCode::CONFLICT);

        let empty = IngestDocumentError::NoTextExtracted("scanned".to_string());
        assert_eq!(ingest_error_status(&empty).0, StatusCode::UNPROCESSABLE_ENTITY);

        let storage = IngestDocumentError::Storage(StorageError::DatabaseError("down".to_string()));
        assert_eq!(
            ingest_error_status(&storage),
            (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_FAILED")
        );
    }
}
