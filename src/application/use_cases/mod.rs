pub mod answer_question;
pub mod delete_document;
pub mod get_statistics;
pub mod ingest_document;
pub mod list_documents;
pub mod manage_query_log;

pub use answer_question::{
    AnswerQuestionError, AnswerQuestionRequest, AnswerQuestionResponse, AnswerQuestionUseCase,
};
pub use delete_document::DeleteDocumentUseCase;
pub use get_statistics::GetStatisticsUseCase;
pub use ingest_document::{
    IngestDocumentError, IngestDocumentRequest, IngestDocumentResponse, IngestDocumentUseCase,
    IngestSource,
};
pub use list_documents::{ListDocumentsRequest, ListDocumentsResponse, ListDocumentsUseCase};
pub use manage_query_log::ManageQueryLogUseCase;
