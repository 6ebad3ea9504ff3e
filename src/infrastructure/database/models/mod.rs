pub mod document_model;
pub mod fragment_model;
pub mod query_log_model;
pub mod sqlite_models;

pub use document_model::*;
pub use fragment_model::*;
pub use query_log_model::*;
pub use sqlite_models::{SqliteDocumentRow, SqliteFragmentRow, SqliteQueryRow};
