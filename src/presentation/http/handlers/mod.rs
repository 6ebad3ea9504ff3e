pub mod document_handler;
pub mod library_handler;
pub mod query_handler;

pub use document_handler::DocumentHandler;
pub use library_handler::LibraryHandler;
pub use query_handler::QueryHandler;
