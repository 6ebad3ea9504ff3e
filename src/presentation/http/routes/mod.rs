pub mod document_routes;
pub mod library_routes;
pub mod query_routes;

pub use document_routes::*;
pub use library_routes::*;
pub use query_routes::*;
