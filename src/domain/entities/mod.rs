pub mod document;
pub mod fragment;
pub mod query_record;

pub use document::Document;
pub use fragment::{Fragment, NewFragment, StoredFragment};
pub use query_record::QueryRecord;
