pub mod storage_gateway;

pub use storage_gateway::{
    DocumentSearch, LibraryStatistics, NewDocument, StorageError, StorageGateway,
};
