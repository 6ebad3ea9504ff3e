use async_trait::async_trait;
use diesel::dsl::{count_star, max, sum};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::{Document, NewFragment, QueryRecord, StoredFragment};
use crate::domain::repositories::{
    DocumentSearch, LibraryStatistics, NewDocument, StorageError, StorageGateway,
};
use crate::infrastructure::database::connection::{
    SqliteConnectionHandle, SqlitePool, get_sqlite_connection,
};
use crate::infrastructure::database::models::sqlite_models::decode_timestamp;
use crate::infrastructure::database::models::{
    SqliteDocumentRow, SqliteFragmentRow, SqliteQueryRow, document_from_request,
};
use crate::infrastructure::database::repositories::postgres_storage_gateway::like_pattern;
use crate::infrastructure::database::sqlite_schema::{documents, fragments, query_log};

/// Single-file backend. Embeddings are stored as little-endian `f32` blobs
/// and decoded on read.
pub struct SqliteStorageGateway {
    pool: SqlitePool,
}

impl SqliteStorageGateway {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn connection(&self) -> Result<SqliteConnectionHandle, StorageError> {
        get_sqlite_connection(&self.pool).map_err(|e| StorageError::DatabaseError(e.to_string()))
    }
}

fn db_error(error: diesel::result::Error) -> StorageError {
    tracing::error!(error = %error, backend = "sqlite", "storage operation failed");
    StorageError::DatabaseError(error.to_string())
}

#[async_trait]
impl StorageGateway for SqliteStorageGateway {
    async fn create_document(&self, document: NewDocument) -> Result<Uuid, StorageError> {
        let mut conn = self.connection()?;
        let document = document_from_request(document);
        let row = SqliteDocumentRow::from_document(&document)?;

        diesel::insert_into(documents::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(db_error)?;

        Ok(document.id())
    }

    async fn save_fragments(
        &self,
        document_id: Uuid,
        new_fragments: &[NewFragment],
    ) -> Result<usize, StorageError> {
        let mut conn = self.connection()?;
        let key = document_id.to_string();

        let rows: Vec<SqliteFragmentRow> = new_fragments
            .iter()
            .enumerate()
            .map(|(index, fragment)| SqliteFragmentRow::new(document_id, index as i32, fragment))
            .collect();

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let updated = diesel::update(documents::table.find(&key))
                .set(documents::fragment_count.eq(rows.len() as i32))
                .execute(conn)?;
            if updated == 0 {
                return Err(diesel::result::Error::NotFound);
            }
            for row in &rows {
                diesel::insert_into(fragments::table)
                    .values(row)
                    .execute(conn)?;
            }
            Ok(())
        })
        .map_err(|e| match e {
            diesel::result::Error::NotFound => StorageError::DocumentNotFound(document_id),
            other => db_error(other),
        })?;

        Ok(rows.len())
    }

    async fn get_fragments(
        &self,
        document_ids: Option<&[Uuid]>,
    ) -> Result<Vec<StoredFragment>, StorageError> {
        let mut conn = self.connection()?;

        let mut query = fragments::table
            .inner_join(documents::table)
            .select((
                SqliteFragmentRow::as_select(),
                documents::title,
                documents::author,
            ))
            .order((documents::processed_at.asc(), fragments::fragment_index.asc()))
            .into_boxed();

        if let Some(ids) = document_ids {
            let keys: Vec<String> = ids.iter().map(Uuid::to_string).collect();
            query = query.filter(fragments::document_id.eq_any(keys));
        }

        let rows: Vec<(SqliteFragmentRow, String, Option<String>)> =
            query.load(&mut conn).map_err(db_error)?;

        rows.into_iter()
            .map(|(row, document_title, document_author)| {
                Ok(StoredFragment {
                    fragment: row.into_fragment()?,
                    document_title,
                    document_author,
                })
            })
            .collect()
    }

    async fn log_query(&self, record: &QueryRecord) -> Result<(), StorageError> {
        let mut conn = self.connection()?;
        let row = SqliteQueryRow::from_record(record)?;

        diesel::insert_into(query_log::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(db_error)?;

        Ok(())
    }

    async fn find_document_by_hash(&self, hash: &str) -> Result<Option<Document>, StorageError> {
        let mut conn = self.connection()?;

        documents::table
            .filter(documents::file_hash.eq(hash))
            .select(SqliteDocumentRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(db_error)?
            .map(SqliteDocumentRow::into_document)
            .transpose()
    }

    async fn list_documents(&self) -> Result<Vec<Document>, StorageError> {
        let mut conn = self.connection()?;

        let rows = documents::table
            .order(documents::processed_at.desc())
            .select(SqliteDocumentRow::as_select())
            .load(&mut conn)
            .map_err(db_error)?;

        rows.into_iter().map(SqliteDocumentRow::into_document).collect()
    }

    async fn search_documents(&self, criteria: &DocumentSearch) -> Result<Vec<Document>, StorageError> {
        let mut conn = self.connection()?;

        let mut query = documents::table
            .order(documents::processed_at.desc())
            .select(SqliteDocumentRow::as_select())
            .into_boxed();

        // SQLite LIKE is case-insensitive for ASCII only.
        if let Some(title) = &criteria.title {
            query = query.filter(documents::title.like(like_pattern(title)).escape('\\'));
        }
        if let Some(author) = &criteria.author {
            query = query.filter(documents::author.like(like_pattern(author)).escape('\\'));
        }

        let rows = query.load(&mut conn).map_err(db_error)?;
        rows.into_iter().map(SqliteDocumentRow::into_document).collect()
    }

    async fn delete_document(&self, document_id: Uuid) -> Result<bool, StorageError> {
        let mut conn = self.connection()?;
        let key = document_id.to_string();

        let deleted = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                diesel::delete(fragments::table.filter(fragments::document_id.eq(&key)))
                    .execute(conn)?;
                diesel::delete(documents::table.find(&key)).execute(conn)
            })
            .map_err(db_error)?;

        Ok(deleted > 0)
    }

    async fn recent_queries(&self, limit: i64) -> Result<Vec<QueryRecord>, StorageError> {
        let mut conn = self.connection()?;

        let rows = query_log::table
            .order(query_log::asked_at.desc())
            .limit(limit)
            .select(SqliteQueryRow::as_select())
            .load(&mut conn)
            .map_err(db_error)?;

        rows.into_iter().map(SqliteQueryRow::into_record).collect()
    }

    async fn purge_queries(&self) -> Result<i64, StorageError> {
        let mut conn = self.connection()?;

        let removed = diesel::delete(query_log::table)
            .execute(&mut conn)
            .map_err(db_error)?;

        Ok(removed as i64)
    }

    async fn statistics(&self) -> Result<LibraryStatistics, StorageError> {
        let mut conn = self.connection()?;

        let total_documents: i64 = documents::table
            .select(count_star())
            .first(&mut conn)
            .map_err(db_error)?;
        let total_fragments: i64 = fragments::table
            .select(count_star())
            .first(&mut conn)
            .map_err(db_error)?;
        let embedded_fragments: i64 = fragments::table
            .filter(fragments::embedding.is_not_null())
            .select(count_star())
            .first(&mut conn)
            .map_err(db_error)?;
        let total_tokens: Option<i64> = fragments::table
            .select(sum(fragments::token_count))
            .first(&mut conn)
            .map_err(db_error)?;
        let total_queries: i64 = query_log::table
            .select(count_star())
            .first(&mut conn)
            .map_err(db_error)?;
        let last_document: Option<String> = documents::table
            .select(max(documents::processed_at))
            .first(&mut conn)
            .map_err(db_error)?;
        let last_query: Option<String> = query_log::table
            .select(max(query_log::asked_at))
            .first(&mut conn)
            .map_err(db_error)?;

        let last_document = last_document.as_deref().map(decode_timestamp).transpose()?;
        let last_query = last_query.as_deref().map(decode_timestamp).transpose()?;

        Ok(LibraryStatistics {
            total_documents,
            total_fragments,
            embedded_fragments,
            total_queries,
            total_tokens: total_tokens.unwrap_or(0),
            last_activity: last_document.max(last_query),
            backend: "sqlite".to_string(),
        })
    }

    async fn ping(&self) -> Result<(), StorageError> {
        let mut conn = self.connection()?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .map_err(db_error)?;
        Ok(())
    }
}
