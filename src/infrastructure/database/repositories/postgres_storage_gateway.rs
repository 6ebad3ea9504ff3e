use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::{count_star, max, sum};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::{Document, NewFragment, QueryRecord, StoredFragment};
use crate::domain::repositories::{
    DocumentSearch, LibraryStatistics, NewDocument, StorageError, StorageGateway,
};
use crate::infrastructure::database::connection::{DbConnection, DbPool, get_connection_from_pool};
use crate::infrastructure::database::models::{
    DocumentModel, FragmentModel, NewDocumentModel, NewFragmentModel, QueryLogModel,
    document_from_request,
};
use crate::infrastructure::database::schema::{documents, fragments, query_log};

/// PostgreSQL backend; embeddings live in a native pgvector column.
pub struct PostgresStorageGateway {
    pool: DbPool,
}

impl PostgresStorageGateway {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn connection(&self) -> Result<DbConnection, StorageError> {
        get_connection_from_pool(&self.pool).map_err(|e| StorageError::DatabaseError(e.to_string()))
    }
}

fn db_error(error: diesel::result::Error) -> StorageError {
    tracing::error!(error = %error, backend = "postgresql", "storage operation failed");
    StorageError::DatabaseError(error.to_string())
}

/// `%` and `_` are literal in user search terms. Backslash is the escape
/// character on both backends.
/// Rows per fragment INSERT. Eight bound columns per row keeps each statement
/// well under PostgreSQL's 65535 bind parameter limit.
const FRAGMENT_INSERT_BATCH: usize = 1000;

fn fragment_batches(models: &[NewFragmentModel]) -> std::slice::Chunks<'_, NewFragmentModel> {
    models.chunks(FRAGMENT_INSERT_BATCH)
}

pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl StorageGateway for PostgresStorageGateway {
    async fn create_document(&self, document: NewDocument) -> Result<Uuid, StorageError> {
        let mut conn = self.connection()?;
        let document = document_from_request(document);
        let new_model = NewDocumentModel::from(&document);

        diesel::insert_into(documents::table)
            .values(&new_model)
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

        let models: Vec<NewFragmentModel> = new_fragments
            .iter()
            .enumerate()
            .map(|(index, fragment)| NewFragmentModel::new(document_id, index as i32, fragment))
            .collect();

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let updated = diesel::update(documents::table.find(document_id))
                .set(documents::fragment_count.eq(models.len() as i32))
                .execute(conn)?;
            if updated == 0 {
                return Err(diesel::result::Error::NotFound);
            }
            for batch in fragment_batches(&models) {
                diesel::insert_into(fragments::table)
                    .values(batch)
                    .execute(conn)?;
            }
            Ok(())
        })
        .map_err(|e| match e {
            diesel::result::Error::NotFound => StorageError::DocumentNotFound(document_id),
            other => db_error(other),
        })?;

        Ok(models.len())
    }

    async fn get_fragments(
        &self,
        document_ids: Option<&[Uuid]>,
    ) -> Result<Vec<StoredFragment>, StorageError> {
        let mut conn = self.connection()?;

        let mut query = fragments::table
            .inner_join(documents::table)
            .select((
                FragmentModel::as_select(),
                documents::title,
                documents::author,
            ))
            .order((documents::processed_at.asc(), fragments::fragment_index.asc()))
            .into_boxed();

        if let Some(ids) = document_ids {
            query = query.filter(fragments::document_id.eq_any(ids.to_vec()));
        }

        let rows: Vec<(FragmentModel, String, Option<String>)> =
            query.load(&mut conn).map_err(db_error)?;

        rows.into_iter()
            .map(|(model, document_title, document_author)| {
                Ok(StoredFragment {
                    fragment: model.try_into()?,
                    document_title,
                    document_author,
                })
            })
            .collect()
    }

    async fn log_query(&self, record: &QueryRecord) -> Result<(), StorageError> {
        let mut conn = self.connection()?;

        diesel::insert_into(query_log::table)
            .values(QueryLogModel::from(record))
            .execute(&mut conn)
            .map_err(db_error)?;

        Ok(())
    }

    async fn find_document_by_hash(&self, hash: &str) -> Result<Option<Document>, StorageError> {
        let mut conn = self.connection()?;

        let model = documents::table
            .filter(documents::file_hash.eq(hash))
            .select(DocumentModel::as_select())
            .first(&mut conn)
            .optional()
            .map_err(db_error)?;

        Ok(model.map(Document::from))
    }

    async fn list_documents(&self) -> Result<Vec<Document>, StorageError> {
        let mut conn = self.connection()?;

        let models = documents::table
            .order(documents::processed_at.desc())
            .select(DocumentModel::as_select())
            .load(&mut conn)
            .map_err(db_error)?;

        Ok(models.into_iter().map(Document::from).collect())
    }

    async fn search_documents(&self, criteria: &DocumentSearch) -> Result<Vec<Document>, StorageError> {
        let mut conn = self.connection()?;

        let mut query = documents::table
            .order(documents::processed_at.desc())
            .select(DocumentModel::as_select())
            .into_boxed();

        if let Some(title) = &criteria.title {
            query = query.filter(documents::title.ilike(like_pattern(title)));
        }
        if let Some(author) = &criteria.author {
            query = query.filter(documents::author.ilike(like_pattern(author)));
        }

        let models = query.load(&mut conn).map_err(db_error)?;
        Ok(models.into_iter().map(Document::from).collect())
    }

    async fn delete_document(&self, document_id: Uuid) -> Result<bool, StorageError> {
        let mut conn = self.connection()?;

        let deleted = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                diesel::delete(fragments::table.filter(fragments::document_id.eq(document_id)))
                    .execute(conn)?;
                diesel::delete(documents::table.find(document_id)).execute(conn)
            })
            .map_err(db_error)?;

        Ok(deleted > 0)
    }

    async fn recent_queries(&self, limit: i64) -> Result<Vec<QueryRecord>, StorageError> {
        let mut conn = self.connection()?;

        let models = query_log::table
            .order(query_log::asked_at.desc())
            .limit(limit)
            .select(QueryLogModel::as_select())
            .load(&mut conn)
            .map_err(db_error)?;

        models.into_iter().map(QueryRecord::try_from).collect()
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
        let last_document: Option<DateTime<Utc>> = documents::table
            .select(max(documents::processed_at))
            .first(&mut conn)
            .map_err(db_error)?;
        let last_query: Option<DateTime<Utc>> = query_log::table
            .select(max(query_log::asked_at))
            .first(&mut conn)
            .map_err(db_error)?;

        Ok(LibraryStatistics {
            total_documents,
            total_fragments,
            embedded_fragments,
            total_queries,
            total_tokens: total_tokens.unwrap_or(0),
            last_activity: last_document.max(last_query),
            backend: "postgresql".to_string(),
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
