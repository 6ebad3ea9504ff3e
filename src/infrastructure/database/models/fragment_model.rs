use chrono::{DateTime, Utc};
use diesel::prelude::*;
use pgvector::Vector;
use uuid::Uuid;

use crate::domain::entities::{Fragment, NewFragment};
use crate::domain::repositories::StorageError;
use crate::domain::value_objects::EmbeddingVector;
use crate::infrastructure::database::schema::fragments;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(belongs_to(super::DocumentModel, foreign_key = document_id))]
#[diesel(table_name = fragments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FragmentModel {
    pub id: Uuid,
    pub document_id: Uuid,
    pub content: String,
    pub page_number: i32,
    pub fragment_index: i32,
    pub token_count: i32,
    pub embedding: Option<Vector>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = fragments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewFragmentModel {
    pub id: Uuid,
    pub document_id: Uuid,
    pub content: String,
    pub page_number: i32,
    pub fragment_index: i32,
    pub token_count: i32,
    pub embedding: Option<Vector>,
    pub created_at: DateTime<Utc>,
}

impl NewFragmentModel {
    pub fn new(document_id: Uuid, fragment_index: i32, fragment: &NewFragment) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content: fragment.content.clone(),
            page_number: fragment.page_number,
            fragment_index,
            token_count: fragment.token_count,
            embedding: fragment
                .embedding
                .as_ref()
                .map(|vector| Vector::from(vector.as_slice().to_vec())),
            created_at: Utc::now(),
        }
    }
}

impl TryFrom<FragmentModel> for Fragment {
    type Error = StorageError;

    fn try_from(model: FragmentModel) -> Result<Self, Self::Error> {
        let embedding = model
            .embedding
            .map(|vector| EmbeddingVector::new(vector.to_vec()))
            .transpose()
            .map_err(|e| StorageError::CorruptRecord(format!("fragment {}: {}", model.id, e)))?;

        Ok(Fragment::restore(
            model.id,
            model.document_id,
            model.content,
            model.page_number,
            model.fragment_index,
            model.token_count,
            embedding,
            model.created_at,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_column_round_trip() {
        let document_id = Uuid::new_v4();
        let new_fragment = NewFragment {
            content: "Photosynthesis converts light.".to_string(),
            page_number: 4,
            token_count: 5,
            embedding: Some(EmbeddingVector::new(vec![0.25, -0.5, 0.125]).unwrap()),
        };

        let insert = NewFragmentModel::new(document_id, 2, &new_fragment);
        let model = FragmentModel {
            id: insert.id,
            document_id: insert.document_id,
            content: insert.content,
            page_number: insert.page_number,
            fragment_index: insert.fragment_index,
            token_count: insert.token_count,
            embedding: insert.embedding,
            created_at: insert.created_at,
        };

        let fragment = Fragment::try_from(model).unwrap();
        assert_eq!(fragment.fragment_index(), 2);
        assert_eq!(fragment.page_number(), 4);
        assert_eq!(
            fragment.embedding().map(EmbeddingVector::as_slice),
            Some(&[0.25, -0.5, 0.125][..])
        );
    }

    #[test]
    fn test_empty_vector_is_corrupt() {
        let model = FragmentModel {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            content: "x".to_string(),
            page_number: 1,
            fragment_index: 0,
            token_count: 1,
            embedding: Some(Vector::from(Vec::new())),
            created_at: Utc::now(),
        };

        assert!(matches!(Fragment::try_from(model), Err(StorageError::CorruptRecord(_))));
    }
}
