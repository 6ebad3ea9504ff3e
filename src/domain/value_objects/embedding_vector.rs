use serde::{Deserialize, Serialize};

const F32_WIDTH: usize = std::mem::size_of::<f32>();

/// Fixed-length embedding produced by a single model. Never mutated after
/// creation; a changed fragment gets a new vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector(Vec<f32>);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmbeddingVectorError {
    #[error("Embedding vector cannot be empty")]
    Empty,
    #[error("Embedding blob length {0} is not a multiple of 4 bytes")]
    MisalignedBlob(usize),
}

impl EmbeddingVector {
    pub fn new(values: Vec<f32>) -> Result<Self, EmbeddingVectorError> {
        if values.is_empty() {
            return Err(EmbeddingVectorError::Empty);
        }

        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Little-endian `f32` blob, the layout used by blob-backed storage.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.0.len() * F32_WIDTH);
        for value in &self.0 {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, EmbeddingVectorError> {
        if bytes.len() % F32_WIDTH != 0 {
            return Err(EmbeddingVectorError::MisalignedBlob(bytes.len()));
        }

        let values = bytes
            .chunks_exact(F32_WIDTH)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        Self::new(values)
    }
}

impl TryFrom<Vec<f32>> for EmbeddingVector {
    type Error = EmbeddingVectorError;

    fn try_from(values: Vec<f32>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}
