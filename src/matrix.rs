//! Fixed-shape embedding storage
//!
//! Rows are stored contiguously; every row has exactly `dim` values.

use crate::error::{Result, RouterError};

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    dim: usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    pub fn new(dim: usize) -> Result<Self> {
        Self::with_capacity(dim, 0)
    }

    pub fn with_capacity(dim: usize, rows: usize) -> Result<Self> {
        if dim == 0 {
            return Err(RouterError::validation(
                "embedding dimension must be greater than zero",
            ));
        }
        Ok(Self {
            dim,
            data: Vec::with_capacity(dim * rows),
        })
    }

    /// Append a row; its length must equal `dim`
    pub fn push_row(&mut self, row: &[f32]) -> Result<()> {
        if row.len() != self.dim {
            return Err(RouterError::validation(format!(
                "row has {} values, matrix dimension is {}",
                row.len(),
                self.dim
            )));
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f32]> + '_ {
        self.data.chunks_exact(self.dim)
    }
}
