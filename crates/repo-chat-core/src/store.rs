//! Vector arena: documents and their embeddings, addressed by [`DocId`].
//!
//! Entries are stored contiguously in load order, so a `DocId` is both
//! the position in the arena and the load-order tie-breaker used by
//! search. All vectors in one arena share a single dimension.

use crate::error::EmbedError;
use crate::models::Document;

/// Contiguous document identifier: the document's position in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocId(usize);

impl DocId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Arena of documents with their embedding vectors.
#[derive(Debug, Clone)]
pub struct VectorArena {
    dims: usize,
    documents: Vec<Document>,
    vectors: Vec<Vec<f32>>,
}

impl VectorArena {
    pub fn with_capacity(dims: usize, capacity: usize) -> Self {
        Self {
            dims,
            documents: Vec::with_capacity(capacity),
            vectors: Vec::with_capacity(capacity),
        }
    }

    /// Append a document with its vector, returning its id.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::DimensionMismatch`] if the vector length
    /// differs from the arena dimension.
    pub fn push(&mut self, document: Document, vector: Vec<f32>) -> Result<DocId, EmbedError> {
        if vector.len() != self.dims {
            return Err(EmbedError::DimensionMismatch {
                expected: self.dims,
                actual: vector.len(),
            });
        }
        let id = DocId(self.documents.len());
        self.documents.push(document);
        self.vectors.push(vector);
        Ok(id)
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.documents.get(id.0)
    }

    pub fn vector(&self, id: DocId) -> Option<&[f32]> {
        self.vectors.get(id.0).map(Vec::as_slice)
    }

    /// Documents in load order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Iterate `(id, document, vector)` in load order.
    pub fn iter(&self) -> impl Iterator<Item = (DocId, &Document, &[f32])> {
        self.documents
            .iter()
            .zip(self.vectors.iter())
            .enumerate()
            .map(|(i, (d, v))| (DocId(i), d, v.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_contiguous() {
        let mut arena = VectorArena::with_capacity(2, 3);
        let a = arena.push(Document::new("a", "x"), vec![1.0, 0.0]).unwrap();
        let b = arena.push(Document::new("b", "y"), vec![0.0, 1.0]).unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.document(b).unwrap().path(), "b");
        assert_eq!(arena.vector(a).unwrap(), &[1.0, 0.0]);
    }

    #[test]
    fn test_dimension_checked() {
        let mut arena = VectorArena::with_capacity(3, 1);
        let err = arena.push(Document::new("a", "x"), vec![1.0]).unwrap_err();
        assert!(matches!(
            err,
            EmbedError::DimensionMismatch {
                expected: 3,
                actual: 1
            }
        ));
        assert!(arena.is_empty());
    }

    #[test]
    fn test_iter_in_load_order() {
        let mut arena = VectorArena::with_capacity(1, 3);
        for name in ["c", "a", "b"] {
            arena.push(Document::new(name, ""), vec![1.0]).unwrap();
        }
        let paths: Vec<&str> = arena.iter().map(|(_, d, _)| d.path()).collect();
        assert_eq!(paths, vec!["c", "a", "b"]);
    }
}
