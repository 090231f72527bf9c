use crate::error::SchemaError;
use crate::{Document, Index, IndexOptions, Schema};
use parking_lot::RwLock;
use std::sync::Arc;

/// Shared reference to the currently published [`Index`].
///
/// Readers take an `Arc` snapshot and search it without holding the lock, so
/// a concurrent swap never changes what an in-flight search sees.
#[derive(Debug, Clone)]
pub struct IndexHandle {
    inner: Arc<RwLock<Arc<Index>>>,
}

impl IndexHandle {
    pub fn new(index: Index) -> Self {
        Self { inner: Arc::new(RwLock::new(Arc::new(index))) }
    }

    pub fn current(&self) -> Arc<Index> {
        self.inner.read().clone()
    }

    /// Publish `index`, returning the previous snapshot.
    pub fn replace(&self, index: Index) -> Arc<Index> {
        let next = Arc::new(index);
        std::mem::replace(&mut *self.inner.write(), next)
    }

    /// Build a new index and publish it, returning the previous snapshot. On
    /// error the current index stays.
    pub fn rebuild<I>(&self, documents: I, schema: Schema, options: IndexOptions) -> Result<Arc<Index>, SchemaError>
    where
        I: IntoIterator<Item = Document>,
    {
        let index = Index::build_with(documents, schema, options)?;
        Ok(self.replace(index))
    }
}
