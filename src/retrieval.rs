//! # Retrieval
//!
//! The read path of the RAG system: a natural-language query in, a rendered
//! context string out.
//!
//! The service embeds the query to a single vector, asks the vector store for
//! the nearest points, and renders each hit's payload as a block (see
//! [`Record::context_block`](crate::records::Record::context_block)). Blocks
//! are joined with a blank line; an empty collection yields an empty string,
//! which the responder passes through to the model as-is.

use crate::embedder::Embedder;
use crate::error::Result;
use crate::vector_store::VectorStore;

/// Separator between rendered context blocks.
const BLOCK_SEPARATOR: &str = "\n\n";

/// Embeds queries and renders the nearest records into prompt context.
pub struct RetrievalQueryService<'a> {
    embedder: &'a dyn Embedder,
    store: &'a VectorStore,
    collection: &'a str,
}

impl<'a> RetrievalQueryService<'a> {
    pub fn new(embedder: &'a dyn Embedder, store: &'a VectorStore, collection: &'a str) -> Self {
        Self {
            embedder,
            store,
            collection,
        }
    }

    /// Retrieve the `limit` records most similar to `query`, rendered as one
    /// context string.
    ///
    /// # Errors
    /// Embedding and vector store failures are propagated; an empty collection
    /// is not an error and produces an empty string.
    pub fn retrieve(&self, query: &str, limit: usize) -> Result<String> {
        let vector = self.embedder.embed(query)?;
        let hits = self.store.query(self.collection, &vector, limit)?;

        tracing::debug!("Retrieved {} records for query", hits.len());

        Ok(hits
            .iter()
            .map(|hit| hit.payload.context_block())
            .collect::<Vec<_>>()
            .join(BLOCK_SEPARATOR))
    }
}
