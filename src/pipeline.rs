//! # Ingestion pipeline
//!
//! The write path of the RAG system: course records in, vector-store points out.
//!
//! The pipeline derives each record's embeddable text with the fixed rule in
//! [`Record::embeddable_text`], embeds every text in a single batch, builds one
//! point per record (keyed by the record's id, carrying the full record as
//! payload), and upserts the whole batch in one call. An embedding failure
//! aborts the ingestion before anything is written.

use crate::embedder::Embedder;
use crate::error::Result;
use crate::records::Record;
use crate::vector_store::{Point, UpsertSummary, VectorStore};

/// Converts records into points and writes them to a collection.
///
/// Dependencies are injected so tests can substitute the embedder and store.
pub struct IngestionPipeline<'a> {
    embedder: &'a dyn Embedder,
    store: &'a mut VectorStore,
    collection: &'a str,
}

impl<'a> IngestionPipeline<'a> {
    pub fn new(embedder: &'a dyn Embedder, store: &'a mut VectorStore, collection: &'a str) -> Self {
        Self {
            embedder,
            store,
            collection,
        }
    }

    /// Ingest a batch of records.
    ///
    /// Re-ingesting records with ids already in the collection overwrites their
    /// points, so running the same ingestion twice leaves the collection with
    /// the same point count. An empty batch is a successful no-op.
    ///
    /// # Errors
    /// - Embedding failures abort the whole ingestion; no points are upserted.
    /// - Vector store failures (missing collection, dimension mismatch) are
    ///   propagated unchanged.
    pub fn ingest(&mut self, records: &[Record]) -> Result<UpsertSummary> {
        if records.is_empty() {
            tracing::info!("No records to ingest");
            return Ok(UpsertSummary::default());
        }

        let texts: Vec<String> = records.iter().map(Record::embeddable_text).collect();
        let vectors = self.embedder.embed_batch(&texts)?;

        let points: Vec<Point> = records
            .iter()
            .zip(vectors)
            .map(|(record, vector)| Point {
                id: record.id,
                vector,
                payload: record.clone(),
            })
            .collect();

        self.store.upsert(self.collection, points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::stub::{FailingEmbedder, StubEmbedder};
    use crate::vector_store::Distance;

    const DIM: usize = 16;

    fn record(id: i64, name: &str, about: &str) -> Record {
        Record {
            id,
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            about: about.to_string(),
            tags: None,
            institute: "Acme U".to_string(),
        }
    }

    fn store_with_collection() -> VectorStore {
        let mut store = VectorStore::new();
        store.create_collection("kb", DIM, Distance::Cosine);
        store
    }

    #[test]
    fn test_ingest_creates_one_point_per_record() {
        let embedder = StubEmbedder::new(DIM);
        let mut store = store_with_collection();
        let records = vec![
            record(1, "Intro to CS", "basics of computer science"),
            record(2, "Data Structures", "lists trees and graphs"),
            record(3, "Operating Systems", "processes and memory"),
        ];

        let summary = IngestionPipeline::new(&embedder, &mut store, "kb")
            .ingest(&records)
            .unwrap();

        assert_eq!(summary.inserted, 3);
        assert_eq!(store.count("kb").unwrap(), 3);
    }

    #[test]
    fn test_reingesting_the_same_records_does_not_duplicate() {
        let embedder = StubEmbedder::new(DIM);
        let mut store = store_with_collection();
        let records = vec![
            record(1, "Intro to CS", "basics of computer science"),
            record(2, "Data Structures", "lists trees and graphs"),
        ];

        let mut pipeline = IngestionPipeline::new(&embedder, &mut store, "kb");
        pipeline.ingest(&records).unwrap();
        let second = pipeline.ingest(&records).unwrap();

        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 2);
        assert_eq!(store.count("kb").unwrap(), 2);
    }

    #[test]
    fn test_ingesting_nothing_is_a_successful_noop() {
        let embedder = StubEmbedder::new(DIM);
        let mut store = store_with_collection();

        let summary = IngestionPipeline::new(&embedder, &mut store, "kb")
            .ingest(&[])
            .unwrap();

        assert_eq!(summary.total(), 0);
        assert_eq!(store.count("kb").unwrap(), 0);
    }

    #[test]
    fn test_embedding_failure_aborts_before_any_upsert() {
        let embedder = FailingEmbedder { dimension: DIM };
        let mut store = store_with_collection();
        let records = vec![record(1, "Intro to CS", "basics of computer science")];

        let result = IngestionPipeline::new(&embedder, &mut store, "kb").ingest(&records);

        assert!(result.is_err());
        assert_eq!(store.count("kb").unwrap(), 0);
    }

    #[test]
    fn test_ingested_record_is_retrievable_by_its_own_embedding() {
        let embedder = StubEmbedder::new(DIM);
        let mut store = store_with_collection();
        let records = vec![
            record(1, "Intro to CS", "basics of computer science"),
            record(2, "Art History", "renaissance painting and sculpture"),
        ];
        IngestionPipeline::new(&embedder, &mut store, "kb")
            .ingest(&records)
            .unwrap();

        let vector = embedder.embed(&records[0].embeddable_text()).unwrap();
        let hits = store.query("kb", &vector, 2).unwrap();

        assert_eq!(hits[0].id, 1);
        assert!(hits[0].score >= hits[1].score);
    }
}
