//! # VectorStore
//!
//! Collection management and nearest-neighbor search for Lorekeeper.
//!
//! This module wraps a [HNSW](https://arxiv.org/abs/1603.09320) approximate
//! nearest-neighbor index (`hora` crate) with the collection semantics the RAG
//! pipeline needs: named collections with a dimension and distance metric fixed
//! at creation, batched id-keyed upserts, and similarity queries whose results
//! are rescored exactly against the stored vectors.
//!
//! ## Responsibilities
//! - **Collections**: idempotent create, no-op delete, fixed dimension/metric.
//! - **Upserts**: insert-or-overwrite by point id, batch validated as a unit.
//! - **Queries**: HNSW candidate search + exact rescoring, results ordered by
//!   non-increasing score with ties broken by ascending id.
//! - **Persistence**: snapshots to YAML; indexes are rebuilt from the stored
//!   vectors on load rather than serialized.
//!
//! ## Quick Example
//! ```no_run
//! use lorekeeper::vector_store::{Distance, Point, VectorStore};
//! use lorekeeper::records::Record;
//!
//! # fn main() -> lorekeeper::error::Result<()> {
//! let mut store = VectorStore::new();
//! store.create_collection("knowledge_base", 3, Distance::Cosine);
//! let record = Record {
//!     id: 1,
//!     name: "Intro to CS".into(),
//!     slug: "intro-to-cs".into(),
//!     about: "basics of computer science".into(),
//!     tags: None,
//!     institute: "Acme U".into(),
//! };
//! store.upsert(
//!     "knowledge_base",
//!     vec![Point { id: 1, vector: vec![1.0, 0.0, 0.0], payload: record }],
//! )?;
//! let hits = store.query("knowledge_base", &[1.0, 0.0, 0.0], 1)?;
//! println!("Top match: {:?}", hits[0].id);
//! # Ok(()) }
//! ```

use hora::core::ann_index::ANNIndex;
use hora::core::metrics::Metric;
use hora::index::hnsw_idx::HNSWIndex;
use hora::index::hnsw_params::HNSWParams;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::error::{LoreError, Result};
use crate::records::Record;

/// Distance metric for a collection, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    Cosine,
    Euclidean,
}

impl Distance {
    fn metric(self) -> Metric {
        match self {
            Distance::Cosine => Metric::CosineSimilarity,
            Distance::Euclidean => Metric::Euclidean,
        }
    }

    /// Similarity score under this metric; higher is more similar.
    ///
    /// For cosine this is the cosine similarity itself; for euclidean it is the
    /// negated distance so that descending score still means nearest-first.
    fn score(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Distance::Cosine => cosine_similarity(a, b),
            Distance::Euclidean => -euclidean_distance(a, b),
        }
    }
}

/// One stored vector with its id and payload.
///
/// Within a collection there is at most one point per id; upserting an existing
/// id overwrites both vector and payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    pub id: i64,
    pub vector: Vec<f32>,
    pub payload: Record,
}

/// One query result: the point's id, its similarity score, and its payload.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: i64,
    pub score: f32,
    pub payload: Record,
}

/// Outcome of a batched upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub inserted: usize,
    pub updated: usize,
}

impl UpsertSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

fn placeholder_index() -> HNSWIndex<f32, usize> {
    HNSWIndex::new(0, &HNSWParams::default())
}

/// A named container of points with a fixed dimension and metric.
#[derive(Serialize, Deserialize)]
struct Collection {
    dimension: usize,
    distance: Distance,
    points: BTreeMap<i64, Point>,
    /// ANN index over the points; rebuilt after every upsert batch and on load.
    #[serde(skip, default = "placeholder_index")]
    index: HNSWIndex<f32, usize>,
    /// Index slot → point id, parallel to the insertion order used at rebuild.
    #[serde(skip)]
    slots: Vec<i64>,
}

impl Collection {
    fn new(dimension: usize, distance: Distance) -> Self {
        Self {
            dimension,
            distance,
            points: BTreeMap::new(),
            index: placeholder_index(),
            slots: Vec::new(),
        }
    }

    /// Rebuild the HNSW index from the stored points.
    ///
    /// `hora` has no removal or overwrite, so every upsert batch rebuilds from
    /// scratch. `BTreeMap` iteration keeps slot assignment deterministic.
    fn rebuild_index(&mut self) -> Result<()> {
        let mut index = HNSWIndex::new(self.dimension, &HNSWParams::default());
        self.slots.clear();

        if !self.points.is_empty() {
            for (slot, (id, point)) in self.points.iter().enumerate() {
                index
                    .add(&point.vector, slot)
                    .map_err(|e| LoreError::Index(e.to_string()))?;
                self.slots.push(*id);
            }
            index
                .build(self.distance.metric())
                .map_err(|e| LoreError::Index(e.to_string()))?;
        }

        self.index = index;
        Ok(())
    }
}

/// Manages named collections of embedding points.
#[derive(Default, Serialize, Deserialize)]
pub struct VectorStore {
    collections: HashMap<String, Collection>,
}

impl VectorStore {
    /// Create an empty store with no collections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection if it does not already exist.
    ///
    /// Returns `true` if a new collection was created, `false` if one with that
    /// name already existed. In the latter case nothing is mutated, even when
    /// the requested dimension or metric differ: both are fixed at creation.
    pub fn create_collection(&mut self, name: &str, dimension: usize, distance: Distance) -> bool {
        if self.collections.contains_key(name) {
            tracing::debug!("Collection {name} already exists");
            return false;
        }
        tracing::info!("Creating collection {name} (dimension {dimension})");
        self.collections
            .insert(name.to_string(), Collection::new(dimension, distance));
        true
    }

    /// Remove a collection and all its points. No-op if the collection is absent.
    pub fn delete_collection(&mut self, name: &str) {
        if self.collections.remove(name).is_some() {
            tracing::info!("Deleted collection {name}");
        } else {
            tracing::debug!("Collection {name} does not exist");
        }
    }

    pub fn collection_exists(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Number of points currently stored in a collection.
    pub fn count(&self, name: &str) -> Result<usize> {
        let collection = self.collection(name)?;
        Ok(collection.points.len())
    }

    /// Insert or overwrite a batch of points.
    ///
    /// Every point's dimension is validated before anything is written, so a
    /// bad batch leaves the collection untouched. Points whose id already
    /// exists overwrite the stored vector and payload.
    pub fn upsert(&mut self, name: &str, points: Vec<Point>) -> Result<UpsertSummary> {
        let collection = self
            .collections
            .get_mut(name)
            .ok_or_else(|| LoreError::CollectionNotFound {
                name: name.to_string(),
            })?;

        for point in &points {
            if point.vector.len() != collection.dimension {
                return Err(LoreError::DimensionMismatch {
                    expected: collection.dimension,
                    got: point.vector.len(),
                });
            }
        }

        let mut summary = UpsertSummary::default();
        for point in points {
            match collection.points.insert(point.id, point) {
                Some(_) => summary.updated += 1,
                None => summary.inserted += 1,
            }
        }
        collection.rebuild_index()?;

        tracing::info!(
            "Upserted {} points into {name} ({} new, {} overwritten)",
            summary.total(),
            summary.inserted,
            summary.updated
        );
        Ok(summary)
    }

    /// Query a collection for the points nearest to `vector`.
    ///
    /// Returns at most `limit` hits ordered by non-increasing score under the
    /// collection's metric; equal scores are ordered by ascending id. ANN
    /// candidates are rescored exactly against the stored vectors, so the
    /// ordering is deterministic for a given collection state. An empty
    /// collection yields an empty result, not an error.
    pub fn query(&self, name: &str, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        let collection = self.collection(name)?;

        if vector.len() != collection.dimension {
            return Err(LoreError::DimensionMismatch {
                expected: collection.dimension,
                got: vector.len(),
            });
        }
        if collection.points.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let candidates = collection.index.search(vector, limit);
        let mut hits: Vec<SearchHit> = candidates
            .into_iter()
            .filter_map(|slot| {
                let id = *collection.slots.get(slot)?;
                let point = collection.points.get(&id)?;
                Some(SearchHit {
                    id,
                    score: collection.distance.score(vector, &point.vector),
                    payload: point.payload.clone(),
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    /// Snapshot the store to a YAML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| LoreError::io(e, format!("creating {}", parent.display())))?;
        }
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml).map_err(|e| LoreError::io(e, format!("writing {}", path.display())))
    }

    /// Load a store snapshot written by [`save`](Self::save), rebuilding the
    /// ANN indexes from the stored vectors.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path)
            .map_err(|e| LoreError::io(e, format!("reading {}", path.display())))?;
        let mut store: VectorStore = serde_yaml::from_str(&yaml)?;
        for collection in store.collections.values_mut() {
            collection.rebuild_index()?;
        }
        Ok(store)
    }

    fn collection(&self, name: &str) -> Result<&Collection> {
        self.collections
            .get(name)
            .ok_or_else(|| LoreError::CollectionNotFound {
                name: name.to_string(),
            })
    }
}

/// Cosine similarity between two equal-length vectors.
///
/// Returns 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Euclidean distance between two equal-length vectors.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt()
}
