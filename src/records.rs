//! # Course records and their relational source
//!
//! The ingestion pipeline works on [`Record`]s: typed course rows joined with
//! the name of the institute that offers them. Records are owned by the external
//! database and read-only here; this module defines the row shape, the two
//! deterministic derivations the rest of the pipeline needs (embeddable text and
//! a context block for prompt rendering), and the [`RecordSource`] capability
//! with its Diesel/SQLite implementation.
//!
//! Any provider exposing "fetch records" can stand in for the database; tests
//! substitute plain `Vec<Record>` fixtures.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::{courses, institutes};

/// One course row, with the institute name resolved.
///
/// `id` is the stable key the vector store points are keyed by; re-ingesting the
/// same record overwrites its point rather than duplicating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub about: String,
    pub tags: Option<String>,
    pub institute: String,
}

impl Record {
    /// The fixed text-derivation rule used for embedding: `"{name} {about}"`.
    ///
    /// Not persisted anywhere; recomputed on every ingestion so the embedding
    /// always reflects the current row.
    pub fn embeddable_text(&self) -> String {
        format!("{} {}", self.name, self.about)
    }

    /// Render this record as a human-readable block for the prompt context.
    pub fn context_block(&self) -> String {
        let mut block = format!(
            "name: {}\ndescription: {}\ninstitute: {}",
            self.name, self.about, self.institute
        );
        if let Some(tags) = &self.tags {
            block.push_str(&format!("\ntags: {tags}"));
        }
        block
    }
}

/// Capability for anything that can produce the course records to ingest.
pub trait RecordSource {
    /// Fetch all records, ordered by id.
    fn fetch_records(&mut self) -> Result<Vec<Record>>;
}

/// Diesel-backed [`RecordSource`] reading from a SQLite database.
pub struct SqliteRecordSource {
    connection: SqliteConnection,
}

impl SqliteRecordSource {
    /// Connect to the records database.
    ///
    /// # Errors
    /// Returns a data-source connection error if the database cannot be opened.
    pub fn connect(db_url: &str) -> Result<Self> {
        let connection = SqliteConnection::establish(db_url)
            .inspect_err(|e| tracing::error!("Error connecting to the records database: {e}"))?;
        Ok(Self { connection })
    }
}

impl RecordSource for SqliteRecordSource {
    fn fetch_records(&mut self) -> Result<Vec<Record>> {
        let rows: Vec<(i64, String, String, String, Option<String>, String)> = courses::table
            .inner_join(institutes::table)
            .select((
                courses::id,
                courses::name,
                courses::slug,
                courses::about,
                courses::tags,
                institutes::name,
            ))
            .order(courses::id.asc())
            .load(&mut self.connection)
            .inspect_err(|e| tracing::error!("Error fetching records: {e}"))?;

        tracing::info!("Fetched {} records from the data source", rows.len());

        Ok(rows
            .into_iter()
            .map(|(id, name, slug, about, tags, institute)| Record {
                id,
                name,
                slug,
                about,
                tags,
                institute,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::sql_query;
    use tempfile::TempDir;

    fn seeded_source(dir: &TempDir) -> SqliteRecordSource {
        let db_path = dir.path().join("records.db");
        let mut source = SqliteRecordSource::connect(db_path.to_str().unwrap()).unwrap();

        sql_query(
            "CREATE TABLE institutes (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
        )
        .execute(&mut source.connection)
        .unwrap();
        sql_query(
            "CREATE TABLE courses (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT NOT NULL,
                about TEXT NOT NULL,
                tags TEXT,
                institute_id INTEGER NOT NULL REFERENCES institutes (id)
            )",
        )
        .execute(&mut source.connection)
        .unwrap();
        sql_query("INSERT INTO institutes (id, name) VALUES (1, 'Acme U')")
            .execute(&mut source.connection)
            .unwrap();
        sql_query(
            "INSERT INTO courses (id, name, slug, about, tags, institute_id) VALUES
                (2, 'Data Structures', 'data-structures', 'lists trees and graphs', 'cs', 1),
                (1, 'Intro to CS', 'intro-to-cs', 'basics of computer science', NULL, 1)",
        )
        .execute(&mut source.connection)
        .unwrap();

        source
    }

    #[test]
    fn test_fetch_records_joins_and_orders() {
        let dir = TempDir::new().unwrap();
        let mut source = seeded_source(&dir);

        let records = source.fetch_records().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].name, "Intro to CS");
        assert_eq!(records[0].institute, "Acme U");
        assert_eq!(records[0].tags, None);
        assert_eq!(records[1].id, 2);
        assert_eq!(records[1].tags.as_deref(), Some("cs"));
    }

    #[test]
    fn test_connect_bad_path_is_an_error() {
        let source = SqliteRecordSource::connect("/no/such/dir/records.db");
        assert!(source.is_err());
    }

    #[test]
    fn test_embeddable_text_rule() {
        let record = Record {
            id: 1,
            name: "Intro to CS".into(),
            slug: "intro-to-cs".into(),
            about: "basics of computer science".into(),
            tags: None,
            institute: "Acme U".into(),
        };
        assert_eq!(record.embeddable_text(), "Intro to CS basics of computer science");
    }

    #[test]
    fn test_context_block_contains_display_fields() {
        let record = Record {
            id: 1,
            name: "Intro to CS".into(),
            slug: "intro-to-cs".into(),
            about: "basics of computer science".into(),
            tags: Some("cs, beginner".into()),
            institute: "Acme U".into(),
        };
        let block = record.context_block();
        assert!(block.contains("name: Intro to CS"));
        assert!(block.contains("description: basics of computer science"));
        assert!(block.contains("institute: Acme U"));
        assert!(block.contains("tags: cs, beginner"));
    }
}
