//! # Lorekeeper (library root)
//!
//! Core plumbing for the **Lorekeeper** CLI and library, a small
//! retrieval-augmented generation pipeline over a course catalog:
//!
//! - Text embedding with a local sentence-transformer (`embedder`).
//! - Collection management and nearest-neighbor search (`vector_store`).
//! - Record fetching and the ingestion write path (`records`, `schema`,
//!   `pipeline`).
//! - Query-time retrieval and context rendering (`retrieval`).
//! - Conversation-aware response generation (`responder`).
//! - CLI parsing, configuration, and the interactive loop (`commands`,
//!   `config`, `chat`).
//!
//! The pieces are wired together by the `lore` binary but are usable on their
//! own: every component takes its collaborators as explicit constructor
//! arguments, so an alternative record source, embedder, or model client can
//! be substituted without touching the pipeline.
//!
//! ## Data flow
//! ```text
//! records --> IngestionPipeline --> VectorStore            (write path)
//! query ----> RetrievalQueryService --> VectorStore        (read path)
//!       \--> context string --> ConversationalResponder --> answer
//! ```

use directories::ProjectDirs;
use std::path::PathBuf;

pub mod chat;
pub mod commands;
pub mod config;
pub mod embedder;
pub mod error;
pub mod pipeline;
pub mod records;
pub mod responder;
pub mod retrieval;
pub mod schema;
pub mod vector_store;

use error::{LoreError, Result};

/// Return the per-platform configuration directory used by Lorekeeper.
///
/// This uses [`directories::ProjectDirs`] with the application triple
/// `("com", "awful-sec", "lore")`, so you get the right place on each OS
/// (e.g., `~/.config/lore` on Linux via XDG).
///
/// The directory is **not** created by this function; callers that need it
/// should create it with `fs::create_dir_all`.
///
/// # Errors
/// Returns an error if the platform configuration directory cannot be
/// determined (rare, but possible in heavily sandboxed environments).
pub fn config_dir() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "awful-sec", "lore")
        .ok_or_else(|| LoreError::Config("unable to determine config directory".to_string()))?;

    Ok(proj_dirs.config_dir().to_path_buf())
}

/// Where the vector store snapshot lives: `config_dir()/vector_store.yaml`.
pub fn store_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("vector_store.yaml"))
}
