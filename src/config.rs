//! This module provides functionality for loading and handling the application's configuration.
//!
//! It defines the `LorekeeperConfig` struct, which holds the configuration parameters,
//! and a `load_config` function to load the configuration from a file.
//!
//! # Examples
//!
//! Loading the configuration from a file:
//!
//! ```no_run
//! use lorekeeper::config::{LorekeeperConfig, load_config};
//!
//! let config: LorekeeperConfig = load_config("/path/to/config.yaml").unwrap();
//! println!("{:?}", config);
//! ```

use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{LoreError, Result};

/// Represents the application's configuration.
///
/// This struct holds everything needed to run the pipeline: the OpenAI-compatible
/// endpoint, the SQLite database the course records come from, and the knobs for
/// the vector collection, retrieval, and conversation history. It is constructed
/// by loading a YAML configuration file using [`load_config`].
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct LorekeeperConfig {
    /// The API key used to authenticate requests to the API.
    pub api_key: String,

    /// The base URL of the OpenAI-compatible API.
    pub api_base: String,

    /// The name of the model to be used for generating responses.
    pub model: String,

    // The maximum number of tokens the model may generate per answer.
    pub context_max_tokens: u16,

    // Stop words
    pub stop_words: Vec<String>,

    /// SQLite database the course records are fetched from.
    pub records_db_url: String,

    /// Name of the vector collection the records are ingested into.
    pub collection_name: String,

    /// Dimensionality of the embedding vectors (384 for MiniLM-L6).
    pub vector_dimension: usize,

    /// How many nearest records to retrieve per query.
    pub retrieval_limit: usize,

    /// Whether prior turns are replayed into each prompt.
    pub history_enabled: bool,

    /// Token budget for the conversation history; oldest turns are evicted first.
    pub history_max_tokens: u16,
}

impl Default for LorekeeperConfig {
    fn default() -> Self {
        Self {
            api_key: "CHANGEME".to_string(),
            api_base: "http://localhost:5001/v1".to_string(),
            model: "mistral-7b-openorca".to_string(),
            context_max_tokens: 1024,
            stop_words: vec![],
            records_db_url: "lore.db".to_string(),
            collection_name: "knowledge_base".to_string(),
            vector_dimension: 384,
            retrieval_limit: 3,
            history_enabled: true,
            history_max_tokens: 2048,
        }
    }
}

/// Loads the application's configuration from a YAML file.
///
/// This function reads the file at the given path, parses it as YAML, and
/// constructs a `LorekeeperConfig` struct from it.
///
/// # Parameters
///
/// - `file`: The path to the YAML configuration file.
///
/// # Returns
///
/// - `Ok(LorekeeperConfig)`: The loaded configuration.
/// - `Err(LoreError)`: An error occurred while reading the file or parsing the YAML.
pub fn load_config(file: &str) -> Result<LorekeeperConfig> {
    let content =
        fs::read_to_string(file).map_err(|e| LoreError::io(e, format!("reading {file}")))?;
    let config: LorekeeperConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_valid_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
api_key: "example_api_key"
api_base: "http://example.com"
model: "example_model"
context_max_tokens: 1024
stop_words: ["<|im_end|>"]
records_db_url: "lore.db"
collection_name: "knowledge_base"
vector_dimension: 384
retrieval_limit: 3
history_enabled: true
history_max_tokens: 2048
"#
        )
        .unwrap();

        let config = load_config(temp_file.path().to_str().unwrap());

        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.api_key, "example_api_key");
        assert_eq!(config.api_base, "http://example.com");
        assert_eq!(config.model, "example_model");
        assert_eq!(config.records_db_url, "lore.db");
        assert_eq!(config.collection_name, "knowledge_base");
        assert_eq!(config.vector_dimension, 384);
        assert_eq!(config.retrieval_limit, 3);
        assert!(config.history_enabled);
    }

    #[test]
    fn test_load_config_missing_file() {
        let config = load_config("non/existent/path");

        assert!(config.is_err());
    }

    #[test]
    fn test_load_config_invalid_format() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, r#"invalid: config: format"#).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap());

        assert!(config.is_err());
    }

    #[test]
    fn test_default_round_trips_through_yaml() {
        let config = LorekeeperConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let reloaded: LorekeeperConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config, reloaded);
    }
}
