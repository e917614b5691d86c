//! Main module for the Lorekeeper CLI application (lore).
//!
//! Handles command parsing, configuration loading, and initialization, then
//! invokes the appropriate pipeline pieces for the provided subcommand.
//!
//! # Examples
//!
//! Initializing the configuration, ingesting the catalog, and asking:
//!
//! ```sh
//! lore init
//! lore ingest
//! lore ask "Which course covers the basics of computer science?"
//! lore chat
//! ```

use clap::Parser;
use once_cell::sync::OnceCell;
use std::{env, error::Error, fs, path::PathBuf};
use tracing::{debug, info};

use lorekeeper::chat;
use lorekeeper::commands::{Cli, Commands};
use lorekeeper::config::{LorekeeperConfig, load_config};
use lorekeeper::embedder::{BertEmbedder, Embedder};
use lorekeeper::error::LoreError;
use lorekeeper::pipeline::IngestionPipeline;
use lorekeeper::records::{RecordSource, SqliteRecordSource};
use lorekeeper::responder::ConversationalResponder;
use lorekeeper::vector_store::{Distance, VectorStore};

static TRACING: OnceCell<()> = OnceCell::new();

fn main() -> Result<(), Box<dyn Error>> {
    TRACING.get_or_init(|| {
        tracing_subscriber::fmt::init();
    });
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run())
}

/// Parse the CLI, load configuration, and dispatch the subcommand.
async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        return init();
    }

    let config_path = match env::var("LOREKEEPER_CONFIG") {
        Ok(path) => PathBuf::from(path),
        Err(_) => lorekeeper::config_dir()?.join("config.yaml"),
    };
    debug!("Loading config from: {}", config_path.display());
    let config = load_config(
        config_path
            .to_str()
            .ok_or("config path is not valid UTF-8")?,
    )?;
    debug!("Config loaded: {:?}", config);

    match cli.command {
        Commands::Init => unreachable!("handled above"),
        Commands::Ingest => ingest(&config),
        Commands::Ask { question } => {
            let answer = answer_once(&config, &question).await?;
            println!("AI: {answer}");
            Ok(())
        }
        Commands::Chat => chat_loop(&config).await,
    }
}

/// Create the config directory and write a default `config.yaml`.
fn init() -> Result<(), Box<dyn Error>> {
    let config_dir = lorekeeper::config_dir()?;
    fs::create_dir_all(&config_dir)?;

    let config_path = config_dir.join("config.yaml");
    info!("Creating config file: {}", config_path.display());
    let config = LorekeeperConfig::default();
    fs::write(&config_path, serde_yaml::to_string(&config)?)?;

    println!("Wrote {}", config_path.display());
    Ok(())
}

/// Load the persisted store if present, otherwise start empty, and make sure
/// the configured collection exists.
fn open_store(config: &LorekeeperConfig) -> Result<VectorStore, Box<dyn Error>> {
    let store_path = lorekeeper::store_path()?;
    let mut store = if store_path.exists() {
        VectorStore::load(&store_path)?
    } else {
        VectorStore::new()
    };

    if store.create_collection(&config.collection_name, config.vector_dimension, Distance::Cosine)
    {
        info!("Created collection {}", config.collection_name);
    }
    Ok(store)
}

/// Load the embedding model and check it against the configured dimension.
fn load_embedder(config: &LorekeeperConfig) -> Result<BertEmbedder, Box<dyn Error>> {
    let embedder = BertEmbedder::load()?;
    if embedder.dimension() != config.vector_dimension {
        return Err(LoreError::Config(format!(
            "embedding model produces {}-dimensional vectors but vector_dimension is {}",
            embedder.dimension(),
            config.vector_dimension
        ))
        .into());
    }
    Ok(embedder)
}

/// Fetch the course records and upsert them into the collection.
fn ingest(config: &LorekeeperConfig) -> Result<(), Box<dyn Error>> {
    let mut store = open_store(config)?;
    let embedder = load_embedder(config)?;

    let mut source = SqliteRecordSource::connect(&config.records_db_url)?;
    let records = source.fetch_records()?;

    let summary = IngestionPipeline::new(&embedder, &mut store, &config.collection_name)
        .ingest(&records)?;
    store.save(&lorekeeper::store_path()?)?;

    println!(
        "Ingested {} records into {} ({} new, {} overwritten)",
        summary.total(),
        config.collection_name,
        summary.inserted,
        summary.updated
    );
    Ok(())
}

/// One-shot question answering.
async fn answer_once(config: &LorekeeperConfig, question: &str) -> Result<String, Box<dyn Error>> {
    let store = open_store(config)?;
    let embedder = load_embedder(config)?;
    let mut responder = ConversationalResponder::new(config);

    Ok(chat::ask(config, &embedder, &store, &mut responder, question).await?)
}

/// The interactive query loop.
async fn chat_loop(config: &LorekeeperConfig) -> Result<(), Box<dyn Error>> {
    let store = open_store(config)?;
    let embedder = load_embedder(config)?;
    let mut responder = ConversationalResponder::new(config);

    chat::interactive_mode(config, &embedder, &store, &mut responder).await?;
    Ok(())
}
