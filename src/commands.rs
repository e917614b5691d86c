//! This module defines the command-line interface for the application using `clap`.
//!
//! It provides a `Cli` struct that represents the parsed command-line arguments,
//! and a `Commands` enum that represents the available subcommands and their
//! options.

use clap::{Parser, Subcommand};

/// Represents the parsed command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, propagate_version = true, color = clap::ColorChoice::Always)]
pub struct Cli {
    /// The parsed subcommand and its options.
    #[command(subcommand)]
    pub command: Commands,
}

/// Represents the available subcommands and their options.
#[derive(Subcommand, Debug)]
#[command(about, long_about = None, color = clap::ColorChoice::Always)]
pub enum Commands {
    /// Create a default configuration file in the platform config directory.
    Init,

    /// Fetch the course records and ingest them into the vector collection.
    #[clap(name = "ingest")]
    Ingest,

    /// Ask a single question and print the answer.
    #[clap(name = "ask", alias = "a")]
    Ask {
        /// The question to be asked.
        question: String,
    },

    /// Enter the interactive query loop. Type `exit` to leave.
    #[clap(name = "chat", alias = "c")]
    Chat,
}
