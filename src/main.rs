//! # Lease Assist CLI (`lease`)
//!
//! The `lease` binary answers questions about a corpus of lease-contract
//! JSON documents. It provides commands for database initialization,
//! corpus ingestion, question answering, and listing the ingested
//! stores.
//!
//! ## Usage
//!
//! ```bash
//! lease --config ./config/lease.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lease init` | Create the SQLite database and schema |
//! | `lease ingest <dir>` | (Re)build the corpus from a directory of contract JSON files |
//! | `lease ask "<question>"` | Route, assemble context, and synthesize an answer |
//! | `lease stores` | List the ingested metadata collection |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! lease init --config ./config/lease.toml
//!
//! # Ingest the contract corpus (wholesale replace)
//! lease ingest ./contratos_json --config ./config/lease.toml
//!
//! # Portfolio-wide question answered from aggregated metadata
//! lease ask "Quais os vencimentos de todos os contratos?"
//!
//! # Store-specific question answered from a single retrieved document
//! lease ask "Qual a área da loja Livraria Alfa?" --sources
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use lease_assist::{ask, config, ingest, migrate, stores};

/// Lease Assist CLI — a question-answering assistant for shopping-center
/// lease contracts.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/lease.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "lease",
    about = "Lease Assist — answer questions about a lease-contract corpus",
    version,
    long_about = "Lease Assist ingests a directory of lease-contract JSON documents, \
    indexes them with embeddings, and answers natural-language questions by routing each \
    one to either aggregated contract metadata or bounded semantic retrieval before \
    delegating answer synthesis to a chat endpoint."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/lease.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the documents table.
    /// Idempotent — running it multiple times is safe.
    Init,

    /// Ingest a directory of contract JSON files.
    ///
    /// Replaces the entire corpus wholesale: all previously indexed
    /// documents are deleted and the directory is re-read from scratch.
    /// Embeddings are generated inline when a provider is configured;
    /// embedding failures leave documents indexed but unembedded.
    Ingest {
        /// Directory containing one JSON contract record per file.
        directory: PathBuf,

        /// Show file counts without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Ask a question about the ingested contracts.
    ///
    /// The question is classified as portfolio-wide or store-specific,
    /// context is assembled accordingly, and the answer is synthesized
    /// by the configured chat model.
    Ask {
        /// The question, typically in Portuguese.
        question: String,

        /// Also print the provenance of the answer (retrieved stores
        /// and contract numbers, or an aggregated-metadata note).
        #[arg(long)]
        sources: bool,
    },

    /// List the ingested stores and their key contract fields.
    Stores,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { directory, dry_run } => {
            ingest::run_ingest(&cfg, &directory, dry_run).await?;
        }
        Commands::Ask { question, sources } => {
            ask::run_ask(&cfg, &question, sources).await?;
        }
        Commands::Stores => {
            stores::run_stores(&cfg).await?;
        }
    }

    Ok(())
}
