//! # Syllabus RAG CLI (`srag`)
//!
//! ## Usage
//!
//! ```bash
//! srag --config ./config/srag.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `srag init` | Create the SQLite database and run schema migrations |
//! | `srag ingest <file>` | Store a plain-text document and build the knowledge base |
//! | `srag rebuild` | Rebuild the knowledge base from the latest document |
//! | `srag ask "<prompt>" --user <id>` | Answer a question from the indexed material |
//! | `srag report --user <id>` | Print topic strengths and gaps as JSON |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use syllabus_rag::{ask, config, db, kb, logging, migrate, report};

/// Syllabus RAG: question answering grounded in uploaded course material.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/srag.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "srag",
    about = "Syllabus RAG: retrieval-augmented answers over course material",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/srag.toml")]
    config: PathBuf,

    /// Enable debug logging on stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Store an already-extracted plain-text document and index it.
    Ingest {
        /// Path to a UTF-8 text file.
        file: PathBuf,

        /// Document title; defaults to the file name without extension.
        #[arg(long)]
        title: Option<String>,
    },

    /// Re-index the most recently uploaded document.
    Rebuild,

    /// Answer a prompt using the indexed material.
    Ask {
        prompt: String,

        /// Opaque user identifier the interaction is logged under.
        #[arg(long)]
        user: String,
    },

    /// Print the analytics report for a user as JSON.
    Report {
        #[arg(long)]
        user: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg).await?;
            migrate::run_migrations(&pool).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { file, title } => {
            kb::run_ingest(&cfg, &file, title).await?;
        }
        Commands::Rebuild => {
            kb::run_rebuild(&cfg).await?;
        }
        Commands::Ask { prompt, user } => {
            ask::run_ask(&cfg, &prompt, &user).await?;
        }
        Commands::Report { user } => {
            report::run_report(&cfg, &user).await?;
        }
    }

    Ok(())
}
