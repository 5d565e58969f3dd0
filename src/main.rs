//! # caselens CLI
//!
//! Uploads document batches to the case service and renders the results.
//!
//! ## Usage
//!
//! ```bash
//! caselens --config ./config/caselens.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `caselens cases` | List cases with document counts |
//! | `caselens show <id>` | Print a case's summary and timeline |
//! | `caselens upload <files…>` | Upload files as a new case or into `--case` |
//! | `caselens rename <id> <name>` | Rename a case |
//! | `caselens delete <id> --yes` | Delete a case and all of its documents |
//! | `caselens export <id>` | Write the case export JSON |
//! | `caselens parse [path]` | Parse annotation text offline |
//!
//! ## Examples
//!
//! ```bash
//! # Create a case from two PDFs
//! caselens upload --name "Doe v. ACME" note.pdf xray.pdf
//!
//! # Add another document to case 4
//! caselens upload --case 4 bill.pdf
//!
//! # Timeline as JSON for scripts
//! caselens show 4 --json
//! ```

use std::path::PathBuf;

use anyhow::Context;
use caselens::config::{self, Config};
use caselens::http_store::HttpCaseStore;
use caselens::{cases, export, parse_cmd, progress, show, upload};
use caselens_core::models::CaseId;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "./config/caselens.toml";

/// caselens: upload document batches and read their case summaries.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/caselens.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "caselens",
    about = "Upload document batches and read their case summaries and timelines",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/caselens.toml`; built-in defaults are used
    /// when the default file does not exist.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Backend base URL, overriding `[api].base_url`.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all cases.
    Cases,

    /// Show one case: summary, then documents grouped by date.
    Show {
        /// Case id.
        id: CaseId,

        /// Print the case view as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Upload files as one batch.
    ///
    /// Without `--case` a new case is created, named by `--name` or
    /// `[upload].default_case_name`. With `--case` the files are appended
    /// to that case and the name is ignored.
    Upload {
        /// Files to upload.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Name for the new case.
        #[arg(long)]
        name: Option<String>,

        /// Append to this existing case instead of creating one.
        #[arg(long = "case")]
        case_id: Option<CaseId>,

        /// Emit progress as JSON lines on stderr.
        #[arg(long)]
        json_progress: bool,
    },

    /// Rename a case.
    Rename {
        id: CaseId,
        name: String,
    },

    /// Delete a case and all of its documents. Irreversible.
    Delete {
        id: CaseId,

        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },

    /// Export a case's documents and metadata as JSON.
    Export {
        id: CaseId,

        /// Write to this file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Parse annotation text and print the summary and facts as JSON.
    ///
    /// Reads stdin when no path is given. Needs no backend.
    Parse {
        path: Option<PathBuf>,
    },
}

fn init_logging(cfg: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let required = cli.config.as_path() != std::path::Path::new(DEFAULT_CONFIG);
    let mut cfg = config::load_or_default(&cli.config, required)?;
    if let Some(url) = cli.api_url {
        cfg.api.base_url = url;
        config::validate(&cfg)?;
    }
    init_logging(&cfg);

    // Commands that don't talk to the backend
    if let Commands::Parse { path } = &cli.command {
        return parse_cmd::run_parse(path.as_deref());
    }

    let store = HttpCaseStore::from_config(&cfg.api).context("Failed to build HTTP client")?;
    let timeline = cfg.timeline.options();

    match cli.command {
        Commands::Cases => {
            cases::run_list(&store).await?;
        }
        Commands::Show { id, json } => {
            show::run_show(&store, id, &timeline, json).await?;
        }
        Commands::Upload {
            files,
            name,
            case_id,
            json_progress,
        } => {
            let reporter = progress::reporter_for(json_progress);
            upload::run_upload(
                &store,
                &cfg.upload,
                &files,
                name.as_deref(),
                case_id,
                reporter.as_ref(),
            )
            .await?;
        }
        Commands::Rename { id, name } => {
            cases::run_rename(&store, id, &name).await?;
        }
        Commands::Delete { id, yes } => {
            cases::run_delete(&store, id, yes).await?;
        }
        Commands::Export { id, output } => {
            export::run_export(&store, id, output.as_deref()).await?;
        }
        Commands::Parse { .. } => {
            // Handled above (before the store is built)
            unreachable!()
        }
    }

    Ok(())
}
