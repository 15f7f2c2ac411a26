use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use paperfile::config::{self, EngineConfig};
use paperfile::models::enums::ProcessingStatus;
use paperfile::models::Document;
use paperfile::pipeline::TaggerOrchestrator;
use paperfile::store::SqliteStore;

#[derive(Parser)]
#[command(name = "paperfile", version, about = "Tag and file scanned documents into a structured archive")]
struct Cli {
    /// SQLite database path (defaults to the app data directory).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process all documents awaiting tagging and filing.
    Run {
        /// Engine configuration file (JSON). Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the archive root from the configuration.
        #[arg(long)]
        archive_root: Option<PathBuf>,
    },
    /// Register a document so the next run picks it up.
    Ingest {
        /// The file to be archived.
        file: PathBuf,

        /// File containing the document's extracted text.
        #[arg(long)]
        text_file: Option<PathBuf>,

        /// Document type ("Invoice", "Medical Record", ...).
        #[arg(long, default_value = "Unclassified")]
        document_type: String,

        /// Owner to file the document under.
        #[arg(long)]
        owner_id: Option<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let cli = Cli::parse();
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = cli
        .db
        .unwrap_or_else(|| config::app_data_dir().join("paperfile.db"));
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = SqliteStore::open(&db_path)?;

    match cli.command {
        Command::Run {
            config: config_path,
            archive_root,
        } => {
            let mut engine_config = match config_path {
                Some(path) => EngineConfig::load(&path)?,
                None => EngineConfig::default(),
            };
            if let Some(root) = archive_root {
                engine_config.archive_root = root;
            }

            let orchestrator = TaggerOrchestrator::new(Box::new(store), engine_config);
            let outcome = orchestrator.run_batch()?;
            println!(
                "Processed {} document(s): {} filed, {} skipped, {} failed",
                outcome.processed, outcome.filed, outcome.skipped, outcome.failed
            );
            if outcome.failed > 0 {
                return Err(format!("{} document(s) failed filing", outcome.failed).into());
            }
        }
        Command::Ingest {
            file,
            text_file,
            document_type,
            owner_id,
        } => {
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or("File path has no usable file name")?
                .to_string();
            let full_text = match text_file {
                Some(path) => Some(std::fs::read_to_string(path)?),
                None => None,
            };

            let mut doc = Document::new(uuid::Uuid::new_v4().to_string(), &file_name);
            doc.source_path = Some(file.canonicalize()?);
            doc.upload_timestamp = Some(chrono::Utc::now().naive_utc());
            doc.document_type = document_type;
            doc.owner_id = owner_id;
            doc.full_text = full_text;
            doc.processing_status = ProcessingStatus::Summarized;

            store.insert_document(&doc)?;
            println!("Registered {} as {}", file_name, doc.id);
        }
    }
    Ok(())
}
