//! # TR Genius CLI (`trg`)
//!
//! ## Usage
//!
//! ```bash
//! trg --config ./config/trg.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `trg segment <file>` | Print the retrieval units of one file |
//! | `trg corpus add <paths>...` | Ingest support documents |
//! | `trg corpus list` | List corpus entries |
//! | `trg corpus show <name>` | Print an entry's units |
//! | `trg corpus toggle <name>` | Flip an entry's selection |
//! | `trg corpus remove <name>` | Remove a user entry |
//! | `trg context` | Print the assembled context block |
//! | `trg doc save <id> <state.json>` | Record a snapshot if the document changed |
//! | `trg doc history <id>` | List a document's snapshots, newest first |
//! | `trg doc diff <id> --kind tr` | Word diff between two snapshots, per section |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tr_genius::config::{self, DEFAULT_CONFIG_PATH};
use tr_genius::corpus_cmd;
use tr_genius::doc_cmd::{self, DocumentKind};

/// TR Genius CLI: support corpus, version history and diffs for ETP / TR
/// documents.
#[derive(Parser)]
#[command(name = "trg", version)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/trg.toml`; when that file does not exist the
    /// built-in defaults are used.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and segment one file without registering it.
    Segment {
        /// PDF, DOCX or TXT file.
        file: PathBuf,
    },

    /// Manage the support-document corpus.
    Corpus {
        #[command(subcommand)]
        action: CorpusAction,
    },

    /// Print the context block built from the selected entries.
    Context,

    /// Document versions and diffs.
    Doc {
        #[command(subcommand)]
        action: DocAction,
    },
}

#[derive(Subcommand)]
enum CorpusAction {
    /// Add files, or directories walked with the configured globs.
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// List entries with kind, selection and unit count.
    List,
    /// Print an entry's units.
    Show { name: String },
    /// Select or deselect a user entry.
    Toggle { name: String },
    /// Remove a user entry.
    Remove { name: String },
}

#[derive(Subcommand)]
enum DocAction {
    /// Record a snapshot from a JSON state file if anything changed.
    Save { id: String, state: PathBuf },
    /// List snapshots, newest first.
    History { id: String },
    /// Compare snapshot A (shown) against snapshot B, section by section.
    Diff {
        id: String,
        #[arg(long, value_enum)]
        kind: DocumentKind,
        /// Index of the displayed snapshot (0 = newest).
        #[arg(short = 'a', default_value_t = 0)]
        index_a: usize,
        /// Index of the snapshot to compare against.
        #[arg(short = 'b', default_value_t = 1)]
        index_b: usize,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Segment { file } => corpus_cmd::run_segment(&cfg, &file)?,
        Commands::Corpus { action } => match action {
            CorpusAction::Add { paths } => corpus_cmd::run_add(&cfg, &paths)?,
            CorpusAction::List => corpus_cmd::run_list(&cfg)?,
            CorpusAction::Show { name } => corpus_cmd::run_show(&cfg, &name)?,
            CorpusAction::Toggle { name } => corpus_cmd::run_toggle(&cfg, &name)?,
            CorpusAction::Remove { name } => corpus_cmd::run_remove(&cfg, &name)?,
        },
        Commands::Context => corpus_cmd::run_context(&cfg)?,
        Commands::Doc { action } => match action {
            DocAction::Save { id, state } => doc_cmd::run_save(&cfg, &id, &state)?,
            DocAction::History { id } => doc_cmd::run_history(&cfg, &id)?,
            DocAction::Diff {
                id,
                kind,
                index_a,
                index_b,
            } => doc_cmd::run_diff(&cfg, &id, kind, index_a, index_b)?,
        },
    }

    Ok(())
}
