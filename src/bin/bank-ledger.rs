use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use bank_ledger::{
    audit::FileAuditLog,
    bin_utils::{OutputFormat, Service, word_list::load_word_list},
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Loads bank clients, assigns aliases, applies movements and prints the ledger.
#[derive(Parser)]
#[command(name = "bank-ledger", version, about, long_about = None)]
struct Cli {
    /// Client CSV with headers `nombre,apellido,dni,email`
    clients: PathBuf,

    /// Word list used for aliases, one word per line
    #[arg(long)]
    words: Option<PathBuf>,

    /// Movement CSV with headers `type,client,amount,to`
    #[arg(long)]
    movements: Option<PathBuf>,

    /// Append-only movement log
    #[arg(long, default_value = "movimientos.log")]
    audit_log: PathBuf,

    /// Truncate the movement log before applying movements
    #[arg(long)]
    clear_log: bool,

    /// Print accounts as CSV instead of the text report
    #[arg(long)]
    csv: bool,
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open `{}`", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let word_list = match &cli.words {
        Some(path) => Some(
            load_word_list(open(path)?)
                .with_context(|| format!("Failed to read `{}`", path.display()))?,
        ),
        None => None,
    };
    let movements = cli.movements.as_deref().map(open).transpose()?;

    let audit = FileAuditLog::new(&cli.audit_log);
    if cli.clear_log {
        audit.clear()?;
    }

    let service = Service {
        clients: open(&cli.clients)?,
        word_list,
        movements,
        audit,
        output: &mut std::io::stdout(),
        format: if cli.csv {
            OutputFormat::Csv
        } else {
            OutputFormat::Report
        },
        error_printer: Box::new(|err| eprintln!("{err}")),
    };
    service.run().map(drop)
}
