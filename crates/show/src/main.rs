use std::{
    io::{self, Write},
    path::PathBuf,
};

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use labeldb::{config::DEFAULT_DB_PATH, ProposalState, ProposalStateStore};

/// Print stored label sets as JSON lines.
#[derive(Debug, Parser)]
struct Args {
    /// SQLite database file written by labeldb-fill
    #[arg(long, env = "LABELDB_DB", default_value = DEFAULT_DB_PATH)]
    db: PathBuf,

    /// Only print this issue or pull request
    #[arg(long)]
    number: Option<u64>,
}

fn write_rows(
    store: &ProposalStateStore,
    number: Option<u64>,
    out: &mut impl Write,
) -> Result<usize, Box<dyn std::error::Error>> {
    let rows: Vec<ProposalState> = match number {
        Some(n) => store.get(n)?.into_iter().collect(),
        None => store.all()?,
    };
    for row in &rows {
        out.write_all(serde_json::to_string(row)?.as_bytes())?;
        out.write_all(b"\n")?;
    }
    Ok(rows.len())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if !args.db.exists() {
        return Err(format!("no database at {}", args.db.display()).into());
    }
    let store = ProposalStateStore::open_read_only(&args.db)?;
    let written = write_rows(&store, args.number, &mut io::stdout().lock())?;
    if written == 0 {
        if let Some(n) = args.number {
            warn!("No stored labels for #{n}");
        }
    }
    store.close()?;
    Ok(())
}
