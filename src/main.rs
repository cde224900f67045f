use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use xlsx2tsv::{Config, InsertionPolicy};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Policy {
    /// Insert after the "Parent" header column.
    Dynamic,
    /// Insert at column 17.
    Fixed,
}

impl From<Policy> for InsertionPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Dynamic => InsertionPolicy::after_parent(),
            Policy::Fixed => InsertionPolicy::fixed(),
        }
    }
}

#[derive(Parser)]
#[command(version, about = "Write one Excel sheet as TSV")]
struct Args {
    /// Excel file to read.
    input: PathBuf,

    /// Sheet name to read.
    sheet: String,

    /// Where the taxon column is inserted.
    #[arg(long, value_enum, default_value_t = Policy::Dynamic)]
    policy: Policy,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::new(args.input, args.sheet).with_policy(args.policy.into());

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match xlsx2tsv::run(&config, &mut handle) {
        Ok(lines) => {
            tracing::debug!(lines, "done");
            Ok(())
        }
        Err(e) if e.is_broken_pipe() => Ok(()),
        Err(e) => Err(e).with_context(|| {
            format!(
                "failed to read sheet '{}' from {}",
                config.sheet,
                config.input.display()
            )
        }),
    }
}
