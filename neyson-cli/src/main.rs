//! Command line front-end for neyson.
//!
//! ```text
//! neyson fmt data.json --compact
//! neyson get Cargo.toml /package/name
//! neyson convert config.toml --to json -o config.json
//! neyson query app.db "SELECT * FROM users"
//! ```

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::debug;

mod commands;

use commands::Target;

#[derive(Parser)]
#[command(name = "neyson", about = "Inspect and convert JSON, XML, TOML and SQLite data", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reformat a JSON or XML file
    Fmt {
        file: PathBuf,
        /// Write without indentation
        #[arg(long)]
        compact: bool,
        /// Output file, stdout when omitted
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },
    /// Print the value at a JSON pointer
    Get {
        file: PathBuf,
        /// Pointer such as `/items/0/name`
        pointer: String,
    },
    /// Convert between JSON and TOML
    Convert {
        file: PathBuf,
        #[arg(long, value_enum)]
        to: Target,
        /// Output file, stdout when omitted
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },
    /// Run SQL against an SQLite database and print the rows
    Query { db: PathBuf, sql: String },
}

fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            debug!("wrote {} bytes to {}", text.len(), path.display());
        }
        None if text.ends_with('\n') => print!("{text}"),
        None => println!("{text}"),
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Fmt {
            file,
            compact,
            output,
        } => emit(&commands::fmt(&file, compact)?, output.as_deref()),
        Command::Get { file, pointer } => emit(&commands::get(&file, &pointer)?, None),
        Command::Convert { file, to, output } => {
            emit(&commands::convert(&file, to)?, output.as_deref())
        }
        Command::Query { db, sql } => emit(&commands::query(&db, &sql).await?, None),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::builder()
        .format_module_path(false)
        .format_timestamp(None)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format!("error: {e:#}").red());
            ExitCode::FAILURE
        }
    }
}
