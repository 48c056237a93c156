//! Inspect and query built index files

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use mmap_index::{KeyKind, MappedTable, StoredKey, TableReport, inspect};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mmap-index",
    about = "Inspect and query memory-mapped hash index files",
    version,
    author
)]
struct Cli {
    /// Set the logging level (overridden by RUST_LOG)
    #[arg(short, long, value_enum, global = true, default_value = "info")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Args)]
struct TableArgs {
    /// Index file (slot array)
    #[arg(long, env = "MMAP_INDEX_FILE")]
    index: PathBuf,

    /// Data file (record log)
    #[arg(long, env = "MMAP_INDEX_DATA")]
    data: PathBuf,

    /// Records use integer keys
    #[arg(long)]
    int_keys: bool,
}

impl TableArgs {
    const fn kind(&self) -> KeyKind {
        if self.int_keys {
            KeyKind::Int
        } else {
            KeyKind::Bytes
        }
    }

    fn open(&self) -> Result<MappedTable> {
        if self.index == self.data {
            bail!("index and data must be different files");
        }
        MappedTable::open(&self.index, &self.data).with_context(|| {
            format!(
                "failed to open {} and {}",
                self.index.display(),
                self.data.display()
            )
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print table statistics and any structural problems
    Inspect {
        #[command(flatten)]
        table: TableArgs,

        /// Output format
        #[arg(short = 'o', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Check table structure, failing if any problem is found
    Verify {
        #[command(flatten)]
        table: TableArgs,

        /// Output format
        #[arg(short = 'o', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the value stored under a key as hex
    Get {
        #[command(flatten)]
        table: TableArgs,

        /// Treat the key argument as hex-encoded bytes
        #[arg(long, conflicts_with = "int_keys")]
        hex_key: bool,

        /// Key to look up
        #[arg(allow_hyphen_values = true)]
        key: String,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::from(cli.log_level).as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect { table, format } => {
            let report = inspect(&table.open()?, table.kind());
            print_report(&report, format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Verify { table, format } => {
            let report = inspect(&table.open()?, table.kind());
            print_report(&report, format)?;
            if report.is_ok() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Get {
            table,
            hex_key,
            key,
        } => get(&table, hex_key, &key),
    }
}

fn get(table: &TableArgs, hex_key: bool, key: &str) -> Result<ExitCode> {
    let mapped = table.open()?;

    let key_bytes;
    let key = if table.int_keys {
        StoredKey::Int(
            key.parse()
                .with_context(|| format!("invalid integer key: {key}"))?,
        )
    } else if hex_key {
        key_bytes = hex::decode(key).with_context(|| format!("invalid hex key: {key}"))?;
        StoredKey::Bytes(&key_bytes)
    } else {
        StoredKey::Bytes(key.as_bytes())
    };

    match mapped.find(&key)? {
        Some(value) => {
            println!("{}", hex::encode(value));
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("{key}: not found");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_report(report: &TableReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Text => {
            println!("Slots:         {}", report.modulus);
            println!("Occupied:      {}", report.occupied);
            println!("Load factor:   {:.3}", report.load_factor);
            println!("Data bytes:    {}", report.data_bytes);
            println!("Mean probes:   {:.3}", report.mean_probe_length());
            if !report.probe_lengths.is_empty() {
                println!("Probe lengths:");
                for (len, count) in &report.probe_lengths {
                    println!("  {len:>4}: {count}");
                }
            }
            println!("Problems:      {}", report.problem_count);
            for problem in &report.problems {
                println!("  {problem}");
            }
            if report.problems.len() < report.problem_count {
                println!(
                    "  ... {} more",
                    report.problem_count - report.problems.len()
                );
            }
        }
    }
    Ok(())
}

