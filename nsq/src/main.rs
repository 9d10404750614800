//! nsq: Node Selection Query - CLI for filtering node tables with query expressions.

use std::io;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(name = "nsq")]
#[command(about = "Node Selection Query - filter node tables with query expressions")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Clone)]
pub struct GlobalOptions {
    /// Config file (default: $NODESEL_CONFIG, then the user config directory)
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Do not start from the built-in compute-node fields and abbreviations
    #[arg(long = "no-catalog", global = true)]
    pub no_catalog: bool,

    /// Log verbosity when RUST_LOG is not set
    #[arg(long = "log-level", global = true, value_enum, default_value = "warn")]
    pub log_level: LogLevel,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// How `select` prints its result.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Matching records as a JSON array
    Json,
    /// Host names of matching records, one per line
    Hosts,
    /// Row indices of matching records, one per line
    Indices,
    /// One 0/1 digit per input row
    Bits,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the records selected by a query
    #[command(visible_alias = "s")]
    Select {
        /// Query expression (e.g., "compute and cpu% > 50")
        query: String,

        /// File with records as a JSON array or JSON Lines (reads stdin if not provided)
        file: Option<PathBuf>,

        /// Output format
        #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Compile a query and print its expression tree
    Check {
        /// Query expression
        query: String,
    },

    /// Split a comma-separated list of host patterns
    Split {
        /// Patterns (e.g., "c1-[1-4],login*")
        patterns: String,
    },

    /// Print the host names matched by a pattern list
    Match {
        /// Patterns, comma separated
        patterns: String,

        /// Host names to test
        #[arg(required = true)]
        hostnames: Vec<String>,

        /// Match leading host elements only (c1 matches c1.fox)
        #[arg(short = 'p', long = "prefix")]
        prefix: bool,
    },

    /// Print every host name denoted by wildcard-free patterns
    Expand {
        /// Patterns, comma separated
        patterns: String,
    },

    /// Compress host names into patterns
    Compress {
        /// File with one host name per line (reads stdin if not provided)
        file: Option<PathBuf>,
    },

    /// List known fields, aliases and named operations
    Fields,
}

fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.log_level);

    let global = &cli.global;
    let result = match cli.command {
        Commands::Select { query, file, format } => {
            commands::select(global, &query, file.as_deref(), format)
        }
        Commands::Check { query } => commands::check(global, &query),
        Commands::Split { patterns } => commands::split(&patterns),
        Commands::Match { patterns, hostnames, prefix } => {
            match commands::match_hosts(&patterns, &hostnames, prefix) {
                Ok(true) => Ok(()),
                Ok(false) => std::process::exit(1),
                Err(e) => Err(e),
            }
        }
        Commands::Expand { patterns } => commands::expand(&patterns),
        Commands::Compress { file } => commands::compress(file.as_deref()),
        Commands::Fields => commands::fields(global),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
